//! Run control: stop time, random seeds, log components, packet capture
//! and the timeline of events scheduled for after the build.

use super::{DeviceKey, LinkId};
use crate::utils::SimTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Log level mask of a simulation log component.
/// Enabling a component twice ORs the masks together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LogLevel(u32);

impl LogLevel {
    pub const NONE: LogLevel = LogLevel(0);
    pub const ERROR: LogLevel = LogLevel(0x0000_0001);
    pub const WARN: LogLevel = LogLevel(0x0000_0002);
    pub const DEBUG: LogLevel = LogLevel(0x0000_0004);
    pub const INFO: LogLevel = LogLevel(0x0000_0008);
    pub const FUNCTION: LogLevel = LogLevel(0x0000_0010);
    pub const LOGIC: LogLevel = LogLevel(0x0000_0020);
    pub const ALL: LogLevel = LogLevel(0x0fff_ffff);
    pub const PREFIX_FUNC: LogLevel = LogLevel(0x8000_0000);
    pub const PREFIX_TIME: LogLevel = LogLevel(0x4000_0000);
    pub const PREFIX_NODE: LogLevel = LogLevel(0x2000_0000);
    pub const PREFIX_LEVEL: LogLevel = LogLevel(0x1000_0000);
    pub const PREFIX_ALL: LogLevel = LogLevel(0xf000_0000);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: LogLevel) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for LogLevel {
    type Output = LogLevel;

    fn bitor(self, rhs: LogLevel) -> LogLevel {
        LogLevel(self.0 | rhs.0)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// `LOG_X` enables exactly one level, `LOG_LEVEL_X` enables X and everything more severe.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s {
            "LOG_NONE" => LogLevel::NONE,
            "LOG_ERROR" | "LOG_LEVEL_ERROR" => LogLevel::ERROR,
            "LOG_WARN" => LogLevel::WARN,
            "LOG_LEVEL_WARN" => LogLevel::ERROR | LogLevel::WARN,
            "LOG_DEBUG" => LogLevel::DEBUG,
            "LOG_LEVEL_DEBUG" => LogLevel(0x7),
            "LOG_INFO" => LogLevel::INFO,
            "LOG_LEVEL_INFO" => LogLevel(0xf),
            "LOG_FUNCTION" => LogLevel::FUNCTION,
            "LOG_LEVEL_FUNCTION" => LogLevel(0x1f),
            "LOG_LOGIC" => LogLevel::LOGIC,
            "LOG_LEVEL_LOGIC" => LogLevel(0x3f),
            "LOG_ALL" | "LOG_LEVEL_ALL" => LogLevel::ALL,
            "LOG_PREFIX_FUNC" => LogLevel::PREFIX_FUNC,
            "LOG_PREFIX_TIME" => LogLevel::PREFIX_TIME,
            "LOG_PREFIX_NODE" => LogLevel::PREFIX_NODE,
            "LOG_PREFIX_LEVEL" => LogLevel::PREFIX_LEVEL,
            "LOG_PREFIX_ALL" => LogLevel::PREFIX_ALL,
            other => return Err(format!("Unknown LogLevel: {}", other)),
        };
        Ok(level)
    }
}

/// Link-layer header type written into a pcap file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataLinkType {
    /// DLT_EN10MB
    Ethernet,
    /// DLT_PPP
    Ppp,
    /// DLT_IEEE802_11
    Ieee80211,
}

impl DataLinkType {
    /// Numeric link type as written in the pcap global header
    pub fn code(self) -> u32 {
        match self {
            DataLinkType::Ethernet => 1,
            DataLinkType::Ppp => 9,
            DataLinkType::Ieee80211 => 105,
        }
    }
}

/// Packet capture on one device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcapCapture {
    pub link: LinkId,
    pub device: DeviceKey,
    pub file_name: String,
    pub data_link: DataLinkType,
    pub promiscuous: bool,
}

/// Simulation-wide run settings
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunControl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sim_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<SimTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<u64>,
    pub log_components: BTreeMap<String, LogLevel>,
    pub pcap: Vec<PcapCapture>,
    pub flow_monitor: bool,
}

impl RunControl {
    pub fn enable_log_component(&mut self, component: &str, level: LogLevel) {
        let entry = self.log_components.entry(component.to_string()).or_default();
        *entry = *entry | level;
    }
}

/// Work to perform at a simulated time once the scenario runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TimelineEvent {
    PopulateGlobalRoutingTables,
    FlowMonitorReport,
    Stop,
}

impl fmt::Display for TimelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineEvent::PopulateGlobalRoutingTables => f.write_str("populate global routing tables"),
            TimelineEvent::FlowMonitorReport => f.write_str("flow monitor report"),
            TimelineEvent::Stop => f.write_str("stop"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledEvent {
    pub at: SimTime,
    pub event: TimelineEvent,
}

/// Events scheduled during the build; fired in time order, ties in scheduling order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    events: Vec<ScheduledEvent>,
}

impl Timeline {
    pub fn schedule(&mut self, at: SimTime, event: TimelineEvent) {
        self.events.push(ScheduledEvent { at, event });
    }

    /// Events in firing order
    pub fn in_order(&self) -> Vec<&ScheduledEvent> {
        let mut ordered: Vec<_> = self.events.iter().collect();
        // sort_by_key is stable, so equal times keep scheduling order
        ordered.sort_by_key(|e| e.at);
        ordered
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

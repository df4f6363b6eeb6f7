//! Channels and network devices.

use super::{DeviceKey, LinkId};
use crate::utils::{DataRate, SimTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Link technology of a channel and its devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LinkKind {
    PointToPoint,
    Csma,
    Wifi,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::PointToPoint => f.write_str("p2p"),
            LinkKind::Csma => f.write_str("csma"),
            LinkKind::Wifi => f.write_str("wifi"),
        }
    }
}

/// The shared medium created for one link id
#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    pub link: LinkId,
    pub kind: LinkKind,
    /// Attached devices, in attachment order
    pub devices: Vec<DeviceKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<SimTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_rate: Option<DataRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi: Option<WifiChannel>,
}

impl Channel {
    pub fn new(link: LinkId, kind: LinkKind) -> Self {
        Self {
            link,
            kind,
            devices: Vec::new(),
            queue: None,
            delay: None,
            data_rate: None,
            wifi: None,
        }
    }
}

/// A network interface card installed on a node for one link
#[derive(Debug, Clone, Serialize)]
pub struct NetDevice {
    pub key: DeviceKey,
    pub kind: LinkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_rate: Option<DataRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi: Option<WifiDevice>,
}

impl NetDevice {
    pub fn new(key: DeviceKey, kind: LinkKind) -> Self {
        Self {
            key,
            kind,
            mtu: None,
            data_rate: None,
            wifi: None,
        }
    }
}

/// IEEE 802.11 standard of a Wi-Fi link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WifiStandard {
    #[serde(rename = "802.11a")]
    A,
    #[serde(rename = "802.11b")]
    B,
    #[serde(rename = "802.11g")]
    G,
    #[serde(rename = "802.11n")]
    N,
    #[serde(rename = "802.11ac")]
    Ac,
    #[serde(rename = "802.11ax")]
    Ax,
    #[serde(rename = "802.11be")]
    Be,
}

impl FromStr for WifiStandard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WIFI_STANDARD_80211a" => Ok(WifiStandard::A),
            "WIFI_STANDARD_80211b" => Ok(WifiStandard::B),
            "WIFI_STANDARD_80211g" => Ok(WifiStandard::G),
            "WIFI_STANDARD_80211n" => Ok(WifiStandard::N),
            "WIFI_STANDARD_80211ac" => Ok(WifiStandard::Ac),
            "WIFI_STANDARD_80211ax" => Ok(WifiStandard::Ax),
            "WIFI_STANDARD_80211be" => Ok(WifiStandard::Be),
            other => Err(format!("Unknown WifiStandard: {}", other)),
        }
    }
}

/// Channel implementation backing a Wi-Fi link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WifiChannelType {
    Yans,
    SingleModelSpectrum,
    MultiModelSpectrum,
}

impl FromStr for WifiChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns3::YansWifiChannel" => Ok(WifiChannelType::Yans),
            "ns3::SingleModelSpectrumChannel" => Ok(WifiChannelType::SingleModelSpectrum),
            "ns3::MultiModelSpectrumChannel" => Ok(WifiChannelType::MultiModelSpectrum),
            other => Err(format!("Unsupported Wifi channel type: {}", other)),
        }
    }
}

/// Propagation loss model in a Wi-Fi channel's loss chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropagationLoss {
    Friis,
    LogDistance,
    Nakagami,
}

impl FromStr for PropagationLoss {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns3::FriisPropagationLossModel" => Ok(PropagationLoss::Friis),
            "ns3::LogDistancePropagationLossModel" => Ok(PropagationLoss::LogDistance),
            "ns3::NakagamiPropagationLossModel" => Ok(PropagationLoss::Nakagami),
            other => Err(format!("Unsupported PropagationLossModel: {}", other)),
        }
    }
}

/// Rate control for a Wi-Fi link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStationManager {
    #[serde(rename = "type")]
    pub manager_type: String,
    pub data_mode: String,
    pub control_mode: String,
}

/// Link-wide Wi-Fi settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WifiChannel {
    pub standard: WifiStandard,
    pub manager: RemoteStationManager,
    pub channel_type: WifiChannelType,
    pub propagation_delay: String,
    /// Loss models, chained in order
    pub propagation_loss: Vec<PropagationLoss>,
    pub error_rate_model: String,
}

/// MAC layer of one Wi-Fi device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiMac {
    #[serde(rename = "type")]
    pub mac_type: String,
    pub ssid: String,
}

/// PHY attributes of one Wi-Fi device; unknown keys are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiPhy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_settings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_power_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_power_end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_sensitivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cca_ed_threshold: Option<f64>,
}

/// Per-device Wi-Fi settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WifiDevice {
    pub mac: WifiMac,
    pub phy: WifiPhy,
}

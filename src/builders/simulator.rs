//! Simulator run control: name, duration, seeds, log components, packet
//! capture and flow monitoring.

use crate::context::BuildContext;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use crate::model::{DataLinkType, LinkId, LinkKind, LogLevel, PcapCapture, TimelineEvent};
use crate::utils::SimTime;
use log::{debug, info};
use serde::Deserialize;

/// A flow monitor report due exactly at the stop time would never fire,
/// so it is moved this far ahead of it.
const REPORT_BEFORE_STOP: SimTime = SimTime::from_nanos(100);

#[derive(Debug, Deserialize)]
struct LogComponent {
    component: String,
    level: String,
}

fn capture_settings(kind: LinkKind) -> (DataLinkType, bool) {
    match kind {
        LinkKind::PointToPoint => (DataLinkType::Ppp, true),
        LinkKind::Csma => (DataLinkType::Ethernet, false),
        LinkKind::Wifi => (DataLinkType::Ieee80211, false),
    }
}

pub fn build_simulator(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let sim_name = entry::required_str(entry, "simName")?.to_string();
    let duration: SimTime = entry::parse_required(entry, "duration")?;
    let seed: Option<u32> = entry::parse_optional(entry, "seed")?;
    let run: Option<u64> = entry::parse_optional(entry, "run")?;
    let logs: Vec<LogComponent> = entry::parse_optional(entry, "log")?.unwrap_or_default();
    let pcap_links: Vec<LinkId> = entry::parse_optional(entry, "pcapLinkId")?.unwrap_or_default();
    let report_times: Vec<SimTime> = entry::parse_optional(entry, "flowMonitorTimes")?.unwrap_or_default();

    let mut levels = Vec::with_capacity(logs.len());
    for log in logs {
        let level: LogLevel = log.level.parse().map_err(|e: String| BuildError::invalid("log.level", e))?;
        levels.push((log.component, level));
    }

    let mut reports = Vec::with_capacity(report_times.len());
    for at in report_times {
        if at > duration {
            return Err(BuildError::invalid(
                "flowMonitorTimes",
                format!("report at {} is after the simulation stops at {}", at, duration),
            ));
        }
        reports.push(if at == duration {
            duration.saturating_sub(REPORT_BEFORE_STOP)
        } else {
            at
        });
    }

    let network = ctx.network_mut();

    let mut captures = Vec::new();
    for link in pcap_links {
        let channel = network.channel(link)?;
        let (data_link, promiscuous) = capture_settings(channel.kind);
        for device in &channel.devices {
            captures.push(PcapCapture {
                link,
                device: *device,
                file_name: format!("{}-link{}-node{}.pcap", sim_name, link, device.node),
                data_link,
                promiscuous,
            });
        }
    }

    let control = network.run_control_mut();
    for (component, level) in levels {
        debug!("Log component {} enabled", component);
        control.enable_log_component(&component, level);
    }
    control.sim_name = Some(sim_name);
    control.stop_time = Some(duration);
    control.seed = seed;
    control.run = run;
    control.pcap.extend(captures);
    control.flow_monitor = !reports.is_empty();

    let timeline = network.timeline_mut();
    for at in reports {
        timeline.schedule(at, TimelineEvent::FlowMonitorReport);
    }
    timeline.schedule(duration, TimelineEvent::Stop);

    info!("Simulation stops at {}", duration);
    Ok(())
}

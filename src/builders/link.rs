//! Link builders: one channel per link id, one device per `netDevices` item.

use crate::context::BuildContext;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use crate::model::{
    Channel, DeviceKey, LinkId, LinkKind, NetDevice, NodeId, PropagationLoss, RemoteStationManager,
    WifiChannel, WifiChannelType, WifiDevice, WifiMac, WifiPhy, WifiStandard,
};
use crate::utils::{DataRate, SimTime};
use log::debug;
use serde::Deserialize;

const NET_DEVICES: &str = "netDevices";

#[derive(Debug, Default, Deserialize)]
struct QueueSettings {
    #[serde(rename = "type")]
    queue_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSettings {
    delay: Option<SimTime>,
    data_rate: Option<DataRate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceSettings {
    data_rate: Option<DataRate>,
    mtu: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WifiChannelSettings {
    #[serde(rename = "type")]
    channel_type: String,
    propagation_delay: String,
    propagation_loss: Vec<LossModel>,
}

#[derive(Debug, Deserialize)]
struct LossModel {
    #[serde(rename = "type")]
    model: String,
}

/// Node ids of the `netDevices` list, checked against the allowed count
fn device_nodes(
    entry: &Entry,
    kind: LinkKind,
    min: usize,
    max: Option<usize>,
) -> Result<Vec<NodeId>, BuildError> {
    let devices = entry::required_array(entry, NET_DEVICES)?;
    let count = devices.len();
    if count < min || max.is_some_and(|max| count > max) {
        let expected = match max {
            Some(max) if max == min => format!("exactly {}", min),
            Some(max) => format!("{} to {}", min, max),
            None => format!("at least {}", min),
        };
        return Err(BuildError::invalid(
            NET_DEVICES,
            format!("{} link needs {} devices, got {}", kind, expected, count),
        ));
    }
    devices.iter().map(entry::node_id).collect()
}

fn install_wired(
    entry: &Entry,
    ctx: &mut BuildContext<'_>,
    kind: LinkKind,
    nodes: Vec<NodeId>,
) -> Result<(), BuildError> {
    let link: LinkId = entry::link_id(entry)?;
    let queue: QueueSettings = entry::parse_optional(entry, "queue")?.unwrap_or_default();
    let channel_settings: ChannelSettings = entry::parse_optional(entry, "channel")?.unwrap_or_default();
    let device_settings: DeviceSettings = entry::parse_optional(entry, "device")?.unwrap_or_default();

    let mut channel = Channel::new(link, kind);
    channel.queue = queue.queue_type;
    channel.delay = channel_settings.delay;
    // CSMA rates belong to the shared channel, point-to-point rates to the devices
    if kind == LinkKind::Csma {
        channel.data_rate = channel_settings.data_rate;
    }

    let network = ctx.network_mut();
    network.add_channel(channel)?;
    for node in nodes {
        let mut device = NetDevice::new(DeviceKey::new(node, link), kind);
        device.mtu = device_settings.mtu;
        if kind == LinkKind::PointToPoint {
            device.data_rate = device_settings.data_rate;
        }
        network.attach_device(device)?;
    }
    debug!("Installed {} link {}", kind, link);
    Ok(())
}

/// Point-to-point link between exactly two nodes
pub fn build_p2p(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let nodes = device_nodes(entry, LinkKind::PointToPoint, 2, Some(2))?;
    install_wired(entry, ctx, LinkKind::PointToPoint, nodes)
}

/// Shared CSMA segment
pub fn build_csma(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let nodes = device_nodes(entry, LinkKind::Csma, 1, None)?;
    install_wired(entry, ctx, LinkKind::Csma, nodes)
}

/// Wi-Fi link: link-wide standard, rate control and channel, per-device MAC and PHY
pub fn build_wifi(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let link = entry::link_id(entry)?;

    let standard: WifiStandard = entry::required_str(entry, "wifiStandard")?
        .parse()
        .map_err(|e: String| BuildError::invalid("wifiStandard", e))?;
    let manager: RemoteStationManager = entry::parse_required(entry, "wifiManager")?;
    let settings: WifiChannelSettings = entry::parse_required(entry, "channel")?;
    let error_rate_model = entry::required_str(entry, "errorRateModel")?.to_string();

    let channel_type: WifiChannelType = settings
        .channel_type
        .parse()
        .map_err(|e: String| BuildError::invalid("channel.type", e))?;

    let mut propagation_loss = Vec::with_capacity(settings.propagation_loss.len());
    for loss in &settings.propagation_loss {
        let model: PropagationLoss = loss
            .model
            .parse()
            .map_err(|e: String| BuildError::invalid("channel.propagationLoss", e))?;
        if model == PropagationLoss::Nakagami && channel_type != WifiChannelType::Yans {
            return Err(BuildError::invalid(
                "channel.propagationLoss",
                format!("{} is only supported on ns3::YansWifiChannel", loss.model),
            ));
        }
        propagation_loss.push(model);
    }

    let mut devices = Vec::new();
    for item in entry::required_array(entry, NET_DEVICES)? {
        let node = entry::node_id(item)?;
        let mac: WifiMac = entry::parse_required(item, "wifiMac")?;
        let phy: WifiPhy = entry::parse_required(item, "wifiPhy")?;
        devices.push((node, WifiDevice { mac, phy }));
    }

    let mut channel = Channel::new(link, LinkKind::Wifi);
    channel.wifi = Some(WifiChannel {
        standard,
        manager,
        channel_type,
        propagation_delay: settings.propagation_delay,
        propagation_loss,
        error_rate_model,
    });

    let network = ctx.network_mut();
    network.add_channel(channel)?;
    for (node, wifi) in devices {
        let mut device = NetDevice::new(DeviceKey::new(node, link), LinkKind::Wifi);
        device.wifi = Some(wifi);
        network.attach_device(device)?;
    }
    debug!("Installed wifi link {}", link);
    Ok(())
}

//! Traffic applications.
//!
//! Every application entry carries `nodeId`, `applicationId` and optional
//! `startTime`/`stopTime`. Traffic sources address a remote node through
//! `socket.netDeviceId`: without a `linkId` the first address of the remote
//! node's interface 1 is used, with one the address of the interface bound
//! to that device.

use crate::context::BuildContext;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use crate::model::{Application, ApplicationKind, DeviceKey, LinkId, Network, NodeId};
use crate::utils::{DataRate, SimTime};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

const SOCKET: &str = "socket";

/// Interface used when the remote device is not named
const FIRST_INTERFACE: usize = 1;

const DEFAULT_ECHO_MAX_PACKETS: u32 = 100;
const DEFAULT_ECHO_PACKET_SIZE: u32 = 1024;
const DEFAULT_ONOFF_PACKET_SIZE: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SocketFamily {
    Ipv4,
    Ipv6,
}

#[derive(Debug, Deserialize)]
struct RemoteDevice {
    #[serde(rename = "nodeId")]
    node_id: NodeId,
    #[serde(rename = "linkId")]
    link_id: Option<LinkId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocketConfig {
    #[serde(rename = "type")]
    family: SocketFamily,
    port: u16,
    net_device_id: Option<RemoteDevice>,
}

#[derive(Debug, Deserialize)]
struct ListenSocket {
    port: u16,
}

impl SocketConfig {
    /// Address of the remote endpoint this socket sends to
    fn remote_address(&self, network: &Network) -> Result<SocketAddr, BuildError> {
        let remote = self
            .net_device_id
            .as_ref()
            .ok_or_else(|| BuildError::missing("socket.netDeviceId"))?;

        let ip = match self.family {
            SocketFamily::Ipv4 => {
                let interface = match remote.link_id {
                    Some(link) => network.ipv4_interface_for(DeviceKey::new(remote.node_id, link))?,
                    None => FIRST_INTERFACE,
                };
                IpAddr::V4(network.ipv4_address(remote.node_id, interface)?)
            }
            SocketFamily::Ipv6 => {
                let interface = match remote.link_id {
                    Some(link) => network.ipv6_interface_for(DeviceKey::new(remote.node_id, link))?,
                    None => FIRST_INTERFACE,
                };
                IpAddr::V6(network.ipv6_address(remote.node_id, interface)?)
            }
        };
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Any-address of the socket's family
    fn local_address(&self) -> SocketAddr {
        let ip = match self.family {
            SocketFamily::Ipv4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            SocketFamily::Ipv6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        SocketAddr::new(ip, self.port)
    }
}

fn install(entry: &Entry, ctx: &mut BuildContext<'_>, kind: ApplicationKind) -> Result<(), BuildError> {
    let start = entry::parse_optional::<SimTime>(entry, "startTime")?.unwrap_or(SimTime::ZERO);
    let stop = entry::parse_optional::<SimTime>(entry, "stopTime")?;
    if let Some(stop) = stop {
        if stop < start {
            return Err(BuildError::invalid(
                "stopTime",
                format!("stops at {} before starting at {}", stop, start),
            ));
        }
    }

    let app = Application {
        node: entry::node_id(entry)?,
        id: entry::required_u32(entry, "applicationId")?,
        start,
        stop,
        kind,
    };
    ctx.network_mut().add_application(app)?;
    Ok(())
}

pub fn build_udp_echo_client(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let socket: SocketConfig = entry::parse_required(entry, SOCKET)?;
    let remote = socket.remote_address(ctx.network())?;
    let kind = ApplicationKind::UdpEchoClient {
        remote,
        max_packets: entry::parse_optional(entry, "maxPackets")?.unwrap_or(DEFAULT_ECHO_MAX_PACKETS),
        interval: entry::parse_optional(entry, "interval")?.unwrap_or(SimTime::from_secs(1)),
        packet_size: entry::parse_optional(entry, "packetSize")?.unwrap_or(DEFAULT_ECHO_PACKET_SIZE),
    };
    install(entry, ctx, kind)
}

pub fn build_udp_echo_server(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let socket: ListenSocket = entry::parse_required(entry, SOCKET)?;
    install(entry, ctx, ApplicationKind::UdpEchoServer { port: socket.port })
}

pub fn build_on_off(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let socket: SocketConfig = entry::parse_required(entry, SOCKET)?;
    let remote = socket.remote_address(ctx.network())?;
    let data_rate: DataRate = entry::parse_required(entry, "dataRate")?;
    let kind = ApplicationKind::OnOff {
        remote,
        data_rate,
        packet_size: entry::parse_optional(entry, "packetSize")?.unwrap_or(DEFAULT_ONOFF_PACKET_SIZE),
    };
    install(entry, ctx, kind)
}

pub fn build_packet_sink(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let protocol = entry::required_str(entry, "protocol")?.to_string();
    let socket: SocketConfig = entry::parse_required(entry, SOCKET)?;
    let kind = ApplicationKind::PacketSink {
        protocol,
        local: socket.local_address(),
    };
    install(entry, ctx, kind)
}

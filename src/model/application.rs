//! Traffic applications installed on nodes.

use super::NodeId;
use crate::utils::{DataRate, SimTime};
use serde::Serialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Application {
    pub node: NodeId,
    /// Unique per node
    pub id: u32,
    pub start: SimTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<SimTime>,
    pub kind: ApplicationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ApplicationKind {
    UdpEchoClient {
        remote: SocketAddr,
        max_packets: u32,
        interval: SimTime,
        packet_size: u32,
    },
    UdpEchoServer {
        port: u16,
    },
    OnOff {
        remote: SocketAddr,
        data_rate: DataRate,
        packet_size: u32,
    },
    PacketSink {
        /// Socket factory, e.g. "ns3::UdpSocketFactory"
        protocol: String,
        local: SocketAddr,
    },
}

impl ApplicationKind {
    pub fn name(&self) -> &'static str {
        match self {
            ApplicationKind::UdpEchoClient { .. } => "UdpEchoClient",
            ApplicationKind::UdpEchoServer { .. } => "UdpEchoServer",
            ApplicationKind::OnOff { .. } => "OnOff",
            ApplicationKind::PacketSink { .. } => "PacketSink",
        }
    }

    /// Address this application sends to, if it is a traffic source
    pub fn remote(&self) -> Option<SocketAddr> {
        match self {
            ApplicationKind::UdpEchoClient { remote, .. } | ApplicationKind::OnOff { remote, .. } => {
                Some(*remote)
            }
            _ => None,
        }
    }
}

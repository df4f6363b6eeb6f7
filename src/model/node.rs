//! Nodes, their IP stacks, routing stacks and mobility.

use super::address::{Ipv4InterfaceAddress, Ipv6InterfaceAddress};
use super::{LinkId, NodeId};
use crate::utils::SimTime;
use serde::Serialize;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A simulated host, router or switch
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Links this node has a device on, in installation order
    pub devices: Vec<LinkId>,
    /// Links whose devices are bridged together on this node
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bridge: Vec<LinkId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internet: Option<InternetStack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobility: Option<Mobility>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            role: None,
            devices: Vec::new(),
            bridge: Vec::new(),
            internet: None,
            mobility: None,
        }
    }
}

/// One layer-3 interface. Interface 0 of each family is the loopback.
#[derive(Debug, Clone, Serialize)]
pub struct Interface<A> {
    /// Link of the device this interface is bound to; `None` for the loopback
    pub device: Option<LinkId>,
    pub addresses: Vec<A>,
    pub up: bool,
}

/// IPv4/IPv6 stack of a node
#[derive(Debug, Clone, Serialize)]
pub struct InternetStack {
    pub ipv4: Vec<Interface<Ipv4InterfaceAddress>>,
    pub ipv6: Vec<Interface<Ipv6InterfaceAddress>>,
    pub routing: RoutingStack,
}

impl InternetStack {
    pub fn new(routing: RoutingStack) -> Self {
        Self {
            ipv4: vec![Interface {
                device: None,
                addresses: vec![Ipv4InterfaceAddress {
                    local: Ipv4Addr::LOCALHOST,
                    prefix_len: 8,
                }],
                up: true,
            }],
            ipv6: vec![Interface {
                device: None,
                addresses: vec![Ipv6InterfaceAddress {
                    address: Ipv6Addr::LOCALHOST,
                    prefix_len: 128,
                }],
                up: true,
            }],
            routing,
        }
    }

    pub fn ipv4_interface_for(&self, link: LinkId) -> Option<usize> {
        self.ipv4.iter().position(|iface| iface.device == Some(link))
    }

    pub fn ipv6_interface_for(&self, link: LinkId) -> Option<usize> {
        self.ipv6.iter().position(|iface| iface.device == Some(link))
    }

    /// Interface bound to `link`, created (down, without addresses) if missing
    pub fn ensure_ipv4_interface(&mut self, link: LinkId) -> usize {
        self.ipv4_interface_for(link).unwrap_or_else(|| {
            self.ipv4.push(Interface {
                device: Some(link),
                addresses: Vec::new(),
                up: false,
            });
            self.ipv4.len() - 1
        })
    }

    pub fn ensure_ipv6_interface(&mut self, link: LinkId) -> usize {
        self.ipv6_interface_for(link).unwrap_or_else(|| {
            self.ipv6.push(Interface {
                device: Some(link),
                addresses: Vec::new(),
                up: false,
            });
            self.ipv6.len() - 1
        })
    }
}

/// How a node routes packets
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoutingStack {
    /// Stack installed, routing not assembled yet
    Unconfigured,
    /// Scenario-wide computed shortest paths
    Global,
    /// Explicit protocol lists, highest priority first
    List {
        ipv4: Vec<PrioritizedProtocol>,
        ipv6: Vec<PrioritizedProtocol>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrioritizedProtocol {
    pub priority: i32,
    pub protocol: RoutingProtocol,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingProtocol {
    Ipv4Static { routes: Vec<Ipv4Route> },
    Ipv6Static { routes: Vec<Ipv6Route> },
    Olsr(OlsrConfig),
}

impl RoutingProtocol {
    pub fn name(&self) -> &'static str {
        match self {
            RoutingProtocol::Ipv4Static { .. } => "ipv4-static",
            RoutingProtocol::Ipv6Static { .. } => "ipv6-static",
            RoutingProtocol::Olsr(_) => "olsr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ipv4Route {
    pub destination: Ipv4Addr,
    pub prefix_len: u8,
    pub next_hop: Ipv4Addr,
    /// Outgoing IPv4 interface index
    pub interface: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ipv6Route {
    pub destination: Ipv6Addr,
    pub prefix_len: u8,
    pub next_hop: Ipv6Addr,
    pub interface: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OlsrConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hello_interval: Option<SimTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tc_interval: Option<SimTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hna_interval: Option<SimTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub willingness: Option<u8>,
    /// Host network associations announced by this node
    pub hna_networks: Vec<HnaNetwork>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HnaNetwork {
    pub network: Ipv4Addr,
    pub prefix_len: u8,
}

/// Cartesian position in meters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Waypoint {
    pub time: SimTime,
    pub position: Vector3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MobilityKind {
    ConstantPosition,
    Waypoint,
}

/// Mobility model installed on a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mobility {
    pub kind: MobilityKind,
    pub position: Vector3,
    /// Non-decreasing in time
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub waypoints: Vec<Waypoint>,
}

//! Built-in builders.
//!
//! One function per (domain, type tag). Each reads the fields it needs from
//! its entry and mutates the scenario model through the build context.
//! [`register_default_builders`] installs all of them; embedding applications
//! can add or replace tags afterwards.

pub mod application;
pub mod config;
pub mod internet;
pub mod link;
pub mod mobility;
pub mod network;
pub mod node;
pub mod routing;
pub mod simulator;

use crate::domain::Domain;
use crate::model::{DeviceKey, LinkId, NodeId};
use crate::registry::{HandlerRegistry, DEFAULT_TAG};
use serde::Deserialize;

/// Reference to the device a node has on a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRef {
    pub node_id: NodeId,
    pub link_id: LinkId,
}

impl DeviceRef {
    pub fn key(self) -> DeviceKey {
        DeviceKey::new(self.node_id, self.link_id)
    }
}

pub fn register_default_builders(registry: &mut HandlerRegistry) {
    registry.register(Domain::Config, DEFAULT_TAG, config::build_config);

    registry.register(Domain::Node, DEFAULT_TAG, node::build_node);
    registry.register(Domain::Node, "switch", node::build_switch);
    for role in ["gateway", "router", "terminal", "adhoc"] {
        registry.register(Domain::Node, role, node::build_role);
    }

    registry.register(Domain::Link, "p2p", link::build_p2p);
    registry.register(Domain::Link, "csma", link::build_csma);
    registry.register(Domain::Link, "wifi", link::build_wifi);

    registry.register(Domain::Internet, DEFAULT_TAG, internet::build_internet);

    registry.register(Domain::Ipv4Network, DEFAULT_TAG, network::build_ipv4_network);
    registry.register(Domain::Ipv6Network, DEFAULT_TAG, network::build_ipv6_network);

    registry.register(Domain::Ipv4RoutingProtocol, "static", routing::build_ipv4_static);
    registry.register(Domain::Ipv6RoutingProtocol, "static", routing::build_ipv6_static);
    registry.register(Domain::Ipv4RoutingProtocol, "olsr", routing::build_olsr);

    registry.register(
        Domain::Mobility,
        "ConstantPositionMobilityModel",
        mobility::build_constant_position,
    );
    registry.register(Domain::Mobility, "WaypointMobilityModel", mobility::build_waypoint);

    registry.register(Domain::Application, "UdpEchoClient", application::build_udp_echo_client);
    registry.register(Domain::Application, "UdpEchoServer", application::build_udp_echo_server);
    registry.register(Domain::Application, "OnOff", application::build_on_off);
    registry.register(Domain::Application, "PacketSink", application::build_packet_sink);

    registry.register(Domain::Simulator, DEFAULT_TAG, simulator::build_simulator);
}

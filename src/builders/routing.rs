//! Routing protocol builders.
//!
//! These run inside a node's routing pass and append one protocol, with its
//! priority, to that node's accumulator. Routes name their outgoing interface
//! by link id, so addressing must already be in place.

use crate::context::BuildContext;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use crate::model::{DeviceKey, HnaNetwork, Ipv4Route, Ipv6Route, LinkId, OlsrConfig, RoutingProtocol};
use crate::utils::ip_utils::ipv4_prefix_len;
use crate::utils::SimTime;
use log::debug;
use serde::Deserialize;
use std::net::{Ipv4Addr, Ipv6Addr};

const PRIORITY: &str = "priority";
const ROUTES: &str = "routes";

/// Highest willingness an OLSR node can announce
const OLSR_WILL_ALWAYS: u8 = 7;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StaticIpv4Route {
    ipv4_address: Ipv4Addr,
    mask: String,
    next_hop: Ipv4Addr,
    next_link_id: LinkId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StaticIpv6Route {
    dest: Ipv6Addr,
    prefix_length: u8,
    next_hop: Ipv6Addr,
    next_link_id: LinkId,
}

#[derive(Debug, Deserialize)]
struct HnaEntry {
    network: Ipv4Addr,
    mask: String,
}

pub fn build_ipv4_static(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let priority: i32 = entry::parse_required(entry, PRIORITY)?;
    let node = ctx.routing_accumulator()?.node_id();
    let declared: Vec<StaticIpv4Route> = entry::parse_optional(entry, ROUTES)?.unwrap_or_default();

    let mut routes = Vec::with_capacity(declared.len());
    for route in declared {
        let prefix_len = ipv4_prefix_len(&route.mask).map_err(|e| BuildError::invalid("routes.mask", e))?;
        let interface = ctx
            .network()
            .ipv4_interface_for(DeviceKey::new(node, route.next_link_id))?;
        routes.push(Ipv4Route {
            destination: route.ipv4_address,
            prefix_len,
            next_hop: route.next_hop,
            interface,
        });
    }

    debug!("Node {}: IPv4 static routing, priority {}, {} route(s)", node, priority, routes.len());
    ctx.routing_accumulator()?
        .add_ipv4(priority, RoutingProtocol::Ipv4Static { routes });
    Ok(())
}

pub fn build_ipv6_static(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let priority: i32 = entry::parse_required(entry, PRIORITY)?;
    let node = ctx.routing_accumulator()?.node_id();
    let declared: Vec<StaticIpv6Route> = entry::parse_optional(entry, ROUTES)?.unwrap_or_default();

    let mut routes = Vec::with_capacity(declared.len());
    for route in declared {
        if route.prefix_length > 128 {
            return Err(BuildError::invalid("routes.prefixLength", "must be at most 128"));
        }
        let interface = ctx
            .network()
            .ipv6_interface_for(DeviceKey::new(node, route.next_link_id))?;
        routes.push(Ipv6Route {
            destination: route.dest,
            prefix_len: route.prefix_length,
            next_hop: route.next_hop,
            interface,
        });
    }

    debug!("Node {}: IPv6 static routing, priority {}, {} route(s)", node, priority, routes.len());
    ctx.routing_accumulator()?
        .add_ipv6(priority, RoutingProtocol::Ipv6Static { routes });
    Ok(())
}

pub fn build_olsr(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let priority: i32 = entry::parse_required(entry, PRIORITY)?;
    let node = ctx.routing_accumulator()?.node_id();

    let willingness: Option<u8> = entry::parse_optional(entry, "willingness")?;
    if willingness.is_some_and(|w| w > OLSR_WILL_ALWAYS) {
        return Err(BuildError::invalid(
            "willingness",
            format!("must be between 0 and {}", OLSR_WILL_ALWAYS),
        ));
    }

    let hna: Vec<HnaEntry> = entry::parse_optional(entry, "hnaNetworks")?.unwrap_or_default();
    let hna_networks = hna
        .into_iter()
        .map(|h| {
            let prefix_len = ipv4_prefix_len(&h.mask).map_err(|e| BuildError::invalid("hnaNetworks.mask", e))?;
            Ok(HnaNetwork {
                network: h.network,
                prefix_len,
            })
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let config = OlsrConfig {
        hello_interval: entry::parse_optional::<SimTime>(entry, "helloInterval")?,
        tc_interval: entry::parse_optional::<SimTime>(entry, "tcInterval")?,
        hna_interval: entry::parse_optional::<SimTime>(entry, "hnaInterval")?,
        willingness,
        hna_networks,
    };

    debug!("Node {}: OLSR, priority {}", node, priority);
    ctx.routing_accumulator()?.add_ipv4(priority, RoutingProtocol::Olsr(config));
    Ok(())
}

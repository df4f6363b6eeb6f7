//! IPv4 and IPv6 address assignment.
//!
//! Each entry describes one subnet. Devices listed under `fixed` get the
//! address given for them, devices listed under `netDeviceIds` get the next
//! free address of the subnet in list order. Both lists are optional.

use super::DeviceRef;
use crate::context::BuildContext;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use crate::model::{Ipv4AddressAllocator, Ipv4InterfaceAddress, Ipv6AddressAllocator, Ipv6InterfaceAddress};
use crate::utils::ip_utils::{ipv4_network, ipv4_prefix_len, ipv6_network};
use log::debug;
use serde::Deserialize;
use std::net::{Ipv4Addr, Ipv6Addr};

const FIXED: &str = "fixed";
const NET_DEVICE_IDS: &str = "netDeviceIds";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixedIpv4 {
    net_device_id: DeviceRef,
    ipv4_address: Ipv4Addr,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixedIpv6 {
    net_device_id: DeviceRef,
    ipv6_address: Ipv6Addr,
}

pub fn build_ipv4_network(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let subnet: Ipv4Addr = entry::parse_required(entry, "subnet")?;
    let mask = entry::required_str(entry, "mask")?;
    let prefix_len = ipv4_prefix_len(mask).map_err(|e| BuildError::invalid("mask", e))?;
    let base: Ipv4Addr = entry::parse_required(entry, "base")?;

    let fixed: Vec<FixedIpv4> = entry::parse_optional(entry, FIXED)?.unwrap_or_default();
    let sequential: Vec<DeviceRef> = entry::parse_optional(entry, NET_DEVICE_IDS)?.unwrap_or_default();

    for f in &fixed {
        if ipv4_network(f.ipv4_address, prefix_len) != ipv4_network(subnet, prefix_len) {
            return Err(BuildError::invalid(
                "fixed.ipv4Address",
                format!("{} is outside {}/{}", f.ipv4_address, subnet, prefix_len),
            ));
        }
    }

    let network = ctx.network_mut();
    for f in fixed {
        let address = Ipv4InterfaceAddress {
            local: f.ipv4_address,
            prefix_len,
        };
        network.add_ipv4_address(f.net_device_id.key(), address)?;
    }

    let mut allocator = Ipv4AddressAllocator::new(subnet, prefix_len, base);
    for device in sequential {
        let address = allocator.allocate()?;
        network.add_ipv4_address(device.key(), address)?;
    }
    debug!("Assigned IPv4 subnet {}/{}", subnet, prefix_len);
    Ok(())
}

pub fn build_ipv6_network(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let subnet: Ipv6Addr = entry::parse_required(entry, "subnet")?;
    let prefix_len: u8 = entry::parse_required(entry, "prefixLength")?;
    if prefix_len > 128 {
        return Err(BuildError::invalid("prefixLength", "must be at most 128"));
    }

    let fixed: Vec<FixedIpv6> = entry::parse_optional(entry, FIXED)?.unwrap_or_default();
    let sequential: Vec<DeviceRef> = entry::parse_optional(entry, NET_DEVICE_IDS)?.unwrap_or_default();

    for f in &fixed {
        if ipv6_network(f.ipv6_address, prefix_len) != ipv6_network(subnet, prefix_len) {
            return Err(BuildError::invalid(
                "fixed.ipv6Address",
                format!("{} is outside {}/{}", f.ipv6_address, subnet, prefix_len),
            ));
        }
    }

    let network = ctx.network_mut();
    for f in fixed {
        let address = Ipv6InterfaceAddress {
            address: f.ipv6_address,
            prefix_len,
        };
        network.add_ipv6_address(f.net_device_id.key(), address)?;
    }

    let mut allocator = Ipv6AddressAllocator::new(subnet, prefix_len);
    for device in sequential {
        let address = allocator.allocate()?;
        network.add_ipv6_address(device.key(), address)?;
    }
    debug!("Assigned IPv6 prefix {}/{}", subnet, prefix_len);
    Ok(())
}

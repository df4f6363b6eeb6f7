//! IP address registry and sequential allocators.
//!
//! The registry tracks every address assigned in a scenario so two devices
//! never end up with the same address. The allocators hand out consecutive
//! host addresses inside one subnet, starting from a configurable base.

use super::{DeviceKey, ModelError};
use crate::utils::ip_utils::{ipv4_mask_bits, ipv6_mask_bits};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// An IPv4 address bound to an interface, with its prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ipv4InterfaceAddress {
    pub local: Ipv4Addr,
    pub prefix_len: u8,
}

impl fmt::Display for Ipv4InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.local, self.prefix_len)
    }
}

/// An IPv6 address bound to an interface, with its prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ipv6InterfaceAddress {
    pub address: Ipv6Addr,
    pub prefix_len: u8,
}

impl fmt::Display for Ipv6InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

/// Scenario-wide registry of assigned addresses
#[derive(Debug, Default)]
pub struct AddressRegistry {
    /// Address -> device that owns it
    assigned: HashMap<IpAddr, DeviceKey>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `address` as owned by `owner`.
    /// Re-registering an address for the same device is accepted.
    pub fn register(&mut self, address: IpAddr, owner: DeviceKey) -> Result<(), ModelError> {
        match self.assigned.get(&address) {
            Some(existing) if *existing != owner => Err(ModelError::DuplicateAddress {
                address,
                owner: *existing,
            }),
            Some(_) => Ok(()),
            None => {
                self.assigned.insert(address, owner);
                Ok(())
            }
        }
    }

    /// Get the device that owns a given address
    pub fn owner_of(&self, address: &IpAddr) -> Option<DeviceKey> {
        self.assigned.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Hands out consecutive IPv4 host addresses inside one subnet
#[derive(Debug, Clone)]
pub struct Ipv4AddressAllocator {
    network: u32,
    prefix_len: u8,
    next_host: u32,
}

impl Ipv4AddressAllocator {
    /// `base` is the first host address; only its host bits are used.
    pub fn new(subnet: Ipv4Addr, prefix_len: u8, base: Ipv4Addr) -> Self {
        let mask = ipv4_mask_bits(prefix_len);
        Self {
            network: u32::from(subnet) & mask,
            prefix_len,
            next_host: u32::from(base) & !mask,
        }
    }

    /// Next free address in the subnet; the network and broadcast
    /// addresses are never handed out.
    pub fn allocate(&mut self) -> Result<Ipv4InterfaceAddress, ModelError> {
        let host_bits = 32 - u32::from(self.prefix_len);
        let broadcast = if host_bits >= 32 { u32::MAX } else { (1u32 << host_bits) - 1 };
        if self.next_host == 0 {
            self.next_host = 1;
        }
        if host_bits < 2 || self.next_host >= broadcast {
            return Err(ModelError::AddressPoolExhausted {
                network: format!("{}/{}", Ipv4Addr::from(self.network), self.prefix_len),
            });
        }
        let local = Ipv4Addr::from(self.network | self.next_host);
        self.next_host += 1;
        Ok(Ipv4InterfaceAddress {
            local,
            prefix_len: self.prefix_len,
        })
    }
}

/// Hands out consecutive IPv6 host addresses inside one prefix, starting at `::1`
#[derive(Debug, Clone)]
pub struct Ipv6AddressAllocator {
    network: u128,
    prefix_len: u8,
    next_host: u128,
}

impl Ipv6AddressAllocator {
    pub fn new(subnet: Ipv6Addr, prefix_len: u8) -> Self {
        Self {
            network: u128::from(subnet) & ipv6_mask_bits(prefix_len),
            prefix_len,
            next_host: 1,
        }
    }

    pub fn allocate(&mut self) -> Result<Ipv6InterfaceAddress, ModelError> {
        let host_bits = 128 - u32::from(self.prefix_len);
        let exhausted = host_bits == 0 || (host_bits < 128 && self.next_host >> host_bits != 0);
        if exhausted {
            return Err(ModelError::AddressPoolExhausted {
                network: format!("{}/{}", Ipv6Addr::from(self.network), self.prefix_len),
            });
        }
        let address = Ipv6Addr::from(self.network | self.next_host);
        self.next_host += 1;
        Ok(Ipv6InterfaceAddress {
            address,
            prefix_len: self.prefix_len,
        })
    }
}

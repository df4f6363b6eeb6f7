//! IP utility functions for subnet arithmetic

use std::net::{Ipv4Addr, Ipv6Addr};

/// Convert a dotted IPv4 mask ("255.255.255.0") or a "/24" prefix into a prefix length.
/// Rejects non-contiguous masks.
pub fn ipv4_prefix_len(mask: &str) -> Result<u8, String> {
    let mask = mask.trim();
    if let Some(len) = mask.strip_prefix('/') {
        return match len.parse::<u8>() {
            Ok(len) if len <= 32 => Ok(len),
            _ => Err(format!("Invalid IPv4 prefix: {}", mask)),
        };
    }

    let addr: Ipv4Addr = mask
        .parse()
        .map_err(|_| format!("Invalid IPv4 mask: {}", mask))?;
    let bits = u32::from(addr);
    let len = bits.leading_ones();
    if bits.checked_shl(len).unwrap_or(0) != 0 {
        return Err(format!("Non-contiguous IPv4 mask: {}", mask));
    }
    Ok(len as u8)
}

/// Bit mask for an IPv4 prefix length
pub fn ipv4_mask_bits(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len.min(32)))
    }
}

/// Network part of an IPv4 address
pub fn ipv4_network(addr: Ipv4Addr, prefix_len: u8) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr) & ipv4_mask_bits(prefix_len))
}

/// Bit mask for an IPv6 prefix length
pub fn ipv6_mask_bits(prefix_len: u8) -> u128 {
    if prefix_len == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix_len.min(128)))
    }
}

/// Network part of an IPv6 address
pub fn ipv6_network(addr: Ipv6Addr, prefix_len: u8) -> Ipv6Addr {
    Ipv6Addr::from(u128::from(addr) & ipv6_mask_bits(prefix_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_prefix_len() {
        assert_eq!(ipv4_prefix_len("255.255.255.0"), Ok(24));
        assert_eq!(ipv4_prefix_len("255.255.0.0"), Ok(16));
        assert_eq!(ipv4_prefix_len("255.255.255.255"), Ok(32));
        assert_eq!(ipv4_prefix_len("0.0.0.0"), Ok(0));
        assert_eq!(ipv4_prefix_len("/30"), Ok(30));
        assert!(ipv4_prefix_len("255.0.255.0").is_err());
        assert!(ipv4_prefix_len("/33").is_err());
        assert!(ipv4_prefix_len("mask").is_err());
    }

    #[test]
    fn test_network_parts() {
        let addr: Ipv4Addr = "10.1.2.3".parse().unwrap();
        assert_eq!(ipv4_network(addr, 24), Ipv4Addr::new(10, 1, 2, 0));
        assert_eq!(ipv4_network(addr, 0), Ipv4Addr::UNSPECIFIED);

        let addr6: Ipv6Addr = "2001:db8:1:2::5".parse().unwrap();
        assert_eq!(ipv6_network(addr6, 64), "2001:db8:1:2::".parse::<Ipv6Addr>().unwrap());
    }
}

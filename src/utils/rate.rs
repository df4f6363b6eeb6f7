//! Data-rate parsing.
//!
//! Link and application documents express rates as strings such as
//! "5Mbps", "100kb/s" or "2MBps". Decimal prefixes are powers of 1000,
//! binary prefixes ("Ki", "Mi", "Gi") are powers of 1024, and a capital
//! "B" counts bytes instead of bits.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Error returned when a rate string cannot be parsed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid data rate: {0}")]
pub struct RateParseError(pub String);

/// A transmission rate in bits per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DataRate(u64);

impl DataRate {
    pub fn from_bps(bps: u64) -> Self {
        DataRate(bps)
    }

    pub fn bps(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

static RATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]*\.?[0-9]+)\s*([kKmMgG]i?)?(bps|b/s|Bps|B/s)$").expect("data rate pattern is valid")
});

impl FromStr for DataRate {
    type Err = RateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = RATE_PATTERN
            .captures(trimmed)
            .ok_or_else(|| RateParseError(trimmed.to_string()))?;

        let value: f64 = caps[1]
            .parse()
            .map_err(|_| RateParseError(trimmed.to_string()))?;

        let multiplier: f64 = match caps.get(2).map(|m| m.as_str()) {
            None => 1.0,
            Some("k") | Some("K") => 1e3,
            Some("m") | Some("M") => 1e6,
            Some("g") | Some("G") => 1e9,
            Some("ki") | Some("Ki") => 1024.0,
            Some("mi") | Some("Mi") => 1024.0 * 1024.0,
            Some("gi") | Some("Gi") => 1024.0 * 1024.0 * 1024.0,
            Some(_) => return Err(RateParseError(trimmed.to_string())),
        };

        let bits_per_unit = if caps[3].starts_with('B') { 8.0 } else { 1.0 };

        let bps = (value * multiplier * bits_per_unit).round();
        // u64::MAX as f64 rounds up to 2^64, which is already out of range
        if !bps.is_finite() || bps >= u64::MAX as f64 {
            return Err(RateParseError(trimmed.to_string()));
        }
        Ok(DataRate(bps as u64))
    }
}

impl<'de> Deserialize<'de> for DataRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_prefixes() {
        assert_eq!("500bps".parse(), Ok(DataRate::from_bps(500)));
        assert_eq!("5Mbps".parse(), Ok(DataRate::from_bps(5_000_000)));
        assert_eq!("100kb/s".parse(), Ok(DataRate::from_bps(100_000)));
        assert_eq!("1Gbps".parse(), Ok(DataRate::from_bps(1_000_000_000)));
        assert_eq!("1.5Mbps".parse(), Ok(DataRate::from_bps(1_500_000)));
    }

    #[test]
    fn test_bytes_and_binary_prefixes() {
        assert_eq!("2MBps".parse(), Ok(DataRate::from_bps(16_000_000)));
        assert_eq!("1Kibps".parse(), Ok(DataRate::from_bps(1024)));
        assert_eq!("1KiB/s".parse(), Ok(DataRate::from_bps(8192)));
    }

    #[test]
    fn test_invalid_rates() {
        assert!("".parse::<DataRate>().is_err());
        assert!("fast".parse::<DataRate>().is_err());
        assert!("5Tbps".parse::<DataRate>().is_err());
        assert!("5Mb".parse::<DataRate>().is_err());
    }

    #[test]
    fn test_out_of_range_rates() {
        assert!("99999999999999999999Gbps".parse::<DataRate>().is_err());
        assert!("20000000000GBps".parse::<DataRate>().is_err());
        assert_eq!("16Gbps".parse(), Ok(DataRate::from_bps(16_000_000_000)));
    }
}

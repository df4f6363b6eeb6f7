//! Simulated-time parsing utilities.
//!
//! Scenario documents express times as strings with a unit suffix
//! (e.g. "2s", "100ms", "1.5s"). This module turns them into a
//! nanosecond-resolution [`SimTime`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Error returned when a time string cannot be parsed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid time format: {0}")]
pub struct TimeParseError(pub String);

/// A point (or offset) on the simulated time axis, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        SimTime(nanos)
    }

    pub fn from_secs(secs: u64) -> Self {
        SimTime(secs.saturating_mul(NANOS_PER_SECOND))
    }

    /// Fractional seconds; negative and non-finite values are rejected
    pub fn try_from_secs_f64(secs: f64) -> Result<Self, TimeParseError> {
        scaled_nanos(secs, NANOS_PER_SECOND as f64).ok_or_else(|| TimeParseError(secs.to_string()))
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SECOND as f64
    }

    pub fn saturating_sub(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs_f64())
    }
}

impl FromStr for SimTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_sim_time(s)
    }
}

impl<'de> Deserialize<'de> for SimTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a time string (e.g. "5s", "100ms", "1.5min") into a [`SimTime`]
///
/// Supported units, longest suffix first:
/// - Days: "d"
/// - Hours: "h"
/// - Minutes: "min"
/// - Seconds: "s" (a bare number is also seconds)
/// - Milliseconds: "ms"
/// - Microseconds: "us"
/// - Nanoseconds: "ns"
///
/// # Examples
/// ```
/// use netscenario::utils::duration::{parse_sim_time, SimTime};
///
/// assert_eq!(parse_sim_time("2s"), Ok(SimTime::from_secs(2)));
/// assert_eq!(parse_sim_time("100ms"), Ok(SimTime::from_nanos(100_000_000)));
/// assert_eq!(parse_sim_time("1.5s"), Ok(SimTime::from_nanos(1_500_000_000)));
/// assert!(parse_sim_time("fast").is_err());
/// ```
pub fn parse_sim_time(time: &str) -> Result<SimTime, TimeParseError> {
    let time = time.trim();

    // Check longer suffixes before shorter ones ("ms" before "s", "min" before "s")
    let units: [(&str, f64); 7] = [
        ("min", 60.0 * NANOS_PER_SECOND as f64),
        ("ms", 1_000_000.0),
        ("us", 1_000.0),
        ("ns", 1.0),
        ("d", 86_400.0 * NANOS_PER_SECOND as f64),
        ("h", 3_600.0 * NANOS_PER_SECOND as f64),
        ("s", NANOS_PER_SECOND as f64),
    ];

    for (suffix, scale) in units {
        if let Some(num_str) = time.strip_suffix(suffix) {
            return to_nanos(num_str, scale).ok_or_else(|| TimeParseError(time.to_string()));
        }
    }

    // Only try raw seconds parsing if no unit suffix is found
    to_nanos(time, NANOS_PER_SECOND as f64).ok_or_else(|| TimeParseError(time.to_string()))
}

fn to_nanos(num_str: &str, scale: f64) -> Option<SimTime> {
    let num_str = num_str.trim();
    if num_str.is_empty() || !num_str.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value: f64 = num_str.parse().ok()?;
    scaled_nanos(value, scale)
}

/// `value * scale` as whole nanoseconds; `None` when negative, non-finite or
/// past the end of the time axis
fn scaled_nanos(value: f64, scale: f64) -> Option<SimTime> {
    let nanos = (value * scale).round();
    // u64::MAX as f64 rounds up to 2^64, which is already out of range
    if !nanos.is_finite() || nanos < 0.0 || nanos >= u64::MAX as f64 {
        return None;
    }
    Some(SimTime(nanos as u64))
}

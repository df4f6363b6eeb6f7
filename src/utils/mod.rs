//! Shared utilities: simulated time, data rates, IP subnet helpers.

pub mod duration;
pub mod ip_utils;
pub mod rate;

pub use duration::{parse_sim_time, SimTime, TimeParseError};
pub use rate::{DataRate, RateParseError};

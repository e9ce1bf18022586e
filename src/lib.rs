//! # Typed Fetch
//!
//! Typed HTTP JSON fetching with flexible ISO-8601 date decoding.
//!
//! ## Architecture
//!
//! - **fetch**: the fetch-validate-decode pipeline (transport seam, error
//!   taxonomy, lenient and strict entry points)
//! - **datetime**: two-format ISO-8601 timestamp parsing and serde adapters

pub mod datetime;
pub mod fetch;

pub use datetime::{parse_flexible, DateError};
pub use fetch::{FetchClient, FetchError, HttpTransport, RawResponse, Transport, TransportConfig};

/// Parse a clock-style duration string (`MM:SS` or `H:MM:SS`) into seconds.
///
/// Lenient by design: a component that is not a number counts as zero, and
/// any unsupported component count yields `0.0`. Never fails.
pub fn parse_duration(s: &str) -> f64 {
    let components: Vec<f64> = s
        .split(':')
        .map(|part| part.parse().unwrap_or(0.0))
        .collect();

    match components[..] {
        [minutes, seconds] => minutes * 60.0 + seconds,
        [hours, minutes, seconds] => hours * 3600.0 + minutes * 60.0 + seconds,
        _ => 0.0,
    }
}

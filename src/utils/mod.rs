//! Common utilities and helpers

use std::time::Duration;

pub mod logging;
pub mod path;

/// Utility functions for Reelcast
pub struct Utils;

impl Utils {
    /// Format a length as `H:MM:SS`
    pub fn format_length(length: Duration) -> String {
        let total_seconds = length.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    }

    /// Format an optional measurement with a unit, or `-` when unknown
    pub fn format_measure(value: Option<f64>, unit: &str) -> String {
        match value {
            Some(value) => format!("{} {}", value, unit),
            None => "-".to_string(),
        }
    }
}

//! Utility functions and helpers

pub mod address_parser;

pub use address_parser::{expand_ranges, AddressRange};

use std::time::Duration;

/// Logging utilities
pub struct Logger;

impl Logger {
    /// Initialize logger; `RUST_LOG` overrides the given default level
    pub fn init(level: log::LevelFilter) {
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .format_timestamp_secs()
            .init();
    }

    /// Log scan start
    pub fn log_scan_start(ranges: &[String], hosts: usize, workers: usize) {
        log::info!(
            "Starting scan of {} ({} hosts) across {} workers",
            ranges.join(", "),
            hosts,
            workers
        );
    }

    /// Log scan completion
    pub fn log_scan_complete(duration: Duration, devices: usize, hosts: usize) {
        log::info!(
            "Scan completed in {:.2}s - {} devices on {} hosts",
            duration.as_secs_f64(),
            devices,
            hosts
        );
    }
}

//! Error handling for the findilo scanner
//!
//! Only [`ScanError::InvalidRange`] and [`ScanError::Config`] are fatal. Every
//! network-level variant is contained within the host that produced it: the
//! scan engine logs it and moves on to the next address.

use std::net::Ipv4Addr;
use thiserror::Error;

/// Main error type for scanning operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("Probe of {0} timed out")]
    ProbeTimeout(Ipv4Addr),

    #[error("Probe of {host} refused: {reason}")]
    ProbeRefused { host: Ipv4Addr, reason: String },

    #[error("Metadata fetch from {host} failed: {reason}")]
    MetadataFetch { host: Ipv4Addr, reason: String },

    #[error("Metadata from {host} could not be parsed: {reason}")]
    MetadataParse { host: Ipv4Addr, reason: String },

    #[error("Name resolution for {host} failed: {reason}")]
    NameResolution { host: Ipv4Addr, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    pub fn invalid_range(range: &str, reason: impl ToString) -> Self {
        ScanError::InvalidRange {
            range: range.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidRange { .. } | ScanError::Config(_)
        )
    }
}

/// Result type alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

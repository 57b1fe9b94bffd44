//! findilo - discover HP iLO management controllers
//!
//! Expands CIDR ranges, probes the iLO management port on every address with a
//! pool of concurrent workers, identifies the controllers that answer and
//! returns them ordered by hardware generation.

pub mod config;
pub mod device;
pub mod error;
pub mod network;
pub mod output;
pub mod scanner;
pub mod utils;

// Re-export commonly used types
pub use config::ScanConfig;
pub use device::{DeviceRecord, Generation, HttpIdentifier, Identifier};
pub use error::{ScanError, ScanResult};
pub use network::{PortProber, TcpConnectProber};
pub use output::{ConsoleReporter, ProgressObserver, Reporter};
pub use scanner::engine::ScanEngine;
pub use utils::{expand_ranges, AddressRange};

pub type Result<T> = std::result::Result<T, ScanError>;

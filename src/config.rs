//! Configuration module for the findilo scanner

use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Management port answered by every iLO generation
pub const ILO_PORT: u16 = 17988;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "FINDILO_CONFIG";

/// Main configuration structure for scanning operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Port probed to decide whether a host is a management controller
    pub port: u16,

    /// Timeout for the TCP probe in milliseconds
    pub probe_timeout_ms: u64,

    /// Timeout for each HTTP/HTTPS request in milliseconds
    pub http_timeout_ms: u64,

    /// Number of concurrent workers the address list is split across
    pub workers: usize,

    /// Port of the plaintext endpoints (metadata and legacy name page)
    pub http_port: u16,

    /// Port of the TLS login-session endpoint
    pub https_port: u16,

    /// Report rendering
    pub output_format: OutputFormat,

    /// Draw a progress bar on stderr while scanning
    pub progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port: ILO_PORT,
            probe_timeout_ms: 250,
            http_timeout_ms: 5000,
            workers: 100,
            http_port: 80,
            https_port: 443,
            output_format: OutputFormat::Table,
            progress: true,
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the probed port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the probe timeout
    pub fn with_probe_timeout(mut self, timeout_ms: u64) -> Self {
        self.probe_timeout_ms = timeout_ms;
        self
    }

    /// Set the HTTP request timeout
    pub fn with_http_timeout(mut self, timeout_ms: u64) -> Self {
        self.http_timeout_ms = timeout_ms;
        self
    }

    /// Point the device-facing protocols at non-standard ports
    pub fn with_http_ports(mut self, http_port: u16, https_port: u16) -> Self {
        self.http_port = http_port;
        self.https_port = https_port;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Get probe timeout as Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::ScanError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| crate::ScanError::Config(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Location of the config file: `$FINDILO_CONFIG`, else `~/.findilo.toml`
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home_dir.join(".findilo.toml")
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load_default_config() -> Self {
        let path = Self::default_path();

        if path.exists() {
            match Self::from_toml_file(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring config file: {}", e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.workers == 0 {
            return Err(crate::ScanError::Config(
                "Worker count must be greater than 0".to_string(),
            ));
        }

        if self.probe_timeout_ms == 0 {
            return Err(crate::ScanError::Config(
                "Probe timeout must be greater than 0".to_string(),
            ));
        }

        if self.http_timeout_ms == 0 {
            return Err(crate::ScanError::Config(
                "HTTP timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

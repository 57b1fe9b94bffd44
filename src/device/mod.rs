//! Device identification
//!
//! A reachable host is identified in two steps. The metadata document is
//! fetched first; if that fails the host is dropped. The names are then looked
//! up with the protocol matching the hardware generation, and a failure there
//! only leaves the name fields blank.

pub mod names;
pub mod rimp;

pub use names::{scrape_legacy_names, Generation, LoginSession};
pub use rimp::Rimp;

use crate::config::ScanConfig;
use crate::{Result, ScanError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Placeholder for fields the device did not report
pub const NOT_AVAILABLE: &str = "N/A";

/// Path of the metadata document
pub const METADATA_PATH: &str = "/xmldata?item=all";

/// Everything known about one management controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub address: Ipv4Addr,
    pub hardware_revision: String,
    pub model: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub server_name: String,
    pub device_name: String,
}

impl DeviceRecord {
    /// Fill in the two name fields
    pub fn with_names(mut self, server_name: String, device_name: String) -> Self {
        self.server_name = server_name;
        self.device_name = device_name;
        self
    }

    pub fn generation(&self) -> Generation {
        Generation::classify(&self.hardware_revision)
    }
}

/// Turns a reachable host into a [`DeviceRecord`]
#[async_trait]
pub trait Identifier: Send + Sync {
    /// Fails only when the metadata step fails
    async fn identify(&self, host: Ipv4Addr) -> Result<DeviceRecord>;
}

/// Identifier speaking the controllers' HTTP and HTTPS endpoints
#[derive(Debug, Clone)]
pub struct HttpIdentifier {
    plain: reqwest::Client,
    secure: reqwest::Client,
    http_port: u16,
    https_port: u16,
}

impl HttpIdentifier {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let timeout = config.http_timeout();

        let plain = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ScanError::Config(format!("HTTP client: {}", e)))?;

        // Controllers ship self-signed certificates
        let secure = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ScanError::Config(format!("HTTPS client: {}", e)))?;

        Ok(Self {
            plain,
            secure,
            http_port: config.http_port,
            https_port: config.https_port,
        })
    }

    fn plain_url(&self, host: Ipv4Addr, path: &str) -> String {
        format!("http://{}:{}{}", host, self.http_port, path)
    }

    fn secure_url(&self, host: Ipv4Addr, path: &str) -> String {
        format!("https://{}:{}{}", host, self.https_port, path)
    }

    /// Step A: fetch and parse the metadata document
    pub async fn fetch_metadata(&self, host: Ipv4Addr) -> Result<DeviceRecord> {
        let fetch_error = |e: reqwest::Error| ScanError::MetadataFetch {
            host,
            reason: e.to_string(),
        };

        let body = self
            .plain
            .get(self.plain_url(host, METADATA_PATH))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(fetch_error)?
            .text()
            .await
            .map_err(fetch_error)?;

        let doc = Rimp::parse(&body).map_err(|reason| ScanError::MetadataParse { host, reason })?;
        Ok(doc.into_record(host))
    }

    /// Step B for generation 3 to 5: the JSON login-session endpoint
    pub async fn fetch_session_names(&self, host: Ipv4Addr) -> Result<(String, String)> {
        let name_error = |e: reqwest::Error| ScanError::NameResolution {
            host,
            reason: e.to_string(),
        };

        let session: LoginSession = self
            .secure
            .get(self.secure_url(host, names::LOGIN_SESSION_PATH))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(name_error)?
            .json()
            .await
            .map_err(name_error)?;

        Ok((session.server_name, session.cn))
    }

    /// Step B for everything else: scrape the login page
    pub async fn fetch_legacy_names(&self, host: Ipv4Addr) -> Result<(String, String)> {
        let name_error = |e: reqwest::Error| ScanError::NameResolution {
            host,
            reason: e.to_string(),
        };

        let markup = self
            .plain
            .get(self.plain_url(host, "/"))
            .send()
            .await
            .map_err(name_error)?
            .text()
            .await
            .map_err(name_error)?;

        Ok(scrape_legacy_names(&markup))
    }
}

#[async_trait]
impl Identifier for HttpIdentifier {
    async fn identify(&self, host: Ipv4Addr) -> Result<DeviceRecord> {
        let record = self.fetch_metadata(host).await?;

        let names = match record.generation() {
            Generation::Modern(_) => self.fetch_session_names(host).await,
            Generation::Legacy => self.fetch_legacy_names(host).await,
        };

        match names {
            Ok((server_name, device_name)) => Ok(record.with_names(server_name, device_name)),
            Err(e) => {
                log::debug!("{}", e);
                Ok(record)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hw: &str) -> DeviceRecord {
        DeviceRecord {
            address: Ipv4Addr::new(10, 0, 0, 1),
            hardware_revision: hw.to_string(),
            model: NOT_AVAILABLE.to_string(),
            firmware_version: NOT_AVAILABLE.to_string(),
            serial_number: String::new(),
            server_name: String::new(),
            device_name: String::new(),
        }
    }

    #[test]
    fn test_with_names_only_touches_names() {
        let before = record("iLO 2");
        let after = before.clone().with_names("srv".into(), "ilo-srv".into());
        assert_eq!(after.server_name, "srv");
        assert_eq!(after.device_name, "ilo-srv");
        assert_eq!(after.hardware_revision, before.hardware_revision);
        assert_eq!(after.address, before.address);
    }

    #[test]
    fn test_record_generation() {
        assert!(record("iLO 5").generation().is_modern());
        assert_eq!(record(NOT_AVAILABLE).generation(), Generation::Legacy);
    }

    #[test]
    fn test_urls_use_configured_ports() {
        let config = ScanConfig::default().with_http_ports(8080, 8443);
        let identifier = HttpIdentifier::new(&config).unwrap();
        let host = Ipv4Addr::new(10, 1, 1, 1);
        assert_eq!(
            identifier.plain_url(host, METADATA_PATH),
            "http://10.1.1.1:8080/xmldata?item=all"
        );
        assert_eq!(
            identifier.secure_url(host, names::LOGIN_SESSION_PATH),
            "https://10.1.1.1:8443/json/login_session?null"
        );
    }

    #[tokio::test]
    async fn test_unreachable_metadata_is_fetch_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = ScanConfig::default()
            .with_http_ports(port, port)
            .with_http_timeout(500);
        let identifier = HttpIdentifier::new(&config).unwrap();

        let err = identifier.identify(Ipv4Addr::LOCALHOST).await.unwrap_err();
        assert!(matches!(err, ScanError::MetadataFetch { .. }));
    }
}

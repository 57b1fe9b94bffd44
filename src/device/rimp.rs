//! The `RIMP` metadata document served at `/xmldata?item=all`
//!
//! Only four leaves are read; everything else in the document is skipped.
//!
//! ```xml
//! <RIMP>
//!   <HSI><SBSN>CZ1234567 </SBSN><SPN>ProLiant DL380 Gen9</SPN></HSI>
//!   <MP><PN>Integrated Lights-Out 4 (iLO 4)</PN><FWRI>2.55</FWRI></MP>
//! </RIMP>
//! ```

use super::{DeviceRecord, NOT_AVAILABLE};
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::Deserialize;
use std::net::Ipv4Addr;

const ROOT_ELEMENT: &[u8] = b"RIMP";

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Rimp {
    #[serde(rename = "HSI", default)]
    pub hsi: HostSystemInfo,
    #[serde(rename = "MP", default)]
    pub mp: ManagementProcessor,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct HostSystemInfo {
    /// Server serial number
    #[serde(rename = "SBSN", default)]
    pub serial: String,
    /// Server product name
    #[serde(rename = "SPN", default)]
    pub product_name: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ManagementProcessor {
    /// Controller product name, e.g. `Integrated Lights-Out 3 (iLO 3)`
    #[serde(rename = "PN", default)]
    pub product_name: String,
    #[serde(rename = "FWRI", default)]
    pub firmware: String,
    #[serde(rename = "HWRI", default)]
    pub hardware: String,
}

impl Rimp {
    /// Parse a metadata document. Anything whose root is not `<RIMP>` is rejected.
    pub fn parse(body: &str) -> Result<Self, String> {
        match root_element(body) {
            Some(name) if name == ROOT_ELEMENT => {}
            Some(name) => {
                return Err(format!(
                    "expected element <RIMP>, found <{}>",
                    String::from_utf8_lossy(&name)
                ))
            }
            None => return Err("document has no root element".to_string()),
        }

        quick_xml::de::from_str(body).map_err(|e| e.to_string())
    }

    /// The parenthesised part of the controller name: `"... (iLO 4)"` gives `"iLO 4"`.
    pub fn hardware_revision(&self) -> String {
        lazy_static! {
            static ref REVISION: Regex = Regex::new(r"\((.*)\)").unwrap();
        }

        REVISION
            .captures(&self.mp.product_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|rev| !rev.is_empty())
            .map_or_else(|| NOT_AVAILABLE.to_string(), str::to_string)
    }

    pub fn model(&self) -> String {
        or_not_available(&self.hsi.product_name)
    }

    pub fn firmware_version(&self) -> String {
        or_not_available(&self.mp.firmware)
    }

    pub fn serial_number(&self) -> String {
        self.hsi.serial.trim().to_string()
    }

    /// Build the record for `host`; the name fields start out empty.
    pub fn into_record(self, host: Ipv4Addr) -> DeviceRecord {
        DeviceRecord {
            address: host,
            hardware_revision: self.hardware_revision(),
            model: self.model(),
            firmware_version: self.firmware_version(),
            serial_number: self.serial_number(),
            server_name: String::new(),
            device_name: String::new(),
        }
    }
}

fn or_not_available(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Name of the first element in `body`, skipping the prolog
fn root_element(body: &str) -> Option<Vec<u8>> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return Some(e.name().as_ref().to_vec()),
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

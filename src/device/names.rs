//! Server and controller name lookup
//!
//! Generation 3 to 5 controllers expose a JSON login-session endpoint over
//! TLS. Older or unrecognised controllers only serve a login page, and the
//! names are scraped out of its markup.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

/// Path of the JSON endpoint on modern controllers
pub const LOGIN_SESSION_PATH: &str = "/json/login_session?null";

/// Hardware generation, as far as the name protocol is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// iLO 3, 4 or 5
    Modern(u8),
    Legacy,
}

impl Generation {
    /// Classify a hardware revision such as `"iLO 4"`.
    ///
    /// The marker may appear anywhere in the string.
    pub fn classify(hardware_revision: &str) -> Self {
        lazy_static! {
            static ref MODERN: Regex = Regex::new(r"iLO (3|4|5)").unwrap();
        }

        MODERN
            .captures(hardware_revision)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .map_or(Generation::Legacy, Generation::Modern)
    }

    pub fn is_modern(&self) -> bool {
        matches!(self, Generation::Modern(_))
    }
}

/// Body of `/json/login_session?null`
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginSession {
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub cn: String,
}

/// Names scraped from a legacy login page.
///
/// Not an HTML parser: it looks for the literal `serverName="..."` and
/// `nicName="..."` attributes and keeps capture group 1 of the first match.
/// Values are limited to ASCII letters, digits, `_` and `-`. A missing
/// attribute yields an empty string.
pub fn scrape_legacy_names(markup: &str) -> (String, String) {
    lazy_static! {
        static ref SERVER_NAME: Regex = Regex::new(r#"serverName="([A-Za-z0-9_-]+)""#).unwrap();
        static ref NIC_NAME: Regex = Regex::new(r#"nicName="([A-Za-z0-9_-]+)""#).unwrap();
    }

    (
        first_capture(&SERVER_NAME, markup),
        first_capture(&NIC_NAME, markup),
    )
}

fn first_capture(pattern: &Regex, haystack: &str) -> String {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

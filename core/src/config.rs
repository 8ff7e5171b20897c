/*
 * config.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Segnalibro, a small URL-to-content fetcher.
 *
 * Segnalibro is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Segnalibro is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Segnalibro.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Fetch configuration: defaults, plus optional overrides from ~/.segnalibro/config.xml.
//! All XML reading uses the quick_xml reader.
//!
//! ```xml
//! <config>
//!   <http-version>1.1</http-version>
//!   <keep-alive>true</keep-alive>
//!   <user-agent>Segnalibro/0.1</user-agent>
//!   <connect-timeout>15</connect-timeout>
//!   <read-timeout>30</read-timeout>
//!   <connection-lifetime>119</connection-lifetime>
//!   <default-max-age>5</default-max-age>
//!   <max-redirects>20</max-redirects>
//! </config>
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;

use crate::protocol::http::HttpVersion;

/// Seconds a pooled connection may be reused after it was opened.
pub const CONNECTION_LIFETIME_SECS: u64 = 119;
/// Cache lifetime when a response has Cache-Control but no max-age.
pub const DEFAULT_MAX_AGE_SECS: u64 = 5;
pub const MAX_REDIRECTS: u32 = 20;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Io(#[from] io::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("invalid value for <{element}>: {value:?}")]
    InvalidValue { element: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub http_version: HttpVersion,
    /// Send `Connection: keep-alive` so the pool can reuse sockets.
    pub keep_alive: bool,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub connection_lifetime_secs: u64,
    pub default_max_age_secs: u64,
    pub max_redirects: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            http_version: HttpVersion::Http11,
            keep_alive: true,
            user_agent: concat!("Segnalibro/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            connection_lifetime_secs: CONNECTION_LIFETIME_SECS,
            default_max_age_secs: DEFAULT_MAX_AGE_SECS,
            max_redirects: MAX_REDIRECTS,
        }
    }
}

/// Default config directory: ~/.segnalibro.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from).map(|h| h.join(".segnalibro"))
}

/// Default config file: ~/.segnalibro/config.xml.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join("config.xml"))
}

impl FetchConfig {
    /// Load from `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_xml(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse `<config>` XML over the defaults. Unknown elements are ignored.
    pub fn from_xml(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut element_name = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => return Err(ConfigError::Xml(e.to_string())),
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => {
                    element_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                }
                Ok(Event::Text(e)) => {
                    if element_name.is_empty() {
                        continue;
                    }
                    let text = e
                        .unescape()
                        .map_err(|e| ConfigError::Xml(e.to_string()))?
                        .trim()
                        .to_string();
                    config.apply(&element_name, &text)?;
                    element_name.clear();
                }
                Ok(Event::End(_)) => element_name.clear(),
                _ => {}
            }
            buf.clear();
        }
        Ok(config)
    }

    fn apply(&mut self, element: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            element: element.to_string(),
            value: value.to_string(),
        };
        let secs = || value.parse::<u64>().map_err(|_| invalid());
        match element {
            "http-version" => self.http_version = HttpVersion::from_label(value).ok_or_else(invalid)?,
            "keep-alive" => self.keep_alive = parse_bool(value).ok_or_else(invalid)?,
            "user-agent" => self.user_agent = value.to_string(),
            "connect-timeout" => self.connect_timeout = Duration::from_secs(secs()?),
            "read-timeout" => self.read_timeout = Duration::from_secs(secs()?),
            "connection-lifetime" => self.connection_lifetime_secs = secs()?,
            "default-max-age" => self.default_max_age_secs = secs()?,
            "max-redirects" => self.max_redirects = value.parse().map_err(|_| invalid())?,
            _ => {}
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = FetchConfig::default();
        assert_eq!(c.http_version, HttpVersion::Http11);
        assert!(c.keep_alive);
        assert_eq!(c.connection_lifetime_secs, 119);
        assert_eq!(c.default_max_age_secs, 5);
        assert_eq!(c.max_redirects, 20);
        assert!(c.user_agent.starts_with("Segnalibro/"));
    }

    #[test]
    fn xml_overrides() {
        let c = FetchConfig::from_xml(
            "<?xml version=\"1.0\"?>\n<config>\n  <http-version>1.0</http-version>\n  \
             <keep-alive>no</keep-alive>\n  <user-agent>Test &amp; Co</user-agent>\n  \
             <read-timeout>3</read-timeout>\n  <max-redirects>4</max-redirects>\n  \
             <something-else>ignored</something-else>\n</config>",
        )
        .unwrap();
        assert_eq!(c.http_version, HttpVersion::Http10);
        assert!(!c.keep_alive);
        assert_eq!(c.user_agent, "Test & Co");
        assert_eq!(c.read_timeout, Duration::from_secs(3));
        assert_eq!(c.max_redirects, 4);
        assert_eq!(c.connection_lifetime_secs, 119);
    }

    #[test]
    fn bad_value_is_an_error() {
        let err = FetchConfig::from_xml("<config><http-version>2</http-version></config>")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = FetchConfig::load(&dir.path().join("config.xml")).unwrap();
        assert_eq!(c, FetchConfig::default());
    }
}

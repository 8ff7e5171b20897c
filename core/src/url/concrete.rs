/*
 * concrete.rs
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

//! Scheme-refined URLs, ready for handler dispatch.

use std::fmt;

use super::data::DataUrl;
use super::Url;
use crate::error::UrlParseError;

/// Closed set of schemes this crate can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    File,
    Data,
    About,
    ViewSource,
}

impl Scheme {
    /// Case-insensitive lookup; `None` for schemes without a handler.
    pub fn from_name(name: &str) -> Option<Scheme> {
        let scheme = match name.to_ascii_lowercase().as_str() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            "file" => Scheme::File,
            "data" => Scheme::Data,
            "about" => Scheme::About,
            "view-source" => Scheme::ViewSource,
            _ => return None,
        };
        Some(scheme)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::File => "file",
            Scheme::Data => "data",
            Scheme::About => "about",
            Scheme::ViewSource => "view-source",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpScheme {
    Http,
    Https,
}

impl HttpScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpScheme::Http => "http",
            HttpScheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            HttpScheme::Http => 80,
            HttpScheme::Https => 443,
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, HttpScheme::Https)
    }
}

/// `http:` or `https:` URL. `host` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFamilyUrl {
    pub scheme: HttpScheme,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl HttpFamilyUrl {
    pub fn from_url(url: &Url) -> Result<Self, UrlParseError> {
        let scheme = match url.scheme().to_ascii_lowercase().as_str() {
            "http" => HttpScheme::Http,
            "https" => HttpScheme::Https,
            other => return Err(UrlParseError::UnsupportedScheme(other.to_string())),
        };
        let host = match url.host() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(UrlParseError::MissingHost),
        };
        // Path and query end up in the request line verbatim.
        let mut target_bytes = url.path().into_iter().chain(url.query()).flat_map(str::bytes);
        if target_bytes.any(|b| b <= b' ' || b == 0x7f) {
            return Err(UrlParseError::Invalid(url.to_string()));
        }
        Ok(Self {
            scheme,
            username: url.username().map(str::to_string),
            password: url.password().map(str::to_string),
            host,
            port: url.port(),
            path: url.path().map(str::to_string),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
        })
    }

    /// Explicit port, or 80/443.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.scheme.default_port())
    }

    /// Request target for the request line: path (default `/`) plus `?query`.
    pub fn request_target(&self) -> String {
        let mut target = self.path.clone().unwrap_or_else(|| "/".to_string());
        if let Some(q) = &self.query {
            target.push('?');
            target.push_str(q);
        }
        target
    }

    /// Value for the `Host` header; the port is only included when it is not the default.
    pub fn host_header(&self) -> String {
        match self.port {
            Some(p) if p != self.scheme.default_port() => format!("{}:{}", self.host, p),
            _ => self.host.clone(),
        }
    }

    /// Same scheme and authority, different path; query and fragment dropped.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            query: None,
            fragment: None,
            ..self.clone()
        }
    }

    pub fn to_url(&self) -> Url {
        Url::from_parts(
            self.scheme.as_str(),
            self.username.clone(),
            self.password.clone(),
            Some(self.host.clone()),
            self.port,
            self.path.clone(),
            self.query.clone(),
            self.fragment.clone(),
        )
    }
}

impl fmt::Display for HttpFamilyUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_url().fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUrl {
    pub host: String,
    pub path: Option<String>,
}

impl FileUrl {
    pub fn to_url(&self) -> Url {
        Url::from_parts(
            "file",
            None,
            None,
            Some(self.host.clone()),
            None,
            self.path.clone(),
            None,
            None,
        )
    }
}

/// `about:` URL. Only `blank` is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AboutUrl {
    pub path: String,
}

/// `view-source:` wrapping the text of another URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSourceUrl {
    pub inner: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcreteUrl {
    HttpFamily(HttpFamilyUrl),
    File(FileUrl),
    Data(DataUrl),
    About(AboutUrl),
    ViewSource(ViewSourceUrl),
}

impl ConcreteUrl {
    pub fn scheme(&self) -> Scheme {
        match self {
            ConcreteUrl::HttpFamily(u) => match u.scheme {
                HttpScheme::Http => Scheme::Http,
                HttpScheme::Https => Scheme::Https,
            },
            ConcreteUrl::File(_) => Scheme::File,
            ConcreteUrl::Data(_) => Scheme::Data,
            ConcreteUrl::About(_) => Scheme::About,
            ConcreteUrl::ViewSource(_) => Scheme::ViewSource,
        }
    }

    /// Rebuild a generic URL for display or redirect composition.
    pub fn to_url(&self) -> Url {
        let opaque = |scheme: &str, path: String| {
            let path = if path.is_empty() { None } else { Some(path) };
            Url::from_parts(scheme, None, None, None, None, path, None, None)
        };
        match self {
            ConcreteUrl::HttpFamily(u) => u.to_url(),
            ConcreteUrl::File(u) => u.to_url(),
            ConcreteUrl::Data(u) => opaque("data", u.to_path()),
            ConcreteUrl::About(u) => opaque("about", u.path.clone()),
            ConcreteUrl::ViewSource(u) => match Url::parse(&format!("view-source:{}", u.inner)) {
                Ok(url) => url,
                Err(_) => opaque("view-source", u.inner.clone()),
            },
        }
    }
}

impl fmt::Display for ConcreteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_url().fmt(f)
    }
}

/// Refine a generic URL by scheme. Pure: no I/O.
pub fn to_concrete(url: &Url) -> Result<ConcreteUrl, UrlParseError> {
    let scheme = Scheme::from_name(url.scheme())
        .ok_or_else(|| UrlParseError::UnsupportedScheme(url.scheme().to_string()))?;
    let concrete = match scheme {
        Scheme::Data => ConcreteUrl::Data(DataUrl::parse(url.path().unwrap_or(""))?),
        Scheme::Http | Scheme::Https => ConcreteUrl::HttpFamily(HttpFamilyUrl::from_url(url)?),
        Scheme::File => ConcreteUrl::File(FileUrl {
            host: url.host().unwrap_or("localhost").to_string(),
            path: url.path().map(str::to_string),
        }),
        Scheme::About => ConcreteUrl::About(AboutUrl {
            path: url.path().unwrap_or("").to_string(),
        }),
        Scheme::ViewSource => {
            let mut inner = url
                .path()
                .ok_or_else(|| UrlParseError::MissingPath("view-source".to_string()))?
                .to_string();
            if let Some(q) = url.query() {
                inner.push('?');
                inner.push_str(q);
            }
            if let Some(frag) = url.fragment() {
                inner.push('#');
                inner.push_str(frag);
            }
            ConcreteUrl::ViewSource(ViewSourceUrl { inner })
        }
    };
    Ok(concrete)
}

/*
 * request.rs
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

//! HTTP request: method, path, headers, version, and its HTTP/1.x wire encoding.

use std::fmt;

use super::headers::HeaderMap;

const CRLF: &str = "\r\n";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Other(&'static str),
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
}

impl HttpVersion {
    /// "1.0" or "1.1", as written after `HTTP/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http10 => "1.0",
            HttpVersion::Http11 => "1.1",
        }
    }

    /// Accepts `1.0`, `1.1`, `HTTP/1.0`, `HTTP/1.1`.
    pub fn from_label(s: &str) -> Option<HttpVersion> {
        let s = s.trim();
        let s = s
            .strip_prefix("HTTP/")
            .or_else(|| s.strip_prefix("http/"))
            .unwrap_or(s);
        match s {
            "1.0" => Some(HttpVersion::Http10),
            "1.1" => Some(HttpVersion::Http11),
            _ => None,
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}", self.as_str())
    }
}

/// Request without body. Headers are sent in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub version: HttpVersion,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>, version: HttpVersion) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            version,
        }
    }

    pub fn get(path: impl Into<String>, version: HttpVersion) -> Self {
        Self::new(Method::Get, path, version)
    }

    /// Add or replace a header. Name comparison is case-insensitive per HTTP.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Request line, headers, blank line. HTTP/1.1 requests without an explicit
    /// `Connection` header get `Connection: close`.
    pub fn encode(&self) -> Vec<u8> {
        let mut req = format!(
            "{} {} HTTP/{}{}",
            self.method.as_str(),
            self.path,
            self.version.as_str(),
            CRLF
        );
        for (name, value) in self.headers.iter() {
            req.push_str(name);
            req.push_str(": ");
            req.push_str(value);
            req.push_str(CRLF);
        }
        if self.version == HttpVersion::Http11 && !self.headers.contains_key("Connection") {
            req.push_str("Connection: close");
            req.push_str(CRLF);
        }
        req.push_str(CRLF);
        req.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http11_defaults_to_close() {
        let mut req = HttpRequest::get("/index.html", HttpVersion::Http11);
        req.header("Host", "example.com");
        assert_eq!(
            String::from_utf8(req.encode()).unwrap(),
            "GET /index.html HTTP/1.1\r\nHost: example.com\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn explicit_connection_is_kept() {
        let mut req = HttpRequest::get("/", HttpVersion::Http11);
        req.header("Host", "example.com")
            .header("connection", "keep-alive")
            .header("Accept-Encoding", "gzip");
        assert_eq!(
            String::from_utf8(req.encode()).unwrap(),
            "GET / HTTP/1.1\r\nHost: example.com\r\nconnection: keep-alive\r\nAccept-Encoding: gzip\r\n\r\n"
        );
    }

    #[test]
    fn http10_gets_no_injected_header() {
        let mut req = HttpRequest::get("/", HttpVersion::Http10);
        req.header("Host", "h");
        assert_eq!(
            String::from_utf8(req.encode()).unwrap(),
            "GET / HTTP/1.0\r\nHost: h\r\n\r\n"
        );
    }

    #[test]
    fn version_labels() {
        assert_eq!(HttpVersion::from_label("1.0"), Some(HttpVersion::Http10));
        assert_eq!(HttpVersion::from_label("HTTP/1.1"), Some(HttpVersion::Http11));
        assert_eq!(HttpVersion::from_label("2"), None);
        assert_eq!(HttpVersion::Http11.to_string(), "HTTP/1.1");
    }
}

/*
 * response.rs
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

//! Fully buffered HTTP response.

use super::headers::HeaderMap;
use super::request::HttpRequest;
use crate::media_type::{MediaType, ParsedMediaType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// As sent by the server, e.g. `HTTP/1.1`.
    pub version: String,
    pub status_code: u16,
    pub status_message: String,
    /// Names are case-folded to lowercase by the decoder.
    pub headers: HeaderMap,
    /// Body after transfer and content decoding.
    pub body: Vec<u8>,
    /// Request that produced this response; kept for diagnostics.
    pub request: HttpRequest,
}

impl HttpResponse {
    /// Parsed `Content-Type`. `None` when absent, not `type/subtype`, or with a malformed
    /// parameter list.
    pub fn content_type(&self) -> Option<MediaType> {
        let raw = self.headers.get("content-type")?;
        match MediaType::parse(raw) {
            Ok(ParsedMediaType::Valid(m)) => Some(m),
            Ok(ParsedMediaType::Invalid(_)) | Err(_) => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get("location")
    }

    /// Peer asked to close the connection after this exchange.
    pub fn connection_close(&self) -> bool {
        self.headers.value_is("connection", "close")
    }
}

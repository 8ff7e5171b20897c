/*
 * data.rs
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

//! `data:` URIs (RFC 2397): `[mediatype][;param=value]*[;base64],data`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{FetchError, UrlParseError};
use crate::media_type::{MediaType, ParsedMediaType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub media_type: MediaType,
    pub is_base64: bool,
    /// Payload as written in the URL (still base64 when `is_base64`).
    pub data: String,
}

impl DataUrl {
    /// Parse the part after `data:`. An empty string is read as `","`.
    pub fn parse(path: &str) -> Result<DataUrl, UrlParseError> {
        let path = if path.is_empty() { "," } else { path };
        let (metadata, data) = path
            .split_once(',')
            .ok_or(UrlParseError::MissingDataComma)?;

        let mut essence: Option<&str> = None;
        let mut parameters = Vec::new();
        let mut is_base64 = false;
        for (i, part) in metadata.split(';').enumerate() {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if part.eq_ignore_ascii_case("base64") {
                is_base64 = true;
            } else if let Some((k, v)) = part.split_once('=') {
                parameters.push((k.trim().to_string(), v.trim().to_string()));
            } else if i == 0 {
                essence = Some(part);
            } else {
                return Err(UrlParseError::Invalid(format!("data:{}", path)));
            }
        }

        let mut media_type = match essence {
            None => MediaType::text_plain(),
            Some(e) => match MediaType::parse(e) {
                Ok(ParsedMediaType::Valid(m)) => m,
                _ => return Err(UrlParseError::Invalid(format!("data:{}", path))),
            },
        };
        for (k, v) in parameters {
            media_type.set_parameter(&k, v);
        }
        if media_type.is_mime_type("text", "plain") && !media_type.has_parameter("charset") {
            media_type.set_parameter("charset", "US-ASCII");
        }

        Ok(DataUrl {
            media_type,
            is_base64,
            data: data.to_string(),
        })
    }

    /// Payload bytes: base64-decoded when flagged, otherwise the raw characters.
    pub fn get_data(&self) -> Result<Vec<u8>, FetchError> {
        if self.is_base64 {
            let compact: String = self.data.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| FetchError::InvalidData(format!("data URI base64: {}", e)))
        } else {
            Ok(self.data.as_bytes().to_vec())
        }
    }

    /// Path component that parses back to this value.
    pub fn to_path(&self) -> String {
        let mut out = self.media_type.to_string();
        if self.is_base64 {
            out.push_str(";base64");
        }
        out.push(',');
        out.push_str(&self.data);
        out
    }
}

/*
 * media_type.rs
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

//! Media types as carried by `Content-Type` (RFC 9110 §8.3) and data URIs.

use std::collections::HashMap;
use std::fmt;

use crate::error::MediaTypeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    primary_type: String,
    sub_type: String,
    parameters: HashMap<String, String>,
}

/// A string that does not have the `type/subtype` shape. Kept as data, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMediaType {
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMediaType {
    Valid(MediaType),
    Invalid(InvalidMediaType),
}

impl ParsedMediaType {
    pub fn valid(self) -> Option<MediaType> {
        match self {
            ParsedMediaType::Valid(m) => Some(m),
            ParsedMediaType::Invalid(_) => None,
        }
    }
}

impl MediaType {
    /// Build from parts. Type and subtype are lowercased; parameter names too.
    pub fn new(
        primary_type: impl Into<String>,
        sub_type: impl Into<String>,
        parameters: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            primary_type: primary_type.into().to_ascii_lowercase(),
            sub_type: sub_type.into().to_ascii_lowercase(),
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }

    pub fn text_plain() -> Self {
        Self::new("text", "plain", [])
    }

    /// Parse a `Content-Type`-shaped string.
    ///
    /// A first segment that is not `type/subtype` yields `Invalid`; a parameter without `=`
    /// is a hard error for the whole call.
    pub fn parse(s: &str) -> Result<ParsedMediaType, MediaTypeError> {
        let mut parts = s.split(';');
        let main = parts.next().unwrap_or("").trim();
        let invalid = || {
            Ok(ParsedMediaType::Invalid(InvalidMediaType {
                raw: s.to_string(),
            }))
        };
        let (primary, sub) = match main.split_once('/') {
            Some((p, st)) => (p.trim(), st.trim()),
            None => return invalid(),
        };
        if primary.is_empty() || sub.is_empty() || sub.contains('/') {
            return invalid();
        }
        let mut parameters = Vec::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (key, value) = param
                .split_once('=')
                .ok_or_else(|| MediaTypeError::MalformedParameter(param.to_string()))?;
            parameters.push((key.trim().to_string(), unquote(value.trim()).to_string()));
        }
        Ok(ParsedMediaType::Valid(MediaType::new(primary, sub, parameters)))
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.primary_type, self.sub_type)
    }

    pub fn is_mime_type(&self, primary: &str, sub: &str) -> bool {
        self.primary_type.eq_ignore_ascii_case(primary) && self.sub_type.eq_ignore_ascii_case(sub)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(&name.to_ascii_lowercase())
    }

    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    pub(crate) fn set_parameter(&mut self, name: &str, value: impl Into<String>) {
        self.parameters.insert(name.to_ascii_lowercase(), value.into());
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary_type, self.sub_type)?;
        let mut names: Vec<&String> = self.parameters.keys().collect();
        names.sort();
        for name in names {
            write!(f, ";{}={}", name, self.parameters[name])?;
        }
        Ok(())
    }
}

fn unquote(v: &str) -> &str {
    if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(s: &str) -> MediaType {
        match MediaType::parse(s).unwrap() {
            ParsedMediaType::Valid(m) => m,
            ParsedMediaType::Invalid(i) => panic!("unexpectedly invalid: {}", i.raw),
        }
    }

    #[test]
    fn simple_type() {
        let m = valid("text/html");
        assert_eq!(m.primary_type(), "text");
        assert_eq!(m.sub_type(), "html");
        assert!(m.parameters().is_empty());
    }

    #[test]
    fn case_folded_with_parameters() {
        let m = valid("Text/HTML; Charset=\"UTF-8\" ; q=0.5");
        assert!(m.is_mime_type("text", "html"));
        assert_eq!(m.essence(), "text/html");
        assert_eq!(m.parameter("charset"), Some("UTF-8"));
        assert_eq!(m.parameter("CHARSET"), Some("UTF-8"));
        assert_eq!(m.parameter("q"), Some("0.5"));
    }

    #[test]
    fn trailing_semicolon_is_ignored() {
        let m = valid("image/png;");
        assert_eq!(m.essence(), "image/png");
    }

    #[test]
    fn invalid_shape_is_data() {
        for s in ["", "text", "text/", "/html", "a/b/c"] {
            assert_eq!(
                MediaType::parse(s).unwrap(),
                ParsedMediaType::Invalid(InvalidMediaType { raw: s.to_string() })
            );
        }
    }

    #[test]
    fn malformed_parameter_is_an_error() {
        assert_eq!(
            MediaType::parse("text/plain; charset"),
            Err(MediaTypeError::MalformedParameter("charset".to_string()))
        );
    }

    #[test]
    fn display() {
        let m = valid("text/plain;charset=utf-8");
        assert_eq!(m.to_string(), "text/plain;charset=utf-8");
    }
}

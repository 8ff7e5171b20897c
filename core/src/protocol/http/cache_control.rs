/*
 * cache_control.rs
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

//! Cache-Control header tokens (RFC 7234 section 5.2).

/// Response directives. Only `no-store` and `max-age` drive the client cache; the rest are
/// parsed so callers can inspect them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCacheControl {
    /// `no-cache` with the optional list of header names it applies to.
    NoCache(Vec<String>),
    NoStore,
    NoTransform,
    OnlyIfCached,
    MaxAge(u64),
    MaxStale(u64),
    MinFresh(u64),
    MustRevalidate,
    Unknown { name: String, value: Option<String> },
}

/// Request directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestCacheControl {
    NoCache,
    NoStore,
    NoTransform,
    OnlyIfCached,
    MaxAge(u64),
    /// `max-stale` may be sent without a value, meaning any staleness is acceptable.
    MaxStale(Option<u64>),
    MinFresh(u64),
    Public,
    Unknown { name: String, value: Option<String> },
}

/// Split a header value into `(name, value)` directives. Commas inside a quoted value do
/// not separate directives; surrounding quotes are removed from values.
fn directives(header: &str) -> Vec<(String, Option<String>)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in header.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((name, value)) => {
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                (name.trim().to_ascii_lowercase(), Some(value.to_string()))
            }
            None => (p.to_ascii_lowercase(), None),
        })
        .collect()
}

/// Largest delta-seconds kept; bigger values are clamped to it (RFC 9111 section 1.2.2).
pub const MAX_DELTA_SECONDS: u64 = 1 << 31;

fn delta_seconds(value: &Option<String>) -> Option<u64> {
    let v = value.as_deref()?;
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // All digits, so a parse failure is an overflow.
    Some(v.parse::<u64>().map_or(MAX_DELTA_SECONDS, |d| d.min(MAX_DELTA_SECONDS)))
}

pub fn parse_response_cache_control(header: &str) -> Vec<ResponseCacheControl> {
    directives(header)
        .into_iter()
        .map(|(name, value)| {
            let token = match name.as_str() {
                "no-cache" => Some(ResponseCacheControl::NoCache(
                    value
                        .as_deref()
                        .map(|v| {
                            v.split(',')
                                .map(str::trim)
                                .filter(|s| !s.is_empty())
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                )),
                "no-store" => Some(ResponseCacheControl::NoStore),
                "no-transform" => Some(ResponseCacheControl::NoTransform),
                "only-if-cached" => Some(ResponseCacheControl::OnlyIfCached),
                "must-revalidate" => Some(ResponseCacheControl::MustRevalidate),
                "max-age" => delta_seconds(&value).map(ResponseCacheControl::MaxAge),
                "max-stale" => delta_seconds(&value).map(ResponseCacheControl::MaxStale),
                "min-fresh" => delta_seconds(&value).map(ResponseCacheControl::MinFresh),
                _ => None,
            };
            token.unwrap_or(ResponseCacheControl::Unknown { name, value })
        })
        .collect()
}

pub fn parse_request_cache_control(header: &str) -> Vec<RequestCacheControl> {
    directives(header)
        .into_iter()
        .map(|(name, value)| {
            let token = match name.as_str() {
                "no-cache" => Some(RequestCacheControl::NoCache),
                "no-store" => Some(RequestCacheControl::NoStore),
                "no-transform" => Some(RequestCacheControl::NoTransform),
                "only-if-cached" => Some(RequestCacheControl::OnlyIfCached),
                "public" => Some(RequestCacheControl::Public),
                "max-age" => delta_seconds(&value).map(RequestCacheControl::MaxAge),
                "max-stale" => match &value {
                    None => Some(RequestCacheControl::MaxStale(None)),
                    Some(_) => delta_seconds(&value).map(|d| RequestCacheControl::MaxStale(Some(d))),
                },
                "min-fresh" => delta_seconds(&value).map(RequestCacheControl::MinFresh),
                _ => None,
            };
            token.unwrap_or(RequestCacheControl::Unknown { name, value })
        })
        .collect()
}

/*
 * error.rs
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

//! URL, media type and fetch errors.

use std::io;

use thiserror::Error;

/// The input does not match the URL grammar, or a scheme-specific refinement failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlParseError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    Invalid(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("invalid data URI: missing comma separator")]
    MissingDataComma,

    #[error("{0}: URL needs a path")]
    MissingPath(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Hard failure while parsing a media type's parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    #[error("invalid media type parameter: {0:?}")]
    MalformedParameter(String),
}

/// Errors that abort a fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Url(#[from] UrlParseError),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("max redirects exceeded ({0})")]
    TooManyRedirects(u32),

    #[error("unsupported content encoding: {0}")]
    UnsupportedContentEncoding(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("HTTP protocol error: {0}")]
    Protocol(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FetchError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

pub type Result<T, E = FetchError> = std::result::Result<T, E>;

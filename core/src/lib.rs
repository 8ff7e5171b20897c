/*
 * lib.rs
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

//! Segnalibro core: turn a URL into typed content.
//!
//! A `ContentFetcher` resolves a URL to its scheme-specific form, dispatches to the
//! registered `UrlHandler` and follows redirects. HTTP and HTTPS go through an `HttpClient`
//! that pools connections and caches responses.

pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod fetcher;
pub mod handler;
pub mod media_type;
pub mod net;
pub mod protocol;
pub mod url;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FetchConfig;
pub use content::{recognize_content, Content};
pub use error::{FetchError, MediaTypeError, UrlParseError};
pub use fetcher::ContentFetcher;
pub use handler::{Fetched, HandlerRegistry, RedirectInfo, UrlHandler};
pub use media_type::{InvalidMediaType, MediaType, ParsedMediaType};
pub use protocol::http::HttpClient;
pub use url::{to_concrete, ConcreteUrl, Url};

/*
 * mod.rs
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

//! HTTP/1.x client with push-parsed responses, connection pooling and response caching.
//!
//! - Buffers: `bytes` crate (BytesMut for the parse buffer).
//! - HTTP/1.0 and HTTP/1.1 only: state-machine response parser in `h1`.
//! - TLS via rustls with ALPN `http/1.1`.
//! - One pooled connection per (scheme, host, port); responses cached by URL under
//!   `Cache-Control`.

mod cache_control;
mod handler;
mod headers;
mod request;
mod response;

pub mod cache;
pub mod client;
pub mod connection;
pub mod h1;
pub mod pool;

pub use cache::HttpCache;
pub use cache_control::{
    parse_request_cache_control, parse_response_cache_control, RequestCacheControl,
    ResponseCacheControl,
};
pub use client::HttpClient;
pub use connection::{HttpConnection, HttpStream};
pub use h1::H1ResponseHandler;
pub use handler::{resolve_location, HttpHandler};
pub use headers::HeaderMap;
pub use pool::{ConnectionPool, PoolKey};
pub use request::{HttpRequest, HttpVersion, Method};
pub use response::HttpResponse;

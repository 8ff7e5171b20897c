/*
 * client.rs
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

//! HTTP client: owns the connection pool and the response cache, and runs one exchange per
//! request over a pooled connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::clock::{Clock, SystemClock};
use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::net::upgrade_to_tls;
use crate::protocol::http::cache::HttpCache;
use crate::protocol::http::connection::{HttpConnection, HttpStream};
use crate::protocol::http::pool::{ConnectionPool, PoolKey};
use crate::protocol::http::request::HttpRequest;
use crate::protocol::http::response::HttpResponse;
use crate::url::HttpFamilyUrl;

/// HTTP client. Construct once and share via `Arc`; pool and cache live as long as it does.
pub struct HttpClient {
    pool: ConnectionPool,
    cache: HttpCache,
    config: FetchConfig,
    clock: Arc<dyn Clock>,
}

impl HttpClient {
    pub fn new(config: FetchConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Client whose pool and cache read time from `clock`.
    pub fn with_clock(config: FetchConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool: ConnectionPool::new(
                clock.clone(),
                config.connection_lifetime_secs,
                config.connect_timeout,
            ),
            cache: HttpCache::new(clock.clone()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn cache(&self) -> &HttpCache {
        &self.cache
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Connect to the given host and port, with a TLS handshake when `use_tls` is true.
    /// TCP connect and handshake are each bounded by `connect_timeout`.
    pub async fn connect(
        host: &str,
        port: u16,
        use_tls: bool,
        connect_timeout: Duration,
    ) -> Result<HttpConnection> {
        let addr = format!("{}:{}", host, port);
        let tcp = timeout(connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| FetchError::Timeout("connect"))??;
        tcp.set_nodelay(true)?;

        if use_tls {
            let tls = timeout(connect_timeout, upgrade_to_tls(tcp, host))
                .await
                .map_err(|_| FetchError::Timeout("TLS handshake"))?
                .map_err(|e| FetchError::Tls(format!("{}: {}", host, e)))?;
            Ok(HttpConnection::new(
                HttpStream::Tls(Box::new(tls)),
                host.to_string(),
                port,
                true,
            ))
        } else {
            Ok(HttpConnection::new(
                HttpStream::Plain(tcp),
                host.to_string(),
                port,
                false,
            ))
        }
    }

    /// Send `request` to the URL's origin over a pooled connection. The connection is evicted
    /// after a failure, a `Connection: close`, or any response that leaves it unusable.
    pub async fn request_http(
        &self,
        url: &HttpFamilyUrl,
        request: &HttpRequest,
    ) -> Result<HttpResponse> {
        let key = PoolKey::for_url(url);
        let mut guard = self.pool.checkout(&key).await?;
        let (result, reusable) = match guard.connection() {
            Some(conn) => {
                let result = conn.send(request, self.config.read_timeout).await;
                (result, conn.is_reusable())
            }
            None => (Err(FetchError::protocol("no connection")), false),
        };
        match &result {
            Ok(response) => log::debug!(
                "{} {}{} -> {} {}",
                request.method.as_str(),
                key,
                request.path,
                response.status_code,
                response.status_message
            ),
            Err(e) => log::warn!("{} {}{} failed: {}", request.method.as_str(), key, request.path, e),
        }
        if !reusable {
            self.pool.discard(guard).await;
        }
        result
    }
}

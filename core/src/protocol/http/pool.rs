/*
 * pool.rs
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

//! Connection pool keyed by (scheme, host, port).
//!
//! Each key owns one slot behind its own async mutex. A request holds its key's slot for the
//! whole open/send/receive sequence, so a key never opens two connections at once and
//! different keys never wait on each other.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::clock::Clock;
use crate::error::Result;
use crate::protocol::http::client::HttpClient;
use crate::protocol::http::connection::HttpConnection;
use crate::url::{HttpFamilyUrl, HttpScheme};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub scheme: HttpScheme,
    pub host: String,
    pub port: u16,
}

impl PoolKey {
    /// Key for a URL; an absent port is the scheme default.
    pub fn for_url(url: &HttpFamilyUrl) -> Self {
        Self {
            scheme: url.scheme,
            host: url.host.to_ascii_lowercase(),
            port: url.effective_port(),
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}

pub struct PooledConnection {
    connection: HttpConnection,
    expires_at: u64,
}

type Slot = Arc<AsyncMutex<Option<PooledConnection>>>;

pub struct ConnectionPool {
    slots: Mutex<HashMap<PoolKey, Slot>>,
    clock: Arc<dyn Clock>,
    lifetime_secs: u64,
    connect_timeout: Duration,
}

impl ConnectionPool {
    pub fn new(clock: Arc<dyn Clock>, lifetime_secs: u64, connect_timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            clock,
            lifetime_secs,
            connect_timeout,
        }
    }

    fn slot(&self, key: &PoolKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(None)))
            .clone()
    }

    /// Forget the key's slot once it is empty and no task holds or waits on it.
    fn prune(&self, key: &PoolKey) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = slots.get(key).is_some_and(|slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().map(|s| s.is_none()).unwrap_or(false)
        });
        if unused {
            slots.remove(key);
        }
    }

    /// Lock the key's slot and make sure it holds a live connection: reuse an unexpired one,
    /// otherwise close the stale one and open a new one.
    pub async fn checkout(&self, key: &PoolKey) -> Result<PoolGuard> {
        let mut guard = self.slot(key).lock_owned().await;
        let now = self.clock.now_secs();
        if let Some(pooled) = guard.take() {
            if pooled.expires_at < now {
                log::debug!(
                    "connection {} to {} expired, reopening",
                    pooled.connection.id(),
                    key
                );
                pooled.connection.close().await;
            } else {
                log::debug!("reusing connection {} to {}", pooled.connection.id(), key);
                *guard = Some(pooled);
                return Ok(PoolGuard { key: key.clone(), guard });
            }
        }
        let connection = match HttpClient::connect(
            &key.host,
            key.port,
            key.scheme.is_secure(),
            self.connect_timeout,
        )
        .await
        {
            Ok(c) => c,
            Err(e) => {
                drop(guard);
                self.prune(key);
                return Err(e);
            }
        };
        log::debug!("opened connection {} to {}", connection.id(), key);
        *guard = Some(PooledConnection {
            connection,
            expires_at: now.saturating_add(self.lifetime_secs),
        });
        Ok(PoolGuard { key: key.clone(), guard })
    }

    /// Close and forget the connection for `key`, if any.
    pub async fn evict(&self, key: &PoolKey) {
        let slot = self.slot(key);
        let pooled = slot.lock().await.take();
        drop(slot);
        if let Some(pooled) = pooled {
            log::debug!("evicting connection {} to {}", pooled.connection.id(), key);
            pooled.connection.close().await;
        }
        self.prune(key);
    }

    /// Close the guard's connection instead of returning it, and forget the key.
    pub async fn discard(&self, guard: PoolGuard) {
        let key = guard.key.clone();
        guard.evict().await;
        self.prune(&key);
    }

    /// Number of keys the pool is tracking, idle or in use.
    pub fn tracked_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of keys currently holding a connection. Skips slots that are in use.
    pub fn idle_connections(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| slot.try_lock().map(|s| s.is_some()).unwrap_or(false))
            .count()
    }
}

/// Exclusive use of one pooled connection. Dropping the guard returns the connection to
/// the pool; `evict` closes it instead.
pub struct PoolGuard {
    key: PoolKey,
    guard: OwnedMutexGuard<Option<PooledConnection>>,
}

impl PoolGuard {
    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// The checked-out connection. None only after `evict`.
    pub fn connection(&mut self) -> Option<&mut HttpConnection> {
        self.guard.as_mut().map(|p| &mut p.connection)
    }

    pub async fn evict(mut self) {
        if let Some(pooled) = self.guard.take() {
            log::debug!(
                "evicting connection {} to {}",
                pooled.connection.id(),
                self.key
            );
            pooled.connection.close().await;
        }
    }
}

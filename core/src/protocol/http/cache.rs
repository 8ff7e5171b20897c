/*
 * cache.rs
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

//! In-memory HTTP response cache with per-entry expiry. Striped over 16 shards.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::clock::Clock;
use crate::protocol::http::response::HttpResponse;
use crate::url::{HttpFamilyUrl, HttpScheme};

const SHARDS: usize = 16;

/// Scheme, host, port, path and query. Userinfo and fragment never affect the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scheme: HttpScheme,
    host: String,
    port: u16,
    path: String,
    query: Option<String>,
}

impl CacheKey {
    pub fn for_url(url: &HttpFamilyUrl) -> Self {
        Self {
            scheme: url.scheme,
            host: url.host.to_ascii_lowercase(),
            port: url.effective_port(),
            path: url.path.clone().unwrap_or_else(|| "/".to_string()),
            query: url.query.clone(),
        }
    }
}

struct CacheEntry {
    response: HttpResponse,
    expires_at: u64,
}

pub struct HttpCache {
    shards: Vec<Mutex<HashMap<CacheKey, CacheEntry>>>,
    clock: Arc<dyn Clock>,
}

impl HttpCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
            clock,
        }
    }

    fn shard(&self, key: &CacheKey) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % SHARDS;
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Unexpired response for `url`. An expired entry is removed on the way out.
    pub fn get(&self, url: &HttpFamilyUrl) -> Option<HttpResponse> {
        let key = CacheKey::for_url(url);
        let now = self.clock.now_secs();
        let mut shard = self.shard(&key);
        match shard.get(&key) {
            Some(entry) if now < entry.expires_at => Some(entry.response.clone()),
            Some(_) => {
                shard.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store `response` until `expires_at` (epoch seconds), replacing any previous entry.
    pub fn set(&self, url: &HttpFamilyUrl, response: HttpResponse, expires_at: u64) {
        let key = CacheKey::for_url(url);
        self.shard(&key).insert(
            key,
            CacheEntry {
                response,
                expires_at,
            },
        );
    }

    pub fn remove(&self, url: &HttpFamilyUrl) -> Option<HttpResponse> {
        let key = CacheKey::for_url(url);
        self.shard(&key).remove(&key).map(|e| e.response)
    }

    /// Entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::protocol::http::headers::HeaderMap;
    use crate::protocol::http::request::{HttpRequest, HttpVersion};
    use crate::url::Url;

    fn url(s: &str) -> HttpFamilyUrl {
        HttpFamilyUrl::from_url(&Url::parse(s).unwrap()).unwrap()
    }

    fn response(body: &str) -> HttpResponse {
        HttpResponse {
            version: "HTTP/1.1".to_string(),
            status_code: 200,
            status_message: "OK".to_string(),
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
            request: HttpRequest::get("/", HttpVersion::Http11),
        }
    }

    #[test]
    fn entry_expires_lazily() {
        let clock = Arc::new(ManualClock::new(100));
        let cache = HttpCache::new(clock.clone());
        let u = url("http://example.com/page");
        cache.set(&u, response("a"), 105);
        assert_eq!(cache.get(&u).unwrap().body, b"a");
        clock.set(104);
        assert!(cache.get(&u).is_some());
        clock.set(105);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&u).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn key_ignores_userinfo_and_fragment() {
        let cache = HttpCache::new(Arc::new(ManualClock::new(0)));
        cache.set(&url("http://example.com"), response("root"), 10);
        assert!(cache.get(&url("http://user:pw@EXAMPLE.com:80/#top")).is_some());
        assert!(cache.get(&url("http://example.com/?q=1")).is_none());
        assert!(cache.get(&url("https://example.com/")).is_none());
        assert!(cache.remove(&url("http://example.com/")).is_some());
    }

    #[test]
    fn clear_drops_everything() {
        let cache = HttpCache::new(Arc::new(ManualClock::new(0)));
        for i in 0..40 {
            cache.set(&url(&format!("http://example.com/{}", i)), response("x"), 10);
        }
        assert_eq!(cache.len(), 40);
        cache.clear();
        assert!(cache.is_empty());
    }
}

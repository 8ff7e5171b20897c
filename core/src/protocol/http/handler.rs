/*
 * handler.rs
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

//! Handler for `http:` and `https:` URLs: cache lookup, one exchange, cache store,
//! redirect resolution, content recognition.

use std::sync::Arc;

use crate::content::recognize_content;
use crate::error::{FetchError, Result};
use crate::fetcher::ContentFetcher;
use crate::handler::{Fetched, HandlerFuture, RedirectInfo, UrlHandler};
use crate::protocol::http::cache_control::{parse_response_cache_control, ResponseCacheControl};
use crate::protocol::http::client::HttpClient;
use crate::protocol::http::request::HttpRequest;
use crate::protocol::http::response::HttpResponse;
use crate::url::{ConcreteUrl, HttpFamilyUrl, Url};

pub struct HttpHandler {
    client: Arc<HttpClient>,
}

impl HttpHandler {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<HttpClient> {
        &self.client
    }

    fn build_request(&self, url: &HttpFamilyUrl) -> HttpRequest {
        let config = self.client.config();
        let mut request = HttpRequest::get(url.request_target(), config.http_version);
        request.header("Host", url.host_header());
        if config.keep_alive {
            request.header("Connection", "keep-alive");
        }
        request
            .header("Accept-Encoding", "gzip")
            .header("User-Agent", config.user_agent.clone());
        request
    }

    /// Cache the response when it carries `Cache-Control` without `no-store`.
    fn store(&self, url: &HttpFamilyUrl, response: &HttpResponse) {
        let header = match response.headers.get("cache-control") {
            Some(h) => h,
            None => return,
        };
        let directives = parse_response_cache_control(header);
        if directives.contains(&ResponseCacheControl::NoStore) {
            return;
        }
        let max_age = directives
            .iter()
            .find_map(|d| match d {
                ResponseCacheControl::MaxAge(secs) => Some(*secs),
                _ => None,
            })
            .unwrap_or(self.client.config().default_max_age_secs);
        let expires_at = self.client.clock().now_secs().saturating_add(max_age);
        log::debug!("caching {} for {}s", url, max_age);
        self.client.cache().set(url, response.clone(), expires_at);
    }

    async fn fetch_http(&self, url: &HttpFamilyUrl) -> Result<Fetched> {
        let response = match self.client.cache().get(url) {
            Some(cached) => {
                log::debug!("cache hit for {}", url);
                cached
            }
            None => {
                let request = self.build_request(url);
                let response = self.client.request_http(url, &request).await?;
                self.store(url, &response);
                response
            }
        };

        if response.is_redirect() {
            if let Some(location) = response.location() {
                let target = resolve_location(url, location)?;
                log::info!("{} {} redirects to {}", url, response.status_code, target);
                return Ok(Fetched::Redirect(RedirectInfo { url: target }));
            }
        }
        let media_type = response.content_type();
        Ok(Fetched::Content(recognize_content(
            media_type.as_ref(),
            response.body,
        )))
    }
}

impl UrlHandler for HttpHandler {
    fn fetch<'a>(&'a self, url: &'a ConcreteUrl, _fetcher: &'a ContentFetcher) -> HandlerFuture<'a> {
        Box::pin(async move {
            match url {
                ConcreteUrl::HttpFamily(u) => self.fetch_http(u).await,
                other => Err(FetchError::UnsupportedScheme(other.scheme().to_string())),
            }
        })
    }
}

/// `scheme:` prefix per RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ).
fn has_scheme(s: &str) -> bool {
    match s.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Resolve a `Location` value against the URL that returned it. Absolute and
/// network-path references are parsed as is; relative ones keep scheme and authority.
pub fn resolve_location(base: &HttpFamilyUrl, location: &str) -> Result<Url> {
    let location = location.trim();
    if has_scheme(location) {
        return Ok(Url::parse(location)?);
    }
    if location.starts_with("//") {
        return Ok(Url::parse(&format!("{}:{}", base.scheme.as_str(), location))?);
    }

    let (rest, fragment) = match location.split_once('#') {
        Some((r, f)) => (r, Some(f.to_string())),
        None => (location, None),
    };
    let (path_part, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q.to_string())),
        None => (rest, None),
    };
    let base_path = base.path.as_deref().unwrap_or("/");
    let mut target = if path_part.is_empty() {
        // Same document; a reference without a query keeps the base query.
        let mut t = base.with_path(base_path);
        t.query = query.or_else(|| base.query.clone());
        t
    } else {
        let joined = if path_part.starts_with('/') {
            path_part.to_string()
        } else {
            let dir = match base_path.rfind('/') {
                Some(i) => &base_path[..=i],
                None => "/",
            };
            format!("{}{}", dir, path_part)
        };
        let mut t = base.with_path(remove_dot_segments(&joined));
        t.query = query;
        t
    };
    target.fragment = fragment;
    let url = Url::parse(&target.to_url().to_string())?;
    HttpFamilyUrl::from_url(&url)?;
    Ok(url)
}

/// Collapse `.` and `..` segments of an absolute path.
fn remove_dot_segments(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    for seg in &segments {
        match *seg {
            "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    if matches!(segments.last(), Some(&".") | Some(&"..")) {
        out.push("");
    }
    format!("/{}", out.join("/"))
}

/*
 * fetcher.rs
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

//! URL to Content: resolve, dispatch to the scheme's handler, follow redirects.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::{FetchConfig, MAX_REDIRECTS};
use crate::content::Content;
use crate::error::{FetchError, Result, UrlParseError};
use crate::handler::{Fetched, HandlerRegistry};
use crate::protocol::http::HttpClient;
use crate::url::{to_concrete, Url};

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Content>> + Send + 'a>>;

pub struct ContentFetcher {
    registry: HandlerRegistry,
    max_redirects: u32,
}

impl ContentFetcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            max_redirects: MAX_REDIRECTS,
        }
    }

    /// Fetcher with every built-in handler over a fresh HttpClient built from `config`.
    pub fn from_config(config: FetchConfig) -> Self {
        let max_redirects = config.max_redirects;
        let client = Arc::new(HttpClient::new(config));
        Self::new(HandlerRegistry::with_defaults(client)).with_max_redirects(max_redirects)
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Fetch `url`, following up to `max_redirects` redirects. A redirect that arrives
    /// with the budget spent fails with `TooManyRedirects`.
    ///
    /// Boxed because `view-source:` handlers call back into the fetcher.
    pub fn fetch<'a>(&'a self, url: &'a Url) -> FetchFuture<'a> {
        Box::pin(async move {
            let mut current = url.clone();
            let mut remaining = self.max_redirects;
            loop {
                let concrete = to_concrete(&current).map_err(|e| match e {
                    UrlParseError::UnsupportedScheme(s) => FetchError::UnsupportedScheme(s),
                    other => FetchError::Url(other),
                })?;
                let handler = self.registry.get(concrete.scheme())?;
                match handler.fetch(&concrete, self).await? {
                    Fetched::Content(content) => {
                        log::debug!("{} -> {}", current, content.kind());
                        return Ok(content);
                    }
                    Fetched::Redirect(redirect) => {
                        if remaining == 0 {
                            return Err(FetchError::TooManyRedirects(self.max_redirects));
                        }
                        remaining -= 1;
                        log::debug!("redirect {} -> {}", current, redirect.url);
                        current = redirect.url;
                    }
                }
            }
        })
    }

    /// Parse `url` and fetch it.
    pub async fn fetch_str(&self, url: &str) -> Result<Content> {
        let url = Url::parse(url)?;
        self.fetch(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerFuture, RedirectInfo, UrlHandler};
    use crate::url::{ConcreteUrl, Scheme};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fetcher() -> ContentFetcher {
        ContentFetcher::from_config(FetchConfig::default())
    }

    /// Redirects every request to the same URL, counting calls.
    struct Loop {
        calls: Arc<AtomicU32>,
    }

    impl UrlHandler for Loop {
        fn fetch<'a>(&'a self, url: &'a ConcreteUrl, _f: &'a ContentFetcher) -> HandlerFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(Fetched::Redirect(RedirectInfo { url: url.to_url() }))
            })
        }
    }

    #[tokio::test]
    async fn redirect_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(Scheme::Http, Arc::new(Loop { calls: calls.clone() }));
        let fetcher = ContentFetcher::new(registry);
        let err = fetcher.fetch_str("http://loop.test/").await.unwrap_err();
        assert!(matches!(err, FetchError::TooManyRedirects(20)));
        assert_eq!(calls.load(Ordering::SeqCst), 21);

        calls.store(0, Ordering::SeqCst);
        let fetcher = ContentFetcher::new(fetcher.registry().clone()).with_max_redirects(0);
        assert!(fetcher.fetch_str("http://loop.test/").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsupported_scheme() {
        assert!(matches!(
            fetcher().fetch_str("ftp://example.com/x").await,
            Err(FetchError::UnsupportedScheme(ref s)) if s == "ftp"
        ));
    }

    #[tokio::test]
    async fn parse_errors_surface() {
        assert!(matches!(
            fetcher().fetch_str("").await,
            Err(FetchError::Url(UrlParseError::Empty))
        ));
        assert!(matches!(
            fetcher().fetch_str("data:no-comma").await,
            Err(FetchError::Url(UrlParseError::MissingDataComma))
        ));
    }

    #[tokio::test]
    async fn data_urls() {
        let f = fetcher();
        assert_eq!(
            f.fetch_str("data:,Hello").await.unwrap(),
            Content::PlainText {
                text: "Hello".to_string()
            }
        );
        assert_eq!(
            f.fetch_str("data:;base64,SGVsbG8sIFdvcmxkIQ==").await.unwrap(),
            Content::PlainText {
                text: "Hello, World!".to_string()
            }
        );
        assert_eq!(
            f.fetch_str("data:text/html,<b>hi</b>").await.unwrap(),
            Content::Html {
                data: b"<b>hi</b>".to_vec()
            }
        );
        assert_eq!(
            f.fetch_str("data:text/plain;charset=iso-8859-1,caf\u{e9}").await.unwrap(),
            Content::PlainText {
                text: "caf\u{e9}".to_string()
            }
        );
        assert_eq!(
            f.fetch_str("data:text/plain;charset=utf-16,hi").await.unwrap(),
            Content::PlainText {
                text: "hi".to_string()
            }
        );
    }

    #[tokio::test]
    async fn about_pages() {
        let f = fetcher();
        assert_eq!(
            f.fetch_str("about:blank").await.unwrap(),
            Content::Html {
                data: b"<html><body>Blank page</body></html>".to_vec()
            }
        );
        assert_eq!(
            f.fetch_str("about:config").await.unwrap(),
            Content::Html {
                data: b"Failed to parse URL with about: scheme".to_vec()
            }
        );
    }

    #[tokio::test]
    async fn view_source_wraps_inner_content() {
        assert_eq!(
            fetcher().fetch_str("view-source:data:,abc").await.unwrap(),
            Content::ViewSource(Box::new(Content::PlainText {
                text: "abc".to_string()
            }))
        );
        assert!(matches!(
            fetcher().fetch_str("view-source:").await,
            Err(FetchError::Url(UrlParseError::MissingPath(_)))
        ));
    }

    #[tokio::test]
    async fn file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "local text").unwrap();
        let url = format!("file://{}", path.display());
        assert_eq!(
            fetcher().fetch_str(&url).await.unwrap(),
            Content::PlainText {
                text: "local text".to_string()
            }
        );
        let missing = format!("file://{}", dir.path().join("absent").display());
        assert!(matches!(
            fetcher().fetch_str(&missing).await,
            Err(FetchError::Io(_))
        ));
    }
}

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

//! Per-scheme URL handlers and the registry the fetcher dispatches through.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::content::Content;
use crate::error::{FetchError, Result};
use crate::fetcher::ContentFetcher;
use crate::protocol::about::AboutUrlHandler;
use crate::protocol::data::DataUrlHandler;
use crate::protocol::file::FileUrlHandler;
use crate::protocol::http::{HttpClient, HttpHandler};
use crate::protocol::view_source::ViewSourceUrlHandler;
use crate::url::{ConcreteUrl, Scheme, Url};

/// Target of a redirect, already resolved against the URL that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectInfo {
    pub url: Url,
}

/// What a handler produced for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Content(Content),
    Redirect(RedirectInfo),
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Fetched>> + Send + 'a>>;

/// Fetches one resolved URL. `fetcher` is available to handlers that fetch other URLs.
pub trait UrlHandler: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a ConcreteUrl, fetcher: &'a ContentFetcher) -> HandlerFuture<'a>;
}

/// Handlers by scheme.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<Scheme, Arc<dyn UrlHandler>>,
}

impl HandlerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in scheme; http and https share `client`.
    pub fn with_defaults(client: Arc<HttpClient>) -> Self {
        let mut registry = Self::new();
        let http: Arc<dyn UrlHandler> = Arc::new(HttpHandler::new(client));
        registry.register(Scheme::Http, http.clone());
        registry.register(Scheme::Https, http);
        registry.register(Scheme::File, Arc::new(FileUrlHandler));
        registry.register(Scheme::Data, Arc::new(DataUrlHandler));
        registry.register(Scheme::About, Arc::new(AboutUrlHandler));
        registry.register(Scheme::ViewSource, Arc::new(ViewSourceUrlHandler));
        registry
    }

    /// Install `handler` for `scheme`, replacing any previous one.
    pub fn register(&mut self, scheme: Scheme, handler: Arc<dyn UrlHandler>) {
        self.handlers.insert(scheme, handler);
    }

    pub fn get(&self, scheme: Scheme) -> Result<Arc<dyn UrlHandler>> {
        self.handlers
            .get(&scheme)
            .cloned()
            .ok_or_else(|| FetchError::UnsupportedScheme(scheme.as_str().to_string()))
    }
}

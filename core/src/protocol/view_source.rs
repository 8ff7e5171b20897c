/*
 * view_source.rs
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

//! `view-source:` wraps whatever its inner URL fetches to.

use crate::content::Content;
use crate::error::FetchError;
use crate::fetcher::ContentFetcher;
use crate::handler::{Fetched, HandlerFuture, UrlHandler};
use crate::url::{ConcreteUrl, Url};

pub struct ViewSourceUrlHandler;

impl UrlHandler for ViewSourceUrlHandler {
    fn fetch<'a>(&'a self, url: &'a ConcreteUrl, fetcher: &'a ContentFetcher) -> HandlerFuture<'a> {
        Box::pin(async move {
            let inner = match url {
                ConcreteUrl::ViewSource(v) => Url::parse(&v.inner)?,
                other => return Err(FetchError::UnsupportedScheme(other.scheme().to_string())),
            };
            let content = fetcher.fetch(&inner).await?;
            Ok(Fetched::Content(Content::ViewSource(Box::new(content))))
        })
    }
}

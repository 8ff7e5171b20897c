/*
 * file.rs
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

//! `file:` URLs: read a local file as text.

use crate::content::Content;
use crate::error::{FetchError, UrlParseError};
use crate::fetcher::ContentFetcher;
use crate::handler::{Fetched, HandlerFuture, UrlHandler};
use crate::url::ConcreteUrl;

/// Reads the file named by the URL path. The host is ignored; contents are decoded as
/// UTF-8 with invalid sequences replaced.
pub struct FileUrlHandler;

impl UrlHandler for FileUrlHandler {
    fn fetch<'a>(&'a self, url: &'a ConcreteUrl, _fetcher: &'a ContentFetcher) -> HandlerFuture<'a> {
        Box::pin(async move {
            let file = match url {
                ConcreteUrl::File(f) => f,
                other => return Err(FetchError::UnsupportedScheme(other.scheme().to_string())),
            };
            let path = file
                .path
                .as_deref()
                .ok_or_else(|| UrlParseError::MissingPath("file".to_string()))?;
            log::debug!("reading {}", path);
            let bytes = tokio::fs::read(path).await?;
            Ok(Fetched::Content(Content::PlainText {
                text: String::from_utf8_lossy(&bytes).into_owned(),
            }))
        })
    }
}

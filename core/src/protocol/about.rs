/*
 * about.rs
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

//! `about:` pages.

use crate::content::Content;
use crate::error::FetchError;
use crate::fetcher::ContentFetcher;
use crate::handler::{Fetched, HandlerFuture, UrlHandler};
use crate::url::ConcreteUrl;

const BLANK_PAGE: &[u8] = b"<html><body>Blank page</body></html>";
const UNKNOWN_PAGE: &[u8] = b"Failed to parse URL with about: scheme";

pub struct AboutUrlHandler;

impl UrlHandler for AboutUrlHandler {
    fn fetch<'a>(&'a self, url: &'a ConcreteUrl, _fetcher: &'a ContentFetcher) -> HandlerFuture<'a> {
        Box::pin(async move {
            let page = match url {
                ConcreteUrl::About(about) if about.path == "blank" => BLANK_PAGE,
                ConcreteUrl::About(_) => UNKNOWN_PAGE,
                other => return Err(FetchError::UnsupportedScheme(other.scheme().to_string())),
            };
            Ok(Fetched::Content(Content::Html {
                data: page.to_vec(),
            }))
        })
    }
}

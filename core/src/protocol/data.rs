/*
 * data.rs
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

//! `data:` URLs: payload comes from the URL itself.

use crate::content::{encode_text, recognize_content};
use crate::error::FetchError;
use crate::fetcher::ContentFetcher;
use crate::handler::{Fetched, HandlerFuture, UrlHandler};
use crate::url::ConcreteUrl;

pub struct DataUrlHandler;

impl UrlHandler for DataUrlHandler {
    fn fetch<'a>(&'a self, url: &'a ConcreteUrl, _fetcher: &'a ContentFetcher) -> HandlerFuture<'a> {
        Box::pin(async move {
            let data = match url {
                ConcreteUrl::Data(d) => d,
                other => return Err(FetchError::UnsupportedScheme(other.scheme().to_string())),
            };
            // Literal text is stored in the declared charset so the recognizer decodes it back.
            let bytes = match data.media_type.parameter("charset") {
                Some(charset) if !data.is_base64 => encode_text(&data.data, charset),
                _ => data.get_data()?,
            };
            Ok(Fetched::Content(recognize_content(
                Some(&data.media_type),
                bytes,
            )))
        })
    }
}

/*
 * content.rs
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

//! Typed content model and the recognizer that classifies raw bytes by media type.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, WINDOWS_1252};

use crate::media_type::MediaType;

/// Charset assumed for `text/plain` when none is declared.
pub const DEFAULT_TEXT_CHARSET: &str = "iso-8859-1";

/// Image subtypes the renderer knows how to paint.
const IMAGE_SUBTYPES: &[&str] = &["jpeg", "png", "gif", "webp", "svg+xml", "bmp"];

/// What a fetch produces. Always one of these variants, never raw unclassified bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Html { data: Vec<u8> },
    PlainText { text: String },
    Image { bytes: Vec<u8>, media_type: MediaType },
    Unhandled { bytes: Vec<u8>, media_type: MediaType },
    /// No usable media type was given.
    Unknown { bytes: Vec<u8> },
    /// Produced by `view-source:`; wraps what the inner URL resolved to.
    ViewSource(Box<Content>),
}

impl Content {
    pub fn media_type(&self) -> Option<&MediaType> {
        match self {
            Content::Image { media_type, .. } | Content::Unhandled { media_type, .. } => {
                Some(media_type)
            }
            _ => None,
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Html { .. } => "html",
            Content::PlainText { .. } => "text",
            Content::Image { .. } => "image",
            Content::Unhandled { .. } => "unhandled",
            Content::Unknown { .. } => "unknown",
            Content::ViewSource(_) => "view-source",
        }
    }
}

/// Classify `data` by `media_type`. `None` means the type was absent or unparseable and
/// yields `Unknown`; no sniffing is attempted.
pub fn recognize_content(media_type: Option<&MediaType>, data: Vec<u8>) -> Content {
    let media_type = match media_type {
        Some(m) => m,
        None => return Content::Unknown { bytes: data },
    };
    if media_type.is_mime_type("text", "html") {
        Content::Html { data }
    } else if media_type.is_mime_type("text", "plain") {
        let charset = media_type.parameter("charset").unwrap_or(DEFAULT_TEXT_CHARSET);
        Content::PlainText {
            text: decode_text(&data, charset),
        }
    } else if media_type.primary_type() == "image" && IMAGE_SUBTYPES.contains(&media_type.sub_type())
    {
        Content::Image {
            bytes: data,
            media_type: media_type.clone(),
        }
    } else {
        Content::Unhandled {
            bytes: data,
            media_type: media_type.clone(),
        }
    }
}

/// Decode `bytes` using a charset label. Unknown labels fall back to windows-1252, the
/// superset browsers use for iso-8859-1 and us-ascii.
pub fn decode_text(bytes: &[u8], charset: &str) -> String {
    let encoding = Encoding::for_label(charset.trim().as_bytes()).unwrap_or(WINDOWS_1252);
    let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Encode `text` in the charset named by `label`, with the same fallback as `decode_text`.
/// Characters the charset cannot represent become numeric character references.
pub fn encode_text(text: &str, label: &str) -> Vec<u8> {
    let encoding = Encoding::for_label(label.trim().as_bytes()).unwrap_or(WINDOWS_1252);
    // encoding_rs only encodes to its output encodings, which map UTF-16 to UTF-8.
    if encoding == UTF_16LE {
        return text.encode_utf16().flat_map(u16::to_le_bytes).collect();
    }
    if encoding == UTF_16BE {
        return text.encode_utf16().flat_map(u16::to_be_bytes).collect();
    }
    let (bytes, _, _had_errors) = encoding.encode(text);
    bytes.into_owned()
}

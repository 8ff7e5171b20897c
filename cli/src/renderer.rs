/*
 * renderer.rs
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

//! Plain-text rendering of fetched content.

use std::io::{self, Write};

use segnalibro_core::Content;

pub trait Renderer {
    fn render(&mut self, content: &Content, viewport_width: usize) -> io::Result<()>;
}

/// Prints content to a writer. Text is wrapped to the viewport width; HTML is printed as
/// is; binary content gets a one-line description.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write_wrapped(&mut self, text: &str, width: usize) -> io::Result<()> {
        for line in wrap(text, width) {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, content: &Content, viewport_width: usize) -> io::Result<()> {
        match content {
            Content::Html { data } => {
                self.out.write_all(data)?;
                if !data.ends_with(b"\n") {
                    writeln!(self.out)?;
                }
            }
            Content::PlainText { text } => self.write_wrapped(text, viewport_width)?,
            Content::Image { bytes, media_type } => {
                writeln!(self.out, "[image {}, {} bytes]", media_type.essence(), bytes.len())?
            }
            Content::Unhandled { bytes, media_type } => writeln!(
                self.out,
                "[unhandled {}, {} bytes]",
                media_type.essence(),
                bytes.len()
            )?,
            Content::Unknown { bytes } => {
                writeln!(self.out, "[content of unknown type, {} bytes]", bytes.len())?
            }
            Content::ViewSource(inner) => match inner.as_ref() {
                Content::Html { data } => {
                    self.write_wrapped(&String::from_utf8_lossy(data), viewport_width)?
                }
                other => self.render(other, viewport_width)?,
            },
        }
        self.out.flush()
    }
}

/// Greedy word wrap. Existing line breaks are kept; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for source_line in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;
        for word in source_line.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }
            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use segnalibro_core::{MediaType, ParsedMediaType};

    fn render(content: &Content, width: usize) -> String {
        let mut r = TextRenderer::new(Vec::new());
        r.render(content, width).unwrap();
        String::from_utf8(r.into_inner()).unwrap()
    }

    #[test]
    fn wraps_words() {
        assert_eq!(wrap("the quick brown fox", 10), vec!["the quick", "brown fox"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn renders_each_kind() {
        let text = Content::PlainText {
            text: "hello wide world".to_string(),
        };
        assert_eq!(render(&text, 10), "hello wide\nworld\n");

        let html = Content::Html {
            data: b"<p>x</p>".to_vec(),
        };
        assert_eq!(render(&html, 3), "<p>x</p>\n");

        let png = match MediaType::parse("image/png").unwrap() {
            ParsedMediaType::Valid(m) => m,
            ParsedMediaType::Invalid(_) => unreachable!(),
        };
        let image = Content::Image {
            bytes: vec![0; 3],
            media_type: png,
        };
        assert_eq!(render(&image, 80), "[image image/png, 3 bytes]\n");

        let source = Content::ViewSource(Box::new(Content::Html {
            data: b"<a> <b>".to_vec(),
        }));
        assert_eq!(render(&source, 3), "<a>\n<b>\n");
    }
}

/*
 * parser.rs
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

//! HTTP/1.x response push parser: status line, headers, body (Content-Length, chunked, or
//! read until close).

use bytes::Buf;
use bytes::BytesMut;

use crate::error::FetchError;

/// Callback for HTTP/1.x response events. The connection implements this to assemble a response.
pub trait H1ResponseHandler {
    fn status(&mut self, version: &str, code: u16, reason: &str);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]);
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Idle,
    StatusLine,
    Headers,
    /// Headers done; connection must call set_body_mode().
    HeadersComplete,
    Body,
    ChunkSize,
    ChunkData,
    ChunkDataEnd,
    ChunkTrailer,
}

/// Push parser for one HTTP/1.x response. Feed bytes via `receive`; the handler is invoked
/// as complete tokens are parsed.
pub struct ResponseParser {
    state: ParseState,
    /// Content-Length when known (None for chunked or read-until-close).
    content_length: Option<u64>,
    bytes_received: u64,
    chunk_remaining: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            content_length: None,
            bytes_received: 0,
            chunk_remaining: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ParseState::StatusLine;
        self.content_length = None;
        self.bytes_received = 0;
        self.chunk_remaining = 0;
    }

    /// Offset of the first CRLF in buf, if any.
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    /// Split off one CRLF-terminated line and return it without the CRLF, as ISO-8859-1 text.
    fn take_line(buf: &mut BytesMut) -> Option<String> {
        let line_end = Self::find_crlf(buf)?;
        let line = buf.split_to(line_end + 2);
        Some(line[..line_end].iter().map(|&b| b as char).collect())
    }

    /// Consume and parse as much as possible from buf. Partial data remains in buf.
    pub fn receive<H: H1ResponseHandler>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<(), FetchError> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let line = match Self::take_line(buf) {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    // HTTP/1.1 200 OK; the reason may contain spaces or be missing.
                    let mut parts = line.splitn(3, ' ');
                    let version = parts.next().unwrap_or("");
                    let code = parts.next().and_then(|s| s.trim().parse::<u16>().ok());
                    let reason = parts.next().unwrap_or("").trim_end();
                    match code {
                        Some(code) if version.starts_with("HTTP/") => {
                            handler.status(version, code, reason)
                        }
                        _ => {
                            return Err(FetchError::protocol(format!(
                                "malformed status line: {:?}",
                                line
                            )))
                        }
                    }
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line = match Self::take_line(buf) {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.state = ParseState::HeadersComplete;
                        return Ok(()); // Connection will set_body_mode and call receive again
                    }
                    let (name, value) = line.split_once(':').ok_or_else(|| {
                        FetchError::protocol(format!("malformed header line: {:?}", line))
                    })?;
                    handler.header(&name.trim().to_ascii_lowercase(), value.trim());
                }
                ParseState::HeadersComplete => {
                    // Waiting for connection to call set_body_mode()
                    return Ok(());
                }
                ParseState::Body => match self.content_length {
                    Some(content_length) => {
                        let remaining = (content_length - self.bytes_received) as usize;
                        let to_read = remaining.min(buf.len());
                        if to_read > 0 {
                            let chunk = buf.split_to(to_read);
                            handler.body_chunk(&chunk);
                            self.bytes_received += to_read as u64;
                        }
                        if self.bytes_received >= content_length {
                            handler.complete();
                            self.state = ParseState::Idle;
                        }
                    }
                    None => {
                        // Read until close: deliver all available; finish() ends the body.
                        let chunk = buf.split_to(buf.len());
                        handler.body_chunk(&chunk);
                        return Ok(());
                    }
                },
                ParseState::ChunkSize => {
                    let line = match Self::take_line(buf) {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    let hex_part = line.split(';').next().unwrap_or("").trim();
                    self.chunk_remaining = u64::from_str_radix(hex_part, 16).map_err(|_| {
                        FetchError::protocol(format!("invalid chunk size: {:?}", line))
                    })?;
                    self.state = if self.chunk_remaining == 0 {
                        ParseState::ChunkTrailer
                    } else {
                        ParseState::ChunkData
                    };
                }
                ParseState::ChunkData => {
                    let to_read = (self.chunk_remaining as usize).min(buf.len());
                    let chunk = buf.split_to(to_read);
                    handler.body_chunk(&chunk);
                    self.chunk_remaining -= to_read as u64;
                    if self.chunk_remaining == 0 {
                        self.state = ParseState::ChunkDataEnd;
                    }
                }
                ParseState::ChunkDataEnd => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    if &buf[..2] != b"\r\n" {
                        return Err(FetchError::protocol("missing CRLF after chunk data"));
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
                ParseState::ChunkTrailer => {
                    let line = match Self::take_line(buf) {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    // Trailer fields are read and dropped.
                    if line.is_empty() {
                        handler.complete();
                        self.state = ParseState::Idle;
                    }
                }
                ParseState::Idle => return Ok(()),
            }
        }
        Ok(())
    }

    /// Called by the connection after headers are received (state HeadersComplete).
    /// `has_body` is false for responses that never carry one (1xx, 204, 304, HEAD).
    pub fn set_body_mode<H: H1ResponseHandler>(
        &mut self,
        content_length: Option<u64>,
        chunked: bool,
        has_body: bool,
        handler: &mut H,
    ) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        self.bytes_received = 0;
        if !has_body || (!chunked && content_length == Some(0)) {
            self.content_length = Some(0);
            handler.complete();
            self.state = ParseState::Idle;
        } else if chunked {
            self.content_length = None;
            self.state = ParseState::ChunkSize;
        } else {
            self.content_length = content_length;
            self.state = ParseState::Body;
        }
    }

    /// The peer closed the connection. Completes a read-until-close body; anything else is
    /// a truncated response.
    pub fn finish<H: H1ResponseHandler>(&mut self, handler: &mut H) -> Result<(), FetchError> {
        match self.state {
            ParseState::Idle => Ok(()),
            ParseState::Body if self.content_length.is_none() => {
                handler.complete();
                self.state = ParseState::Idle;
                Ok(())
            }
            state => Err(FetchError::protocol(format!(
                "connection closed before response was complete ({:?})",
                state
            ))),
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        status: Option<(String, u16, String)>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        completed: bool,
    }

    impl H1ResponseHandler for Recorder {
        fn status(&mut self, version: &str, code: u16, reason: &str) {
            self.status = Some((version.to_string(), code, reason.to_string()));
        }
        fn header(&mut self, name: &str, value: &str) {
            self.headers.push((name.to_string(), value.to_string()));
        }
        fn body_chunk(&mut self, data: &[u8]) {
            self.body.extend_from_slice(data);
        }
        fn complete(&mut self) {
            self.completed = true;
        }
    }

    fn header_value<'a>(r: &'a Recorder, name: &str) -> Option<&'a str> {
        r.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Drive the parser the way the connection does, with the whole input at once.
    fn parse_all(input: &[u8], eof: bool) -> Result<Recorder, FetchError> {
        let mut parser = ResponseParser::new();
        let mut rec = Recorder::default();
        let mut buf = BytesMut::from(input);
        loop {
            parser.receive(&mut buf, &mut rec)?;
            if parser.state() == ParseState::HeadersComplete {
                let chunked = header_value(&rec, "transfer-encoding") == Some("chunked");
                let cl = header_value(&rec, "content-length").and_then(|v| v.parse().ok());
                parser.set_body_mode(cl, chunked, true, &mut rec);
                continue;
            }
            break;
        }
        if eof {
            parser.finish(&mut rec)?;
        }
        Ok(rec)
    }

    #[test]
    fn content_length_body() {
        let rec = parse_all(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello",
            false,
        )
        .unwrap();
        assert_eq!(
            rec.status,
            Some(("HTTP/1.1".to_string(), 200, "OK".to_string()))
        );
        assert_eq!(header_value(&rec, "content-type"), Some("text/plain"));
        assert_eq!(rec.body, b"hello");
        assert!(rec.completed);
    }

    #[test]
    fn status_message_keeps_spaces() {
        let rec = parse_all(
            b"HTTP/1.0 404 Not Found Here\r\nContent-Length: 0\r\n\r\n",
            false,
        )
        .unwrap();
        assert_eq!(
            rec.status,
            Some(("HTTP/1.0".to_string(), 404, "Not Found Here".to_string()))
        );
        assert!(rec.completed);
    }

    #[test]
    fn chunked_body() {
        let rec = parse_all(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n0\r\n\r\n",
            false,
        )
        .unwrap();
        assert_eq!(rec.body, b"Wiki");
        assert!(rec.completed);
    }

    #[test]
    fn chunked_with_extensions_and_trailers() {
        let rec = parse_all(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
              5;name=value\r\nhello\r\n1\r\n \r\n5\r\nworld\r\n0\r\nExpires: never\r\n\r\n",
            false,
        )
        .unwrap();
        assert_eq!(rec.body, b"hello world");
        assert!(rec.completed);
    }

    #[test]
    fn chunked_body_split_across_reads() {
        let input: &[u8] =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let mut parser = ResponseParser::new();
        let mut rec = Recorder::default();
        let mut buf = BytesMut::new();
        for byte in input {
            buf.extend_from_slice(&[*byte]);
            loop {
                parser.receive(&mut buf, &mut rec).unwrap();
                if parser.state() == ParseState::HeadersComplete {
                    parser.set_body_mode(None, true, true, &mut rec);
                    continue;
                }
                break;
            }
        }
        assert_eq!(rec.body, b"Wikipedia");
        assert!(rec.completed);
    }

    #[test]
    fn final_response_follows_interim_in_same_buffer() {
        let mut parser = ResponseParser::new();
        let mut buf = BytesMut::from(
            &b"HTTP/1.1 103 Early Hints\r\nLink: </a.css>\r\n\r\n\
               HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nfinal"[..],
        );
        let mut interim = Recorder::default();
        parser.receive(&mut buf, &mut interim).unwrap();
        assert_eq!(parser.state(), ParseState::HeadersComplete);
        assert_eq!(interim.status.as_ref().map(|s| s.1), Some(103));
        assert!(!interim.completed);

        parser.reset();
        let mut rec = Recorder::default();
        parser.receive(&mut buf, &mut rec).unwrap();
        assert_eq!(parser.state(), ParseState::HeadersComplete);
        parser.set_body_mode(Some(5), false, true, &mut rec);
        parser.receive(&mut buf, &mut rec).unwrap();
        assert_eq!(rec.status.as_ref().map(|s| s.1), Some(200));
        assert_eq!(header_value(&rec, "link"), None);
        assert_eq!(rec.body, b"final");
        assert!(rec.completed);
        assert!(buf.is_empty());
    }

    #[test]
    fn read_until_close() {
        let rec = parse_all(b"HTTP/1.0 200 OK\r\n\r\nall of it", true).unwrap();
        assert_eq!(rec.body, b"all of it");
        assert!(rec.completed);
    }

    #[test]
    fn truncated_content_length_body_fails_on_close() {
        let err = parse_all(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort", true)
            .err()
            .unwrap();
        assert!(matches!(err, FetchError::Protocol(_)));
    }

    #[test]
    fn malformed_input() {
        assert!(parse_all(b"garbage\r\n\r\n", false).is_err());
        assert!(parse_all(b"HTTP/1.1 abc OK\r\n\r\n", false).is_err());
        assert!(parse_all(b"HTTP/1.1 200 OK\r\nno colon here\r\n\r\n", false).is_err());
        assert!(parse_all(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n",
            false
        )
        .is_err());
    }
}

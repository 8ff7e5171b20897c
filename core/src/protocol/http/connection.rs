/*
 * connection.rs
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

//! HTTP connection: one TCP or TLS stream, drives the H1 parser and assembles an HttpResponse.

use std::io::{self, Read};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use flate2::read::GzDecoder;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;

use crate::error::{FetchError, Result};
use crate::protocol::http::h1::{H1ResponseHandler, ParseState, ResponseParser};
use crate::protocol::http::headers::HeaderMap;
use crate::protocol::http::request::{HttpRequest, HttpVersion, Method};
use crate::protocol::http::response::HttpResponse;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Collects H1 parser callbacks into the parts of an HttpResponse.
#[derive(Default)]
struct ResponseCollector {
    version: String,
    status_code: u16,
    status_message: String,
    headers: HeaderMap,
    body: Vec<u8>,
    complete: bool,
}

impl H1ResponseHandler for ResponseCollector {
    fn status(&mut self, version: &str, code: u16, reason: &str) {
        self.version = version.to_string();
        self.status_code = code;
        self.status_message = reason.to_string();
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_ascii_lowercase(), value);
    }

    fn body_chunk(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    fn complete(&mut self) {
        self.complete = true;
    }
}

/// HTTP/1.x connection. One request at a time; call send() to run an exchange.
pub struct HttpConnection {
    id: u64,
    stream: HttpStream,
    host: String,
    port: u16,
    secure: bool,
    read_buf: BytesMut,
    parser: ResponseParser,
    /// False once the peer or the framing rules out another exchange on this stream.
    reusable: bool,
}

impl HttpConnection {
    /// Wrap an already-connected stream. Used by HttpClient::connect().
    pub fn new(stream: HttpStream, host: String, port: u16, secure: bool) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            stream,
            host,
            port,
            secure,
            read_buf: BytesMut::with_capacity(8192),
            parser: ResponseParser::new(),
            reusable: true,
        }
    }

    /// Process-unique id, for logging.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn is_reusable(&self) -> bool {
        self.reusable
    }

    /// Write the request and read until the response is complete. Each read is bounded by
    /// `read_timeout`. The body is returned after transfer and content decoding.
    pub async fn send(
        &mut self,
        request: &HttpRequest,
        read_timeout: Duration,
    ) -> Result<HttpResponse> {
        self.reusable = false;
        self.parser.reset();
        self.read_buf.clear();

        let encoded = request.encode();
        timeout(read_timeout, async {
            self.stream.write_all(&encoded).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| FetchError::Timeout("write"))??;

        let mut collector = ResponseCollector::default();
        let mut read_to_close = false;
        let mut peer_closed = false;
        loop {
            self.parser.receive(&mut self.read_buf, &mut collector)?;
            match self.parser.state() {
                ParseState::HeadersComplete if is_interim(collector.status_code) => {
                    log::debug!(
                        "connection {}: skipping interim {} {}",
                        self.id,
                        collector.status_code,
                        collector.status_message
                    );
                    collector = ResponseCollector::default();
                    self.parser.reset();
                    continue;
                }
                ParseState::HeadersComplete => {
                    let (content_length, chunked, has_body) =
                        body_framing(request, &collector)?;
                    read_to_close = has_body && !chunked && content_length.is_none();
                    self.parser
                        .set_body_mode(content_length, chunked, has_body, &mut collector);
                    continue;
                }
                ParseState::Idle => break,
                _ => {}
            }
            let n = timeout(read_timeout, self.stream.read_buf(&mut self.read_buf))
                .await
                .map_err(|_| FetchError::Timeout("read"))??;
            if n == 0 {
                peer_closed = true;
                self.parser.finish(&mut collector)?;
                break;
            }
        }
        if !collector.complete {
            return Err(FetchError::protocol("incomplete response"));
        }

        let body = decode_content(&collector.headers, std::mem::take(&mut collector.body))?;
        let response = HttpResponse {
            version: collector.version,
            status_code: collector.status_code,
            status_message: collector.status_message,
            headers: collector.headers,
            body,
            request: request.clone(),
        };
        self.reusable = !read_to_close && !peer_closed && keep_alive(request, &response);
        Ok(response)
    }

    /// Shut down the stream. Errors are logged, not returned: the connection is gone either way.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            log::debug!("connection {} to {}:{}: shutdown: {}", self.id, self.host, self.port, e);
        }
    }
}

/// 1xx informational response that precedes the final one. 101 ends HTTP on the stream.
fn is_interim(code: u16) -> bool {
    (100..200).contains(&code) && code != 101
}

/// Content-Length, chunked, and whether the response carries a body at all.
fn body_framing(
    request: &HttpRequest,
    collector: &ResponseCollector,
) -> Result<(Option<u64>, bool, bool)> {
    let code = collector.status_code;
    let has_body = request.method != Method::Head
        && !(100..200).contains(&code)
        && code != 204
        && code != 304;
    let chunked = collector
        .headers
        .get("transfer-encoding")
        .map(|v| v.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);
    let content_length = match collector.headers.get("content-length") {
        Some(v) if !chunked => Some(v.trim().parse::<u64>().map_err(|_| {
            FetchError::protocol(format!("invalid Content-Length: {:?}", v))
        })?),
        _ => None,
    };
    Ok((content_length, chunked, has_body))
}

/// Whether both sides allow another request on this connection.
fn keep_alive(request: &HttpRequest, response: &HttpResponse) -> bool {
    if response.status_code == 101 {
        return false;
    }
    let request_allows = match request.version {
        HttpVersion::Http11 => !request.headers.value_is("connection", "close"),
        HttpVersion::Http10 => request.headers.value_is("connection", "keep-alive"),
    };
    let response_allows = if response.version.eq_ignore_ascii_case("HTTP/1.0") {
        response.headers.value_is("connection", "keep-alive")
    } else {
        !response.connection_close()
    };
    request_allows && response_allows
}

/// Undo `Content-Encoding`. Only gzip and identity are understood.
fn decode_content(headers: &HeaderMap, body: Vec<u8>) -> Result<Vec<u8>> {
    let encoding = match headers.get("content-encoding") {
        Some(v) => v.trim().to_ascii_lowercase(),
        None => return Ok(body),
    };
    match encoding.as_str() {
        "" | "identity" => Ok(body),
        "gzip" | "x-gzip" => {
            let mut out = Vec::with_capacity(body.len() * 2);
            GzDecoder::new(&body[..])
                .read_to_end(&mut out)
                .map_err(|e| FetchError::InvalidData(format!("gzip: {}", e)))?;
            Ok(out)
        }
        other => Err(FetchError::UnsupportedContentEncoding(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Accept one connection, read the request head, write `reply`, then keep the socket open
    /// until the client goes away unless `close_after` is set.
    async fn serve_once(reply: Vec<u8>, close_after: bool) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut tmp = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut tmp).await.unwrap();
                if n == 0 {
                    return;
                }
                buf.extend_from_slice(&tmp[..n]);
            }
            sock.write_all(&reply).await.unwrap();
            if close_after {
                sock.shutdown().await.ok();
            } else {
                let _ = sock.read(&mut tmp).await;
            }
        });
        port
    }

    async fn connect(port: u16) -> HttpConnection {
        let tcp = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        HttpConnection::new(HttpStream::Plain(tcp), "127.0.0.1".into(), port, false)
    }

    fn get() -> HttpRequest {
        let mut req = HttpRequest::get("/", HttpVersion::Http11);
        req.header("Host", "127.0.0.1").header("Connection", "keep-alive");
        req
    }

    #[tokio::test]
    async fn content_length_response_keeps_connection() {
        let port = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello".to_vec(),
            false,
        )
        .await;
        let mut conn = connect(port).await;
        let resp = conn.send(&get(), TIMEOUT).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.status_message, "OK");
        assert_eq!(resp.headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(resp.body, b"hello");
        assert_eq!(resp.request, get());
        assert!(conn.is_reusable());
    }

    #[tokio::test]
    async fn gzip_body_is_decoded() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"compressed text").unwrap();
        let gz = enc.finish().unwrap();
        let mut reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\n\r\n",
            gz.len()
        )
        .into_bytes();
        reply.extend_from_slice(&gz);
        let port = serve_once(reply, false).await;
        let mut conn = connect(port).await;
        let resp = conn.send(&get(), TIMEOUT).await.unwrap();
        assert_eq!(resp.body, b"compressed text");
    }

    #[tokio::test]
    async fn unknown_content_encoding_fails() {
        let port = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Encoding: br\r\nContent-Length: 3\r\n\r\nabc".to_vec(),
            false,
        )
        .await;
        let mut conn = connect(port).await;
        let err = conn.send(&get(), TIMEOUT).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedContentEncoding(ref e) if e == "br"));
        assert!(!conn.is_reusable());
    }

    #[tokio::test]
    async fn read_to_close_body_is_not_reusable() {
        let port = serve_once(b"HTTP/1.1 200 OK\r\n\r\nuntil the end".to_vec(), true).await;
        let mut conn = connect(port).await;
        let resp = conn.send(&get(), TIMEOUT).await.unwrap();
        assert_eq!(resp.body, b"until the end");
        assert!(!conn.is_reusable());
    }

    #[tokio::test]
    async fn connection_close_and_http10_are_not_reusable() {
        let port = serve_once(
            b"HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 0\r\n\r\n".to_vec(),
            false,
        )
        .await;
        let mut conn = connect(port).await;
        conn.send(&get(), TIMEOUT).await.unwrap();
        assert!(!conn.is_reusable());

        let port = serve_once(b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n".to_vec(), false).await;
        let mut conn = connect(port).await;
        conn.send(&get(), TIMEOUT).await.unwrap();
        assert!(!conn.is_reusable());
    }

    #[tokio::test]
    async fn no_content_has_no_body() {
        let port = serve_once(b"HTTP/1.1 204 No Content\r\n\r\n".to_vec(), false).await;
        let mut conn = connect(port).await;
        let resp = conn.send(&get(), TIMEOUT).await.unwrap();
        assert_eq!(resp.status_code, 204);
        assert!(resp.body.is_empty());
        assert!(conn.is_reusable());
    }

    #[tokio::test]
    async fn interim_responses_are_skipped() {
        let port = serve_once(
            b"HTTP/1.1 100 Continue\r\n\r\n\
              HTTP/1.1 103 Early Hints\r\nLink: </style.css>; rel=preload\r\n\r\n\
              HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nfinal"
                .to_vec(),
            false,
        )
        .await;
        let mut conn = connect(port).await;
        let resp = conn.send(&get(), TIMEOUT).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.headers.get("link"), None);
        assert_eq!(resp.body, b"final");
        assert!(conn.is_reusable());
    }

    #[tokio::test]
    async fn switching_protocols_is_final_and_not_reusable() {
        let port = serve_once(
            b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n".to_vec(),
            false,
        )
        .await;
        let mut conn = connect(port).await;
        let resp = conn.send(&get(), TIMEOUT).await.unwrap();
        assert_eq!(resp.status_code, 101);
        assert!(resp.body.is_empty());
        assert!(!conn.is_reusable());
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut tmp = [0u8; 1024];
            while sock.read(&mut tmp).await.map(|n| n > 0).unwrap_or(false) {}
        });
        let mut conn = connect(port).await;
        let err = conn
            .send(&get(), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout("read")));
    }

    #[tokio::test]
    async fn truncated_response_fails() {
        let port = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 50\r\n\r\nshort".to_vec(),
            true,
        )
        .await;
        let mut conn = connect(port).await;
        assert!(matches!(
            conn.send(&get(), TIMEOUT).await,
            Err(FetchError::Protocol(_))
        ));
    }
}

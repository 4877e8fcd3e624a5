//! The response sink handed to middleware and handlers.
//!
//! Nothing reaches the socket until the whole chain has finished: the writer
//! buffers status, headers and body, and the server converts it into a hyper
//! response afterwards. A chain that writes nothing produces `200 OK` with an
//! empty body.

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use tracing::warn;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseWriter::bytes`].
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_static(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// Buffered response sink.
///
/// The status is committed by the first call to [`set_status`](Self::set_status)
/// or the first body write, whichever comes first. Later status changes are
/// ignored and logged, so a middleware that already answered `401` cannot be
/// silently overridden further down the chain.
///
/// ```rust
/// use wisp::{ContentType, ResponseWriter};
/// use http::StatusCode;
///
/// let mut res = ResponseWriter::new();
/// res.set_status(StatusCode::CREATED);
/// res.insert_header(http::header::LOCATION, http::HeaderValue::from_static("/users/42"));
/// res.bytes(ContentType::Json, br#"{"id":42}"#);
/// ```
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    status_committed: bool,
    written: bool,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            status_committed: false,
            written: false,
        }
    }

    /// A writer with `status` already committed.
    pub fn with_status(status: StatusCode) -> Self {
        let mut res = Self::new();
        res.set_status(status);
        res
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Whether anything (status or body) has been written yet.
    pub fn is_written(&self) -> bool { self.written }

    pub fn set_status(&mut self, status: StatusCode) {
        if self.status_committed {
            warn!(current = %self.status, ignored = %status, "status already written");
            return;
        }
        self.status = status;
        self.status_committed = true;
        self.written = true;
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Appends raw bytes to the body, committing the current status.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.status_committed = true;
        self.written = true;
        self.body.extend_from_slice(chunk.as_ref());
    }

    /// Appends `body` as `text/plain; charset=utf-8`.
    pub fn text(&mut self, body: impl AsRef<str>) {
        self.bytes(ContentType::Text, body.as_ref());
    }

    /// Appends `body` as `application/json`. Pass bytes straight from the
    /// serialiser (`serde_json::to_vec(&val)?`, `format!(..).into_bytes()`).
    pub fn json(&mut self, body: impl AsRef<[u8]>) {
        self.bytes(ContentType::Json, body);
    }

    /// Appends a typed body. The content type is only set if no earlier
    /// write chose one.
    pub fn bytes(&mut self, content_type: ContentType, body: impl AsRef<[u8]>) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_static()));
        }
        self.write(body);
    }

    /// Converts the buffered state into the response hyper sends.
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_writer_is_empty_ok() {
        let res = ResponseWriter::new();
        assert!(!res.is_written());
        let response = res.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().is_empty());
    }

    #[test]
    fn first_status_wins() {
        let mut res = ResponseWriter::new();
        res.set_status(StatusCode::UNAUTHORIZED);
        res.set_status(StatusCode::OK);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn body_write_commits_status() {
        let mut res = ResponseWriter::new();
        res.text("hello");
        res.set_status(StatusCode::NOT_FOUND);
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), b"hello");
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn writes_append_and_keep_first_content_type() {
        let mut res = ResponseWriter::new();
        res.json(b"[1,");
        res.text("2]");
        assert_eq!(res.body(), b"[1,2]");
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    }
}

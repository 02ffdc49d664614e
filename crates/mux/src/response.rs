//! Response side of the handler contract.
//!
//! Handlers write into a [`ResponseWriter`] instead of returning a response,
//! so several handlers in a middleware chain can contribute to the same
//! response. The writer is turned into an [`http::Response`] once the mux is done.

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use http_body::Body as HttpBody;
use http_body_util::Full;

/// The body type of responses produced by [`ResponseWriter::into_response`].
pub type ResponseBody = Full<Bytes>;

/// A buffering response recorder.
///
/// The status is fixed by the first call to [`write_header`](Self::write_header);
/// writing body bytes before any status implies `200 OK`.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the response status, later calls are ignored.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    /// Appends bytes to the body.
    pub fn write(&mut self, bytes: impl AsRef<[u8]>) {
        self.write_header(StatusCode::OK);
        self.body.extend_from_slice(bytes.as_ref());
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The status written so far, `200 OK` if nothing was written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns true once a status or body bytes have been written.
    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Discards the status, headers and body written so far.
    pub fn reset(&mut self) {
        self.status = None;
        self.headers.clear();
        self.body.clear();
    }

    /// Builds the final response, filling in `content-length` when it is not set.
    pub fn into_response(self) -> Response<ResponseBody> {
        let body = Full::new(self.body.freeze());
        let mut headers = self.headers;

        if !headers.contains_key(CONTENT_LENGTH) {
            if let Some(len) = body.size_hint().exact() {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
            }
        }

        let mut response = Response::new(body);
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = headers;
        response
    }
}

/// Replies with a plain text error: `text` followed by a newline.
///
/// The text is appended to whatever body was written so far, call
/// [`ResponseWriter::reset`] first to discard it. Any `content-length` set
/// earlier is dropped.
pub fn error(writer: &mut ResponseWriter, text: &str, status: StatusCode) {
    let headers = writer.headers_mut();
    headers.remove(CONTENT_LENGTH);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    writer.write_header(status);
    writer.write(text);
    writer.write("\n");
}

/// Replies with the canonical reason phrase of `status`, e.g. `"Not Found\n"`.
pub fn status_error(writer: &mut ResponseWriter, status: StatusCode) {
    error(writer, status.canonical_reason().unwrap_or_default(), status);
}

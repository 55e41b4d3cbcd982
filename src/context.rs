//! Per-request handler context
//!
//! A [`Context`] is created by the dispatcher for exactly one request and
//! moved into the handler. It owns the request and a handle to the request's
//! [`ResponseWriter`]; nothing in it outlives the dispatch call.

use crate::error::{BoxError, StatusError};
use crate::http::{HttpResponse, PathParams};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{AsHeaderName, HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct WriterState {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

/// Response sink for a single request.
///
/// Mirrors the usual streaming-writer contract: the first status written
/// wins, writing body bytes without a status commits `200 OK`, and header
/// changes after the status is committed are ignored.
///
/// Cloning yields another handle to the same response; the dispatcher keeps
/// one to build the final [`HttpResponse`] after the handler returns.
#[derive(Debug, Clone, Default)]
pub struct ResponseWriter {
    inner: Arc<Mutex<WriterState>>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a response header, replacing any previous value.
    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        let mut state = self.lock();
        if state.status.is_some() {
            tracing::debug!(header = %name, "header set after status was written, ignoring");
            return;
        }
        state.headers.insert(name, value);
    }

    pub fn header(&self, name: impl AsHeaderName) -> Option<HeaderValue> {
        self.lock().headers.get(name).cloned()
    }

    /// Status committed so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.lock().status
    }

    pub fn is_committed(&self) -> bool {
        self.status().is_some()
    }

    /// Commit the response status. Only the first call has an effect.
    pub fn write_header(&self, status: StatusCode) {
        let mut state = self.lock();
        match state.status {
            Some(current) => {
                tracing::warn!(%current, attempted = %status, "superfluous write_header call");
            }
            None => state.status = Some(status),
        }
    }

    /// Append bytes to the body, committing `200 OK` if no status was written.
    pub fn write(&self, data: impl AsRef<[u8]>) -> usize {
        let data = data.as_ref();
        let mut state = self.lock();
        state.status.get_or_insert(StatusCode::OK);
        state.body.extend_from_slice(data);
        data.len()
    }

    /// Build the final response from everything written so far.
    pub fn into_response(self) -> HttpResponse {
        let state = match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => {
                std::mem::take(&mut *shared.lock().unwrap_or_else(PoisonError::into_inner))
            }
        };

        let mut resp = Response::new(Full::new(Bytes::from(state.body)));
        *resp.status_mut() = state.status.unwrap_or(StatusCode::OK);
        *resp.headers_mut() = state.headers;
        resp
    }
}

/// Request and response sink handed to a handler.
#[derive(Debug)]
pub struct Context {
    writer: ResponseWriter,
    request: Request<Bytes>,
}

impl Context {
    pub const fn new(writer: ResponseWriter, request: Request<Bytes>) -> Self {
        Self { writer, request }
    }

    pub const fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn query(&self) -> Option<&str> {
        self.request.uri().query()
    }

    /// Request header value, if present and valid visible ASCII.
    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.request.headers().get(name)?.to_str().ok()
    }

    /// Named path parameter captured by the route pattern, e.g. `name` for
    /// `/users/{name}`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.extensions().get::<PathParams>()?.get(name)
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// Deserialize the request body as JSON.
    pub fn decode_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(self.request.body())
    }

    pub const fn response(&self) -> &ResponseWriter {
        &self.writer
    }

    pub fn set_status(&self, status: StatusCode) {
        self.writer.write_header(status);
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.writer.set_header(name, value);
    }

    /// Serialize `value` as JSON and write it as the response body.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), BoxError> {
        let body = serde_json::to_vec(value)?;
        self.writer.write(body);
        Ok(())
    }

    pub fn text(&self, body: &str) {
        self.writer.write(body);
    }

    /// Build a [`StatusError`] answering with `status`.
    ///
    /// Nothing is written here; the handler has to return the error:
    ///
    /// ```
    /// # use errhttp::{BoxError, Context, StatusCode};
    /// async fn handler(c: Context) -> Result<(), BoxError> {
    ///     if c.body().is_empty() {
    ///         return Err(c.fail("empty body", StatusCode::BAD_REQUEST).into());
    ///     }
    ///     c.json(&"ok")
    /// }
    /// ```
    pub fn fail(&self, err: impl Into<BoxError>, status: StatusCode) -> StatusError {
        StatusError::new(err, status)
    }
}

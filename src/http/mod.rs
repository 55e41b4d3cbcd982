//! HTTP protocol layer module
//!
//! Shared request/response types and the plain-text and JSON response
//! builders used by the router, dispatcher and middleware.

pub mod response;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::string::FromUtf8Error;
use std::sync::Arc;

pub use response::{
    build_404_response, build_405_response, build_413_response, build_error_response,
    build_no_content_response, json_error_body,
};

/// Response type produced by every endpoint.
pub type HttpResponse = Response<Full<Bytes>>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A request-handling function: the unit middleware wraps and the router
/// stores. The request body has already been collected.
pub type Endpoint = Arc<dyn Fn(Request<Bytes>) -> BoxFuture<'static, HttpResponse> + Send + Sync>;

/// Named path parameters captured by the router, stored in request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'k, 'v> TryFrom<matchit::Params<'k, 'v>> for PathParams {
    type Error = FromUtf8Error;

    /// Captured values are percent-decoded; a value that decodes to invalid
    /// UTF-8 is an error.
    fn try_from(params: matchit::Params<'k, 'v>) -> Result<Self, Self::Error> {
        params
            .iter()
            .map(|(k, v)| Ok((k.to_owned(), urlencoding::decode(v)?.into_owned())))
            .collect::<Result<HashMap<_, _>, FromUtf8Error>>()
            .map(Self)
    }
}

/// Wrap an async closure into an [`Endpoint`].
pub fn endpoint<F, Fut>(f: F) -> Endpoint
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    Arc::new(move |req: Request<Bytes>| -> BoxFuture<'static, HttpResponse> {
        Box::pin(f(req))
    })
}

//! Permissive CORS middleware

use crate::http::{build_no_content_response, endpoint, Endpoint};
use hyper::body::Bytes;
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS,
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::{Method, Request};
use std::sync::Arc;

pub const ALLOW_HEADERS: &str = "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, \
Authorization, accept, origin, Cache-Control, X-Requested-With";
pub const ALLOW_METHODS: &str = "POST, GET, OPTIONS, PUT, DELETE";

/// Add CORS headers to every response.
///
/// `OPTIONS` requests are answered here with an empty `204 No Content` and
/// never reach `next`. Headers already set by the wrapped endpoint are kept.
pub fn cors(next: Endpoint) -> Endpoint {
    endpoint(move |req: Request<Bytes>| {
        let next = Arc::clone(&next);
        async move {
            if *req.method() == Method::OPTIONS {
                tracing::debug!(path = %req.uri().path(), "answering CORS preflight");
                let mut resp = build_no_content_response();
                apply_headers(resp.headers_mut());
                return resp;
            }

            let mut resp = next(req).await;
            apply_headers(resp.headers_mut());
            resp
        }
    })
}

fn apply_headers(headers: &mut HeaderMap) {
    let pairs: [(HeaderName, &'static str); 4] = [
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
        (ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
        (ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
    ];
    for (name, value) in pairs {
        headers
            .entry(name)
            .or_insert_with(|| HeaderValue::from_static(value));
    }
}

//! HTTP response building module
//!
//! Plain-text error responses follow the `http.Error` convention: UTF-8 text
//! body terminated by a newline, `nosniff`, and no caching hints.

use super::HttpResponse;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use hyper::{Response, StatusCode};
use serde::Serialize;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// JSON envelope written for handler errors.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub message: &'a str,
}

/// Serialize `{"message": <message>}`
pub fn json_error_body(message: &str) -> serde_json::Result<Bytes> {
    serde_json::to_vec(&ErrorBody { message }).map(Bytes::from)
}

/// Build a plain-text error response with the given status
pub fn build_error_response(status: StatusCode, message: &str) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Full::new(Bytes::from(format!("{message}\n"))))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback(status)
        })
}

/// Build 204 No Content response (empty body)
pub fn build_no_content_response() -> HttpResponse {
    fallback(StatusCode::NO_CONTENT)
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_error_response(StatusCode::NOT_FOUND, "404 page not found")
}

/// Build 405 Method Not Allowed response listing the allowed methods
pub fn build_405_response(allow: &str) -> HttpResponse {
    let mut resp = build_error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    match allow.parse() {
        Ok(value) => {
            resp.headers_mut().insert(ALLOW, value);
        }
        Err(e) => tracing::warn!(error = %e, allow, "invalid Allow header value"),
    }
    resp
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> HttpResponse {
    build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request Entity Too Large")
}

fn fallback(status: StatusCode) -> HttpResponse {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    tracing::error!(%status, %error, "failed to build response");
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(resp: HttpResponse) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_is_plain_text_with_newline() {
        let resp = build_error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()[CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(resp.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(body_string(resp).await, "Unauthorized\n");
    }

    #[tokio::test]
    async fn test_no_content_has_empty_body() {
        let resp = build_no_content_response();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(body_string(resp).await.is_empty());
    }

    #[test]
    fn test_405_sets_allow() {
        let resp = build_405_response("GET, HEAD");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[ALLOW], "GET, HEAD");
    }
}

//! HTTP Basic authentication middleware
//!
//! Credentials are compared byte for byte: no hashing and no
//! constant-time comparison. Rejections are written as plain-text errors,
//! not the JSON envelope used for handler errors.

use super::Middleware;
use crate::http::{build_error_response, endpoint, Endpoint, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use hyper::{Request, StatusCode};
use std::fmt;
use std::sync::Arc;

/// Challenge sent when the `Authorization` header is missing.
pub const CHALLENGE: &str = r#"Basic realm="Restricted""#;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No `Authorization` header.
    Missing,
    /// Header is not `Basic <payload>`.
    Malformed,
    /// Payload is not valid base64.
    Undecodable,
    /// Decoded payload is not `user:pass` or does not match.
    InvalidCredentials,
}

impl AuthRejection {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Missing | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Malformed | Self::Undecodable => StatusCode::BAD_REQUEST,
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::Missing => "Authorization required",
            Self::Malformed | Self::Undecodable => "Bad request",
            Self::InvalidCredentials => "Unauthorized",
        }
    }

    pub fn into_response(self) -> HttpResponse {
        let mut resp = build_error_response(self.status(), self.message());
        if self == Self::Missing {
            resp.headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
        }
        resp
    }
}

/// Expected username and password.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Validate an `Authorization` header value.
    pub fn check(&self, header: Option<&HeaderValue>) -> Result<(), AuthRejection> {
        let header = header.ok_or(AuthRejection::Missing)?;
        let header = header.to_str().map_err(|_| AuthRejection::Malformed)?;

        let (scheme, payload) = header.split_once(' ').ok_or(AuthRejection::Malformed)?;
        if scheme != "Basic" {
            return Err(AuthRejection::Malformed);
        }

        let decoded = STANDARD
            .decode(payload)
            .map_err(|_| AuthRejection::Undecodable)?;

        // Split on the first colon; the password may contain more.
        let colon = decoded
            .iter()
            .position(|&b| b == b':')
            .ok_or(AuthRejection::InvalidCredentials)?;
        let (user, pass) = (&decoded[..colon], &decoded[colon + 1..]);
        if user == self.username.as_bytes() && pass == self.password.as_bytes() {
            Ok(())
        } else {
            Err(AuthRejection::InvalidCredentials)
        }
    }

    /// Wrap `next` so it only runs for requests carrying these credentials.
    pub fn wrap(&self, next: Endpoint) -> Endpoint {
        let auth = self.clone();
        endpoint(move |req: Request<Bytes>| {
            let next = Arc::clone(&next);
            let verdict = auth.check(req.headers().get(AUTHORIZATION));
            async move {
                match verdict {
                    Ok(()) => next(req).await,
                    Err(rejection) => {
                        tracing::debug!(
                            path = %req.uri().path(),
                            ?rejection,
                            "basic auth rejected request"
                        );
                        rejection.into_response()
                    }
                }
            }
        })
    }

    pub fn into_middleware(self) -> Middleware {
        Arc::new(move |next: Endpoint| self.wrap(next))
    }
}

/// Wrap `next` with basic authentication against `username` and `password`.
pub fn basic_auth(next: Endpoint, username: &str, password: &str) -> Endpoint {
    BasicAuth::new(username, password).wrap(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};
    use hyper::Response;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn guarded(reached: Arc<AtomicBool>) -> Endpoint {
        let inner = endpoint(move |_req: Request<Bytes>| {
            let reached = Arc::clone(&reached);
            async move {
                reached.store(true, Ordering::SeqCst);
                Response::new(Full::new(Bytes::from_static(b"secret")))
            }
        });
        basic_auth(inner, "user", "pass")
    }

    fn request(authorization: Option<&str>) -> Request<Bytes> {
        let mut builder = Request::builder().uri("/admin");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Bytes::new()).unwrap()
    }

    fn encoded(credentials: &str) -> String {
        format!("Basic {}", STANDARD.encode(credentials))
    }

    async fn body(resp: HttpResponse) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_header_challenges() {
        let reached = Arc::new(AtomicBool::new(false));
        let resp = guarded(Arc::clone(&reached))(request(None)).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers()[WWW_AUTHENTICATE], CHALLENGE);
        assert_eq!(body(resp).await, "Authorization required\n");
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_valid_credentials_reach_handler() {
        let reached = Arc::new(AtomicBool::new(false));
        let auth = encoded("user:pass");
        let resp = guarded(Arc::clone(&reached))(request(Some(&auth))).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, "secret");
        assert!(reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let reached = Arc::new(AtomicBool::new(false));
        let auth = encoded("user:wrong");
        let resp = guarded(Arc::clone(&reached))(request(Some(&auth))).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(!resp.headers().contains_key(WWW_AUTHENTICATE));
        assert_eq!(body(resp).await, "Unauthorized\n");
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_non_base64_payload_is_bad_request() {
        let reached = Arc::new(AtomicBool::new(false));
        let resp = guarded(Arc::clone(&reached))(request(Some("Basic !!not-base64!!"))).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(resp).await, "Bad request\n");
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[test]
    fn test_check_rejections() {
        let auth = BasicAuth::new("user", "pass");
        let check = |value: &str| auth.check(Some(&HeaderValue::from_str(value).unwrap()));

        assert_eq!(auth.check(None), Err(AuthRejection::Missing));
        assert_eq!(check("Bearer abc"), Err(AuthRejection::Malformed));
        assert_eq!(check("Basic"), Err(AuthRejection::Malformed));
        assert_eq!(check("basic dXNlcjpwYXNz"), Err(AuthRejection::Malformed));
        assert_eq!(check("Basic %%%"), Err(AuthRejection::Undecodable));
        assert_eq!(
            check(&encoded("userpass")),
            Err(AuthRejection::InvalidCredentials)
        );
        assert_eq!(
            check(&encoded("other:pass")),
            Err(AuthRejection::InvalidCredentials)
        );
        assert_eq!(check(&encoded("user:pass")), Ok(()));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let auth = BasicAuth::new("user", "p:a:ss");
        let value = HeaderValue::from_str(&encoded("user:p:a:ss")).unwrap();
        assert_eq!(auth.check(Some(&value)), Ok(()));
    }

    #[test]
    fn test_credentials_compare_raw_bytes() {
        let auth = BasicAuth::new("u", "\u{FFFD}");
        let raw = format!("Basic {}", STANDARD.encode(b"u:\xFF"));
        let value = HeaderValue::from_str(&raw).unwrap();
        assert_eq!(
            auth.check(Some(&value)),
            Err(AuthRejection::InvalidCredentials)
        );

        let exact = format!("Basic {}", STANDARD.encode("u:\u{FFFD}"));
        let value = HeaderValue::from_str(&exact).unwrap();
        assert_eq!(auth.check(Some(&value)), Ok(()));
    }

    #[test]
    fn test_debug_redacts_password() {
        let auth = BasicAuth::new("user", "hunter2");
        let printed = format!("{auth:?}");
        assert!(printed.contains("user"));
        assert!(!printed.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_as_middleware() {
        let m = BasicAuth::new("user", "pass").into_middleware();
        let wrapped = m(endpoint(|_req: Request<Bytes>| async {
            Response::new(Full::new(Bytes::new()))
        }));
        let resp = wrapped(request(None)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

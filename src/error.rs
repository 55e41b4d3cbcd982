//! Error types
//!
//! [`StatusError`] is what handlers return to pick a response status.
//! [`Error`] covers failures of the framework itself (route registration,
//! binding, configuration).

use hyper::StatusCode;
use std::io;

/// Boxed error returned by handlers. Anything implementing
/// `std::error::Error + Send + Sync` converts into it with `?`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error paired with the HTTP status it should be answered with.
///
/// Its `Display` output is the wrapped error's, so the JSON body written by
/// the dispatcher contains the original message only.
///
/// Constructing a `StatusError` has no effect by itself: it must be returned
/// from the handler for the dispatcher to see it.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
#[must_use = "a StatusError does nothing unless it is returned from the handler"]
pub struct StatusError {
    source: BoxError,
    status: StatusCode,
}

impl StatusError {
    pub fn new(err: impl Into<BoxError>, status: StatusCode) -> Self {
        Self {
            source: err.into(),
            status,
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

/// Framework-level failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid route: {0}")]
    Route(#[from] matchit::InsertError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_displays_inner_message() {
        let err = StatusError::new("name is required", StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "name is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_error_wraps_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such item");
        let err = StatusError::new(io_err, StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "no such item");
        let inner = err.into_inner();
        assert!(inner.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn test_status_error_survives_boxing() {
        let boxed: BoxError = StatusError::new("gone", StatusCode::GONE).into();
        let err = boxed
            .downcast_ref::<StatusError>()
            .expect("should downcast back to StatusError");
        assert_eq!(err.status(), StatusCode::GONE);
    }
}

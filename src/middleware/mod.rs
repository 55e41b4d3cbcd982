//! Middleware module
//!
//! A [`Middleware`] transforms one [`Endpoint`] into another. The router
//! applies its configured chain to every endpoint at registration time.

mod basic_auth;
mod cors;

pub use basic_auth::{basic_auth, AuthRejection, BasicAuth, CHALLENGE};
pub use cors::{cors, ALLOW_HEADERS, ALLOW_METHODS};

use crate::http::Endpoint;
use std::sync::Arc;

pub type Middleware = Arc<dyn Fn(Endpoint) -> Endpoint + Send + Sync>;

/// Compose `middleware` into a single transform.
///
/// The first entry ends up outermost, so it sees the request first and the
/// response last. An empty list is the identity.
pub fn chain(middleware: Vec<Middleware>) -> Middleware {
    Arc::new(move |endpoint: Endpoint| {
        middleware
            .iter()
            .rev()
            .fold(endpoint, |next, m| m(next))
    })
}

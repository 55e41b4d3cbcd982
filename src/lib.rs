//! Error-returning HTTP handlers on top of hyper.
//!
//! Handlers receive a [`Context`] and return `Result<(), BoxError>`. A
//! [`StatusError`] carries an explicit status code; any other error becomes
//! `500 Internal Server Error`. Both produce a JSON body of the form
//! `{"message": "<error text>"}`.
//!
//! ```no_run
//! use errhttp::{BoxError, Context, Router, StatusCode};
//!
//! async fn hello(c: Context) -> Result<(), BoxError> {
//!     let Some(name) = c.param("name").map(str::to_owned) else {
//!         return Err(c.fail("missing name", StatusCode::BAD_REQUEST).into());
//!     };
//!     c.json(&serde_json::json!({ "hello": name }))
//! }
//!
//! # async fn run() -> errhttp::Result<()> {
//! let mut router = Router::new();
//! router.cors().get("/hello/{name}", hello)?;
//! router.start("127.0.0.1:8080").await
//! # }
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod router;
pub mod server;

pub use context::{Context, ResponseWriter};
pub use dispatcher::{dispatch, Handler};
pub use error::{BoxError, Error, Result, StatusError};
pub use http::{endpoint, BoxFuture, Endpoint, HttpResponse, PathParams};
pub use hyper::{Method, StatusCode};
pub use middleware::{basic_auth, chain, cors, BasicAuth, Middleware};
pub use router::Router;

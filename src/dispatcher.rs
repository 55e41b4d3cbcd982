//! Dispatcher
//!
//! Turns a [`Handler`] into an [`Endpoint`]: supplies a fresh [`Context`]
//! per request and translates a returned error into a JSON error response.

use crate::context::{Context, ResponseWriter};
use crate::error::{BoxError, StatusError};
use crate::http::response::{json_error_body, APPLICATION_JSON};
use crate::http::{BoxFuture, Endpoint, HttpResponse};
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, StatusCode};
use std::future::Future;
use std::sync::Arc;

/// An async function from [`Context`] to an optional error.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> BoxFuture<'static, Result<(), BoxError>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, Result<(), BoxError>> {
        Box::pin(self(ctx))
    }
}

/// Wrap `handler` so that it can be served.
///
/// The response content type is set to `application/json` before the
/// handler runs. On `Err`, a [`StatusError`] answers with its own status and
/// any other error with `500`; the body is `{"message": "<error text>"}`.
pub fn dispatch<H: Handler>(handler: H) -> Endpoint {
    let handler = Arc::new(handler);
    Arc::new(move |req: Request<Bytes>| -> BoxFuture<'static, HttpResponse> {
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();

            let writer = ResponseWriter::new();
            writer.set_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
            let ctx = Context::new(writer.clone(), req);

            if let Err(err) = handler.call(ctx).await {
                let status = err
                    .downcast_ref::<StatusError>()
                    .map_or(StatusCode::INTERNAL_SERVER_ERROR, StatusError::status);

                if status.is_server_error() {
                    tracing::error!(%method, %path, %status, error = %err, "handler failed");
                } else {
                    tracing::debug!(%method, %path, %status, error = %err, "handler rejected request");
                }

                write_error(&writer, status, &err.to_string());
            }

            writer.into_response()
        })
    })
}

fn write_error(writer: &ResponseWriter, status: StatusCode, message: &str) {
    writer.write_header(status);
    match json_error_body(message) {
        Ok(body) => {
            writer.write(body);
        }
        Err(e) => tracing::error!(error = %e, "failed to encode error body"),
    }
}

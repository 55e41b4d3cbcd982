//! Router facade
//!
//! Verb-specific registration on top of a per-method [`matchit`] router.
//! Every registered handler is wrapped as `middleware(dispatch(handler))`
//! using the middleware chain configured at the time of registration.

use crate::config::Config;
use crate::dispatcher::{dispatch, Handler};
use crate::error::{BoxError, Error, Result};
use crate::http::{
    build_404_response, build_405_response, build_413_response, build_error_response, Endpoint,
    HttpResponse, PathParams,
};
use crate::logger::{self, AccessLogEntry, AccessLogFormat};
use crate::middleware::{chain, cors, BasicAuth, Middleware};
use crate::server::{self, ServeOptions};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_LENGTH;
use hyper::{Method, Request, StatusCode};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::string::FromUtf8Error;
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

/// Route table plus the middleware chain applied to new registrations.
///
/// The router holds no per-request state; once serving starts it is shared
/// read-only between connections.
pub struct Router {
    routes: HashMap<Method, matchit::Router<Endpoint>>,
    middleware: Middleware,
    max_body_size: u64,
    access_log: bool,
    access_log_format: AccessLogFormat,
    serve_options: ServeOptions,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.routes.keys().collect::<Vec<_>>())
            .field("max_body_size", &self.max_body_size)
            .field("access_log", &self.access_log)
            .field("serve_options", &self.serve_options)
            .finish_non_exhaustive()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            middleware: chain(Vec::new()),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            access_log: true,
            access_log_format: AccessLogFormat::default(),
            serve_options: ServeOptions::default(),
        }
    }

    /// Build a router with limits, logging and middleware taken from `cfg`.
    ///
    /// With both CORS and basic auth enabled, CORS runs first so that
    /// preflight requests are answered without credentials.
    pub fn from_config(cfg: &Config) -> Self {
        let mut router = Self::new();
        router
            .max_body_size(cfg.server.max_body_size)
            .access_log(cfg.logging.access_log)
            .access_log_format(cfg.logging.access_log_format)
            .serve_options(ServeOptions::from(&cfg.server));

        let mut middleware = Vec::new();
        if cfg.http.enable_cors {
            middleware.push(Arc::new(cors) as Middleware);
        }
        if let Some(credentials) = &cfg.http.basic_auth {
            middleware.push(
                BasicAuth::new(&credentials.username, &credentials.password).into_middleware(),
            );
        }
        router.with_middleware(middleware);
        router
    }

    /// Replace the middleware chain with CORS alone.
    ///
    /// This is not additive: any chain configured earlier is discarded, and
    /// only routes registered afterwards are affected.
    pub fn cors(&mut self) -> &mut Self {
        self.middleware = chain(vec![Arc::new(cors) as Middleware]);
        self
    }

    /// Replace the middleware chain. The first entry runs first.
    pub fn with_middleware(&mut self, middleware: Vec<Middleware>) -> &mut Self {
        self.middleware = chain(middleware);
        self
    }

    /// Reject request bodies larger than `bytes` with `413`.
    pub fn max_body_size(&mut self, bytes: u64) -> &mut Self {
        self.max_body_size = bytes;
        self
    }

    pub fn access_log(&mut self, enabled: bool) -> &mut Self {
        self.access_log = enabled;
        self
    }

    pub fn access_log_format(&mut self, format: AccessLogFormat) -> &mut Self {
        self.access_log_format = format;
        self
    }

    pub fn serve_options(&mut self, options: ServeOptions) -> &mut Self {
        self.serve_options = options;
        self
    }

    pub const fn options(&self) -> &ServeOptions {
        &self.serve_options
    }

    pub fn get<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self> {
        self.handle(Method::GET, path, handler)
    }

    pub fn post<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self> {
        self.handle(Method::POST, path, handler)
    }

    pub fn put<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self> {
        self.handle(Method::PUT, path, handler)
    }

    pub fn delete<H: Handler>(&mut self, path: &str, handler: H) -> Result<&mut Self> {
        self.handle(Method::DELETE, path, handler)
    }

    /// Register `handler` for `method` and the route pattern `path`
    /// (`/users/{name}`, `/files/{*rest}`).
    pub fn handle<H: Handler>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<&mut Self> {
        let endpoint = (self.middleware)(dispatch(handler));
        self.routes
            .entry(method.clone())
            .or_insert_with(matchit::Router::new)
            .insert(path, endpoint)?;
        tracing::debug!(%method, path, "route registered");
        Ok(self)
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Endpoint, std::result::Result<PathParams, FromUtf8Error>)> {
        let matched = self.routes.get(method)?.at(path).ok()?;
        Some((Arc::clone(matched.value), PathParams::try_from(matched.params)))
    }

    /// Methods with a route matching `path`, in a stable order.
    fn allowed_methods(&self, path: &str) -> Vec<String> {
        let mut allowed: Vec<String> = self
            .routes
            .iter()
            .filter(|(_, routes)| routes.at(path).is_ok())
            .map(|(method, _)| method.to_string())
            .collect();
        if allowed.iter().any(|m| m == "GET") && !allowed.iter().any(|m| m == "HEAD") {
            allowed.push(Method::HEAD.to_string());
        }
        allowed.sort();
        allowed
    }

    /// Route a request whose body has already been read.
    ///
    /// `HEAD` falls back to the `GET` route with the body dropped. Unknown
    /// paths get `404`, known paths under another method `405`.
    pub async fn call(&self, mut req: Request<Bytes>) -> HttpResponse {
        let path = req.uri().path().to_owned();

        let mut strip_body = false;
        let found = self.lookup(req.method(), &path).or_else(|| {
            if *req.method() == Method::HEAD {
                strip_body = true;
                self.lookup(&Method::GET, &path)
            } else {
                None
            }
        });

        let Some((endpoint, params)) = found else {
            let allowed = self.allowed_methods(&path);
            return if allowed.is_empty() {
                build_404_response()
            } else {
                build_405_response(&allowed.join(", "))
            };
        };

        let params = match params {
            Ok(params) => params,
            Err(e) => {
                tracing::debug!(%path, error = %e, "path parameter is not valid UTF-8");
                return build_error_response(StatusCode::BAD_REQUEST, "Bad Request");
            }
        };
        req.extensions_mut().insert(params);
        let mut resp = endpoint(req).await;
        if strip_body {
            *resp.body_mut() = Full::new(Bytes::new());
        }
        resp
    }

    /// Read the body of a live request, enforce the size limit, route it and
    /// write the access log line.
    pub async fn serve<B>(&self, req: Request<B>, remote_addr: Option<SocketAddr>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let started = Instant::now();
        let mut entry = self
            .access_log
            .then(|| AccessLogEntry::from_request(&req, remote_addr));

        let resp = match self.read_body(req).await {
            Ok(req) => self.call(req).await,
            Err(resp) => resp,
        };

        if let Some(entry) = entry.as_mut() {
            entry.complete(&resp, started.elapsed());
            logger::log_access(entry, self.access_log_format);
        }
        resp
    }

    async fn read_body<B>(&self, req: Request<B>) -> Result<Request<Bytes>, HttpResponse>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        if let Some(declared) = content_length(&req) {
            if declared > self.max_body_size {
                tracing::warn!(
                    declared,
                    max = self.max_body_size,
                    "request body too large"
                );
                return Err(build_413_response());
            }
        }

        let (parts, body) = req.into_parts();
        let limit = usize::try_from(self.max_body_size).unwrap_or(usize::MAX);
        match Limited::new(body, limit).collect().await {
            Ok(collected) => Ok(Request::from_parts(parts, collected.to_bytes())),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::warn!(max = self.max_body_size, "request body exceeded limit while reading");
                Err(build_413_response())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read request body");
                Err(build_error_response(StatusCode::BAD_REQUEST, "Bad Request"))
            }
        }
    }

    /// Bind `addr` and serve until the process is stopped.
    ///
    /// `addr` is `host:port`, or `:port` for all interfaces. Bind and
    /// listener failures are returned to the caller.
    pub async fn start(self, addr: &str) -> Result<()> {
        self.start_with_shutdown(addr, std::future::pending()).await
    }

    /// Like [`Router::start`], returning once `shutdown` resolves.
    pub async fn start_with_shutdown<F>(self, addr: &str, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = parse_addr(addr)?;
        let listener = server::create_reusable_listener(addr)
            .map_err(|source| Error::Bind { addr, source })?;
        tracing::info!(%addr, "listening");
        server::serve(listener, Arc::new(self), shutdown).await
    }
}

fn content_length<B>(req: &Request<B>) -> Option<u64> {
    let value = req.headers().get(CONTENT_LENGTH)?;
    match value.to_str().ok().and_then(|v| v.parse::<u64>().ok()) {
        Some(size) => Some(size),
        None => {
            tracing::warn!(?value, "invalid Content-Length value, skipping size check");
            None
        }
    }
}

/// Parse `host:port` or `:port`.
pub fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_owned()
    };
    full.parse()
        .map_err(|e| Error::InvalidAddress(format!("{addr}: {e}")))
}

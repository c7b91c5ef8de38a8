//! Request-scoped logging context.
//!
//! The context of a request is its [`Extensions`]: the middleware stores the
//! request's logger, identifier, effective remote address and log toggles
//! there, and handlers read them back with the accessors below. Lookups never
//! fail; a missing value falls back to a no-op logger or an empty string.
//!
//! ```rust,no_run
//! use axum::{extract::Request, http::StatusCode};
//! use service_logging::{get_logger, ignore_request};
//!
//! async fn health(req: Request) -> StatusCode {
//!     ignore_request(&req);
//!     get_logger(&req).debug("health probed");
//!     StatusCode::OK
//! }
//! ```

use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Extensions, Request};

use crate::observability::Logger;

/// Anything carrying request extensions.
pub trait RequestContext {
    fn extensions(&self) -> &Extensions;
    fn extensions_mut(&mut self) -> &mut Extensions;
}

impl RequestContext for Extensions {
    fn extensions(&self) -> &Extensions {
        self
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        self
    }
}

impl<B> RequestContext for Request<B> {
    fn extensions(&self) -> &Extensions {
        Request::extensions(self)
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        Request::extensions_mut(self)
    }
}

impl RequestContext for Parts {
    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Identifier generated for each request, used only for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Effective client address: the first `X-Forwarded-For` hop, else the peer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteAddr(pub String);

/// Per-request switches that handlers may flip on, never off.
#[derive(Debug, Default)]
pub struct RequestToggles {
    ignored: AtomicBool,
    include_query: AtomicBool,
}

impl RequestToggles {
    /// Suppress the completion entry for this request.
    pub fn ignore(&self) {
        self.ignored.store(true, Ordering::Release);
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored.load(Ordering::Acquire)
    }

    /// Add the raw query string to the completion entry.
    pub fn include_query(&self) {
        self.include_query.store(true, Ordering::Release);
    }

    pub fn is_query_included(&self) -> bool {
        self.include_query.load(Ordering::Acquire)
    }
}

/// Attach `logger` to `parent`. Without a logger the parent is returned
/// unchanged.
pub fn with_logger<C: RequestContext>(mut parent: C, logger: Option<Logger>) -> C {
    if let Some(logger) = logger {
        parent.extensions_mut().insert(logger);
    }
    parent
}

/// The context's logger, or a logger that discards everything.
pub fn get_logger<C: RequestContext + ?Sized>(ctx: &C) -> Logger {
    ctx.extensions()
        .get::<Logger>()
        .cloned()
        .unwrap_or_else(Logger::noop)
}

/// The request identifier, or `""` outside the middleware.
pub fn get_request_id<C: RequestContext + ?Sized>(ctx: &C) -> String {
    ctx.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// The effective remote address, or `""` when unknown.
pub fn get_remote_addr<C: RequestContext + ?Sized>(ctx: &C) -> String {
    ctx.extensions()
        .get::<RemoteAddr>()
        .map(|addr| addr.0.clone())
        .unwrap_or_default()
}

/// Suppress this request's completion entry. No-op outside the middleware.
pub fn ignore_request<C: RequestContext + ?Sized>(ctx: &C) {
    if let Some(toggles) = ctx.extensions().get::<Arc<RequestToggles>>() {
        toggles.ignore();
    }
}

/// Include the raw query string in this request's completion entry.
/// No-op outside the middleware.
pub fn include_request_query<C: RequestContext + ?Sized>(ctx: &C) {
    if let Some(toggles) = ctx.extensions().get::<Arc<RequestToggles>>() {
        toggles.include_query();
    }
}

/// Extractor for handlers that only need the toggles.
#[derive(Debug, Clone, Default)]
pub struct RequestLogControl(Option<Arc<RequestToggles>>);

impl RequestLogControl {
    pub fn ignore(&self) {
        if let Some(toggles) = &self.0 {
            toggles.ignore();
        }
    }

    pub fn include_query(&self) {
        if let Some(toggles) = &self.0 {
            toggles.include_query();
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Logger {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(get_logger(&*parts))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestId(get_request_id(&*parts)))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestLogControl {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestLogControl(
            parts.extensions.get::<Arc<RequestToggles>>().cloned(),
        ))
    }
}

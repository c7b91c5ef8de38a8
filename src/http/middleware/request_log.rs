//! Request logging middleware.
//!
//! Every request gets an identifier, a child logger carrying it, and a pair
//! of log toggles, all stored in the request extensions. One INFO `served`
//! entry is written per request once its response is finished:
//!
//! ```text
//! {"severity":"INFO",...,"message":"served","env":"prod","service":"api",
//!  "rid":"r3k9x0","took":0.0021,"method":"GET","path":"/users","remote":"10.0.0.5","status":200}
//! ```
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use service_logging::{Logger, RequestLogLayer};
//!
//! # fn app(logger: Logger) -> Router {
//! Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(RequestLogLayer::new(logger))
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::http::{Request, Response};
use pin_project::pin_project;
use tower::{Layer, Service};

use crate::context::{RemoteAddr, RequestId, RequestToggles};
use crate::http::request::{generate_request_id, remote_addr};
use crate::http::response::{Completion, ObservedBody};
use crate::observability::Logger;

/// Wrap `next` so every request through it is annotated and logged.
pub fn middleware<S>(next: S, logger: Logger) -> RequestLog<S> {
    RequestLogLayer::new(logger).layer(next)
}

/// Layer producing [`RequestLog`] services.
#[derive(Debug, Clone)]
pub struct RequestLogLayer {
    logger: Logger,
    duration: bool,
}

impl RequestLogLayer {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            duration: true,
        }
    }

    /// Include the elapsed time as `took` (seconds). On by default.
    pub fn with_duration(mut self, enabled: bool) -> Self {
        self.duration = enabled;
        self
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLog {
            inner,
            logger: self.logger.clone(),
            duration: self.duration,
        }
    }
}

/// Service that annotates requests and logs their completion.
#[derive(Debug, Clone)]
pub struct RequestLog<S> {
    inner: S,
    logger: Logger,
    duration: bool,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLog<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = Response<ObservedBody<ResBody>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let request_id = generate_request_id();
        let toggles = Arc::new(RequestToggles::default());
        let remote = remote_addr(&req);

        let extensions = req.extensions_mut();
        extensions.insert(self.logger.with_request_id(&request_id));
        extensions.insert(RequestId::new(request_id.clone()));
        extensions.insert(toggles.clone());
        extensions.insert(RemoteAddr(remote.clone()));

        let completion = Completion {
            logger: self.logger.clone(),
            request_id,
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(str::to_string),
            remote,
            toggles,
            started: self.duration.then(Instant::now),
            observation: Default::default(),
        };

        ResponseFuture {
            inner: self.inner.call(req),
            completion: Some(completion),
        }
    }
}

/// Response future for [`RequestLog`].
#[pin_project]
#[derive(Debug)]
pub struct ResponseFuture<F> {
    #[pin]
    inner: F,
    completion: Option<Completion>,
}

impl<F, B, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<ObservedBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));
        let mut completion = this.completion.take();

        // An error drops the completion here, logging status 0.
        let response = result?;
        if let Some(completion) = completion.as_mut() {
            completion.record_status(response.status());
        }
        Poll::Ready(Ok(response.map(|body| ObservedBody::new(body, completion))))
    }
}

//! Response observation.
//!
//! # Responsibilities
//! - Record the first status code a response is given
//! - Forward the response body untouched
//! - Emit the `served` entry once the response is finished
//!
//! # Design Decisions
//! - Completion is a drop guard: it fires when the body ends, errors, or is
//!   dropped, and when the handler unwinds before producing a response
//! - The guard lives in the body, so streaming responses are logged after
//!   their last frame rather than when headers go out

use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::http::{Method, StatusCode};
use hyper::body::{Body, Frame, SizeHint};
use pin_project::pin_project;

use crate::context::RequestToggles;
use crate::observability::Logger;

/// Whether headers were produced, and with which status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResponseObservation {
    status: Option<StatusCode>,
}

impl ResponseObservation {
    /// Record `status` unless one was already recorded. Returns whether this
    /// call was the one that recorded it.
    pub fn record(&mut self, status: StatusCode) -> bool {
        if self.status.is_some() {
            return false;
        }
        self.status = Some(status);
        true
    }

    pub fn headers_written(&self) -> bool {
        self.status.is_some()
    }

    /// Recorded status code, `0` when nothing was written.
    pub fn status(&self) -> u16 {
        self.status.map(|s| s.as_u16()).unwrap_or_default()
    }
}

/// Everything needed to log a finished request.
#[derive(Debug)]
pub(crate) struct Completion {
    pub(crate) logger: Logger,
    pub(crate) request_id: String,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) remote: String,
    pub(crate) toggles: Arc<RequestToggles>,
    pub(crate) started: Option<Instant>,
    pub(crate) observation: ResponseObservation,
}

impl Completion {
    pub(crate) fn record_status(&mut self, status: StatusCode) {
        self.observation.record(status);
    }

    fn emit(&self) {
        if self.toggles.is_ignored() {
            return;
        }
        let took = self.started.map(|started| started.elapsed().as_secs_f64());
        let query = self
            .query
            .as_deref()
            .filter(|q| !q.is_empty() && self.toggles.is_query_included());

        self.logger.in_scope(|| {
            tracing::info!(
                rid = self.request_id.as_str(),
                took,
                method = self.method.as_str(),
                path = self.path.as_str(),
                remote = self.remote.as_str(),
                status = self.observation.status(),
                query,
                "served"
            )
        });
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.emit();
    }
}

/// Response body that reports completion once the wrapped body is done.
///
/// Frames are forwarded as soon as the inner body yields them, so a handler
/// streaming its body is flushed frame by frame by hyper; there is no
/// separate flush capability to pass through.
#[pin_project]
#[derive(Debug)]
pub struct ObservedBody<B> {
    #[pin]
    inner: B,
    completion: Option<Completion>,
}

impl<B> ObservedBody<B> {
    pub(crate) fn new(inner: B, completion: Option<Completion>) -> Self {
        Self { inner, completion }
    }
}

impl<B: Body> Body for ObservedBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let frame = ready!(this.inner.poll_frame(cx));
        if !matches!(frame, Some(Ok(_))) {
            this.completion.take();
        }
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

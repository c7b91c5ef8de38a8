//! Connection takeover and deliberate aborts.
//!
//! The middleware never touches the connection itself. Upgrades keep working
//! because the request's `OnUpgrade` extension is passed through as-is, and a
//! handler that wants to cut the connection after sending an error does so by
//! failing its own response body.

use axum::body::{Body, Bytes};
use axum::http::{Request, Response, StatusCode};
use hyper::upgrade::OnUpgrade;

use crate::error::{Capability, LogError};

/// Take over the request's connection once the response has been sent.
///
/// Fails with [`LogError::Unsupported`] when the transport cannot be
/// upgraded (for instance in tests, or on HTTP/2 without extended CONNECT).
pub fn hijack<B>(req: &mut Request<B>) -> Result<OnUpgrade, LogError> {
    req.extensions_mut()
        .remove::<OnUpgrade>()
        .ok_or(LogError::Unsupported(Capability::Hijack))
}

/// Sentinel error that aborts the connection mid-response.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("handler aborted the connection")]
pub struct AbortHandler;

/// A response that sends `message` with `status`, then aborts the
/// connection instead of completing the body.
pub fn abort_with(status: StatusCode, message: impl Into<Bytes>) -> Response<Body> {
    let message: Bytes = message.into();
    let chunks = futures_util::stream::iter([Ok(message), Err(AbortHandler)]);
    let mut response = Response::new(Body::from_stream(chunks));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hijack_without_upgrade_is_unsupported() {
        let mut req = Request::new(Body::empty());
        let err = hijack(&mut req).unwrap_err();
        assert!(matches!(err, LogError::Unsupported(Capability::Hijack)));
    }

    #[tokio::test]
    async fn test_abort_body_fails_after_message() {
        let response = abort_with(StatusCode::INTERNAL_SERVER_ERROR, "error");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = axum::body::to_bytes(response.into_body(), usize::MAX).await;
        assert!(err.is_err());
    }
}

//! HTTP request logging subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → middleware/request_log.rs (rid, child logger, toggles → extensions)
//!     → request.rs (request id, remote address)
//!     → inner service / handler (reads context, may flip toggles)
//!     → response.rs (record status, wrap body)
//!     → body finished or dropped → `served` entry
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod upgrade;

pub use middleware::{middleware, RequestLog, RequestLogLayer};
pub use request::{generate_request_id, X_FORWARDED_FOR};
pub use response::{ObservedBody, ResponseObservation};
pub use upgrade::{abort_with, hijack, AbortHandler};

//! Environment-aware structured logging and HTTP request logging.
//!
//! ```text
//! Logger::new(service, component, &shutdown)   one per process
//!     → RequestLogLayer                         child logger per request
//!     → handlers: get_logger / Logger extractor
//!     → `served` entry per request
//! ```
//!
//! `ENV` selects the output (`local`, `test`, anything else is production),
//! `DEBUG` lowers the production threshold, `VERSION` sets the version field.

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{Environment, LogConfig};
pub use context::{
    get_logger, get_remote_addr, get_request_id, ignore_request, include_request_query,
    with_logger, RemoteAddr, RequestContext, RequestId, RequestLogControl, RequestToggles,
};
pub use error::{Capability, LogError};
pub use http::{abort_with, hijack, middleware, AbortHandler, RequestLogLayer};
pub use lifecycle::{Shutdown, ShutdownListener};
pub use observability::{Logger, LoggerBuilder, Severity, Stream};

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! LogConfig (env, threshold, version)
//!     → logging.rs (Logger factory: dispatcher + field span)
//!     → format.rs (Cloud Logging JSON) or fmt (human readable)
//!     → sink.rs (shared, flushable byte stream)
//!
//! Teardown:
//!     Shutdown fires → flush hook → sink.flush()
//! ```
//!
//! # Design Decisions
//! - Loggers are explicit handles; nothing is installed globally unless asked
//! - Static fields live in a root span, request fields in a child span
//! - Escalated severities are ERROR events on dedicated targets

pub mod format;
pub mod logging;
pub mod severity;
pub mod sink;
pub mod version;

pub use format::{CloudFields, CloudFormat};
pub use logging::{Logger, LoggerBuilder};
pub use severity::Severity;
pub use sink::{LogSink, Stream};

//! Structured logger construction.
//!
//! A [`Logger`] is a `tracing` dispatcher plus a span carrying the logger's
//! fields. Clones share the dispatcher and sink; child loggers open a child
//! span, so they inherit every parent field and can only add more.
//!
//! The output depends on the configured environment:
//!
//! | env        | format                 | stream | threshold               |
//! |------------|------------------------|--------|-------------------------|
//! | `local`    | human readable (color) | stderr | debug                   |
//! | `test`     | JSON, no timestamp     | stdout | debug                   |
//! | other      | JSON                   | stderr | info (debug if `DEBUG`) |

use std::backtrace::Backtrace;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::panic::Location;

use tracing::{dispatcher, Dispatch, Span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

use super::format::{short_caller, CloudFields, CloudFormat};
use super::severity::EMERGENCY_TARGET;
use super::sink::{LogSink, Stream};
use super::version::resolve_version;
use crate::config::{Environment, LogConfig};
use crate::error::LogError;
use crate::lifecycle::{Shutdown, ShutdownListener};

/// Handle for emitting structured log entries.
///
/// Structured fields go through `tracing` macros inside [`Logger::in_scope`]:
///
/// ```rust,no_run
/// # use service_logging::Logger;
/// # let logger = Logger::noop();
/// logger.in_scope(|| tracing::info!(addr = "0.0.0.0:8080", "listening"));
/// ```
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
    span: Span,
    sink: Option<LogSink>,
}

impl Logger {
    /// Build a logger from `ENV`, `DEBUG` and `VERSION`, flushing its output
    /// once `shutdown` fires.
    pub fn new(service: &str, component: &str, shutdown: &Shutdown) -> Result<Self, LogError> {
        Self::builder(service)
            .component(component)
            .shutdown(shutdown)
            .build()
    }

    pub fn builder(service: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(service)
    }

    /// A logger that discards everything.
    pub fn noop() -> Self {
        Self {
            dispatch: Dispatch::none(),
            span: Span::none(),
            sink: None,
        }
    }

    /// Whether this logger discards everything.
    pub fn is_noop(&self) -> bool {
        self.sink.is_none()
    }

    /// Derive a child logger carrying the `rid` field.
    pub fn with_request_id(&self, request_id: &str) -> Self {
        let span = dispatcher::with_default(&self.dispatch, || {
            tracing::info_span!(parent: &self.span, "request", rid = request_id)
        });
        Self {
            span,
            ..self.clone()
        }
    }

    /// Run `f` with this logger as the current dispatcher and its fields in
    /// scope. Events emitted inside carry the logger's fields.
    pub fn in_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        dispatcher::with_default(&self.dispatch, || self.span.in_scope(f))
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        let caller = caller();
        self.in_scope(|| tracing::debug!(caller = caller.as_str(), "{}", message));
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        let caller = caller();
        self.in_scope(|| tracing::info!(caller = caller.as_str(), "{}", message));
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        let caller = caller();
        self.in_scope(|| tracing::warn!(caller = caller.as_str(), "{}", message));
    }

    /// Log at ERROR with a stack trace.
    #[track_caller]
    pub fn error(&self, message: &str) {
        if self.is_noop() {
            return;
        }
        let caller = caller();
        let stacktrace = stacktrace();
        self.in_scope(|| {
            tracing::error!(
                caller = caller.as_str(),
                stacktrace = stacktrace.as_str(),
                "{}",
                message
            )
        });
    }

    /// Log at ERROR with a stack trace and the failure under `error`.
    ///
    /// ```rust,no_run
    /// # use service_logging::Logger;
    /// # let logger = Logger::noop();
    /// if let Err(err) = std::fs::read("missing.toml") {
    ///     logger.error_with("failed to read config", &err);
    /// }
    /// ```
    #[track_caller]
    pub fn error_with(&self, message: &str, err: &(dyn std::error::Error + 'static)) {
        if self.is_noop() {
            return;
        }
        let caller = caller();
        let stacktrace = stacktrace();
        self.in_scope(|| {
            tracing::error!(
                caller = caller.as_str(),
                error = err,
                stacktrace = stacktrace.as_str(),
                "{}",
                message
            )
        });
    }

    /// Log at EMERGENCY, flush, then panic with `message` as payload.
    ///
    /// The panic is recoverable: a surrounding `catch_unwind` or a
    /// panic-catching HTTP layer decides whether the process or only the
    /// current connection goes down.
    #[track_caller]
    pub fn fatal(&self, message: &str) -> ! {
        let caller = caller();
        let stacktrace = stacktrace();
        self.in_scope(|| {
            tracing::error!(
                target: EMERGENCY_TARGET,
                caller = caller.as_str(),
                stacktrace = stacktrace.as_str(),
                "{}",
                message
            )
        });
        self.flush();
        std::panic::panic_any(message.to_string())
    }

    /// Flush buffered output. Failures are dropped; logging never fails
    /// the caller.
    pub fn flush(&self) {
        if let Some(sink) = &self.sink {
            let _ = sink.flush();
        }
    }

    /// Install this logger's dispatcher as the process-wide default.
    ///
    /// Allowed once per process; events emitted outside
    /// [`Logger::in_scope`] do not carry the logger's fields.
    pub fn install_global(&self) -> Result<(), LogError> {
        dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| LogError::GlobalAlreadySet)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("span", &self.span)
            .field("noop", &self.is_noop())
            .finish()
    }
}

#[track_caller]
fn caller() -> String {
    let location = Location::caller();
    short_caller(location.file(), location.line())
}

fn stacktrace() -> String {
    Backtrace::force_capture().to_string()
}

/// Builder for [`Logger`].
#[derive(Debug)]
pub struct LoggerBuilder {
    service: String,
    component: String,
    config: Option<LogConfig>,
    sink: Option<LogSink>,
    ansi: Option<bool>,
    shutdown: Option<ShutdownListener>,
}

impl LoggerBuilder {
    fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            component: String::new(),
            config: None,
            sink: None,
            ansi: None,
            shutdown: None,
        }
    }

    /// Component name; omitted from entries when empty.
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    /// Use this configuration instead of reading the environment.
    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Write to `writer` instead of stdout/stderr.
    pub fn writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.sink = Some(LogSink::new(writer));
        self
    }

    /// Force colors on or off for local output. Defaults to whether stdout
    /// is a terminal.
    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = Some(ansi);
        self
    }

    /// Flush the output once `shutdown` fires or its last handle is dropped.
    pub fn shutdown(mut self, shutdown: &Shutdown) -> Self {
        self.shutdown = Some(shutdown.listener());
        self
    }

    pub fn build(self) -> Result<Logger, LogError> {
        let config = self.config.unwrap_or_else(LogConfig::from_env);
        let sink = self
            .sink
            .unwrap_or_else(|| LogSink::for_stream(Stream::for_env(&config.env)));

        let level = config.level();
        let dispatch = match &config.env {
            Environment::Local => {
                let ansi = self.ansi.unwrap_or_else(|| io::stdout().is_terminal());
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(sink.clone())
                    .with_ansi(ansi)
                    .with_target(false)
                    .with_filter(level);
                Dispatch::new(tracing_subscriber::registry().with(layer))
            }
            Environment::Test | Environment::Production(_) => {
                let mut format = CloudFormat::new();
                if config.env == Environment::Test {
                    format = format.without_timestamp();
                }
                let layer = tracing_subscriber::fmt::layer()
                    .fmt_fields(CloudFields)
                    .event_format(format)
                    .with_writer(sink.clone())
                    .with_filter(level);
                Dispatch::new(tracing_subscriber::registry().with(layer))
            }
        };

        let component = (!self.component.is_empty()).then_some(self.component.as_str());
        let version = resolve_version(config.version.as_deref());
        let span = dispatcher::with_default(&dispatch, || {
            tracing::info_span!(
                parent: None,
                "logger",
                env = config.env.name(),
                service = self.service.as_str(),
                component = component,
                version = version.as_deref()
            )
        });

        if let Some(shutdown) = self.shutdown {
            spawn_flush_hook(sink.clone(), shutdown)?;
        }

        Ok(Logger {
            dispatch,
            span,
            sink: Some(sink),
        })
    }
}

/// Flush `sink` exactly once, when `shutdown` wakes.
fn spawn_flush_hook(sink: LogSink, shutdown: ShutdownListener) -> Result<(), LogError> {
    std::thread::Builder::new()
        .name("log-flush".into())
        .spawn(move || {
            shutdown.wait_blocking();
            let _ = sink.flush();
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_logger_is_silent() {
        let logger = Logger::noop();
        assert!(logger.is_noop());
        logger.debug("discarded");
        logger.info("discarded");
        logger.error("discarded");
        let child = logger.with_request_id("r1");
        assert!(child.is_noop());
        child.in_scope(|| tracing::info!("discarded"));
    }

    #[test]
    fn test_fatal_on_noop_still_panics() {
        let result = std::panic::catch_unwind(|| Logger::noop().fatal("boom"));
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("boom"));
    }
}

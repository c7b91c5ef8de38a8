//! Cloud Logging compatible JSON entries.
//!
//! One line per event:
//!
//! ```text
//! {"severity":"INFO","timestamp":"...","caller":"src/main.rs:17","message":"served","env":"prod","service":"api","rid":"r1x2y3",...}
//! ```
//!
//! Context fields come from the spans in scope (root first). Spans store
//! them as JSON through [`CloudFields`], so a layer using [`CloudFormat`]
//! must be configured with it as well.

use std::fmt;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::Record;
use tracing::{Event, Subscriber};
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

use super::severity::Severity;

const MESSAGE: &str = "message";
const CALLER: &str = "caller";
const STACKTRACE: &str = "stacktrace";

/// Event formatter producing Cloud Logging entries.
#[derive(Debug, Clone)]
pub struct CloudFormat {
    timestamps: bool,
}

impl CloudFormat {
    pub fn new() -> Self {
        Self { timestamps: true }
    }

    /// Drop the `timestamp` key, for reproducible test output.
    pub fn without_timestamp(mut self) -> Self {
        self.timestamps = false;
        self
    }
}

impl Default for CloudFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, N> FormatEvent<S, N> for CloudFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let mut entry = Map::new();
        entry.insert(
            "severity".into(),
            Severity::from_metadata(meta).as_str().into(),
        );
        if self.timestamps {
            entry.insert("timestamp".into(), timestamp().into());
        }
        let caller = visitor.caller.take().or_else(|| {
            meta.file()
                .map(|file| short_caller(file, meta.line().unwrap_or_default()))
        });
        if let Some(caller) = caller {
            entry.insert(CALLER.into(), caller.into());
        }
        entry.insert(
            MESSAGE.into(),
            visitor.message.take().unwrap_or_default().into(),
        );

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                let Some(fields) = extensions.get::<FormattedFields<N>>() else {
                    continue;
                };
                if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&fields.fields) {
                    entry.extend(fields);
                }
            }
        }

        entry.extend(visitor.fields);
        if let Some(stacktrace) = visitor.stacktrace {
            entry.insert(STACKTRACE.into(), stacktrace.into());
        }

        let line = serde_json::to_string(&entry).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

/// Span field formatter storing fields as a JSON object, in declaration
/// order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudFields;

impl<'writer> FormatFields<'writer> for CloudFields {
    fn format_fields<R: RecordFields>(&self, mut writer: Writer<'writer>, fields: R) -> fmt::Result {
        let mut visitor = EntryVisitor::default();
        fields.record(&mut visitor);
        let json = serde_json::to_string(&visitor.into_fields()).map_err(|_| fmt::Error)?;
        writer.write_str(&json)
    }

    fn add_fields(
        &self,
        current: &'writer mut FormattedFields<Self>,
        fields: &Record<'_>,
    ) -> fmt::Result {
        let mut merged: Map<String, Value> = if current.fields.is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&current.fields).map_err(|_| fmt::Error)?
        };
        let mut visitor = EntryVisitor::default();
        fields.record(&mut visitor);
        merged.extend(visitor.into_fields());
        current.fields = serde_json::to_string(&merged).map_err(|_| fmt::Error)?;
        Ok(())
    }
}

/// RFC 3339 UTC timestamp.
fn timestamp() -> String {
    let mut buf = String::new();
    let _ = SystemTime.format_time(&mut Writer::new(&mut buf));
    buf
}

/// Shorten a source path to its last directory and file name.
pub fn short_caller(file: &str, line: u32) -> String {
    let mut parts = file.rsplitn(3, |c| c == '/' || c == '\\');
    let name = parts.next().unwrap_or(file);
    match parts.next() {
        Some(dir) => format!("{dir}/{name}:{line}"),
        None => format!("{name}:{line}"),
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: Option<String>,
    caller: Option<String>,
    stacktrace: Option<String>,
    fields: Map<String, Value>,
}

impl EntryVisitor {
    /// All recorded fields, including the ones events treat specially.
    fn into_fields(mut self) -> Map<String, Value> {
        let special = [
            (MESSAGE, self.message.take()),
            (CALLER, self.caller.take()),
            (STACKTRACE, self.stacktrace.take()),
        ];
        for (name, value) in special {
            if let Some(value) = value {
                self.fields.insert(name.to_string(), value.into());
            }
        }
        self.fields
    }

    fn record_string(&mut self, field: &Field, value: String) {
        match field.name() {
            MESSAGE => self.message = Some(value),
            CALLER => self.caller = Some(value),
            STACKTRACE => self.stacktrace = Some(value),
            name => {
                self.fields.insert(name.to_string(), value.into());
            }
        }
    }
}

impl Visit for EntryVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_string(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_string(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_string(field, format!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_caller() {
        assert_eq!(short_caller("src/http/middleware.rs", 42), "http/middleware.rs:42");
        assert_eq!(
            short_caller("/home/dev/project/tests/logger.rs", 7),
            "tests/logger.rs:7"
        );
        assert_eq!(short_caller("main.rs", 1), "main.rs:1");
        assert_eq!(short_caller("src\\lib.rs", 3), "src/lib.rs:3");
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'), "{ts}");
        assert!(ts.contains('T'), "{ts}");
    }
}

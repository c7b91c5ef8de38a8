//! Cloud Logging severities.
//!
//! `tracing` stops at ERROR. The escalated severities are expressed as ERROR
//! events on dedicated targets, which the cloud formatter maps back.

use tracing::{Level, Metadata};

/// Target for CRITICAL events.
pub const CRITICAL_TARGET: &str = "severity::critical";
/// Target for ALERT events.
pub const ALERT_TARGET: &str = "severity::alert";
/// Target for EMERGENCY events (fatal log calls).
pub const EMERGENCY_TARGET: &str = "severity::emergency";

/// Severity labels understood by the cloud logging backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    /// Severity for an event, honouring the escalation targets.
    pub fn from_metadata(meta: &Metadata<'_>) -> Self {
        match meta.target() {
            CRITICAL_TARGET => Severity::Critical,
            ALERT_TARGET => Severity::Alert,
            EMERGENCY_TARGET => Severity::Emergency,
            _ => Self::from_level(*meta.level()),
        }
    }

    pub fn from_level(level: Level) -> Self {
        match level {
            Level::TRACE | Level::DEBUG => Severity::Debug,
            Level::INFO => Severity::Info,
            Level::WARN => Severity::Warning,
            Level::ERROR => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }
}

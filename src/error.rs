//! Error types.

use std::fmt;

use crate::config::loader::ConfigError;

/// A response or connection capability that a wrapped transport may lack.
///
/// Flushing is not listed: response bodies are streamed frame by frame, so
/// hyper writes each frame as soon as the body yields it and there is no
/// buffered state to flush (see [`ObservedBody`](crate::http::response::ObservedBody)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Taking over the underlying connection (protocol upgrade).
    Hijack,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Hijack => write!(f, "hijack"),
        }
    }
}

/// Errors surfaced while building or installing a logger.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("a global logger has already been installed")]
    GlobalAlreadySet,

    #[error("capability unsupported: {0}")]
    Unsupported(Capability),
}

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber wakes once
//!             → logger flush hook drains buffered output
//!     last Shutdown dropped → listeners wake as well
//! ```
//!
//! # Design Decisions
//! - The shutdown signal is one-shot and cloneable
//! - The flush hook runs on its own thread so it works with or without a runtime
//! - Callers own the grace period before exiting

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::{shutdown_on_signal, spawn_signal_listener};

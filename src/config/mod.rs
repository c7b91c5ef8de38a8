//! Logger configuration subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (ENV, DEBUG, VERSION)
//!     → LogConfig (immutable, handed to the logger factory)
//! ```
//!
//! # Design Decisions
//! - The environment always wins over the file
//! - All fields have defaults so an empty file is valid
//! - Lookup is injectable so resolution can be tested without touching
//!   the process environment

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{Environment, LogConfig};

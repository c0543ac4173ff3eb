//! cloudscale-converge Common Library
//!
//! Shared error type, configuration and the record/state/diff types used by
//! the reconciler and the CLI.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, ApiToken};
pub use error::{Error, Result};
pub use types::*;

/// cloudscale-converge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Theme Sync CLI Library
//!
//! Command-line host for [`theme_sync`]. Loads configuration, installs the
//! logger and runs the commands behind the `theme-sync` binary.
//!
//! ## Modules
//!
//! - [`commands`] - `list`, `get`, `set` and `watch` implementations
//! - [`config`] - Configuration loading, defaults and validation
//! - [`error`] - Error types and exit codes
//! - [`logger`] - Logging configuration

pub mod commands;
pub mod config;
pub mod error;
pub mod logger;

pub use error::{AppError, AppResult};

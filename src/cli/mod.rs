//! CLI command handlers for PriceGrid.
//!
//! This module provides headless, scriptable access to the price table
//! builder for automation, testing, and CI/CD integration.

pub mod build;
pub mod common;
pub mod config;
pub mod handlers;
pub mod validate;

// Re-export types used by main.rs and tests
pub use build::BuildArgs;
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use handlers::HandlersArgs;
pub use validate::ValidateArgs;

//! Loading of pattern configuration files.
//!
//! This module handles locating pattern files in the configured stores,
//! parsing them into the configuration model, and reporting non-fatal
//! problems found in their content.

pub mod pattern_file;
pub mod store;

// Re-export commonly used functions
pub use pattern_file::{load_configuration, validate_configuration, ConfigWarning};
pub use store::{DirectoryStore, EmbeddedStore, LayeredStore, MemoryStore, PatternStore};

//! Error types for price table construction.

use thiserror::Error;

/// Errors that abort a single build call.
///
/// Mapping misses and UDF parse failures never show up here; they degrade
/// to documented defaults and are only logged.
#[derive(Debug, Error)]
pub enum PriceTableError {
    /// No pattern file exists for the group code in any configured store.
    #[error("no pattern configuration found for group code '{group_code}' (looked in {searched})")]
    ConfigNotFound {
        /// Group code that was requested
        group_code: String,
        /// Human-readable description of the stores that were searched
        searched: String,
    },

    /// The pattern file exists but is not a valid configuration document.
    #[error("failed to parse pattern configuration for group code '{group_code}': {source}")]
    ConfigParse {
        /// Group code whose file failed to parse
        group_code: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The default pattern is missing or disabled.
    #[error(
        "group code '{group_code}' has no enabled pattern matching default pattern \
         '{default_pattern}'"
    )]
    NoEnabledPattern {
        /// Group code being built
        group_code: String,
        /// The `defaultPattern` id from the configuration
        default_pattern: String,
    },

    /// The group code cannot name a pattern file (empty or path-like).
    #[error("invalid group code '{0}'")]
    InvalidGroupCode(String),

    /// The handler registry has no handler for the group code and no fallback.
    #[error("no handler registered for group code '{0}'")]
    HandlerNotFound(String),

    /// A pattern store failed to read its backing storage.
    #[error("failed to read pattern store: {0}")]
    Store(#[from] std::io::Error),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PriceTableError>;

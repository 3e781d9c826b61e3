//! Shared CLI types: error kinds, exit codes, and output helpers.

use serde::Serialize;
use std::fmt;

use crate::error::PriceTableError;

/// Process exit codes used by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Input or configuration was rejected
    ValidationError = 1,
    /// A file could not be read, written, or serialized
    IoError = 2,
}

impl ExitCode {
    /// Numeric code passed to `std::process::exit`.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Category of a CLI failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    /// Rejected input
    Validation,
    /// File system or serialization failure
    Io,
}

/// Error returned by command handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Failure category, determines the exit code
    pub kind: CliErrorKind,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// Creates a validation error (exit code 1).
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Validation,
            message: message.into(),
        }
    }

    /// Creates an I/O error (exit code 2).
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Io,
            message: message.into(),
        }
    }

    /// Exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.kind {
            CliErrorKind::Validation => ExitCode::ValidationError,
            CliErrorKind::Io => ExitCode::IoError,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<PriceTableError> for CliError {
    fn from(err: PriceTableError) -> Self {
        match err {
            PriceTableError::ConfigNotFound { .. } | PriceTableError::Store(_) => {
                Self::io(err.to_string())
            }
            PriceTableError::ConfigParse { .. }
            | PriceTableError::NoEnabledPattern { .. }
            | PriceTableError::InvalidGroupCode(_)
            | PriceTableError::HandlerNotFound(_) => Self::validation(err.to_string()),
        }
    }
}

/// Result type for command handlers.
pub type CliResult<T> = Result<T, CliError>;

/// Serializes a value as JSON, pretty unless `compact` is set.
pub fn to_json<T: Serialize>(value: &T, compact: bool) -> CliResult<String> {
    let result = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    result.map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::validation("bad").exit_code().code(), 1);
        assert_eq!(CliError::io("disk").exit_code().code(), 2);
        assert_eq!(ExitCode::Success.code(), 0);
    }

    #[test]
    fn test_price_table_error_mapping() {
        let not_found = PriceTableError::ConfigNotFound {
            group_code: "X".to_string(),
            searched: "memory".to_string(),
        };
        assert_eq!(CliError::from(not_found).kind, CliErrorKind::Io);

        let invalid = PriceTableError::InvalidGroupCode("../x".to_string());
        let err = CliError::from(invalid);
        assert_eq!(err.kind, CliErrorKind::Validation);
        assert!(err.to_string().contains("../x"));
    }

    #[test]
    fn test_to_json_compact() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(to_json(&value, true).unwrap(), r#"{"a":1}"#);
        assert!(to_json(&value, false).unwrap().contains('\n'));
    }
}

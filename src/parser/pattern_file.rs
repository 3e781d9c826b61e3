//! Pattern file loading and validation.
//!
//! Loading is strict about structure (missing file or malformed JSON aborts
//! the build call) and lenient about content: validation only produces
//! warnings, which are logged and returned but never change the document.

use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{PriceTableError, Result};
use crate::models::mappings::{ItemFormat, ValueMappingsConfig};
use crate::models::pattern::{split_attributes, PriceTableConfiguration};
use crate::parser::store::{pattern_file_name, PatternStore};

/// Non-fatal problem found while validating a pattern file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A mapping dictionary is declared but holds no entries.
    EmptyMappingDictionary {
        /// "root" or "pattern '<id>'"
        scope: String,
        /// Dictionary name, e.g. "groupCodeMappings"
        dictionary: &'static str,
    },
    /// An item format entry cannot produce output.
    MalformedItemFormat {
        /// Where the format was declared
        scope: String,
        /// Index of the offending part
        index: usize,
        /// Why it is malformed
        reason: &'static str,
    },
    /// `defaultPattern` does not name an enabled pattern.
    DefaultPatternUnavailable {
        /// The configured default id
        default_pattern: String,
    },
    /// Two patterns share an id.
    DuplicatePatternId {
        /// The duplicated id
        id: String,
    },
    /// A pattern declares no row grouping, so every record becomes its own row.
    NoRowGrouping {
        /// Pattern id
        pattern: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMappingDictionary { scope, dictionary } => {
                write!(f, "{scope}: valueMappings.{dictionary} is empty")
            }
            Self::MalformedItemFormat {
                scope,
                index,
                reason,
            } => {
                write!(f, "{scope}: item format part {index} is malformed ({reason})")
            }
            Self::DefaultPatternUnavailable { default_pattern } => write!(
                f,
                "defaultPattern '{default_pattern}' does not name an enabled pattern"
            ),
            Self::DuplicatePatternId { id } => {
                write!(f, "pattern id '{id}' is declared more than once")
            }
            Self::NoRowGrouping { pattern } => {
                write!(f, "pattern '{pattern}' has no row grouping; records will not collapse")
            }
        }
    }
}

/// Rejects group codes that cannot safely name a pattern file.
///
/// # Errors
///
/// Returns `InvalidGroupCode` for empty codes, path separators, traversal
/// sequences and hidden-file names.
pub fn validate_group_code(group_code: &str) -> Result<&str> {
    let trimmed = group_code.trim();
    if trimmed.is_empty()
        || trimmed.contains("..")
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.starts_with('.')
    {
        return Err(PriceTableError::InvalidGroupCode(group_code.to_string()));
    }
    Ok(trimmed)
}

/// Parses a pattern document.
///
/// # Errors
///
/// Returns `ConfigParse` when the JSON does not match the schema.
pub fn parse_configuration(group_code: &str, json: &str) -> Result<PriceTableConfiguration> {
    serde_json::from_str(json).map_err(|source| PriceTableError::ConfigParse {
        group_code: group_code.to_string(),
        source,
    })
}

/// Loads, parses and validates the configuration for a group code.
///
/// The file is read fresh on every call; nothing is cached.
///
/// # Errors
///
/// - `InvalidGroupCode` when the code cannot name a file
/// - `ConfigNotFound` when no store holds the file
/// - `ConfigParse` on malformed JSON
/// - `Store` when the backing storage fails
pub fn load_configuration(
    store: &dyn PatternStore,
    group_code: &str,
) -> Result<PriceTableConfiguration> {
    let group_code = validate_group_code(group_code)?;
    let file_name = pattern_file_name(group_code);

    let Some(content) = store.read(&file_name)? else {
        return Err(PriceTableError::ConfigNotFound {
            group_code: group_code.to_string(),
            searched: store.describe(),
        });
    };

    let config = parse_configuration(group_code, &content)?;
    debug!(
        group_code,
        patterns = config.patterns.len(),
        default_pattern = %config.default_pattern,
        "Loaded pattern configuration"
    );

    for warning in validate_configuration(&config) {
        warn!(group_code, "{warning}");
    }

    Ok(config)
}

/// Checks a configuration for non-fatal problems.
#[must_use]
pub fn validate_configuration(config: &PriceTableConfiguration) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if let Some(mappings) = &config.value_mappings {
        check_mappings("root", mappings, &mut warnings);
    }

    if config.default_pattern().is_none() {
        warnings.push(ConfigWarning::DefaultPatternUnavailable {
            default_pattern: config.default_pattern.clone(),
        });
    }

    let mut seen = BTreeSet::new();
    for pattern in &config.patterns {
        if !seen.insert(pattern.id.as_str()) {
            warnings.push(ConfigWarning::DuplicatePatternId {
                id: pattern.id.clone(),
            });
        }

        let scope = format!("pattern '{}'", pattern.id);
        if let Some(mappings) = &pattern.value_mappings {
            check_mappings(&scope, mappings, &mut warnings);
        }
        if let Some(format) = &pattern.item_format {
            check_item_format(&scope, format, &mut warnings);
        }
        if pattern.enabled && split_attributes(&pattern.grouping.rows).is_empty() {
            warnings.push(ConfigWarning::NoRowGrouping {
                pattern: pattern.id.clone(),
            });
        }
    }

    warnings
}

fn check_mappings(scope: &str, mappings: &ValueMappingsConfig, warnings: &mut Vec<ConfigWarning>) {
    let dictionaries = [
        ("groupCodeMappings", mappings.group_code_mappings.as_ref().map(|m| m.is_empty())),
        ("handlerMappings", mappings.handler_mappings.as_ref().map(|m| m.is_empty())),
        ("specialMappings", mappings.special_mappings.as_ref().map(|m| m.is_empty())),
    ];
    for (dictionary, empty) in dictionaries {
        if empty == Some(true) {
            warnings.push(ConfigWarning::EmptyMappingDictionary {
                scope: scope.to_string(),
                dictionary,
            });
        }
    }

    if let Some(format) = &mappings.default_item_format {
        check_item_format(&format!("{scope} defaultItemFormat"), format, warnings);
    }
}

fn check_item_format(scope: &str, format: &ItemFormat, warnings: &mut Vec<ConfigWarning>) {
    for problem in format.problems() {
        warnings.push(ConfigWarning::MalformedItemFormat {
            scope: scope.to_string(),
            index: problem.index,
            reason: problem.reason,
        });
    }
}

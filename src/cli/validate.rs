//! Validation command for pattern files.

use crate::cli::common::{to_json, CliError, CliResult};
use crate::config::Config;
use crate::parser::{validate_configuration, ConfigWarning, PatternStore};
use crate::services::PriceTableBuilder;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Validate pattern files and report the handler each group code resolves to
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Group code to validate (all known group codes when omitted)
    #[arg(short, long, value_name = "CODE")]
    pub group_code: Option<String>,

    /// Directory searched for pattern files before the configured ones
    #[arg(long, value_name = "DIR")]
    pub patterns_dir: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat warnings as errors (exit non-zero)
    #[arg(long)]
    pub strict: bool,
}

/// Result for one pattern file.
#[derive(Debug, Serialize)]
struct PatternReport {
    group_code: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    handler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_pattern: Option<String>,
    patterns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ValidationResponse {
    valid: bool,
    results: Vec<PatternReport>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> CliResult<()> {
        let config =
            Config::load().map_err(|e| CliError::io(format!("Failed to load config: {e}")))?;
        let store = config
            .pattern_store(self.patterns_dir.as_deref())
            .map_err(|e| CliError::io(format!("Failed to open pattern store: {e}")))?;

        let group_codes = match &self.group_code {
            Some(code) => vec![code.clone()],
            None => store.group_codes(),
        };
        if group_codes.is_empty() {
            return Err(CliError::validation(format!(
                "No pattern files found in {}",
                store.describe()
            )));
        }

        let builder = PriceTableBuilder::new(store);
        let results: Vec<PatternReport> = group_codes
            .iter()
            .map(|code| check_group_code(&builder, code))
            .collect();

        let response = ValidationResponse {
            valid: results.iter().all(|r| r.valid),
            results,
        };

        if self.json {
            println!("{}", to_json(&response, false)?);
        } else {
            output_human_readable(&response);
        }

        if !response.valid {
            return Err(CliError::validation("Validation failed"));
        }

        let has_warnings = response.results.iter().any(|r| !r.warnings.is_empty());
        if self.strict && has_warnings {
            return Err(CliError::validation("Warnings found in strict mode"));
        }

        Ok(())
    }
}

fn check_group_code(builder: &PriceTableBuilder, group_code: &str) -> PatternReport {
    match builder.prepare(group_code) {
        Ok((config, handler)) => PatternReport {
            group_code: group_code.to_string(),
            valid: true,
            handler: Some(handler.id.to_string()),
            default_pattern: Some(config.default_pattern.clone()),
            patterns: config.patterns.len(),
            error: None,
            warnings: validate_configuration(&config)
                .iter()
                .map(ConfigWarning::to_string)
                .collect(),
        },
        Err(err) => PatternReport {
            group_code: group_code.to_string(),
            valid: false,
            handler: None,
            default_pattern: None,
            patterns: 0,
            error: Some(err.to_string()),
            warnings: Vec::new(),
        },
    }
}

fn output_human_readable(response: &ValidationResponse) {
    for report in &response.results {
        if let Some(error) = &report.error {
            println!("✗ {}: {}", report.group_code, error);
            continue;
        }

        println!(
            "✓ {} (handler: {}, default pattern: {}, {} pattern(s))",
            report.group_code,
            report.handler.as_deref().unwrap_or("-"),
            report.default_pattern.as_deref().unwrap_or("-"),
            report.patterns
        );
        for warning in &report.warnings {
            println!("  ⚠ {warning}");
        }
    }

    println!();
    if response.valid {
        println!("✓ Validation passed");
    } else {
        println!("✗ Validation failed");
    }
}

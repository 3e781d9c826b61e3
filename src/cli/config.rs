//! Configuration management CLI commands.

use crate::cli::common::{to_json, CliError, CliResult};
use crate::config::Config;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Set configuration values
    Set(ConfigSetArgs),
}

/// Display current configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Directory holding pattern files
    #[arg(long, value_name = "DIR")]
    patterns_dir: Option<PathBuf>,

    /// Fall back to the bundled pattern files (true or false)
    #[arg(long, value_name = "BOOL")]
    embedded_fallback: Option<bool>,

    /// Pretty-print JSON output (true or false)
    #[arg(long, value_name = "BOOL")]
    pretty: Option<bool>,

    /// Default log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// JSON-serializable configuration for output
#[derive(Serialize, Debug)]
struct ConfigOutput {
    config_file: String,
    exists: bool,
    paths: PathsOutput,
    build: BuildOutput,
    logging: LoggingOutput,
}

#[derive(Serialize, Debug)]
struct PathsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    patterns_dir: Option<String>,
}

#[derive(Serialize, Debug)]
struct BuildOutput {
    embedded_fallback: bool,
    pretty: bool,
}

#[derive(Serialize, Debug)]
struct LoggingOutput {
    level: String,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(),
            ConfigCommand::Set(args) => args.execute(),
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self) -> CliResult<()> {
        let config = Config::load()
            .map_err(|e| CliError::validation(format!("Failed to load configuration: {e}")))?;
        let config_file = Config::config_file_path()
            .map_err(|e| CliError::io(format!("Failed to resolve config path: {e}")))?;

        let output = ConfigOutput {
            config_file: config_file.display().to_string(),
            exists: config_file.exists(),
            paths: PathsOutput {
                patterns_dir: config
                    .paths
                    .patterns_dir
                    .as_ref()
                    .map(|p| p.display().to_string()),
            },
            build: BuildOutput {
                embedded_fallback: config.build.embedded_fallback,
                pretty: config.build.pretty,
            },
            logging: LoggingOutput {
                level: config.logging.level.clone(),
            },
        };

        if self.json {
            println!("{}", to_json(&output, false)?);
        } else {
            output_human_readable(&output);
        }

        Ok(())
    }
}

impl ConfigSetArgs {
    /// Execute set command
    pub fn execute(&self) -> CliResult<()> {
        if self.patterns_dir.is_none()
            && self.embedded_fallback.is_none()
            && self.pretty.is_none()
            && self.log_level.is_none()
        {
            return Err(CliError::validation(
                "At least one configuration option must be specified: \
                 --patterns-dir, --embedded-fallback, --pretty, or --log-level",
            ));
        }

        let mut config = Config::load().unwrap_or_default();

        if let Some(path) = &self.patterns_dir {
            if !path.is_dir() {
                return Err(CliError::validation(format!(
                    "Patterns directory does not exist: {}",
                    path.display()
                )));
            }
            let absolute = path.canonicalize().map_err(|e| {
                CliError::io(format!("Failed to resolve {}: {e}", path.display()))
            })?;
            config.paths.patterns_dir = Some(absolute);
        }
        if let Some(enabled) = self.embedded_fallback {
            config.build.embedded_fallback = enabled;
        }
        if let Some(pretty) = self.pretty {
            config.build.pretty = pretty;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.to_ascii_lowercase();
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("Invalid configuration: {e}")))?;
        config
            .save()
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e}")))?;

        println!("✓ Configuration updated");
        Ok(())
    }
}

fn output_human_readable(output: &ConfigOutput) {
    println!("Configuration file: {}", output.config_file);
    if !output.exists {
        println!("  (not created yet, showing defaults)");
    }
    println!();
    println!("[paths]");
    println!(
        "  patterns_dir = {}",
        output.paths.patterns_dir.as_deref().unwrap_or("(not set)")
    );
    println!();
    println!("[build]");
    println!("  embedded_fallback = {}", output.build.embedded_fallback);
    println!("  pretty = {}", output.build.pretty);
    println!();
    println!("[logging]");
    println!("  level = {}", output.logging.level);
}

//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application settings
//! in TOML format with platform-specific directory resolution. Settings only
//! decide where pattern files come from and how output is written; the
//! pattern files themselves are loaded by [`crate::parser`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{APP_DIR_NAME, CONFIG_DIR_ENV};
use crate::parser::store::{DirectoryStore, EmbeddedStore, LayeredStore};

/// Log levels accepted in `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Directory holding `<GROUP_CODE>_PATTERN.json` files that override the bundle
    #[serde(default)]
    pub patterns_dir: Option<PathBuf>,
}

/// Table build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Fall back to the pattern files compiled into the binary
    #[serde(default = "default_true")]
    pub embedded_fallback: bool,
    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            embedded_fallback: true,
            pretty: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - `$PRICEGRID_CONFIG_DIR/config.toml` when the variable is set
/// - Linux: `~/.config/PriceGrid/config.toml`
/// - macOS: `~/Library/Application Support/PriceGrid/config.toml`
/// - Windows: `%APPDATA%\PriceGrid\config.toml`
///
/// # Validation
///
/// - `patterns_dir`, when set, must be an existing directory
/// - `logging.level` must be a known level
/// - at least one pattern source must be enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the config directory path.
    ///
    /// `PRICEGRID_CONFIG_DIR` wins when set; otherwise the platform config
    /// directory joined with `PriceGrid`.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Checks if the config file exists on disk.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from a specific file.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to a specific file using temp file + rename.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.paths.patterns_dir {
            if !dir.is_dir() {
                anyhow::bail!("Patterns directory does not exist: {}", dir.display());
            }
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}': expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            );
        }

        if self.paths.patterns_dir.is_none() && !self.build.embedded_fallback {
            anyhow::bail!(
                "No pattern source: set paths.patterns_dir or enable build.embedded_fallback"
            );
        }

        Ok(())
    }

    /// Builds the pattern store described by these settings.
    ///
    /// Layers, first hit wins: `override_dir` (e.g. a command-line flag),
    /// `paths.patterns_dir`, then the embedded bundle when enabled.
    pub fn pattern_store(&self, override_dir: Option<&Path>) -> Result<LayeredStore> {
        let mut store = LayeredStore::new();

        if let Some(dir) = override_dir {
            if !dir.is_dir() {
                anyhow::bail!("Patterns directory does not exist: {}", dir.display());
            }
            store = store.with_layer(DirectoryStore::new(dir));
        }
        if let Some(dir) = &self.paths.patterns_dir {
            store = store.with_layer(DirectoryStore::new(dir));
        }
        if self.build.embedded_fallback {
            store = store.with_layer(EmbeddedStore);
        }

        if store.is_empty() {
            anyhow::bail!("No pattern source configured");
        }
        Ok(store)
    }
}

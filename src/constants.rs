//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and configuration locations.

/// The binary name of the application (used in command examples).
pub const APP_BINARY_NAME: &str = "pricegrid";

/// Directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "PriceGrid";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "PRICEGRID_CONFIG_DIR";

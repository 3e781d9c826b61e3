//! Build command: turns price list JSON into a grid response.

use crate::cli::common::{to_json, CliError, CliResult};
use crate::config::Config;
use crate::models::PriceList;
use crate::services::PriceTableBuilder;
use clap::Args;
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Build a price table from price list data
#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Price list JSON file, or `-` for stdin
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Group code selecting the pattern file (defaults to the input's group code)
    #[arg(short, long, value_name = "CODE")]
    pub group_code: Option<String>,

    /// Directory searched for pattern files before the configured ones
    #[arg(long, value_name = "DIR")]
    pub patterns_dir: Option<PathBuf>,

    /// Write the response to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Emit single-line JSON
    #[arg(long)]
    pub compact: bool,
}

/// Accepted input shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BuildInput {
    /// `{"groupCode": "COIL", "priceLists": [...]}`
    Request {
        #[serde(default, rename = "groupCode")]
        group_code: Option<String>,
        #[serde(rename = "priceLists")]
        price_lists: Vec<PriceList>,
    },
    /// A bare array of price lists
    Lists(Vec<PriceList>),
}

impl BuildInput {
    fn into_parts(self) -> (Option<String>, Vec<PriceList>) {
        match self {
            Self::Request {
                group_code,
                price_lists,
            } => (group_code, price_lists),
            Self::Lists(price_lists) => (None, price_lists),
        }
    }
}

impl BuildArgs {
    /// Execute the build command
    pub fn execute(&self) -> CliResult<()> {
        let config =
            Config::load().map_err(|e| CliError::io(format!("Failed to load config: {e}")))?;

        let raw = read_input(&self.input)?;
        let input: BuildInput = serde_json::from_str(&raw)
            .map_err(|e| CliError::validation(format!("Invalid price list input: {e}")))?;
        let (input_group_code, price_lists) = input.into_parts();

        let group_code = self
            .group_code
            .clone()
            .or(input_group_code)
            .or_else(|| {
                price_lists
                    .iter()
                    .map(|list| list.group_key.trim())
                    .find(|key| !key.is_empty())
                    .map(ToString::to_string)
            })
            .ok_or_else(|| {
                CliError::validation(
                    "No group code: pass --group-code or set groupKey on a price list",
                )
            })?;

        let store = config
            .pattern_store(self.patterns_dir.as_deref())
            .map_err(|e| CliError::io(format!("Failed to open pattern store: {e}")))?;
        let builder = PriceTableBuilder::new(store);
        let response = builder.build(&group_code, &price_lists)?;

        let compact = self.compact || !config.build.pretty;
        let json = to_json(&response, compact)?;

        match &self.output {
            Some(path) => {
                fs::write(path, format!("{json}\n"))
                    .map_err(|e| CliError::io(format!("Failed to write {}: {e}", path.display())))?;
                eprintln!(
                    "✓ Wrote {} tab(s) for {} to {}",
                    response.tabs.len(),
                    response.id,
                    path.display()
                );
            }
            None => println!("{json}"),
        }

        Ok(())
    }
}

fn read_input(path: &Path) -> CliResult<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| CliError::io(format!("Failed to read stdin: {e}")))?;
        return Ok(buffer);
    }

    fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("Failed to read {}: {e}", path.display())))
}

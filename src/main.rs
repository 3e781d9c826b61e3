//! PriceGrid - configuration-driven price table builder
//!
//! Reads price list data, applies the pattern file for its group code, and
//! prints the resulting grid response as JSON.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricegrid::cli::{BuildArgs, ConfigArgs, HandlersArgs, ValidateArgs};
use pricegrid::config::Config;
use pricegrid::constants::APP_BINARY_NAME;

/// PriceGrid - build pivot-style price tables from pattern files
#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a price table from price list JSON
    Build(BuildArgs),
    /// Validate pattern files
    Validate(ValidateArgs),
    /// List built-in handlers and group code mappings
    Handlers(HandlersArgs),
    /// Manage configuration
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        Config::load()
            .map(|config| config.logging.level)
            .unwrap_or_else(|_| "info".to_string())
    };

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Command::Build(args) => args.execute(),
        Command::Validate(args) => args.execute(),
        Command::Handlers(args) => args.execute(),
        Command::Config(args) => args.execute(),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code().code());
    }
}

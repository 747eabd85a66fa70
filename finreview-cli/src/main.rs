//! finreview CLI - financial review API server and maintenance commands
//!
//! - `serve`: run migrations, then the HTTP API until Ctrl+C/SIGTERM
//! - `migrate`: create tables and indexes idempotently
//! - `check-config`: print the effective configuration
//! - `validate-balance`: offline trial-balance check

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finreview_core::FinreviewConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "finreview",
    author,
    version,
    about = "Financial review API: entities, GL accounts, trial reports and variance analysis"
)]
struct Cli {
    /// Config file (default: ~/.finreview/config.toml)
    #[arg(long, global = true, env = "FINREVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (needs the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create database tables and indexes
    Migrate(commands::migrate::MigrateArgs),
    /// Print the effective configuration as TOML
    CheckConfig,
    /// Check that debits equal credits
    ValidateBalance(commands::balance::ValidateBalanceArgs),
}

/// `.env` in the working directory, then `~/.finreview/.env`.
/// Existing variables are never overwritten.
fn load_dotenv() {
    dotenvy::dotenv().ok();
    let home_env = FinreviewConfig::default_path().with_file_name(".env");
    if home_env.exists() {
        // Parse errors are ignored; the command reports what is still missing
        dotenvy::from_path(&home_env).ok();
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<FinreviewConfig> {
    FinreviewConfig::load(path).context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let result = match cli.command {
        Commands::Serve(args) => {
            let config = load_config(cli.config.as_deref())?;
            commands::run_serve(args, config).await
        }
        Commands::Migrate(args) => {
            let config = load_config(cli.config.as_deref())?;
            commands::run_migrate(args, config).await
        }
        Commands::CheckConfig => {
            let config = load_config(cli.config.as_deref())?;
            commands::run_check_config(&config)
        }
        Commands::ValidateBalance(args) => {
            let config = load_config(cli.config.as_deref())?;
            commands::run_validate_balance(args, &config)
        }
    };

    tracing_setup::shutdown_otel();
    result
}

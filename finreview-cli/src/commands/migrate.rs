//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;
use finreview_core::FinreviewConfig;
use finreview_server::db::{create_pool, migrations};

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, config: FinreviewConfig) -> Result<()> {
    let database_url = super::database_url(args.database_url, &config)?;

    let pool = create_pool(&database_url)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    println!("Schema is up to date");
    Ok(())
}

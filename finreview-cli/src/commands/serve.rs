//! HTTP server command

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use finreview_core::FinreviewConfig;
use finreview_server::db::{create_pool_with_options, migrations};
use finreview_server::http::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default from config: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Migrate, then serve until shutdown.
pub async fn run_serve(args: ServeArgs, config: FinreviewConfig) -> Result<()> {
    let database_url = super::database_url(args.database_url, &config)?;

    let mut server_config = ServerConfig::from_config(&config)?;
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }
    server_config.cors_permissive |= args.cors_permissive;

    let pool = create_pool_with_options(&database_url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!(
        bind = %server_config.bind_addr,
        cors_permissive = server_config.cors_permissive,
        "Starting finreview server"
    );

    run_server(pool, server_config)
        .await
        .context("Server error")?;

    Ok(())
}

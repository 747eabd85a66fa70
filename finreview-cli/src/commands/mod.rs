//! Command implementations for the finreview CLI

pub mod balance;
pub mod config;
pub mod migrate;
pub mod serve;

pub use balance::run_validate_balance;
pub use config::run_check_config;
pub use migrate::run_migrate;
pub use serve::run_serve;

use anyhow::{Context, Result};
use finreview_core::FinreviewConfig;

/// Database URL from the flag/env, falling back to `[database] url`.
pub(crate) fn database_url(flag: Option<String>, config: &FinreviewConfig) -> Result<String> {
    flag.filter(|url| !url.trim().is_empty())
        .or_else(|| config.database.url.clone())
        .context(
            "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, \
             ~/.finreview/.env, or [database] url in the config file",
        )
}

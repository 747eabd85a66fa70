//! Offline trial-balance check

use anyhow::{bail, Result};
use clap::Parser;
use finreview_core::{check_trial_balance, FinreviewConfig};

#[derive(Parser, Debug)]
pub struct ValidateBalanceArgs {
    /// Total debits
    #[arg(long, allow_negative_numbers = true)]
    pub debits: f64,

    /// Total credits
    #[arg(long, allow_negative_numbers = true)]
    pub credits: f64,

    /// Allowed absolute difference (default from `[analysis] balance_tolerance`)
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Exits non-zero when the totals are out of balance.
pub fn run_validate_balance(args: ValidateBalanceArgs, config: &FinreviewConfig) -> Result<()> {
    let tolerance = args.tolerance.unwrap_or(config.analysis.balance_tolerance);
    let check = check_trial_balance(args.debits, args.credits, tolerance);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&check)?);
    } else {
        println!("{}", check.message);
    }

    if !check.is_valid {
        bail!(
            "out of balance by {:.2} (tolerance {})",
            check.balance_difference.abs(),
            tolerance
        );
    }
    Ok(())
}

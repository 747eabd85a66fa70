//! Variance heuristics for GL accounts
//!
//! Compares each account's current balance against its previous balance and
//! flags an anomaly when any of these hold:
//!
//! - the absolute change is at least `min_abs_change`
//! - the percentage change is at least `min_pct_change` (skipped when the
//!   previous balance is zero)
//! - the change's z-score across all accounts in the batch exceeds
//!   `zscore_threshold`
//!
//! These are static rules, not a statistical model.

use crate::config::AnalysisSection;

/// Anomaly thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_abs_change: f64,
    pub min_pct_change: f64,
    pub zscore_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&AnalysisSection::default())
    }
}

impl From<&AnalysisSection> for Thresholds {
    fn from(section: &AnalysisSection) -> Self {
        Self {
            min_abs_change: section.min_abs_change,
            min_pct_change: section.min_pct_change,
            zscore_threshold: section.zscore_threshold,
        }
    }
}

/// Balances of one account for the two compared periods
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountBalances {
    pub account_id: i64,
    pub current: f64,
    pub previous: f64,
}

/// Computed variance for one account
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceFinding {
    pub account_id: i64,
    /// current - previous, rounded to cents
    pub amount: f64,
    /// change relative to |previous|, in percent, rounded to 2 places
    pub percentage: f64,
    pub zscore: f64,
    pub anomaly: bool,
    /// Human-readable list of the rules that fired
    pub reason: Option<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Change and percentage change between two balances.
///
/// Percentage is 0 when the previous balance is 0.
pub fn variance(current: f64, previous: f64) -> (f64, f64) {
    let amount = current - previous;
    let percentage = if previous == 0.0 {
        0.0
    } else {
        amount / previous.abs() * 100.0
    };
    (round2(amount), round2(percentage))
}

/// Population z-scores. All zeros when there is no spread.
pub fn zscores(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();

    if std == 0.0 || !std.is_finite() {
        return vec![0.0; values.len()];
    }

    values.iter().map(|v| (v - mean) / std).collect()
}

/// Run the variance rules over a batch of accounts, in input order.
pub fn analyze_accounts(accounts: &[AccountBalances], thresholds: &Thresholds) -> Vec<VarianceFinding> {
    let changes: Vec<(f64, f64)> = accounts
        .iter()
        .map(|a| variance(a.current, a.previous))
        .collect();
    let amounts: Vec<f64> = changes.iter().map(|(amount, _)| *amount).collect();
    let scores = zscores(&amounts);

    accounts
        .iter()
        .zip(changes)
        .zip(scores)
        .map(|((account, (amount, percentage)), zscore)| {
            let mut reasons = Vec::new();

            if amount.abs() >= thresholds.min_abs_change {
                reasons.push(format!(
                    "absolute change {:.2} >= {:.2}",
                    amount.abs(),
                    thresholds.min_abs_change
                ));
            }
            if account.previous != 0.0 && percentage.abs() >= thresholds.min_pct_change {
                reasons.push(format!(
                    "change {:.2}% >= {:.2}%",
                    percentage.abs(),
                    thresholds.min_pct_change
                ));
            }
            if zscore.abs() > thresholds.zscore_threshold {
                reasons.push(format!(
                    "z-score {:.2} exceeds {:.2}",
                    zscore,
                    thresholds.zscore_threshold
                ));
            }

            VarianceFinding {
                account_id: account.account_id,
                amount,
                percentage,
                zscore,
                anomaly: !reasons.is_empty(),
                reason: (!reasons.is_empty()).then(|| reasons.join("; ")),
            }
        })
        .collect()
}

//! Trial-balance checks
//!
//! A trial balance is valid when total debits equal total credits.

use serde::Serialize;

/// Result of checking a trial balance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheck {
    pub is_valid: bool,
    pub total_debits: f64,
    pub total_credits: f64,
    pub balance_difference: f64,
    pub message: String,
}

/// Debits minus credits. Positive means debits exceed credits.
pub fn balance_difference(total_debits: f64, total_credits: f64) -> f64 {
    total_debits - total_credits
}

/// Check a trial balance, treating differences within `tolerance` as balanced.
///
/// # Example
/// ```
/// use finreview_core::check_trial_balance;
///
/// let check = check_trial_balance(1500.0, 1250.5, 0.005);
/// assert!(!check.is_valid);
/// assert_eq!(check.message, "Trial balance is out of balance. debits exceed credits by 249.50.");
/// ```
pub fn check_trial_balance(total_debits: f64, total_credits: f64, tolerance: f64) -> BalanceCheck {
    let difference = balance_difference(total_debits, total_credits);
    let is_valid = difference.abs() < tolerance;

    let message = if is_valid {
        "Trial balance is valid. Total debits equal total credits.".to_string()
    } else {
        let side = if difference > 0.0 {
            "debits exceed credits"
        } else {
            "credits exceed debits"
        };
        format!(
            "Trial balance is out of balance. {} by {:.2}.",
            side,
            difference.abs()
        )
    };

    BalanceCheck {
        is_valid,
        total_debits,
        total_credits,
        balance_difference: difference,
        message,
    }
}

//! finreview-core: shared pieces of the financial-review service
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`balance`]: trial-balance (debits vs credits) checks
//! - [`analysis`]: period-over-period variance and anomaly heuristics

pub mod analysis;
pub mod balance;
pub mod config;
pub mod error;

pub use analysis::{analyze_accounts, AccountBalances, Thresholds, VarianceFinding};
pub use balance::{balance_difference, check_trial_balance, BalanceCheck};
pub use config::{AnalysisSection, DatabaseSection, FinreviewConfig, ServerSection};
pub use error::{FinreviewError, Result};

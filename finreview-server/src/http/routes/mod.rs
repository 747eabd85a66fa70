//! Route handlers organized by resource
//!
//! Every resource lives at one path and dispatches on the method; single-row
//! operations take `?id=`.

pub mod assignments;
pub mod audit_logs;
pub mod entities;
pub mod gl_accounts;
pub mod health;
pub mod notifications;
pub mod stakeholders;
pub mod trial_reports;
pub mod variances;

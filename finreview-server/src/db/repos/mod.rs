//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Borrows the pool: `XRepo::new(&pool)`
//! - Relies on named constraints for uniqueness (no check-then-insert)
//! - Single-row reads and writes return `Option`; `None` means no such id
//! - Lists build their WHERE clause with `QueryBuilder` and bound values

mod filters;

pub mod assignments;
pub mod audit;
pub mod entities;
pub mod gl_accounts;
pub mod notifications;
pub mod stakeholders;
pub mod trial_reports;
pub mod variances;

pub use assignments::{Assignment, AssignmentChanges, AssignmentFilter, AssignmentRepo, NewAssignment};
pub use audit::{AuditFilter, AuditLog, AuditRepo, NewAuditLog};
pub use entities::{Entity, EntityChanges, EntityFilter, EntityRepo, NewEntity};
pub use gl_accounts::{GlAccount, GlAccountChanges, GlAccountFilter, GlAccountRepo, NewGlAccount};
pub use notifications::{NewNotification, Notification, NotificationFilter, NotificationRepo};
pub use stakeholders::{
    NewStakeholder, NotificationPreferences, Stakeholder, StakeholderChanges, StakeholderFilter,
    StakeholderRepo,
};
pub use trial_reports::{
    NewTrialReport, TrialReport, TrialReportChanges, TrialReportFilter, TrialReportRepo,
};
pub use variances::{NewVariance, Variance, VarianceRepo, VarianceWithAccount};

//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod enums;
pub mod email;
pub mod fields;
pub mod pagination;

pub use validation::ValidationError;
pub use enums::{
    AccountType, AssignmentStatus, AuditAction, EntityStatus, NotificationType,
    PeriodComparison, ReportStatus, ReportType, RoleType, StakeholderRole,
};
pub use email::Email;
pub use fields::{
    non_blank, nullable, parse_amount, parse_due_date, parse_id, parse_id_str, parse_timestamp,
    query_id, RecordId,
};
pub use pagination::Pagination;

//! Enumerated status/type fields
//!
//! Stored as TEXT; the enum is the single source of the allowed values and
//! of the error code returned when a request uses anything else.

use std::fmt;

use super::ValidationError;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal, code = $code:literal {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Allowed wire values, in declaration order.
            pub const ALL: &'static [&'static str] = &[$($value),+];

            /// Parse from the wire value (surrounding whitespace ignored).
            pub fn parse(s: &str) -> Result<Self, ValidationError> {
                match s.trim() {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(ValidationError::InvalidVariant {
                        field: $field,
                        code: $code,
                        allowed: Self::ALL,
                    }),
                }
            }

            /// Get string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Lifecycle of a tracked business unit
    EntityStatus, field = "status", code = "INVALID_STATUS" {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

text_enum! {
    /// General-ledger account classification
    AccountType, field = "account type", code = "INVALID_ACCOUNT_TYPE" {
        Asset => "Asset",
        Liability => "Liability",
        Equity => "Equity",
        Revenue => "Revenue",
        Expense => "Expense",
    }
}

text_enum! {
    ReportType, field = "report type", code = "INVALID_REPORT_TYPE" {
        Monthly => "monthly",
        Quarterly => "quarterly",
        Yearly => "yearly",
    }
}

text_enum! {
    /// Review state of a trial report
    ReportStatus, field = "status", code = "INVALID_STATUS" {
        Pending => "pending",
        InReview => "in_review",
        Approved => "approved",
        Rejected => "rejected",
    }
}

text_enum! {
    StakeholderRole, field = "role", code = "INVALID_ROLE" {
        Maker => "maker",
        Checker => "checker",
        Approver => "approver",
        Admin => "admin",
    }
}

text_enum! {
    /// What a stakeholder does for an entity in an assignment
    RoleType, field = "roleType", code = "INVALID_ROLE_TYPE" {
        Uploader => "uploader",
        Reviewer => "reviewer",
        Approver => "approver",
    }
}

text_enum! {
    AssignmentStatus, field = "status", code = "INVALID_STATUS" {
        Pending => "pending",
        Completed => "completed",
        Overdue => "overdue",
    }
}

text_enum! {
    NotificationType, field = "notification type", code = "INVALID_TYPE" {
        Reminder => "reminder",
        Alert => "alert",
        ApprovalRequest => "approval_request",
    }
}

text_enum! {
    /// Which periods a variance compares
    PeriodComparison, field = "periodComparison", code = "INVALID_PERIOD_COMPARISON" {
        MonthOverMonth => "MoM",
        QuarterOverQuarter => "QoQ",
        YearOverYear => "YoY",
    }
}

text_enum! {
    AuditAction, field = "action", code = "INVALID_ACTION" {
        Create => "create",
        Update => "update",
        Delete => "delete",
    }
}

impl ReportStatus {
    /// Approved and rejected reports record who/when they were reviewed.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

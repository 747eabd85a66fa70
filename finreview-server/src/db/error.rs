//! Database error type
//!
//! Constraint violations are split out of `sqlx::Error` so the HTTP layer
//! can answer 400 with a precise code instead of 500.

use sqlx::error::ErrorKind;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// UNIQUE violation (SQLSTATE 23505)
    #[error("unique constraint '{constraint}' violated")]
    Conflict { constraint: String },

    /// FOREIGN KEY violation (SQLSTATE 23503)
    #[error("foreign key constraint '{constraint}' violated")]
    ForeignKey { constraint: String },
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let constraint = db.constraint().unwrap_or_default().to_owned();
            match db.kind() {
                ErrorKind::UniqueViolation => return Self::Conflict { constraint },
                ErrorKind::ForeignKeyViolation => return Self::ForeignKey { constraint },
                _ => {}
            }
        }
        Self::Sqlx(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_pass_through() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn conflict_display() {
        let err = DbError::Conflict {
            constraint: "entities_code_key".into(),
        };
        assert_eq!(err.to_string(), "unique constraint 'entities_code_key' violated");
    }
}

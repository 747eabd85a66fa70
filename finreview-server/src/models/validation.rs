//! Validation error types
//!
//! Every variant carries the stable machine code that API clients match on
//! (`MISSING_NAME`, `INVALID_ROLE`, ...) next to the human message.

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field absent, null, or blank
    Missing { field: &'static str, code: &'static str },

    /// Several required fields reported together
    MissingFields {
        fields: &'static [&'static str],
        code: &'static str,
    },

    /// Field present but empty after trimming
    Empty { field: &'static str, code: &'static str },

    /// Field is not a parseable number
    InvalidNumber { field: &'static str, code: &'static str },

    /// Id parameter absent or not a positive integer
    InvalidId { field: &'static str, code: &'static str },

    /// String doesn't match required format
    InvalidFormat {
        field: &'static str,
        code: &'static str,
        reason: &'static str,
    },

    /// Value is not one of the enumerated variants
    InvalidVariant {
        field: &'static str,
        code: &'static str,
        allowed: &'static [&'static str],
    },

    /// Update request carried nothing to change
    NoUpdates { code: &'static str },
}

impl ValidationError {
    /// Machine-readable error code for the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing { code, .. }
            | Self::MissingFields { code, .. }
            | Self::Empty { code, .. }
            | Self::InvalidNumber { code, .. }
            | Self::InvalidId { code, .. }
            | Self::InvalidFormat { code, .. }
            | Self::InvalidVariant { code, .. }
            | Self::NoUpdates { code } => *code,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field, .. } => write!(f, "{} is required", field),
            Self::MissingFields { fields, .. } => {
                write!(f, "Missing required fields: {} are required", fields.join(", "))
            }
            Self::Empty { field, .. } => write!(f, "{} must be a non-empty string", field),
            Self::InvalidNumber { field, .. } => write!(f, "{} must be a valid number", field),
            Self::InvalidId { field, .. } => write!(f, "Valid {} is required", field),
            Self::InvalidFormat { field, reason, .. } => write!(f, "{}: {}", field, reason),
            Self::InvalidVariant { field, allowed, .. } => {
                write!(f, "Invalid {}. Must be one of: {}", field, allowed.join(", "))
            }
            Self::NoUpdates { .. } => write!(f, "No valid fields to update"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::InvalidVariant {
            field: "role",
            code: "INVALID_ROLE",
            allowed: &["maker", "checker"],
        };
        assert_eq!(err.to_string(), "Invalid role. Must be one of: maker, checker");
        assert_eq!(err.code(), "INVALID_ROLE");
    }

    #[test]
    fn missing_fields_display() {
        let err = ValidationError::MissingFields {
            fields: &["name", "email"],
            code: "MISSING_REQUIRED_FIELDS",
        };
        assert_eq!(
            err.to_string(),
            "Missing required fields: name, email are required"
        );
    }
}

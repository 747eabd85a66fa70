//! Stakeholder email validation
//!
//! Emails are trimmed and lowercased so the UNIQUE constraint on
//! `stakeholders.email` is case-insensitive in practice.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// One `@` with a non-empty local part and host, no whitespace
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("invalid email regex"));

/// Validated, normalized email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Normalize and validate an email address.
    ///
    /// # Example
    /// ```
    /// use finreview_server::models::Email;
    ///
    /// let email = Email::new("  Ana.Ruiz@Example.COM ").unwrap();
    /// assert_eq!(email.as_str(), "ana.ruiz@example.com");
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ValidationError::Empty {
                field: "email",
                code: "INVALID_INPUT",
            });
        }

        if !EMAIL_RE.is_match(&normalized) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                code: "INVALID_EMAIL",
                reason: "must be a valid email address",
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(
            Email::new(" CFO@Corp.io\n").unwrap().into_string(),
            "cfo@corp.io"
        );
    }

    #[test]
    fn rejects_blank() {
        let err = Email::new("   ").unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["no-at-sign", "two@@corp.io", "space in@corp.io", "@corp.io", "ops@"] {
            let err = Email::new(bad).unwrap_err();
            assert_eq!(err.code(), "INVALID_EMAIL", "{bad}");
        }
    }

    #[test]
    fn accepts_dotless_host() {
        assert_eq!(Email::new("Ops@LocalHost").unwrap().as_str(), "ops@localhost");
    }
}

//! Field-level parsing shared by every resource
//!
//! Request bodies come from spreadsheet-ish front-ends, so id and amount
//! fields accept either a JSON number or a numeric string. Text fields are
//! trimmed; blank counts as missing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::ValidationError;

/// Positive row id taken from `?id=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Parse the `id` query parameter. Absent, blank, non-numeric and
    /// non-positive values are all `INVALID_ID`.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        raw.and_then(parse_id_str)
            .map(Self)
            .ok_or(ValidationError::InvalidId {
                field: "ID",
                code: "INVALID_ID",
            })
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

/// Parse a positive integer id from a query-string value.
pub fn parse_id_str(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Non-blank, trimmed query-string value.
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Optional id filter from the query string: blank → `None`, present but
/// not a positive integer → `InvalidId`.
pub fn query_id(
    raw: Option<&str>,
    field: &'static str,
    code: &'static str,
) -> Result<Option<i64>, ValidationError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(s) => parse_id_str(s)
            .map(Some)
            .ok_or(ValidationError::InvalidId { field, code }),
    }
}

/// Parse a positive integer id from a JSON number or numeric string.
pub fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .filter(|id| *id > 0),
        Value::String(s) => parse_id_str(s),
        _ => None,
    }
}

/// Parse a finite amount from a JSON number or numeric string.
pub fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    amount.is_finite().then_some(amount)
}

/// Null or a blank string.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Required text: absent or blank → `Missing`.
pub fn required_text(
    value: Option<String>,
    field: &'static str,
    code: &'static str,
) -> Result<String, ValidationError> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::Missing { field, code })
}

/// Optional text on update: absent is fine, present-but-blank → `Empty`.
pub fn optional_text(
    value: Option<String>,
    field: &'static str,
    code: &'static str,
) -> Result<Option<String>, ValidationError> {
    match value {
        None => Ok(None),
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(ValidationError::Empty { field, code })
            } else {
                Ok(Some(trimmed.to_owned()))
            }
        }
    }
}

/// Required id field in a JSON body.
pub fn required_id(
    value: Option<&Value>,
    field: &'static str,
    missing_code: &'static str,
    invalid_code: &'static str,
) -> Result<i64, ValidationError> {
    match value {
        None => Err(ValidationError::Missing { field, code: missing_code }),
        Some(v) if is_blank(v) => Err(ValidationError::Missing { field, code: missing_code }),
        Some(v) => parse_id(v).ok_or(ValidationError::InvalidNumber {
            field,
            code: invalid_code,
        }),
    }
}

/// Optional id field in a JSON body: absent or null → `None`.
pub fn optional_id(
    value: Option<&Value>,
    field: &'static str,
    invalid_code: &'static str,
) -> Result<Option<i64>, ValidationError> {
    match value {
        None => Ok(None),
        Some(v) if is_blank(v) => Ok(None),
        Some(v) => parse_id(v).map(Some).ok_or(ValidationError::InvalidNumber {
            field,
            code: invalid_code,
        }),
    }
}

/// Required amount field in a JSON body.
pub fn required_amount(
    value: Option<&Value>,
    field: &'static str,
    missing_code: &'static str,
    invalid_code: &'static str,
) -> Result<f64, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::Missing { field, code: missing_code }),
        Some(v) => parse_amount(v).ok_or(ValidationError::InvalidNumber {
            field,
            code: invalid_code,
        }),
    }
}

/// Optional amount field in a JSON body: absent → `None`, present must parse.
pub fn optional_amount(
    value: Option<&Value>,
    field: &'static str,
    invalid_code: &'static str,
) -> Result<Option<f64>, ValidationError> {
    match value {
        None => Ok(None),
        Some(v) => parse_amount(v).map(Some).ok_or(ValidationError::InvalidNumber {
            field,
            code: invalid_code,
        }),
    }
}

/// Parse a due date: `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_due_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
}

/// Parse an RFC 3339 timestamp (or a bare date at midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// Deserialize a field that distinguishes "absent" from "explicit null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

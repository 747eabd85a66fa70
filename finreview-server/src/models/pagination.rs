//! Pagination types
//!
//! Lists use `limit`/`offset` query parameters. Values that don't parse
//! fall back to the defaults instead of failing the request.

/// Maximum rows per list request
const MAX_LIMIT: i64 = 100;

/// Default rows per list request
const DEFAULT_LIMIT: i64 = 10;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: i64,
    offset: i64,
}

impl Pagination {
    /// Create pagination with clamping.
    ///
    /// - Limit is clamped to 1..=100
    /// - Offset is clamped to a minimum of 0
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset: offset.max(0),
        }
    }

    /// Build from raw query-string values.
    pub fn from_raw(limit: Option<&str>, offset: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(
            parse(limit).unwrap_or(DEFAULT_LIMIT),
            parse(offset).unwrap_or(0),
        )
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

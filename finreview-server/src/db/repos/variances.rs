//! Variance analysis repository
//!
//! Reads always LEFT JOIN the GL account so callers get the account
//! number, name and type next to each variance.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::db::DbError;
use crate::models::PeriodComparison;

/// Variance record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variance {
    pub id: i64,
    pub trial_report_id: i64,
    pub gl_account_id: i64,
    pub variance_amount: f64,
    pub variance_percentage: f64,
    pub period_comparison: String,
    pub anomaly_detected: bool,
    pub anomaly_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Variance joined with its GL account.
///
/// Account columns are nullable because the join is a LEFT JOIN.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarianceWithAccount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub variance: Variance,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub account_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewVariance {
    pub trial_report_id: i64,
    pub gl_account_id: i64,
    pub variance_amount: f64,
    pub variance_percentage: f64,
    pub period_comparison: PeriodComparison,
    pub anomaly_detected: bool,
    pub anomaly_reason: Option<String>,
}

/// Rows per INSERT; Postgres caps a statement at 65535 bind parameters.
const INSERT_CHUNK_ROWS: usize = 1000;

fn insert_statement(chunk: &[NewVariance]) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO variance_analysis (trial_report_id, gl_account_id, variance_amount, \
         variance_percentage, period_comparison, anomaly_detected, anomaly_reason) ",
    );
    qb.push_values(chunk, |mut b, row| {
        b.push_bind(row.trial_report_id)
            .push_bind(row.gl_account_id)
            .push_bind(row.variance_amount)
            .push_bind(row.variance_percentage)
            .push_bind(row.period_comparison.as_str())
            .push_bind(row.anomaly_detected)
            .push_bind(row.anomaly_reason.as_deref());
    });
    qb.push(" RETURNING *");
    qb
}

const JOINED_SELECT: &str = r#"
    SELECT v.*, g.account_number, g.account_name, g.account_type
    FROM variance_analysis v
    LEFT JOIN gl_accounts g ON g.id = v.gl_account_id
"#;

/// Variance analysis repository
pub struct VarianceRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> VarianceRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<VarianceWithAccount>, DbError> {
        let sql = format!("{JOINED_SELECT} WHERE v.id = $1");
        let variance = sqlx::query_as::<_, VarianceWithAccount>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(variance)
    }

    /// Every variance of one report, in insertion order.
    pub async fn list_for_report(
        &self,
        report_id: i64,
    ) -> Result<Vec<VarianceWithAccount>, DbError> {
        let sql = format!("{JOINED_SELECT} WHERE v.trial_report_id = $1 ORDER BY v.id");
        let rows = sqlx::query_as::<_, VarianceWithAccount>(&sql)
            .bind(report_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, new: NewVariance) -> Result<Variance, DbError> {
        let variance = sqlx::query_as::<_, Variance>(
            r#"
            INSERT INTO variance_analysis (
                trial_report_id, gl_account_id, variance_amount, variance_percentage,
                period_comparison, anomaly_detected, anomaly_reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.trial_report_id)
        .bind(new.gl_account_id)
        .bind(new.variance_amount)
        .bind(new.variance_percentage)
        .bind(new.period_comparison.as_str())
        .bind(new.anomaly_detected)
        .bind(new.anomaly_reason)
        .fetch_one(self.pool)
        .await?;
        Ok(variance)
    }

    /// Insert a batch, `INSERT_CHUNK_ROWS` rows per statement, in one
    /// transaction.
    pub async fn insert_many(&self, rows: Vec<NewVariance>) -> Result<Vec<Variance>, DbError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(rows.len());
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let batch = insert_statement(chunk)
                .build_query_as::<Variance>()
                .fetch_all(&mut *tx)
                .await?;
            inserted.extend(batch);
        }
        tx.commit().await?;

        Ok(inserted)
    }

    pub async fn delete(&self, id: i64) -> Result<Option<Variance>, DbError> {
        let variance = sqlx::query_as::<_, Variance>(
            "DELETE FROM variance_analysis WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(variance)
    }
}

//! Trial report repository
//!
//! `balance_difference` is always derived in SQL from the stored or
//! incoming totals, so it can't drift from `total_debits - total_credits`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::filters::{push_page, Conditions};
use crate::db::DbError;
use crate::models::{Pagination, ReportStatus, ReportType};

/// Trial report record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialReport {
    pub id: i64,
    pub entity_id: i64,
    pub reporting_period: String,
    pub report_type: String,
    pub status: String,
    pub total_debits: f64,
    pub total_credits: f64,
    pub balance_difference: f64,
    pub uploaded_by: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTrialReport {
    pub entity_id: i64,
    pub reporting_period: String,
    pub report_type: ReportType,
    pub total_debits: f64,
    pub total_credits: f64,
    pub uploaded_by: Option<i64>,
    pub file_url: Option<String>,
}

/// Partial update.
///
/// `reviewed_by` and `file_url` are `Option<Option<_>>`: the outer `None`
/// leaves the column alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TrialReportChanges {
    pub status: Option<ReportStatus>,
    pub total_debits: Option<f64>,
    pub total_credits: Option<f64>,
    pub reviewed_by: Option<Option<i64>>,
    pub file_url: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct TrialReportFilter {
    pub entity_id: Option<i64>,
    pub status: Option<ReportStatus>,
    pub report_type: Option<ReportType>,
    pub reporting_period: Option<String>,
}

/// Trial report repository
pub struct TrialReportRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TrialReportRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<TrialReport>, DbError> {
        let report = sqlx::query_as::<_, TrialReport>("SELECT * FROM trial_reports WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(report)
    }

    /// Most recent upload first.
    pub async fn list(
        &self,
        filter: TrialReportFilter,
        page: Pagination,
    ) -> Result<Vec<TrialReport>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM trial_reports");
        let mut cond = Conditions::new();

        if let Some(entity_id) = filter.entity_id {
            cond.next(&mut qb).push("entity_id = ").push_bind(entity_id);
        }
        if let Some(status) = filter.status {
            cond.next(&mut qb).push("status = ").push_bind(status.as_str());
        }
        if let Some(report_type) = filter.report_type {
            cond.next(&mut qb)
                .push("report_type = ")
                .push_bind(report_type.as_str());
        }
        if let Some(period) = filter.reporting_period {
            cond.next(&mut qb).push("reporting_period = ").push_bind(period);
        }

        qb.push(" ORDER BY uploaded_at DESC");
        push_page(&mut qb, page);

        let rows = qb.build_query_as::<TrialReport>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Insert with status `pending`.
    pub async fn create(&self, new: NewTrialReport) -> Result<TrialReport, DbError> {
        let report = sqlx::query_as::<_, TrialReport>(
            r#"
            INSERT INTO trial_reports (
                entity_id, reporting_period, report_type, status,
                total_debits, total_credits, balance_difference,
                uploaded_by, file_url
            )
            VALUES ($1, $2, $3, 'pending', $4, $5, $4 - $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.entity_id)
        .bind(new.reporting_period)
        .bind(new.report_type.as_str())
        .bind(new.total_debits)
        .bind(new.total_credits)
        .bind(new.uploaded_by)
        .bind(new.file_url)
        .fetch_one(self.pool)
        .await?;
        Ok(report)
    }

    /// Apply changes. A final status (approved/rejected) stamps `reviewed_at`.
    pub async fn update(
        &self,
        id: i64,
        changes: TrialReportChanges,
    ) -> Result<Option<TrialReport>, DbError> {
        let stamp_review = changes.status.is_some_and(|s| s.is_final());

        let report = sqlx::query_as::<_, TrialReport>(
            r#"
            UPDATE trial_reports SET
                status = COALESCE($2, status),
                total_debits = COALESCE($3, total_debits),
                total_credits = COALESCE($4, total_credits),
                balance_difference = COALESCE($3, total_debits) - COALESCE($4, total_credits),
                reviewed_by = CASE WHEN $5 THEN $6 ELSE reviewed_by END,
                file_url = CASE WHEN $7 THEN $8 ELSE file_url END,
                reviewed_at = CASE WHEN $9 THEN NOW() ELSE reviewed_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.total_debits)
        .bind(changes.total_credits)
        .bind(changes.reviewed_by.is_some())
        .bind(changes.reviewed_by.flatten())
        .bind(changes.file_url.is_some())
        .bind(changes.file_url.flatten())
        .bind(stamp_review)
        .fetch_optional(self.pool)
        .await?;
        Ok(report)
    }

    pub async fn delete(&self, id: i64) -> Result<Option<TrialReport>, DbError> {
        let report =
            sqlx::query_as::<_, TrialReport>("DELETE FROM trial_reports WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(report)
    }
}

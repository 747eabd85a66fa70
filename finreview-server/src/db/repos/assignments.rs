//! Assignment repository

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::filters::{push_page, Conditions};
use crate::db::DbError;
use crate::models::{AssignmentStatus, Pagination, RoleType};

/// Assignment record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub entity_id: i64,
    pub stakeholder_id: i64,
    pub role_type: String,
    pub due_date: NaiveDate,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub entity_id: i64,
    pub stakeholder_id: i64,
    pub role_type: RoleType,
    pub due_date: NaiveDate,
}

/// Partial update. `completed_at: Some(None)` clears the timestamp.
#[derive(Debug, Clone, Default)]
pub struct AssignmentChanges {
    pub status: Option<AssignmentStatus>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl AssignmentChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.due_date.is_none() && self.completed_at.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub entity_id: Option<i64>,
    pub stakeholder_id: Option<i64>,
    pub status: Option<AssignmentStatus>,
    pub role_type: Option<RoleType>,
}

/// Assignment repository
pub struct AssignmentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AssignmentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Assignment>, DbError> {
        let assignment = sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(assignment)
    }

    /// Soonest due first.
    pub async fn list(
        &self,
        filter: AssignmentFilter,
        page: Pagination,
    ) -> Result<Vec<Assignment>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM assignments");
        let mut cond = Conditions::new();

        if let Some(entity_id) = filter.entity_id {
            cond.next(&mut qb).push("entity_id = ").push_bind(entity_id);
        }
        if let Some(stakeholder_id) = filter.stakeholder_id {
            cond.next(&mut qb)
                .push("stakeholder_id = ")
                .push_bind(stakeholder_id);
        }
        if let Some(status) = filter.status {
            cond.next(&mut qb).push("status = ").push_bind(status.as_str());
        }
        if let Some(role_type) = filter.role_type {
            cond.next(&mut qb)
                .push("role_type = ")
                .push_bind(role_type.as_str());
        }

        qb.push(" ORDER BY due_date ASC, id ASC");
        push_page(&mut qb, page);

        let rows = qb.build_query_as::<Assignment>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Insert with status `pending` and no completion time.
    pub async fn create(&self, new: NewAssignment) -> Result<Assignment, DbError> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (entity_id, stakeholder_id, role_type, due_date, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *
            "#,
        )
        .bind(new.entity_id)
        .bind(new.stakeholder_id)
        .bind(new.role_type.as_str())
        .bind(new.due_date)
        .fetch_one(self.pool)
        .await?;
        Ok(assignment)
    }

    /// Apply changes.
    ///
    /// An explicit `completed_at` wins. Otherwise moving to `completed`
    /// stamps the current time unless one is already stored.
    pub async fn update(
        &self,
        id: i64,
        changes: AssignmentChanges,
    ) -> Result<Option<Assignment>, DbError> {
        let completing = changes.status == Some(AssignmentStatus::Completed);

        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments SET
                status = COALESCE($2, status),
                due_date = COALESCE($3, due_date),
                completed_at = CASE
                    WHEN $4 THEN $5
                    WHEN $6 THEN COALESCE(completed_at, NOW())
                    ELSE completed_at
                END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.due_date)
        .bind(changes.completed_at.is_some())
        .bind(changes.completed_at.flatten())
        .bind(completing)
        .fetch_optional(self.pool)
        .await?;
        Ok(assignment)
    }

    pub async fn delete(&self, id: i64) -> Result<Option<Assignment>, DbError> {
        let assignment =
            sqlx::query_as::<_, Assignment>("DELETE FROM assignments WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(assignment)
    }
}

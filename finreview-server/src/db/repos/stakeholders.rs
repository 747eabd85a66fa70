//! Stakeholder repository
//!
//! `entities` and `notification_preferences` are JSONB columns decoded
//! through `sqlx::types::Json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::filters::{like_pattern, push_page, Conditions};
use crate::db::DbError;
use crate::models::{Email, Pagination, StakeholderRole};

/// Delivery channels a stakeholder opted into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    #[serde(default = "enabled")]
    pub email: bool,
    #[serde(default = "enabled")]
    pub in_app: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms: Option<bool>,
}

fn enabled() -> bool {
    true
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            in_app: true,
            sms: None,
        }
    }
}

/// Stakeholder record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stakeholder {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub entities: Json<Vec<i64>>,
    pub notification_preferences: Json<NotificationPreferences>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStakeholder {
    pub name: String,
    pub email: Email,
    pub role: StakeholderRole,
    pub department: String,
    pub entities: Vec<i64>,
    pub notification_preferences: NotificationPreferences,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct StakeholderChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<StakeholderRole>,
    pub department: Option<String>,
    pub entities: Option<Vec<i64>>,
    pub notification_preferences: Option<NotificationPreferences>,
}

#[derive(Debug, Clone, Default)]
pub struct StakeholderFilter {
    pub search: Option<String>,
    pub role: Option<StakeholderRole>,
    pub department: Option<String>,
}

/// Stakeholder repository
pub struct StakeholderRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> StakeholderRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Stakeholder>, DbError> {
        let stakeholder =
            sqlx::query_as::<_, Stakeholder>("SELECT * FROM stakeholders WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(stakeholder)
    }

    /// Newest first.
    pub async fn list(
        &self,
        filter: StakeholderFilter,
        page: Pagination,
    ) -> Result<Vec<Stakeholder>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM stakeholders");
        let mut cond = Conditions::new();

        if let Some(term) = filter.search {
            let pattern = like_pattern(&term);
            cond.next(&mut qb)
                .push("(name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(role) = filter.role {
            cond.next(&mut qb).push("role = ").push_bind(role.as_str());
        }
        if let Some(department) = filter.department {
            cond.next(&mut qb).push("department = ").push_bind(department);
        }

        qb.push(" ORDER BY created_at DESC");
        push_page(&mut qb, page);

        let rows = qb.build_query_as::<Stakeholder>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    pub async fn create(&self, new: NewStakeholder) -> Result<Stakeholder, DbError> {
        let stakeholder = sqlx::query_as::<_, Stakeholder>(
            r#"
            INSERT INTO stakeholders (name, email, role, department, entities, notification_preferences)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.name)
        .bind(new.email.into_string())
        .bind(new.role.as_str())
        .bind(new.department)
        .bind(Json(new.entities))
        .bind(Json(new.notification_preferences))
        .fetch_one(self.pool)
        .await?;
        Ok(stakeholder)
    }

    pub async fn update(
        &self,
        id: i64,
        changes: StakeholderChanges,
    ) -> Result<Option<Stakeholder>, DbError> {
        let stakeholder = sqlx::query_as::<_, Stakeholder>(
            r#"
            UPDATE stakeholders SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                department = COALESCE($5, department),
                entities = COALESCE($6, entities),
                notification_preferences = COALESCE($7, notification_preferences)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email.map(Email::into_string))
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.department)
        .bind(changes.entities.map(Json))
        .bind(changes.notification_preferences.map(Json))
        .fetch_optional(self.pool)
        .await?;
        Ok(stakeholder)
    }

    pub async fn delete(&self, id: i64) -> Result<Option<Stakeholder>, DbError> {
        let stakeholder =
            sqlx::query_as::<_, Stakeholder>("DELETE FROM stakeholders WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(stakeholder)
    }
}

//! Notification repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::filters::{push_page, Conditions};
use crate::db::DbError;
use crate::models::{NotificationType, Pagination};

/// Notification record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub stakeholder_id: i64,
    pub message: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub read_status: bool,
    pub sent_at: DateTime<Utc>,
    pub related_entity_id: Option<i64>,
    pub related_report_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub stakeholder_id: i64,
    pub message: String,
    pub kind: NotificationType,
    pub related_entity_id: Option<i64>,
    pub related_report_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub stakeholder_id: Option<i64>,
    pub read_status: Option<bool>,
    pub kind: Option<NotificationType>,
}

/// Notification repository
pub struct NotificationRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Notification>, DbError> {
        let notification =
            sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(notification)
    }

    /// Most recently sent first.
    pub async fn list(
        &self,
        filter: NotificationFilter,
        page: Pagination,
    ) -> Result<Vec<Notification>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM notifications");
        let mut cond = Conditions::new();

        if let Some(stakeholder_id) = filter.stakeholder_id {
            cond.next(&mut qb)
                .push("stakeholder_id = ")
                .push_bind(stakeholder_id);
        }
        if let Some(read) = filter.read_status {
            cond.next(&mut qb).push("read_status = ").push_bind(read);
        }
        if let Some(kind) = filter.kind {
            cond.next(&mut qb).push("type = ").push_bind(kind.as_str());
        }

        qb.push(" ORDER BY sent_at DESC");
        push_page(&mut qb, page);

        let rows = qb.build_query_as::<Notification>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Insert as unread.
    pub async fn create(&self, new: NewNotification) -> Result<Notification, DbError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (stakeholder_id, message, type, read_status, related_entity_id, related_report_id)
            VALUES ($1, $2, $3, FALSE, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.stakeholder_id)
        .bind(new.message)
        .bind(new.kind.as_str())
        .bind(new.related_entity_id)
        .bind(new.related_report_id)
        .fetch_one(self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn set_read(&self, id: i64, read: bool) -> Result<Option<Notification>, DbError> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET read_status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(read)
        .fetch_optional(self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn delete(&self, id: i64) -> Result<Option<Notification>, DbError> {
        let notification =
            sqlx::query_as::<_, Notification>("DELETE FROM notifications WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(notification)
    }
}

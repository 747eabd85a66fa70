//! Audit log repository
//!
//! Append-only. Rows are written by the HTTP layer after each successful
//! write and are read back through the list endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::filters::{push_page, Conditions};
use crate::db::DbError;
use crate::models::{AuditAction, Pagination};

/// Audit log record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub entity_type: String,
    pub entity_id: i64,
    pub old_value: Option<Json<Value>>,
    pub new_value: Option<Json<Value>>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One change to record
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: i64,
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: i64,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub user_id: Option<i64>,
}

/// Audit log repository
pub struct AuditRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: NewAuditLog) -> Result<AuditLog, DbError> {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id, old_value, new_value, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.old_value.map(Json))
        .bind(entry.new_value.map(Json))
        .bind(entry.ip_address)
        .fetch_one(self.pool)
        .await?;
        Ok(log)
    }

    /// Newest first.
    pub async fn list(&self, filter: AuditFilter, page: Pagination) -> Result<Vec<AuditLog>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM audit_logs");
        let mut cond = Conditions::new();

        if let Some(entity_type) = filter.entity_type {
            cond.next(&mut qb).push("entity_type = ").push_bind(entity_type);
        }
        if let Some(entity_id) = filter.entity_id {
            cond.next(&mut qb).push("entity_id = ").push_bind(entity_id);
        }
        if let Some(action) = filter.action {
            cond.next(&mut qb).push("action = ").push_bind(action.as_str());
        }
        if let Some(user_id) = filter.user_id {
            cond.next(&mut qb).push("user_id = ").push_bind(user_id);
        }

        qb.push(" ORDER BY timestamp DESC, id DESC");
        push_page(&mut qb, page);

        let rows = qb.build_query_as::<AuditLog>().fetch_all(self.pool).await?;
        Ok(rows)
    }
}

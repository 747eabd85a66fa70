//! General-ledger account repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::filters::{like_pattern, push_page, Conditions};
use crate::db::DbError;
use crate::models::{AccountType, Pagination};

/// GL account record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlAccount {
    pub id: i64,
    pub entity_id: i64,
    pub account_number: String,
    pub account_name: String,
    pub account_type: String,
    pub current_balance: f64,
    pub previous_balance: f64,
    pub opening_balance: f64,
    pub currency: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGlAccount {
    pub entity_id: i64,
    pub account_number: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub current_balance: f64,
    pub previous_balance: f64,
    pub opening_balance: f64,
    pub currency: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct GlAccountChanges {
    pub account_name: Option<String>,
    pub account_type: Option<AccountType>,
    pub current_balance: Option<f64>,
    pub previous_balance: Option<f64>,
    pub opening_balance: Option<f64>,
    pub currency: Option<String>,
}

/// List filters. Lists are always scoped to one entity.
#[derive(Debug, Clone)]
pub struct GlAccountFilter {
    pub entity_id: i64,
    pub account_type: Option<AccountType>,
    pub search: Option<String>,
}

/// GL account repository
pub struct GlAccountRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> GlAccountRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<GlAccount>, DbError> {
        let account = sqlx::query_as::<_, GlAccount>("SELECT * FROM gl_accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(account)
    }

    /// Most recently updated first.
    pub async fn list(
        &self,
        filter: GlAccountFilter,
        page: Pagination,
    ) -> Result<Vec<GlAccount>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM gl_accounts");
        let mut cond = Conditions::new();

        cond.next(&mut qb).push("entity_id = ").push_bind(filter.entity_id);
        if let Some(account_type) = filter.account_type {
            cond.next(&mut qb)
                .push("account_type = ")
                .push_bind(account_type.as_str());
        }
        if let Some(term) = filter.search {
            let pattern = like_pattern(&term);
            cond.next(&mut qb)
                .push("(account_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR account_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY last_updated DESC");
        push_page(&mut qb, page);

        let rows = qb.build_query_as::<GlAccount>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Every account of an entity, unpaginated, in id order.
    pub async fn all_for_entity(&self, entity_id: i64) -> Result<Vec<GlAccount>, DbError> {
        let rows = sqlx::query_as::<_, GlAccount>(
            "SELECT * FROM gl_accounts WHERE entity_id = $1 ORDER BY id",
        )
        .bind(entity_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, new: NewGlAccount) -> Result<GlAccount, DbError> {
        let account = sqlx::query_as::<_, GlAccount>(
            r#"
            INSERT INTO gl_accounts (
                entity_id, account_number, account_name, account_type,
                current_balance, previous_balance, opening_balance, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.entity_id)
        .bind(new.account_number)
        .bind(new.account_name)
        .bind(new.account_type.as_str())
        .bind(new.current_balance)
        .bind(new.previous_balance)
        .bind(new.opening_balance)
        .bind(new.currency)
        .fetch_one(self.pool)
        .await?;
        Ok(account)
    }

    /// Apply changes and bump `last_updated`.
    pub async fn update(
        &self,
        id: i64,
        changes: GlAccountChanges,
    ) -> Result<Option<GlAccount>, DbError> {
        let account = sqlx::query_as::<_, GlAccount>(
            r#"
            UPDATE gl_accounts SET
                account_name = COALESCE($2, account_name),
                account_type = COALESCE($3, account_type),
                current_balance = COALESCE($4, current_balance),
                previous_balance = COALESCE($5, previous_balance),
                opening_balance = COALESCE($6, opening_balance),
                currency = COALESCE($7, currency),
                last_updated = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.account_name)
        .bind(changes.account_type.map(|t| t.as_str()))
        .bind(changes.current_balance)
        .bind(changes.previous_balance)
        .bind(changes.opening_balance)
        .bind(changes.currency)
        .fetch_optional(self.pool)
        .await?;
        Ok(account)
    }

    pub async fn delete(&self, id: i64) -> Result<Option<GlAccount>, DbError> {
        let account =
            sqlx::query_as::<_, GlAccount>("DELETE FROM gl_accounts WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(account)
    }
}


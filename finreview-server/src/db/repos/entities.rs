//! Entity repository
//!
//! Code uniqueness is enforced by the `entities_code_key` constraint; a
//! collision surfaces as `DbError::Conflict`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::filters::{like_pattern, push_page, Conditions};
use crate::db::DbError;
use crate::models::{EntityStatus, Pagination};

/// Entity record from database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub department: String,
    pub region: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new entity
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub name: String,
    pub code: String,
    pub department: String,
    pub region: String,
    pub status: EntityStatus,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EntityChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub department: Option<String>,
    pub region: Option<String>,
    pub status: Option<EntityStatus>,
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub search: Option<String>,
    pub department: Option<String>,
    pub region: Option<String>,
    pub status: Option<EntityStatus>,
}

/// Entity repository
pub struct EntityRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> EntityRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Entity>, DbError> {
        let entity = sqlx::query_as::<_, Entity>("SELECT * FROM entities WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(entity)
    }

    /// Newest first.
    pub async fn list(&self, filter: EntityFilter, page: Pagination) -> Result<Vec<Entity>, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM entities");
        let mut cond = Conditions::new();

        if let Some(term) = filter.search {
            let pattern = like_pattern(&term);
            cond.next(&mut qb)
                .push("(name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR code ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(department) = filter.department {
            cond.next(&mut qb).push("department = ").push_bind(department);
        }
        if let Some(region) = filter.region {
            cond.next(&mut qb).push("region = ").push_bind(region);
        }
        if let Some(status) = filter.status {
            cond.next(&mut qb).push("status = ").push_bind(status.as_str());
        }

        qb.push(" ORDER BY created_at DESC");
        push_page(&mut qb, page);

        let rows = qb.build_query_as::<Entity>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    pub async fn create(&self, new: NewEntity) -> Result<Entity, DbError> {
        let entity = sqlx::query_as::<_, Entity>(
            r#"
            INSERT INTO entities (name, code, department, region, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.name)
        .bind(new.code)
        .bind(new.department)
        .bind(new.region)
        .bind(new.status.as_str())
        .fetch_one(self.pool)
        .await?;
        Ok(entity)
    }

    /// Apply changes and bump `updated_at`. `None` when the row is gone.
    pub async fn update(&self, id: i64, changes: EntityChanges) -> Result<Option<Entity>, DbError> {
        let entity = sqlx::query_as::<_, Entity>(
            r#"
            UPDATE entities SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                department = COALESCE($4, department),
                region = COALESCE($5, region),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.code)
        .bind(changes.department)
        .bind(changes.region)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(self.pool)
        .await?;
        Ok(entity)
    }

    /// Delete and return the removed row. Dependent rows cascade.
    pub async fn delete(&self, id: i64) -> Result<Option<Entity>, DbError> {
        let entity = sqlx::query_as::<_, Entity>("DELETE FROM entities WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};

    // Run with: DATABASE_URL=postgres://... cargo test -p finreview-server -- --ignored

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.unwrap();
        migrations::run(&pool).await.unwrap();
        pool
    }

    fn sample(code: &str) -> NewEntity {
        NewEntity {
            name: "Acme Holdings".into(),
            code: code.into(),
            department: "Finance".into(),
            region: "EMEA".into(),
            status: EntityStatus::Active,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_code_is_conflict() {
        let pool = pool().await;
        let repo = EntityRepo::new(&pool);
        let code = format!("DUP-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());

        let first = repo.create(sample(&code)).await.unwrap();
        let err = repo.create(sample(&code)).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { ref constraint } if constraint == "entities_code_key"));

        repo.delete(first.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_keeps_unset_fields() {
        let pool = pool().await;
        let repo = EntityRepo::new(&pool);
        let code = format!("UPD-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
        let created = repo.create(sample(&code)).await.unwrap();

        let changes = EntityChanges {
            region: Some("APAC".into()),
            ..Default::default()
        };
        let updated = repo.update(created.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.region, "APAC");
        assert_eq!(updated.name, created.name);
        assert!(updated.updated_at >= created.updated_at);

        let deleted = repo.delete(created.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(repo.get(created.id).await.unwrap().is_none());
    }
}

//! Entity endpoints - `/api/entities`

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{Entity, EntityChanges, EntityFilter, EntityRepo, NewEntity};
use crate::http::audit::{self, snapshot};
use crate::http::error::ApiError;
use crate::http::extractors::{Actor, IdParam, JsonBody, QueryParams};
use crate::http::server::AppState;
use crate::models::fields::{optional_text, required_text};
use crate::models::{non_blank, AuditAction, EntityStatus, Pagination, RecordId, ValidationError};

const AUDIT_TYPE: &str = "entities";

fn not_found() -> ApiError {
    ApiError::not_found("ENTITY_NOT_FOUND", "Entity not found")
}

#[derive(Debug, Default, Deserialize)]
pub struct EntityQuery {
    pub id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub search: Option<String>,
    pub department: Option<String>,
    pub region: Option<String>,
    pub status: Option<String>,
}

/// Create entity request
#[derive(Debug, Deserialize)]
pub struct CreateEntityRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub department: Option<String>,
    pub region: Option<String>,
    pub status: Option<String>,
}

/// Update entity request; every field optional
#[derive(Debug, Deserialize)]
pub struct UpdateEntityRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub department: Option<String>,
    pub region: Option<String>,
    pub status: Option<String>,
}

impl CreateEntityRequest {
    fn validate(self) -> Result<NewEntity, ValidationError> {
        let name = required_text(self.name, "Name", "MISSING_NAME")?;
        let code = required_text(self.code, "Code", "MISSING_CODE")?;
        let department = required_text(self.department, "Department", "MISSING_DEPARTMENT")?;
        let region = required_text(self.region, "Region", "MISSING_REGION")?;
        let status = match non_blank(self.status.as_deref()) {
            Some(s) => EntityStatus::parse(s)?,
            None => EntityStatus::Active,
        };

        Ok(NewEntity {
            name,
            code,
            department,
            region,
            status,
        })
    }
}

impl UpdateEntityRequest {
    fn validate(self) -> Result<EntityChanges, ValidationError> {
        let status = optional_text(self.status, "Status", "INVALID_STATUS")?
            .map(|s| EntityStatus::parse(&s))
            .transpose()?;

        Ok(EntityChanges {
            name: optional_text(self.name, "Name", "INVALID_NAME")?,
            code: optional_text(self.code, "Code", "INVALID_CODE")?,
            department: optional_text(self.department, "Department", "INVALID_DEPARTMENT")?,
            region: optional_text(self.region, "Region", "INVALID_REGION")?,
            status,
        })
    }
}

/// GET /api/entities - one entity by `?id`, or a filtered list
async fn get_entities(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<EntityQuery>,
) -> Result<Response, ApiError> {
    let repo = EntityRepo::new(&state.pool);

    if let Some(raw) = non_blank(query.id.as_deref()) {
        let id = RecordId::parse(Some(raw))?;
        let entity = repo.get(id.get()).await?.ok_or_else(not_found)?;
        return Ok(Json(entity).into_response());
    }

    let filter = EntityFilter {
        search: non_blank(query.search.as_deref()).map(str::to_owned),
        department: non_blank(query.department.as_deref()).map(str::to_owned),
        region: non_blank(query.region.as_deref()).map(str::to_owned),
        status: non_blank(query.status.as_deref())
            .map(EntityStatus::parse)
            .transpose()?,
    };
    let page = Pagination::from_raw(query.limit.as_deref(), query.offset.as_deref());

    let entities: Vec<Entity> = repo.list(filter, page).await?;
    Ok(Json(entities).into_response())
}

/// POST /api/entities
async fn create_entity(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    JsonBody(req): JsonBody<CreateEntityRequest>,
) -> Result<(StatusCode, Json<Entity>), ApiError> {
    let new = req.validate()?;
    let entity = EntityRepo::new(&state.pool).create(new).await?;

    tracing::info!(entity_id = entity.id, code = %entity.code, "entity created");
    audit::record(
        &state.pool,
        &actor,
        AuditAction::Create,
        AUDIT_TYPE,
        entity.id,
        None,
        snapshot(&entity),
    )
    .await;

    Ok((StatusCode::CREATED, Json(entity)))
}

/// PUT /api/entities?id= - partial update
async fn update_entity(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<UpdateEntityRequest>,
) -> Result<Json<Entity>, ApiError> {
    let changes = req.validate()?;
    let repo = EntityRepo::new(&state.pool);

    let existing = repo.get(id.get()).await?.ok_or_else(not_found)?;
    let updated = repo.update(id.get(), changes).await?.ok_or_else(not_found)?;

    audit::record(
        &state.pool,
        &actor,
        AuditAction::Update,
        AUDIT_TYPE,
        updated.id,
        snapshot(&existing),
        snapshot(&updated),
    )
    .await;

    Ok(Json(updated))
}

/// DELETE /api/entities?id=
async fn delete_entity(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = EntityRepo::new(&state.pool)
        .delete(id.get())
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(entity_id = deleted.id, "entity deleted");
    audit::record(
        &state.pool,
        &actor,
        AuditAction::Delete,
        AUDIT_TYPE,
        deleted.id,
        snapshot(&deleted),
        None,
    )
    .await;

    Ok(Json(json!({
        "message": "Entity deleted successfully",
        "entity": deleted,
    })))
}

/// Entity routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/entities",
        get(get_entities)
            .post(create_entity)
            .put(update_entity)
            .delete(delete_entity),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, code: &str, status: Option<&str>) -> CreateEntityRequest {
        CreateEntityRequest {
            name: Some(name.into()),
            code: Some(code.into()),
            department: Some("Finance".into()),
            region: Some("EMEA".into()),
            status: status.map(Into::into),
        }
    }

    #[test]
    fn create_defaults_to_active_and_trims() {
        let new = create("  Acme  ", " AC-01 ", None).validate().unwrap();
        assert_eq!(new.name, "Acme");
        assert_eq!(new.code, "AC-01");
        assert_eq!(new.status, EntityStatus::Active);
    }

    #[test]
    fn create_reports_first_missing_field() {
        let err = create("", "AC-01", None).validate().unwrap_err();
        assert_eq!(err.code(), "MISSING_NAME");

        let mut req = create("Acme", "AC-01", None);
        req.region = None;
        assert_eq!(req.validate().unwrap_err().code(), "MISSING_REGION");
    }

    #[test]
    fn create_rejects_unknown_status() {
        let err = create("Acme", "AC-01", Some("archived")).validate().unwrap_err();
        assert_eq!(err.code(), "INVALID_STATUS");
    }

    #[test]
    fn update_rejects_blank_fields() {
        let req = UpdateEntityRequest {
            name: None,
            code: Some("  ".into()),
            department: None,
            region: None,
            status: None,
        };
        assert_eq!(req.validate().unwrap_err().code(), "INVALID_CODE");
    }
}

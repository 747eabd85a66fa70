//! Assignment endpoints - `/api/assignments`

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{Assignment, AssignmentChanges, AssignmentFilter, AssignmentRepo, NewAssignment};
use crate::http::audit::{self, snapshot};
use crate::http::error::ApiError;
use crate::http::extractors::{Actor, IdParam, JsonBody, QueryParams};
use crate::http::server::AppState;
use crate::models::fields::{required_id, required_text};
use crate::models::{
    non_blank, nullable, parse_due_date, parse_id_str, parse_timestamp, AssignmentStatus,
    AuditAction, Pagination, RecordId, RoleType, ValidationError,
};

const AUDIT_TYPE: &str = "assignments";

const DATE_REASON: &str = "must be YYYY-MM-DD or an RFC 3339 timestamp";

fn not_found() -> ApiError {
    ApiError::not_found("ASSIGNMENT_NOT_FOUND", "Assignment not found")
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQuery {
    pub id: Option<String>,
    pub entity_id: Option<String>,
    pub stakeholder_id: Option<String>,
    pub status: Option<String>,
    pub role_type: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Create assignment request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub entity_id: Option<Value>,
    pub stakeholder_id: Option<Value>,
    pub role_type: Option<String>,
    pub due_date: Option<String>,
}

/// Update assignment request. `completedAt: null` clears the timestamp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    pub status: Option<String>,
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub completed_at: Option<Option<String>>,
}

fn due_date(raw: &str) -> Result<chrono::NaiveDate, ValidationError> {
    parse_due_date(raw).ok_or(ValidationError::InvalidFormat {
        field: "dueDate",
        code: "INVALID_DUE_DATE",
        reason: DATE_REASON,
    })
}

impl CreateAssignmentRequest {
    fn validate(self) -> Result<NewAssignment, ValidationError> {
        let entity_id = required_id(
            self.entity_id.as_ref(),
            "entityId",
            "MISSING_ENTITY_ID",
            "INVALID_ENTITY_ID",
        )?;
        let stakeholder_id = required_id(
            self.stakeholder_id.as_ref(),
            "stakeholderId",
            "MISSING_STAKEHOLDER_ID",
            "INVALID_STAKEHOLDER_ID",
        )?;
        let role_type = required_text(self.role_type, "roleType", "MISSING_ROLE_TYPE")?;
        let raw_due = required_text(self.due_date, "dueDate", "MISSING_DUE_DATE")?;

        Ok(NewAssignment {
            entity_id,
            stakeholder_id,
            role_type: RoleType::parse(&role_type)?,
            due_date: due_date(&raw_due)?,
        })
    }
}

impl UpdateAssignmentRequest {
    fn validate(self) -> Result<AssignmentChanges, ValidationError> {
        let status = self
            .status
            .as_deref()
            .map(AssignmentStatus::parse)
            .transpose()?;
        let due = self.due_date.as_deref().map(due_date).transpose()?;
        let completed_at = match self.completed_at {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_timestamp(&raw).ok_or(
                ValidationError::InvalidFormat {
                    field: "completedAt",
                    code: "INVALID_COMPLETED_AT",
                    reason: DATE_REASON,
                },
            )?)),
        };

        let changes = AssignmentChanges {
            status,
            due_date: due,
            completed_at,
        };
        if changes.is_empty() {
            return Err(ValidationError::NoUpdates { code: "NO_UPDATES" });
        }
        Ok(changes)
    }
}

/// GET /api/assignments - one assignment by `?id`, or a filtered list
///
/// Id filters that don't parse are ignored rather than rejected.
async fn get_assignments(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<AssignmentQuery>,
) -> Result<Response, ApiError> {
    let repo = AssignmentRepo::new(&state.pool);

    if let Some(raw) = non_blank(query.id.as_deref()) {
        let id = RecordId::parse(Some(raw))?;
        let assignment = repo.get(id.get()).await?.ok_or_else(not_found)?;
        return Ok(Json(assignment).into_response());
    }

    let filter = AssignmentFilter {
        entity_id: query.entity_id.as_deref().and_then(parse_id_str),
        stakeholder_id: query.stakeholder_id.as_deref().and_then(parse_id_str),
        status: non_blank(query.status.as_deref())
            .map(AssignmentStatus::parse)
            .transpose()?,
        role_type: non_blank(query.role_type.as_deref())
            .map(RoleType::parse)
            .transpose()?,
    };
    let page = Pagination::from_raw(query.limit.as_deref(), query.offset.as_deref());

    let assignments: Vec<Assignment> = repo.list(filter, page).await?;
    Ok(Json(assignments).into_response())
}

/// POST /api/assignments
async fn create_assignment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    JsonBody(req): JsonBody<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<Assignment>), ApiError> {
    let new = req.validate()?;
    let assignment = AssignmentRepo::new(&state.pool).create(new).await?;

    tracing::info!(
        assignment_id = assignment.id,
        stakeholder_id = assignment.stakeholder_id,
        due = %assignment.due_date,
        "assignment created"
    );
    audit::record(
        &state.pool,
        &actor,
        AuditAction::Create,
        AUDIT_TYPE,
        assignment.id,
        None,
        snapshot(&assignment),
    )
    .await;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// PUT /api/assignments?id=
async fn update_assignment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<UpdateAssignmentRequest>,
) -> Result<Json<Assignment>, ApiError> {
    let changes = req.validate()?;
    let repo = AssignmentRepo::new(&state.pool);

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

/// DELETE /api/assignments?id=
async fn delete_assignment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
) -> Result<Json<Value>, ApiError> {
    let deleted = AssignmentRepo::new(&state.pool)
        .delete(id.get())
        .await?
        .ok_or_else(not_found)?;

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
        "message": "Assignment deleted successfully",
        "assignment": deleted,
    })))
}

/// Assignment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/assignments",
        get(get_assignments)
            .post(create_assignment)
            .put(update_assignment)
            .delete(delete_assignment),
    )
}

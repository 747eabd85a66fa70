//! Stakeholder endpoints - `/api/stakeholders`

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

use crate::db::{
    NewStakeholder, NotificationPreferences, Stakeholder, StakeholderChanges, StakeholderFilter,
    StakeholderRepo,
};
use crate::http::audit::{self, snapshot};
use crate::http::error::ApiError;
use crate::http::extractors::{Actor, IdParam, JsonBody, QueryParams};
use crate::http::server::AppState;
use crate::models::fields::optional_text;
use crate::models::{
    non_blank, parse_id, AuditAction, Email, Pagination, RecordId, StakeholderRole,
    ValidationError,
};

const AUDIT_TYPE: &str = "stakeholders";

const REQUIRED_FIELDS: &[&str] = &["name", "email", "role", "department"];

fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Stakeholder not found")
}

#[derive(Debug, Default, Deserialize)]
pub struct StakeholderQuery {
    pub id: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Create stakeholder request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStakeholderRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub entities: Option<Vec<Value>>,
    pub notification_preferences: Option<NotificationPreferences>,
}

/// Update stakeholder request; every field optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStakeholderRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub entities: Option<Vec<Value>>,
    pub notification_preferences: Option<NotificationPreferences>,
}

/// Entity ids the stakeholder covers; numbers or numeric strings.
fn entity_ids(values: Vec<Value>) -> Result<Vec<i64>, ValidationError> {
    values
        .iter()
        .map(|v| {
            parse_id(v).ok_or(ValidationError::InvalidNumber {
                field: "entities",
                code: "INVALID_ENTITIES",
            })
        })
        .collect()
}

impl CreateStakeholderRequest {
    fn validate(self) -> Result<NewStakeholder, ValidationError> {
        let missing = ValidationError::MissingFields {
            fields: REQUIRED_FIELDS,
            code: "MISSING_REQUIRED_FIELDS",
        };
        let (Some(name), Some(email), Some(role), Some(department)) = (
            non_blank(self.name.as_deref()),
            non_blank(self.email.as_deref()),
            non_blank(self.role.as_deref()),
            non_blank(self.department.as_deref()),
        ) else {
            return Err(missing);
        };

        let role = StakeholderRole::parse(role)?;
        let email = Email::new(email)?;

        Ok(NewStakeholder {
            name: name.to_owned(),
            email,
            role,
            department: department.to_owned(),
            entities: self.entities.map(entity_ids).transpose()?.unwrap_or_default(),
            notification_preferences: self.notification_preferences.unwrap_or_default(),
        })
    }
}

impl UpdateStakeholderRequest {
    fn validate(self) -> Result<StakeholderChanges, ValidationError> {
        let role = non_blank(self.role.as_deref())
            .map(StakeholderRole::parse)
            .transpose()?;
        let email = self.email.as_deref().map(Email::new).transpose()?;

        Ok(StakeholderChanges {
            name: optional_text(self.name, "Name", "INVALID_INPUT")?,
            email,
            role,
            department: optional_text(self.department, "Department", "INVALID_INPUT")?,
            entities: self.entities.map(entity_ids).transpose()?,
            notification_preferences: self.notification_preferences,
        })
    }
}

/// GET /api/stakeholders - one stakeholder by `?id`, or a filtered list
async fn get_stakeholders(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<StakeholderQuery>,
) -> Result<Response, ApiError> {
    let repo = StakeholderRepo::new(&state.pool);

    if let Some(raw) = non_blank(query.id.as_deref()) {
        let id = RecordId::parse(Some(raw))?;
        let stakeholder = repo.get(id.get()).await?.ok_or_else(not_found)?;
        return Ok(Json(stakeholder).into_response());
    }

    let filter = StakeholderFilter {
        search: non_blank(query.search.as_deref()).map(str::to_owned),
        role: non_blank(query.role.as_deref())
            .map(StakeholderRole::parse)
            .transpose()?,
        department: non_blank(query.department.as_deref()).map(str::to_owned),
    };
    let page = Pagination::from_raw(query.limit.as_deref(), query.offset.as_deref());

    let stakeholders: Vec<Stakeholder> = repo.list(filter, page).await?;
    Ok(Json(stakeholders).into_response())
}

/// POST /api/stakeholders
async fn create_stakeholder(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    JsonBody(req): JsonBody<CreateStakeholderRequest>,
) -> Result<(StatusCode, Json<Stakeholder>), ApiError> {
    let new = req.validate()?;
    let stakeholder = StakeholderRepo::new(&state.pool).create(new).await?;

    tracing::info!(stakeholder_id = stakeholder.id, role = %stakeholder.role, "stakeholder created");
    audit::record(
        &state.pool,
        &actor,
        AuditAction::Create,
        AUDIT_TYPE,
        stakeholder.id,
        None,
        snapshot(&stakeholder),
    )
    .await;

    Ok((StatusCode::CREATED, Json(stakeholder)))
}

/// PUT /api/stakeholders?id=
async fn update_stakeholder(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<UpdateStakeholderRequest>,
) -> Result<Json<Stakeholder>, ApiError> {
    let changes = req.validate()?;
    let repo = StakeholderRepo::new(&state.pool);

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

/// DELETE /api/stakeholders?id=
async fn delete_stakeholder(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
) -> Result<Json<Value>, ApiError> {
    let deleted = StakeholderRepo::new(&state.pool)
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
        "message": "Stakeholder deleted successfully",
        "stakeholder": deleted,
    })))
}

/// Stakeholder routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/stakeholders",
        get(get_stakeholders)
            .post(create_stakeholder)
            .put(update_stakeholder)
            .delete(delete_stakeholder),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(body: Value) -> Result<NewStakeholder, ValidationError> {
        serde_json::from_value::<CreateStakeholderRequest>(body)
            .unwrap()
            .validate()
    }

    #[test]
    fn create_lowercases_email_and_defaults() {
        let new = create(json!({
            "name": " Dana Reviewer ",
            "email": "Dana@Corp.COM",
            "role": "checker",
            "department": "Controllership"
        }))
        .unwrap();

        assert_eq!(new.name, "Dana Reviewer");
        assert_eq!(new.email.as_str(), "dana@corp.com");
        assert_eq!(new.role, StakeholderRole::Checker);
        assert!(new.entities.is_empty());
        assert_eq!(new.notification_preferences, NotificationPreferences::default());
    }

    #[test]
    fn create_reports_missing_fields_together() {
        let err = create(json!({ "name": "Dana", "email": "  " })).unwrap_err();
        assert_eq!(err.code(), "MISSING_REQUIRED_FIELDS");
        assert_eq!(
            err.to_string(),
            "Missing required fields: name, email, role, department are required"
        );
    }

    #[test]
    fn create_checks_role_then_email() {
        let base = json!({
            "name": "Dana",
            "email": "dana@corp.com",
            "role": "auditor",
            "department": "Finance"
        });
        assert_eq!(create(base.clone()).unwrap_err().code(), "INVALID_ROLE");

        let mut bad_email = base;
        bad_email["role"] = json!("maker");
        bad_email["email"] = json!("not-an-email");
        assert_eq!(create(bad_email).unwrap_err().code(), "INVALID_EMAIL");
    }

    #[test]
    fn create_parses_entity_ids() {
        let new = create(json!({
            "name": "Dana",
            "email": "dana@corp.com",
            "role": "admin",
            "department": "Finance",
            "entities": [1, "2"],
            "notificationPreferences": {"email": false, "inApp": true, "sms": true}
        }))
        .unwrap();
        assert_eq!(new.entities, vec![1, 2]);
        assert!(!new.notification_preferences.email);
        assert_eq!(new.notification_preferences.sms, Some(true));
    }

    #[test]
    fn update_blank_is_invalid_input() {
        let req: UpdateStakeholderRequest =
            serde_json::from_value(json!({ "email": " " })).unwrap();
        assert_eq!(req.validate().unwrap_err().code(), "INVALID_INPUT");

        let req: UpdateStakeholderRequest =
            serde_json::from_value(json!({ "department": "" })).unwrap();
        assert_eq!(req.validate().unwrap_err().code(), "INVALID_INPUT");
    }
}

//! Notification endpoints - `/api/notifications`

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

use crate::db::{NewNotification, Notification, NotificationFilter, NotificationRepo};
use crate::http::audit::{self, snapshot};
use crate::http::error::ApiError;
use crate::http::extractors::{Actor, IdParam, JsonBody, QueryParams};
use crate::http::server::AppState;
use crate::models::fields::{required_id, required_text};
use crate::models::{
    non_blank, parse_id, query_id, AuditAction, NotificationType, Pagination, RecordId,
    ValidationError,
};

const AUDIT_TYPE: &str = "notifications";

fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Notification not found")
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub id: Option<String>,
    pub stakeholder_id: Option<String>,
    pub read_status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Create notification request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub stakeholder_id: Option<Value>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub related_entity_id: Option<Value>,
    pub related_report_id: Option<Value>,
}

/// Update notification request; only the read flag can change
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationRequest {
    pub read_status: Option<Value>,
}

/// Read flag from a bool, `1`/`0`, or their string forms.
fn parse_read_status(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

impl CreateNotificationRequest {
    fn validate(self) -> Result<NewNotification, ValidationError> {
        let stakeholder_id = required_id(
            self.stakeholder_id.as_ref(),
            "stakeholderId",
            "MISSING_STAKEHOLDER_ID",
            "INVALID_STAKEHOLDER_ID",
        )?;
        let message = required_text(self.message, "message", "MISSING_MESSAGE")?;
        let kind = NotificationType::parse(&required_text(self.kind, "type", "MISSING_TYPE")?)?;

        Ok(NewNotification {
            stakeholder_id,
            message,
            kind,
            // Related ids are informational; unparseable ones are dropped.
            related_entity_id: self.related_entity_id.as_ref().and_then(parse_id),
            related_report_id: self.related_report_id.as_ref().and_then(parse_id),
        })
    }
}

impl UpdateNotificationRequest {
    fn validate(self) -> Result<bool, ApiError> {
        let value = self
            .read_status
            .ok_or(ValidationError::NoUpdates {
                code: "NO_FIELDS_TO_UPDATE",
            })?;
        parse_read_status(&value)
            .ok_or_else(|| ApiError::bad_request("INVALID_READ_STATUS", "Invalid readStatus value"))
    }
}

/// GET /api/notifications - one notification by `?id`, or a filtered list
async fn get_notifications(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<NotificationQuery>,
) -> Result<Response, ApiError> {
    let repo = NotificationRepo::new(&state.pool);

    if let Some(raw) = non_blank(query.id.as_deref()) {
        let id = RecordId::parse(Some(raw))?;
        let notification = repo.get(id.get()).await?.ok_or_else(not_found)?;
        return Ok(Json(notification).into_response());
    }

    let filter = NotificationFilter {
        stakeholder_id: query_id(
            query.stakeholder_id.as_deref(),
            "stakeholderId",
            "INVALID_STAKEHOLDER_ID",
        )?,
        // Anything other than "true" means unread
        read_status: query.read_status.as_deref().map(|s| s == "true"),
        kind: non_blank(query.kind.as_deref())
            .map(NotificationType::parse)
            .transpose()?,
    };
    let page = Pagination::from_raw(query.limit.as_deref(), query.offset.as_deref());

    let notifications: Vec<Notification> = repo.list(filter, page).await?;
    Ok(Json(notifications).into_response())
}

/// POST /api/notifications
async fn create_notification(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    JsonBody(req): JsonBody<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let new = req.validate()?;
    let notification = NotificationRepo::new(&state.pool).create(new).await?;

    tracing::info!(
        notification_id = notification.id,
        stakeholder_id = notification.stakeholder_id,
        kind = %notification.kind,
        "notification sent"
    );
    audit::record(
        &state.pool,
        &actor,
        AuditAction::Create,
        AUDIT_TYPE,
        notification.id,
        None,
        snapshot(&notification),
    )
    .await;

    Ok((StatusCode::CREATED, Json(notification)))
}

/// PUT /api/notifications?id= - mark read or unread
async fn update_notification(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<UpdateNotificationRequest>,
) -> Result<Json<Notification>, ApiError> {
    let read = req.validate()?;
    let repo = NotificationRepo::new(&state.pool);

    let existing = repo.get(id.get()).await?.ok_or_else(not_found)?;
    let updated = repo.set_read(id.get(), read).await?.ok_or_else(not_found)?;

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

/// DELETE /api/notifications?id=
async fn delete_notification(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
) -> Result<Json<Value>, ApiError> {
    let deleted = NotificationRepo::new(&state.pool)
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
        "message": "Notification deleted successfully",
        "notification": deleted,
    })))
}

/// Notification routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/notifications",
        get(get_notifications)
            .post(create_notification)
            .put(update_notification)
            .delete(delete_notification),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_status_forms() {
        for truthy in [json!(true), json!(1), json!("1"), json!("true")] {
            assert_eq!(parse_read_status(&truthy), Some(true), "{truthy}");
        }
        for falsy in [json!(false), json!(0), json!("0"), json!("false")] {
            assert_eq!(parse_read_status(&falsy), Some(false), "{falsy}");
        }
        for bad in [json!(2), json!("yes"), json!(null), json!([true])] {
            assert_eq!(parse_read_status(&bad), None, "{bad}");
        }
    }

    #[test]
    fn update_requires_read_status() {
        let req: UpdateNotificationRequest = serde_json::from_value(json!({})).unwrap();
        match req.validate() {
            Err(ApiError::Validation(e)) => assert_eq!(e.code(), "NO_FIELDS_TO_UPDATE"),
            other => panic!("unexpected {other:?}"),
        }

        let req: UpdateNotificationRequest =
            serde_json::from_value(json!({ "readStatus": "maybe" })).unwrap();
        match req.validate() {
            Err(ApiError::BadRequest { code, .. }) => assert_eq!(code, "INVALID_READ_STATUS"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn create_drops_unparseable_related_ids() {
        let req: CreateNotificationRequest = serde_json::from_value(json!({
            "stakeholderId": 3,
            "message": " Please review Q1 ",
            "type": "reminder",
            "relatedEntityId": "abc",
            "relatedReportId": "12"
        }))
        .unwrap();

        let new = req.validate().unwrap();
        assert_eq!(new.message, "Please review Q1");
        assert_eq!(new.kind, NotificationType::Reminder);
        assert_eq!(new.related_entity_id, None);
        assert_eq!(new.related_report_id, Some(12));
    }

    #[test]
    fn create_rejects_unknown_type() {
        let req: CreateNotificationRequest = serde_json::from_value(json!({
            "stakeholderId": 3,
            "message": "hello",
            "type": "digest"
        }))
        .unwrap();
        assert_eq!(req.validate().unwrap_err().code(), "INVALID_TYPE");
    }
}

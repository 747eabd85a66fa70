//! Audit log endpoint - `/api/audit-logs` (read only)

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use crate::db::{AuditFilter, AuditLog, AuditRepo};
use crate::http::error::ApiError;
use crate::http::extractors::QueryParams;
use crate::http::server::AppState;
use crate::models::{non_blank, query_id, AuditAction, Pagination, ValidationError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub action: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl AuditQuery {
    fn filter(&self) -> Result<AuditFilter, ValidationError> {
        Ok(AuditFilter {
            entity_type: non_blank(self.entity_type.as_deref()).map(str::to_owned),
            entity_id: query_id(self.entity_id.as_deref(), "entityId", "INVALID_ENTITY_ID")?,
            action: non_blank(self.action.as_deref())
                .map(AuditAction::parse)
                .transpose()?,
            user_id: query_id(self.user_id.as_deref(), "userId", "INVALID_USER_ID")?,
        })
    }
}

/// GET /api/audit-logs - newest first
async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<AuditQuery>,
) -> Result<Json<Vec<AuditLog>>, ApiError> {
    let filter = query.filter()?;
    let page = Pagination::from_raw(query.limit.as_deref(), query.offset.as_deref());

    let logs = AuditRepo::new(&state.pool).list(filter, page).await?;
    Ok(Json(logs))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/audit-logs", get(list_audit_logs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_filter() {
        let query = AuditQuery {
            entity_type: Some(" entities ".into()),
            entity_id: Some("5".into()),
            action: Some("update".into()),
            user_id: Some("".into()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.entity_type.as_deref(), Some("entities"));
        assert_eq!(filter.entity_id, Some(5));
        assert_eq!(filter.action, Some(AuditAction::Update));
        assert_eq!(filter.user_id, None);
    }

    #[test]
    fn rejects_bad_filters() {
        let query = AuditQuery {
            action: Some("approve".into()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap_err().code(), "INVALID_ACTION");

        let query = AuditQuery {
            user_id: Some("-3".into()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap_err().code(), "INVALID_USER_ID");
    }
}

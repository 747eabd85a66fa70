//! API error types with IntoResponse
//!
//! Every error becomes `{ "error": <message>, "code": <CODE> }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Request rejected for a reason other than field validation (400)
    BadRequest { code: &'static str, message: String },

    /// Resource not found (404)
    NotFound {
        code: &'static str,
        message: &'static str,
    },

    /// Route exists but not for this method (405)
    MethodNotAllowed,

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500)
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: &'static str) -> Self {
        Self::NotFound { code, message }
    }

    /// Status code this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(e) => json!({ "error": e.to_string(), "code": e.code() }),
            Self::BadRequest { code, message } => json!({ "error": message, "code": code }),
            Self::NotFound { code, message } => json!({ "error": message, "code": code }),
            Self::MethodNotAllowed => {
                json!({ "error": "Method not allowed", "code": "METHOD_NOT_ALLOWED" })
            }
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                json!({
                    "error": format!("Internal server error: {}", e),
                    "code": "INTERNAL_ERROR"
                })
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                json!({
                    "error": format!("Internal server error: {}", message),
                    "code": "INTERNAL_ERROR"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict { constraint } => match constraint.as_str() {
                "entities_code_key" => {
                    Self::bad_request("DUPLICATE_CODE", "Entity with this code already exists")
                }
                "stakeholders_email_key" => {
                    Self::bad_request("DUPLICATE_EMAIL", "Email already exists")
                }
                _ => Self::bad_request(
                    "DUPLICATE_VALUE",
                    format!("unique constraint '{}' violated", constraint),
                ),
            },
            DbError::ForeignKey { constraint } => {
                let (code, message) = foreign_key_error(&constraint);
                Self::bad_request(code, message)
            }
            other @ DbError::Sqlx(_) => Self::Database(other),
        }
    }
}

/// Map a violated foreign key to the code of the offending request field.
fn foreign_key_error(constraint: &str) -> (&'static str, &'static str) {
    const KEYS: &[(&str, &str, &str)] = &[
        ("stakeholder_id_fkey", "INVALID_STAKEHOLDER_ID", "Referenced stakeholder does not exist"),
        ("trial_report_id_fkey", "INVALID_TRIAL_REPORT_ID", "Referenced trial report does not exist"),
        ("gl_account_id_fkey", "INVALID_GL_ACCOUNT_ID", "Referenced GL account does not exist"),
        ("entity_id_fkey", "INVALID_ENTITY_ID", "Referenced entity does not exist"),
        ("uploaded_by_fkey", "INVALID_UPLOADED_BY", "Referenced uploader does not exist"),
        ("reviewed_by_fkey", "INVALID_REVIEWED_BY", "Referenced reviewer does not exist"),
    ];

    KEYS.iter()
        .find(|(suffix, _, _)| constraint.ends_with(suffix))
        .map(|(_, code, message)| (*code, *message))
        .unwrap_or(("INVALID_REFERENCE", "Referenced record does not exist"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_is_400_with_code() {
        let err = ApiError::from(ValidationError::Missing {
            field: "Name",
            code: "MISSING_NAME",
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_NAME");
        assert_eq!(body["error"], "Name is required");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) =
            body_of(ApiError::not_found("ENTITY_NOT_FOUND", "Entity not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "ENTITY_NOT_FOUND");
    }

    #[tokio::test]
    async fn method_not_allowed_is_405() {
        let (status, body) = body_of(ApiError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    }

    #[tokio::test]
    async fn database_error_is_500_with_message() {
        let err = ApiError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Internal server error: "));
    }

    #[test]
    fn unique_violations_map_to_duplicate_codes() {
        let code = |constraint: &str| {
            match ApiError::from(DbError::Conflict {
                constraint: constraint.into(),
            }) {
                ApiError::BadRequest { code, .. } => code,
                other => panic!("unexpected {other:?}"),
            }
        };
        assert_eq!(code("entities_code_key"), "DUPLICATE_CODE");
        assert_eq!(code("stakeholders_email_key"), "DUPLICATE_EMAIL");
    }

    #[test]
    fn foreign_keys_map_to_field_codes() {
        assert_eq!(foreign_key_error("gl_accounts_entity_id_fkey").0, "INVALID_ENTITY_ID");
        assert_eq!(
            foreign_key_error("assignments_stakeholder_id_fkey").0,
            "INVALID_STAKEHOLDER_ID"
        );
        assert_eq!(
            foreign_key_error("variance_analysis_trial_report_id_fkey").0,
            "INVALID_TRIAL_REPORT_ID"
        );
        assert_eq!(foreign_key_error("trial_reports_reviewed_by_fkey").0, "INVALID_REVIEWED_BY");
        assert_eq!(foreign_key_error("mystery").0, "INVALID_REFERENCE");
    }
}

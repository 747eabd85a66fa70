//! Trial report endpoints - `/api/trial-reports`
//!
//! Also serves `/api/trial-reports/validate`, which checks a stored
//! report's debits against its credits.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use finreview_core::{check_trial_balance, BalanceCheck};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::{
    NewTrialReport, TrialReport, TrialReportChanges, TrialReportFilter, TrialReportRepo,
};
use crate::http::audit::{self, snapshot};
use crate::http::error::ApiError;
use crate::http::extractors::{Actor, IdParam, JsonBody, QueryParams};
use crate::http::server::AppState;
use crate::models::fields::{optional_amount, optional_id, required_amount, required_id, required_text};
use crate::models::{
    non_blank, nullable, parse_id, query_id, AuditAction, Pagination, RecordId, ReportStatus,
    ReportType, ValidationError,
};

const AUDIT_TYPE: &str = "trial_reports";

fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Trial report not found")
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialReportQuery {
    pub id: Option<String>,
    pub entity_id: Option<String>,
    pub status: Option<String>,
    pub report_type: Option<String>,
    pub reporting_period: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Create trial report request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrialReportRequest {
    pub entity_id: Option<Value>,
    pub reporting_period: Option<String>,
    pub report_type: Option<String>,
    pub total_debits: Option<Value>,
    pub total_credits: Option<Value>,
    pub uploaded_by: Option<Value>,
    pub file_url: Option<String>,
}

/// Update trial report request. `reviewedBy` and `fileUrl` accept `null`
/// to clear the stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrialReportRequest {
    pub status: Option<String>,
    pub total_debits: Option<Value>,
    pub total_credits: Option<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub reviewed_by: Option<Option<Value>>,
    #[serde(default, deserialize_with = "nullable")]
    pub file_url: Option<Option<String>>,
}

impl CreateTrialReportRequest {
    fn validate(self) -> Result<NewTrialReport, ValidationError> {
        let entity_id = required_id(
            self.entity_id.as_ref(),
            "Entity ID",
            "MISSING_ENTITY_ID",
            "INVALID_ENTITY_ID",
        )?;
        let reporting_period =
            required_text(self.reporting_period, "Reporting period", "MISSING_REPORTING_PERIOD")?;
        let report_type = ReportType::parse(&required_text(
            self.report_type,
            "Report type",
            "MISSING_REPORT_TYPE",
        )?)?;
        let total_debits = required_amount(
            self.total_debits.as_ref(),
            "Total debits",
            "MISSING_TOTAL_DEBITS",
            "INVALID_TOTAL_DEBITS",
        )?;
        let total_credits = required_amount(
            self.total_credits.as_ref(),
            "Total credits",
            "MISSING_TOTAL_CREDITS",
            "INVALID_TOTAL_CREDITS",
        )?;
        let uploaded_by = optional_id(self.uploaded_by.as_ref(), "Uploaded by", "INVALID_UPLOADED_BY")?;

        Ok(NewTrialReport {
            entity_id,
            reporting_period,
            report_type,
            total_debits,
            total_credits,
            uploaded_by,
            file_url: non_blank(self.file_url.as_deref()).map(str::to_owned),
        })
    }
}

impl UpdateTrialReportRequest {
    fn validate(self) -> Result<TrialReportChanges, ValidationError> {
        let status = non_blank(self.status.as_deref())
            .map(ReportStatus::parse)
            .transpose()?;

        let reviewed_by = match self.reviewed_by {
            None => None,
            Some(None) => Some(None),
            Some(Some(value)) => Some(Some(parse_id(&value).ok_or(
                ValidationError::InvalidNumber {
                    field: "Reviewed by",
                    code: "INVALID_REVIEWED_BY",
                },
            )?)),
        };

        // Blank clears the URL, like null
        let file_url = self
            .file_url
            .map(|url| url.as_deref().and_then(|u| non_blank(Some(u))).map(str::to_owned));

        Ok(TrialReportChanges {
            status,
            total_debits: optional_amount(
                self.total_debits.as_ref(),
                "Total debits",
                "INVALID_TOTAL_DEBITS",
            )?,
            total_credits: optional_amount(
                self.total_credits.as_ref(),
                "Total credits",
                "INVALID_TOTAL_CREDITS",
            )?,
            reviewed_by,
            file_url,
        })
    }
}

/// GET /api/trial-reports - one report by `?id`, or a filtered list
async fn get_reports(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<TrialReportQuery>,
) -> Result<Response, ApiError> {
    let repo = TrialReportRepo::new(&state.pool);

    if let Some(raw) = non_blank(query.id.as_deref()) {
        let id = RecordId::parse(Some(raw))?;
        let report = repo.get(id.get()).await?.ok_or_else(not_found)?;
        return Ok(Json(report).into_response());
    }

    let filter = TrialReportFilter {
        entity_id: query_id(query.entity_id.as_deref(), "entity ID", "INVALID_ENTITY_ID")?,
        status: non_blank(query.status.as_deref())
            .map(ReportStatus::parse)
            .transpose()?,
        report_type: non_blank(query.report_type.as_deref())
            .map(ReportType::parse)
            .transpose()?,
        reporting_period: non_blank(query.reporting_period.as_deref()).map(str::to_owned),
    };
    let page = Pagination::from_raw(query.limit.as_deref(), query.offset.as_deref());

    let reports: Vec<TrialReport> = repo.list(filter, page).await?;
    Ok(Json(reports).into_response())
}

/// POST /api/trial-reports
async fn create_report(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    JsonBody(req): JsonBody<CreateTrialReportRequest>,
) -> Result<(StatusCode, Json<TrialReport>), ApiError> {
    let new = req.validate()?;
    let report = TrialReportRepo::new(&state.pool).create(new).await?;

    tracing::info!(
        report_id = report.id,
        entity_id = report.entity_id,
        period = %report.reporting_period,
        difference = report.balance_difference,
        "trial report uploaded"
    );
    audit::record(
        &state.pool,
        &actor,
        AuditAction::Create,
        AUDIT_TYPE,
        report.id,
        None,
        snapshot(&report),
    )
    .await;

    Ok((StatusCode::CREATED, Json(report)))
}

/// PUT /api/trial-reports?id=
async fn update_report(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<UpdateTrialReportRequest>,
) -> Result<Json<TrialReport>, ApiError> {
    let changes = req.validate()?;
    let repo = TrialReportRepo::new(&state.pool);

    let existing = repo.get(id.get()).await?.ok_or_else(not_found)?;
    let updated = repo.update(id.get(), changes).await?.ok_or_else(not_found)?;

    if existing.status != updated.status {
        tracing::info!(
            report_id = updated.id,
            from = %existing.status,
            to = %updated.status,
            "trial report status changed"
        );
    }
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

/// DELETE /api/trial-reports?id=
async fn delete_report(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
) -> Result<Json<Value>, ApiError> {
    let deleted = TrialReportRepo::new(&state.pool)
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
        "message": "Trial report deleted successfully",
        "deletedReport": deleted,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub id: Option<String>,
}

/// Balance check for one stored report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub report_id: i64,
    #[serde(flatten)]
    pub check: BalanceCheck,
}

/// GET /api/trial-reports/validate?id=
async fn validate_report(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<ValidateQuery>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let raw = non_blank(query.id.as_deref())
        .ok_or_else(|| ApiError::bad_request("MISSING_ID", "ID parameter is required"))?;
    let id = RecordId::parse(Some(raw))?;

    let report = TrialReportRepo::new(&state.pool)
        .get(id.get())
        .await?
        .ok_or_else(|| ApiError::not_found("REPORT_NOT_FOUND", "Trial report not found"))?;

    let check = check_trial_balance(
        report.total_debits,
        report.total_credits,
        state.analysis.balance_tolerance,
    );
    tracing::debug!(report_id = report.id, valid = check.is_valid, "trial balance checked");

    Ok(Json(ValidationResponse {
        report_id: report.id,
        check,
    }))
}

/// Trial report routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/trial-reports",
            get(get_reports)
                .post(create_report)
                .put(update_report)
                .delete(delete_report),
        )
        .route("/api/trial-reports/validate", get(validate_report))
}

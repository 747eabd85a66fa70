//! Variance analysis endpoints - `/api/variance-analysis`
//!
//! Rows are either posted directly or produced by
//! `POST /api/variance-analysis/compute`, which runs the variance rules over
//! every GL account of a report's entity.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use finreview_core::{analyze_accounts, AccountBalances, Thresholds, VarianceFinding};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{GlAccountRepo, NewVariance, TrialReportRepo, Variance, VarianceRepo};
use crate::http::audit::{self, snapshot};
use crate::http::error::ApiError;
use crate::http::extractors::{Actor, IdParam, JsonBody, QueryParams};
use crate::http::server::AppState;
use crate::models::fields::{required_amount, required_id, required_text};
use crate::models::{
    non_blank, parse_id_str, AuditAction, PeriodComparison, RecordId, ValidationError,
};

const AUDIT_TYPE: &str = "variance_analysis";

/// Audit target for a computed batch; keyed by the report id.
const COMPUTE_AUDIT_TYPE: &str = "trial_report_variances";

fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Variance analysis not found")
}

fn invalid_report_id() -> ValidationError {
    ValidationError::InvalidId {
        field: "reportId",
        code: "INVALID_REPORT_ID",
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarianceQuery {
    pub id: Option<String>,
    pub report_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeQuery {
    pub report_id: Option<String>,
    pub period_comparison: Option<String>,
}

/// Create variance request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVarianceRequest {
    pub trial_report_id: Option<Value>,
    pub gl_account_id: Option<Value>,
    pub variance_amount: Option<Value>,
    pub variance_percentage: Option<Value>,
    pub period_comparison: Option<String>,
    pub anomaly_detected: Option<bool>,
    pub anomaly_reason: Option<String>,
}

impl CreateVarianceRequest {
    fn validate(self) -> Result<NewVariance, ValidationError> {
        let trial_report_id = required_id(
            self.trial_report_id.as_ref(),
            "trialReportId",
            "MISSING_TRIAL_REPORT_ID",
            "INVALID_TRIAL_REPORT_ID",
        )?;
        let gl_account_id = required_id(
            self.gl_account_id.as_ref(),
            "glAccountId",
            "MISSING_GL_ACCOUNT_ID",
            "INVALID_GL_ACCOUNT_ID",
        )?;
        let variance_amount = required_amount(
            self.variance_amount.as_ref(),
            "varianceAmount",
            "MISSING_VARIANCE_AMOUNT",
            "INVALID_VARIANCE_AMOUNT",
        )?;
        let variance_percentage = required_amount(
            self.variance_percentage.as_ref(),
            "variancePercentage",
            "MISSING_VARIANCE_PERCENTAGE",
            "INVALID_VARIANCE_PERCENTAGE",
        )?;
        let period_comparison = PeriodComparison::parse(&required_text(
            self.period_comparison,
            "periodComparison",
            "MISSING_PERIOD_COMPARISON",
        )?)?;

        Ok(NewVariance {
            trial_report_id,
            gl_account_id,
            variance_amount,
            variance_percentage,
            period_comparison,
            anomaly_detected: self.anomaly_detected.unwrap_or(false),
            anomaly_reason: non_blank(self.anomaly_reason.as_deref()).map(str::to_owned),
        })
    }
}

impl ComputeQuery {
    /// Report id is required; the comparison defaults to month over month.
    fn validate(&self) -> Result<(i64, PeriodComparison), ApiError> {
        let raw = non_blank(self.report_id.as_deref())
            .ok_or_else(|| ApiError::bad_request("MISSING_REPORT_ID", "reportId is required"))?;
        let report_id = parse_id_str(raw).ok_or_else(invalid_report_id)?;
        let period = non_blank(self.period_comparison.as_deref())
            .map(PeriodComparison::parse)
            .transpose()?
            .unwrap_or(PeriodComparison::MonthOverMonth);
        Ok((report_id, period))
    }
}

fn finding_to_row(report_id: i64, period: PeriodComparison, finding: VarianceFinding) -> NewVariance {
    NewVariance {
        trial_report_id: report_id,
        gl_account_id: finding.account_id,
        variance_amount: finding.amount,
        variance_percentage: finding.percentage,
        period_comparison: period,
        anomaly_detected: finding.anomaly,
        anomaly_reason: finding.reason,
    }
}

/// GET /api/variance-analysis - by `?reportId` or by `?id`
async fn get_variances(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<VarianceQuery>,
) -> Result<Response, ApiError> {
    let repo = VarianceRepo::new(&state.pool);

    if let Some(raw) = non_blank(query.report_id.as_deref()) {
        let report_id = parse_id_str(raw).ok_or_else(invalid_report_id)?;
        let rows = repo.list_for_report(report_id).await?;
        if rows.is_empty() {
            return Err(ApiError::not_found(
                "NOT_FOUND",
                "No variance data found for this report",
            ));
        }
        return Ok(Json(rows).into_response());
    }

    if let Some(raw) = non_blank(query.id.as_deref()) {
        let id = RecordId::parse(Some(raw))?;
        let variance = repo.get(id.get()).await?.ok_or_else(not_found)?;
        return Ok(Json(variance).into_response());
    }

    Err(ApiError::bad_request(
        "MISSING_PARAMETER",
        "Either id or reportId parameter is required",
    ))
}

/// POST /api/variance-analysis
async fn create_variance(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    JsonBody(req): JsonBody<CreateVarianceRequest>,
) -> Result<(StatusCode, Json<Variance>), ApiError> {
    let new = req.validate()?;
    let variance = VarianceRepo::new(&state.pool).create(new).await?;

    audit::record(
        &state.pool,
        &actor,
        AuditAction::Create,
        AUDIT_TYPE,
        variance.id,
        None,
        snapshot(&variance),
    )
    .await;

    Ok((StatusCode::CREATED, Json(variance)))
}

/// DELETE /api/variance-analysis?id=
async fn delete_variance(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
) -> Result<Json<Value>, ApiError> {
    let deleted = VarianceRepo::new(&state.pool)
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
        "message": "Variance analysis deleted successfully",
        "variance": deleted,
    })))
}

/// POST /api/variance-analysis/compute?reportId=&periodComparison=
async fn compute_variances(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    QueryParams(query): QueryParams<ComputeQuery>,
) -> Result<(StatusCode, Json<Vec<Variance>>), ApiError> {
    let (report_id, period) = query.validate()?;

    let report = TrialReportRepo::new(&state.pool)
        .get(report_id)
        .await?
        .ok_or_else(|| ApiError::not_found("REPORT_NOT_FOUND", "Trial report not found"))?;

    let accounts = GlAccountRepo::new(&state.pool)
        .all_for_entity(report.entity_id)
        .await?;
    if accounts.is_empty() {
        return Err(ApiError::not_found(
            "NO_GL_ACCOUNTS",
            "No GL accounts found for this report's entity",
        ));
    }

    let balances: Vec<AccountBalances> = accounts
        .iter()
        .map(|a| AccountBalances {
            account_id: a.id,
            current: a.current_balance,
            previous: a.previous_balance,
        })
        .collect();
    let findings = analyze_accounts(&balances, &Thresholds::from(&state.analysis));
    let anomalies = findings.iter().filter(|f| f.anomaly).count();

    let rows = findings
        .into_iter()
        .map(|f| finding_to_row(report.id, period, f))
        .collect();
    let inserted = VarianceRepo::new(&state.pool).insert_many(rows).await?;

    tracing::info!(
        report_id = report.id,
        entity_id = report.entity_id,
        accounts = inserted.len(),
        anomalies,
        period = %period,
        "variance analysis computed"
    );
    audit::record(
        &state.pool,
        &actor,
        AuditAction::Create,
        COMPUTE_AUDIT_TYPE,
        report.id,
        None,
        Some(json!({ "rows": inserted.len(), "periodComparison": period.as_str() })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(inserted)))
}

/// Variance analysis routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/variance-analysis",
            get(get_variances)
                .post(create_variance)
                .delete(delete_variance),
        )
        .route("/api/variance-analysis/compute", post(compute_variances))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> CreateVarianceRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn create_defaults() {
        let new = request(json!({
            "trialReportId": "4",
            "glAccountId": 9,
            "varianceAmount": "-1200.5",
            "variancePercentage": 12.5,
            "periodComparison": "QoQ",
            "anomalyReason": "   "
        }))
        .validate()
        .unwrap();

        assert_eq!(new.trial_report_id, 4);
        assert_eq!(new.variance_amount, -1200.5);
        assert_eq!(new.period_comparison, PeriodComparison::QuarterOverQuarter);
        assert!(!new.anomaly_detected);
        assert_eq!(new.anomaly_reason, None);
    }

    #[test]
    fn create_error_codes() {
        let cases = [
            (json!({}), "MISSING_TRIAL_REPORT_ID"),
            (json!({ "trialReportId": "x" }), "INVALID_TRIAL_REPORT_ID"),
            (json!({ "trialReportId": 1 }), "MISSING_GL_ACCOUNT_ID"),
            (
                json!({ "trialReportId": 1, "glAccountId": 2, "varianceAmount": "lots" }),
                "INVALID_VARIANCE_AMOUNT",
            ),
            (
                json!({
                    "trialReportId": 1, "glAccountId": 2,
                    "varianceAmount": 1, "variancePercentage": 1
                }),
                "MISSING_PERIOD_COMPARISON",
            ),
            (
                json!({
                    "trialReportId": 1, "glAccountId": 2,
                    "varianceAmount": 1, "variancePercentage": 1,
                    "periodComparison": "WoW"
                }),
                "INVALID_PERIOD_COMPARISON",
            ),
        ];

        for (body, code) in cases {
            assert_eq!(request(body).validate().unwrap_err().code(), code);
        }
    }

    #[test]
    fn compute_query_defaults_to_month_over_month() {
        let query = ComputeQuery {
            report_id: Some("7".into()),
            period_comparison: None,
        };
        let (id, period) = query.validate().unwrap();
        assert_eq!(id, 7);
        assert_eq!(period, PeriodComparison::MonthOverMonth);
    }

    #[test]
    fn compute_query_rejects_bad_report_id() {
        let query = ComputeQuery {
            report_id: Some("0".into()),
            period_comparison: None,
        };
        match query.validate() {
            Err(ApiError::Validation(e)) => assert_eq!(e.code(), "INVALID_REPORT_ID"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn findings_become_rows() {
        let finding = VarianceFinding {
            account_id: 3,
            amount: 500.0,
            percentage: 25.0,
            zscore: 0.0,
            anomaly: true,
            reason: Some("change 25.00% >= 20.00%".into()),
        };
        let row = finding_to_row(11, PeriodComparison::YearOverYear, finding);
        assert_eq!(row.trial_report_id, 11);
        assert_eq!(row.gl_account_id, 3);
        assert!(row.anomaly_detected);
        assert_eq!(row.period_comparison.as_str(), "YoY");
    }
}

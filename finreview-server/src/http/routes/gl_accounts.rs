//! GL account endpoints - `/api/gl-accounts`
//!
//! Lists are always scoped to one entity, so `entityId` is required there.

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

use crate::db::{GlAccount, GlAccountChanges, GlAccountFilter, GlAccountRepo, NewGlAccount};
use crate::http::audit::{self, snapshot};
use crate::http::error::ApiError;
use crate::http::extractors::{Actor, IdParam, JsonBody, QueryParams};
use crate::http::server::AppState;
use crate::models::fields::{optional_amount, optional_text, required_id, required_text};
use crate::models::{
    non_blank, parse_id_str, AccountType, AuditAction, Pagination, RecordId, ValidationError,
};

const AUDIT_TYPE: &str = "gl_accounts";
const DEFAULT_CURRENCY: &str = "USD";

fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "GL account not found")
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlAccountQuery {
    pub id: Option<String>,
    pub entity_id: Option<String>,
    pub account_type: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Create GL account request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGlAccountRequest {
    pub entity_id: Option<Value>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub account_type: Option<String>,
    pub current_balance: Option<Value>,
    pub previous_balance: Option<Value>,
    pub opening_balance: Option<Value>,
    pub currency: Option<String>,
}

/// Update GL account request. Entity and account number are fixed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGlAccountRequest {
    pub account_name: Option<String>,
    pub account_type: Option<String>,
    pub current_balance: Option<Value>,
    pub previous_balance: Option<Value>,
    pub opening_balance: Option<Value>,
    pub currency: Option<String>,
}

fn account_type(raw: Option<String>) -> Result<Option<AccountType>, ValidationError> {
    optional_text(raw, "account type", "INVALID_ACCOUNT_TYPE")?
        .map(|s| AccountType::parse(&s))
        .transpose()
}

impl CreateGlAccountRequest {
    fn validate(self) -> Result<NewGlAccount, ValidationError> {
        let entity_id = required_id(
            self.entity_id.as_ref(),
            "entityId",
            "MISSING_ENTITY_ID",
            "INVALID_ENTITY_ID",
        )?;
        let account_number =
            required_text(self.account_number, "accountNumber", "MISSING_ACCOUNT_NUMBER")?;
        let account_name = required_text(self.account_name, "accountName", "MISSING_ACCOUNT_NAME")?;
        let account_type = AccountType::parse(&required_text(
            self.account_type,
            "accountType",
            "MISSING_ACCOUNT_TYPE",
        )?)?;

        let balance = |value: Option<Value>, field: &'static str, code: &'static str| {
            optional_amount(value.as_ref(), field, code).map(|v| v.unwrap_or(0.0))
        };

        Ok(NewGlAccount {
            entity_id,
            account_number,
            account_name,
            account_type,
            current_balance: balance(
                self.current_balance,
                "currentBalance",
                "INVALID_CURRENT_BALANCE",
            )?,
            previous_balance: balance(
                self.previous_balance,
                "previousBalance",
                "INVALID_PREVIOUS_BALANCE",
            )?,
            opening_balance: balance(
                self.opening_balance,
                "openingBalance",
                "INVALID_OPENING_BALANCE",
            )?,
            currency: non_blank(self.currency.as_deref())
                .unwrap_or(DEFAULT_CURRENCY)
                .to_owned(),
        })
    }
}

impl UpdateGlAccountRequest {
    fn validate(self) -> Result<GlAccountChanges, ValidationError> {
        Ok(GlAccountChanges {
            account_name: optional_text(self.account_name, "accountName", "INVALID_ACCOUNT_NAME")?,
            account_type: account_type(self.account_type)?,
            current_balance: optional_amount(
                self.current_balance.as_ref(),
                "currentBalance",
                "INVALID_CURRENT_BALANCE",
            )?,
            previous_balance: optional_amount(
                self.previous_balance.as_ref(),
                "previousBalance",
                "INVALID_PREVIOUS_BALANCE",
            )?,
            opening_balance: optional_amount(
                self.opening_balance.as_ref(),
                "openingBalance",
                "INVALID_OPENING_BALANCE",
            )?,
            currency: optional_text(self.currency, "currency", "INVALID_CURRENCY")?,
        })
    }
}

/// GET /api/gl-accounts - one account by `?id`, or an entity's accounts
async fn get_accounts(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<GlAccountQuery>,
) -> Result<Response, ApiError> {
    let repo = GlAccountRepo::new(&state.pool);

    if let Some(raw) = non_blank(query.id.as_deref()) {
        let id = RecordId::parse(Some(raw))?;
        let account = repo.get(id.get()).await?.ok_or_else(not_found)?;
        return Ok(Json(account).into_response());
    }

    let raw_entity = non_blank(query.entity_id.as_deref()).ok_or_else(|| {
        ApiError::bad_request("MISSING_ENTITY_ID", "entityId is required for list queries")
    })?;
    let entity_id = parse_id_str(raw_entity).ok_or(ValidationError::InvalidId {
        field: "entityId",
        code: "INVALID_ENTITY_ID",
    })?;

    let filter = GlAccountFilter {
        entity_id,
        account_type: non_blank(query.account_type.as_deref())
            .map(AccountType::parse)
            .transpose()?,
        search: non_blank(query.search.as_deref()).map(str::to_owned),
    };
    let page = Pagination::from_raw(query.limit.as_deref(), query.offset.as_deref());

    let accounts: Vec<GlAccount> = repo.list(filter, page).await?;
    Ok(Json(accounts).into_response())
}

/// POST /api/gl-accounts
async fn create_account(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    JsonBody(req): JsonBody<CreateGlAccountRequest>,
) -> Result<(StatusCode, Json<GlAccount>), ApiError> {
    let new = req.validate()?;
    let account = GlAccountRepo::new(&state.pool).create(new).await?;

    tracing::info!(
        account_id = account.id,
        entity_id = account.entity_id,
        number = %account.account_number,
        "GL account created"
    );
    audit::record(
        &state.pool,
        &actor,
        AuditAction::Create,
        AUDIT_TYPE,
        account.id,
        None,
        snapshot(&account),
    )
    .await;

    Ok((StatusCode::CREATED, Json(account)))
}

/// PUT /api/gl-accounts?id=
async fn update_account(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
    JsonBody(req): JsonBody<UpdateGlAccountRequest>,
) -> Result<Json<GlAccount>, ApiError> {
    let changes = req.validate()?;
    let repo = GlAccountRepo::new(&state.pool);

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

/// DELETE /api/gl-accounts?id=
async fn delete_account(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    IdParam(id): IdParam,
) -> Result<Json<Value>, ApiError> {
    let deleted = GlAccountRepo::new(&state.pool)
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
        "message": "GL account deleted successfully",
        "deletedAccount": deleted,
    })))
}

/// GL account routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/gl-accounts",
        get(get_accounts)
            .post(create_account)
            .put(update_account)
            .delete(delete_account),
    )
}

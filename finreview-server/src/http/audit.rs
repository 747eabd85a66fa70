//! Audit trail for successful writes
//!
//! Recording never fails the request: a failed insert is logged and the
//! response goes out unchanged.

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

use super::extractors::Actor;
use crate::db::{AuditRepo, NewAuditLog};
use crate::models::AuditAction;

/// JSON snapshot of a row for `old_value`/`new_value`.
pub fn snapshot<T: Serialize>(row: &T) -> Option<Value> {
    serde_json::to_value(row).ok()
}

/// Write one audit row.
pub async fn record(
    pool: &PgPool,
    actor: &Actor,
    action: AuditAction,
    entity_type: &'static str,
    entity_id: i64,
    old_value: Option<Value>,
    new_value: Option<Value>,
) {
    let entry = NewAuditLog {
        user_id: actor.user_id,
        action,
        entity_type,
        entity_id,
        old_value,
        new_value,
        ip_address: actor.ip_address.clone(),
    };

    match AuditRepo::new(pool).record(entry).await {
        Ok(log) => tracing::debug!(audit_id = log.id, entity_type, entity_id, %action, "audit recorded"),
        Err(e) => tracing::warn!(error = %e, entity_type, entity_id, %action, "failed to record audit log"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Row {
        account_name: &'static str,
    }

    #[test]
    fn snapshot_uses_wire_names() {
        let value = snapshot(&Row { account_name: "Cash" }).unwrap();
        assert_eq!(value, json!({"accountName": "Cash"}));
    }
}

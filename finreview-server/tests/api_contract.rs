//! End-to-end CRUD contract against a real PostgreSQL database.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p finreview-server -- --ignored

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use finreview_server::db::migrations;
use finreview_server::{build_router, create_pool, AppState, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = create_pool(&url).await.expect("pool creation failed");
    migrations::run(&pool).await.expect("migrations failed");

    let config = ServerConfig::default();
    let state = AppState {
        pool,
        analysis: config.analysis.clone(),
    };
    build_router(state, &config)
}

/// Suffix that keeps unique columns from colliding across runs.
fn unique() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "7")
        .header("x-forwarded-for", "10.0.0.5, 172.16.0.1");
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn create_entity(app: &Router, code: &str) -> i64 {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/entities",
        Some(json!({
            "name": "Acme Holdings",
            "code": code,
            "department": "Finance",
            "region": "EMEA"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
#[ignore = "requires database"]
async fn entity_lifecycle_with_audit() {
    let app = app().await;
    let code = format!("ACME-{}", unique());
    let id = create_entity(&app, &code).await;

    let (status, body) = call(&app, Method::GET, &format!("/api/entities?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["code"], code.as_str());

    // Duplicate code is a 400, not a 500
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/entities",
        Some(json!({ "name": "Other", "code": code, "department": "Ops", "region": "NA" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_CODE");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/entities?id={id}"),
        Some(json!({ "status": "suspended" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "suspended");
    assert_eq!(body["name"], "Acme Holdings");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/audit-logs?entityType=entities&entityId={id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logs = body.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["action"], "update");
    assert_eq!(logs[0]["userId"], 7);
    assert_eq!(logs[0]["ipAddress"], "10.0.0.5");
    assert_eq!(logs[0]["oldValue"]["status"], "active");

    let (status, body) = call(&app, Method::DELETE, &format!("/api/entities?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entity"]["id"], id);

    let (status, body) = call(&app, Method::GET, &format!("/api/entities?id={id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ENTITY_NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires database"]
async fn trial_report_balance_and_review() {
    let app = app().await;
    let entity_id = create_entity(&app, &format!("TB-{}", unique())).await;

    let (status, report) = call(
        &app,
        Method::POST,
        "/api/trial-reports",
        Some(json!({
            "entityId": entity_id,
            "reportingPeriod": "2024-03",
            "reportType": "monthly",
            "totalDebits": "1500.00",
            "totalCredits": 1500
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{report}");
    assert_eq!(report["status"], "pending");
    assert_eq!(report["balanceDifference"], 0.0);
    let id = report["id"].as_i64().unwrap();

    let (status, check) = call(
        &app,
        Method::GET,
        &format!("/api/trial-reports/validate?id={id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["isValid"], true);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/api/trial-reports?id={id}"),
        Some(json!({ "totalCredits": 1400, "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["balanceDifference"], 100.0);
    assert!(updated["reviewedAt"].is_string());
}

#[tokio::test]
#[ignore = "requires database"]
async fn compute_variances_for_report() {
    let app = app().await;
    let entity_id = create_entity(&app, &format!("VAR-{}", unique())).await;

    for (number, current, previous) in [("1000", 1200.0, 1000.0), ("2000", 50.0, 50.0)] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/gl-accounts",
            Some(json!({
                "entityId": entity_id,
                "accountNumber": number,
                "accountName": format!("Account {number}"),
                "accountType": "Asset",
                "currentBalance": current,
                "previousBalance": previous
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (_, report) = call(
        &app,
        Method::POST,
        "/api/trial-reports",
        Some(json!({
            "entityId": entity_id,
            "reportingPeriod": "2024-Q1",
            "reportType": "quarterly",
            "totalDebits": 10,
            "totalCredits": 10
        })),
    )
    .await;
    let report_id = report["id"].as_i64().unwrap();

    let (status, rows) = call(
        &app,
        Method::POST,
        &format!("/api/variance-analysis/compute?reportId={report_id}&periodComparison=QoQ"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{rows}");
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["varianceAmount"], 200.0);
    assert_eq!(rows[0]["variancePercentage"], 20.0);
    assert_eq!(rows[1]["varianceAmount"], 0.0);

    let (status, joined) = call(
        &app,
        Method::GET,
        &format!("/api/variance-analysis?reportId={report_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined[0]["accountNumber"], "1000");
    assert_eq!(joined[0]["periodComparison"], "QoQ");
}

#[tokio::test]
#[ignore = "requires database"]
async fn foreign_keys_map_to_field_codes() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/gl-accounts",
        Some(json!({
            "entityId": i64::MAX,
            "accountNumber": "9999",
            "accountName": "Orphan",
            "accountType": "Expense"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ENTITY_ID");
}

async fn create_stakeholder(app: &Router, email: &str) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/stakeholders",
        Some(json!({
            "name": "Dana Reviewer",
            "email": email,
            "role": "checker",
            "department": "Controllership"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
#[ignore = "requires database"]
async fn stakeholder_round_trip_and_duplicate_email() {
    let app = app().await;
    let email = format!("dana.{}@corp.io", unique());
    let created = create_stakeholder(&app, &email).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["entities"], json!([]));
    assert_eq!(created["notificationPreferences"]["inApp"], true);

    let (status, body) = call(&app, Method::GET, &format!("/api/stakeholders?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["role"], "checker");

    // Same address in another case collides after lowercasing
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/stakeholders",
        Some(json!({
            "name": "Dana Again",
            "email": email.to_uppercase(),
            "role": "maker",
            "department": "Finance"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_EMAIL");

    let (status, body) = call(&app, Method::GET, "/api/stakeholders?id=999999999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires database"]
async fn gl_account_round_trip() {
    let app = app().await;
    let entity_id = create_entity(&app, &format!("GL-{}", unique())).await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/gl-accounts",
        Some(json!({
            "entityId": entity_id,
            "accountNumber": "4000",
            "accountName": "Revenue",
            "accountType": "Revenue",
            "currentBalance": "2500.50"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let id = created["id"].as_i64().unwrap();

    let (status, body) = call(&app, Method::GET, &format!("/api/gl-accounts?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accountNumber"], "4000");
    assert_eq!(body["currentBalance"], 2500.5);
    assert_eq!(body["currency"], "USD");

    let (status, listed) = call(
        &app,
        Method::GET,
        &format!("/api/gl-accounts?entityId={entity_id}&search=reven"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, body) = call(&app, Method::GET, "/api/gl-accounts?id=999999999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires database"]
async fn assignment_completion_timestamps() {
    let app = app().await;
    let entity_id = create_entity(&app, &format!("ASG-{}", unique())).await;
    let stakeholder = create_stakeholder(&app, &format!("asg.{}@corp.io", unique())).await;
    let stakeholder_id = stakeholder["id"].as_i64().unwrap();

    let create = || {
        call(
            &app,
            Method::POST,
            "/api/assignments",
            Some(json!({
                "entityId": entity_id,
                "stakeholderId": stakeholder_id,
                "roleType": "reviewer",
                "dueDate": "2024-04-15"
            })),
        )
    };

    let (status, created) = create().await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["status"], "pending");
    assert!(created["completedAt"].is_null());
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/assignments?id={id}");

    let (status, fetched) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["dueDate"], "2024-04-15");

    // Completing stamps the time once
    let (_, completed) = call(&app, Method::PUT, &uri, Some(json!({ "status": "completed" }))).await;
    let stamped = completed["completedAt"].as_str().unwrap().to_owned();
    let (_, again) = call(&app, Method::PUT, &uri, Some(json!({ "status": "completed" }))).await;
    assert_eq!(again["completedAt"], stamped.as_str());

    // An explicit timestamp wins over the stamp
    let (status, second) = create().await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, explicit) = call(
        &app,
        Method::PUT,
        &format!("/api/assignments?id={}", second["id"]),
        Some(json!({ "status": "completed", "completedAt": "2024-04-10T09:30:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{explicit}");
    let at: chrono::DateTime<chrono::Utc> =
        explicit["completedAt"].as_str().unwrap().parse().unwrap();
    assert_eq!(at.to_rfc3339(), "2024-04-10T09:30:00+00:00");

    let (status, body) = call(&app, Method::GET, "/api/assignments?id=999999999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ASSIGNMENT_NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires database"]
async fn notification_read_flag() {
    let app = app().await;
    let stakeholder = create_stakeholder(&app, &format!("note.{}@corp.io", unique())).await;
    let stakeholder_id = stakeholder["id"].as_i64().unwrap();

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/notifications",
        Some(json!({
            "stakeholderId": stakeholder_id,
            "message": "March trial balance is ready for review",
            "type": "approval_request"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["readStatus"], false);
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = call(&app, Method::GET, &format!("/api/notifications?id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["type"], "approval_request");

    let unread_uri = format!("/api/notifications?stakeholderId={stakeholder_id}&readStatus=false");
    let (_, unread) = call(&app, Method::GET, &unread_uri, None).await;
    assert_eq!(unread.as_array().unwrap().len(), 1);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/api/notifications?id={id}"),
        Some(json!({ "readStatus": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["readStatus"], true);

    let (_, unread) = call(&app, Method::GET, &unread_uri, None).await;
    assert!(unread.as_array().unwrap().is_empty());

    let (status, body) = call(&app, Method::GET, "/api/notifications?id=999999999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

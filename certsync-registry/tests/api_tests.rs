//! Integration tests for the certsync-registry HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use certsync_common::events::EventBus;
use certsync_registry::{AppState, IssuerConfig};

const CENTER_NAME: &str = "АНО ДПО Учебный центр";

/// Test helper: create test app with in-memory database
async fn create_test_app() -> (axum::Router, sqlx::SqlitePool, Uuid) {
    let pool = certsync_common::db::connect_memory()
        .await
        .expect("Failed to create in-memory database");

    let issuer = IssuerConfig {
        training_center_id: Uuid::new_v4(),
        training_center_name: CENTER_NAME.to_string(),
        issued_by: "Комиссия УЦ".to_string(),
    };
    let center_id = issuer.training_center_id;

    let state = AppState::new(pool.clone(), EventBus::new(100), issuer);
    (certsync_registry::build_router(state), pool, center_id)
}

async fn register_tenant_organization(pool: &sqlx::SqlitePool, tenant: Uuid) {
    sqlx::query("INSERT INTO organizations (guid, name, inn, tenant_id) VALUES (?, ?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind("ООО Промышленность")
        .bind("7701234567")
        .bind(tenant.to_string())
        .execute(pool)
        .await
        .expect("Failed to register organization");
}

fn issue_body(tenant: Uuid, number: &str) -> Value {
    json!({
        "client_tenant_id": tenant,
        "personnel_name": "Иванов И.И.",
        "program_id": "program-1",
        "program_name": "Промышленная безопасность А.1",
        "certificate_number": number,
        "protocol_number": "ПБ-123/2024",
        "protocol_date": "2024-01-15",
        "issue_date": "2024-01-15",
        "expiry_date": "2029-01-15",
        "category": "industrial_safety",
        "area": "А.1"
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_reports_module_and_uptime() {
    let (app, _pool, _center) = create_test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "certsync-registry");
}

#[tokio::test]
async fn manual_issue_then_list() {
    let (app, _pool, _center) = create_test_app().await;
    let tenant = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(post_json("/certificates", &issue_body(tenant, "УД-2024-001")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["status"], "issued");
    assert_eq!(created["certificate_number"], "УД-2024-001");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/certificates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = response_json(response).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_certificate_number_is_a_conflict() {
    let (app, _pool, _center) = create_test_app().await;
    let tenant = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(post_json("/certificates", &issue_body(tenant, "УД-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_json("/certificates", &issue_body(tenant, "УД-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn expiry_before_issue_is_a_bad_request() {
    let (app, _pool, _center) = create_test_app().await;
    let mut body = issue_body(Uuid::new_v4(), "УД-1");
    body["expiry_date"] = json!("2020-01-01");

    let response = app.oneshot(post_json("/certificates", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deliver_transitions_once_then_conflicts() {
    let (app, _pool, _center) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/certificates", &issue_body(Uuid::new_v4(), "УД-1")))
        .await
        .unwrap();
    let created = response_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let uri = format!("/certificates/{}/deliver", id);
    let response = app
        .clone()
        .oneshot(post_json(&uri, &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let delivered = response_json(response).await;
    assert_eq!(delivered["status"], "delivered");

    // A second confirmation is refused, not silently accepted
    let response = app.oneshot(post_json(&uri, &json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_certificate_is_not_found() {
    let (app, _pool, _center) = create_test_app().await;

    let uri = format!("/certificates/{}", Uuid::new_v4());
    let response = app
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_preview_reports_row_verdicts() {
    let (app, _pool, _center) = create_test_app().await;

    let text = "\
ФИО;Номер удостоверения;Номер протокола;Дата протокола;Дата выдачи;Срок действия;Область аттестации\n\
Иванов И.И.;УД-1;ПБ-1;2024-05-10;2024-05-10;2029-05-10;А.1\n\
Петров П.П.;УД-2;ПБ-1;2024-05-10;2024-05-10;2023-01-01;А.1\n";

    let response = app
        .oneshot(post_json(
            "/certificates/import/preview",
            &json!({ "text": text }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let preview = response_json(response).await;
    let rows = preview["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0]["issues"].as_array().unwrap().is_empty());
    assert_eq!(rows[1]["issues"][0], "expiry_before_issue");
    assert_eq!(preview["data_lines"], 2);
    assert_eq!(preview["skipped_rows"], 0);
}

#[tokio::test]
async fn import_commit_then_sync_then_annotate() {
    let (app, pool, _center) = create_test_app().await;
    let tenant = Uuid::new_v4();
    register_tenant_organization(&pool, tenant).await;

    let commit_body = json!({
        "rows": [
            {
                "line_number": 2,
                "holder_name": "Иванов И.И.",
                "certificate_number": "УД-1",
                "protocol_number": "ПБ-1",
                "protocol_date": "2024-05-10",
                "issue_date": "2024-05-10",
                "expiry_date": "2029-05-10",
                "area": "А.1"
            },
            {
                "line_number": 3,
                "holder_name": "Петров П.П.",
                "certificate_number": "УД-2",
                "protocol_number": "ПБ-1",
                "protocol_date": "2024-05-10",
                "issue_date": "2024-05-10",
                "expiry_date": "2029-05-10",
                "area": "А.1"
            }
        ],
        "client_tenant_id": tenant,
        "program_id": "program-1",
        "program_name": "Промышленная безопасность А.1",
        "category": "industrial_safety"
    });

    let response = app
        .clone()
        .oneshot(post_json("/certificates/import/commit", &commit_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = response_json(response).await;
    let issued_ids = outcome["issued_ids"].as_array().unwrap().clone();
    assert_eq!(issued_ids.len(), 2);
    assert!(outcome["failures"].as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(post_json(
            "/certificates/sync",
            &json!({ "certificate_ids": issued_ids }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = response_json(response).await;
    assert_eq!(report["tenants_notified"], 1);

    let uri = format!("/qualifications?tenant_id={}", tenant);
    let response = app
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let records = response_json(response).await;
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);

    // Tenant-side annotation of one record
    let record_id = records[0]["id"].as_str().unwrap();
    let uri = format!("/qualifications/{}", record_id);
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(&uri)
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "verified": true, "notes": "проверено" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let annotated = response_json(response).await;
    assert_eq!(annotated["verified"], true);
    assert_eq!(annotated["notes"], "проверено");
}

#[tokio::test]
async fn manual_issue_with_auto_sync_lands_in_the_client_store() {
    let (app, pool, _center) = create_test_app().await;
    let tenant = Uuid::new_v4();
    register_tenant_organization(&pool, tenant).await;

    let mut body = issue_body(tenant, "УД-1");
    body["auto_sync"] = json!(true);

    let response = app
        .clone()
        .oneshot(post_json("/certificates", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["status"], "synced");
    assert_eq!(created["sync"]["tenants_notified"], 1);

    let uri = format!("/qualifications?tenant_id={}", tenant);
    let response = app
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let records = response_json(response).await;
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sync_with_empty_selection_is_a_bad_request() {
    let (app, _pool, _center) = create_test_app().await;

    let response = app
        .oneshot(post_json(
            "/certificates/sync",
            &json!({ "certificate_ids": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_returns_delimited_text() {
    let (app, _pool, _center) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/certificates", &issue_body(Uuid::new_v4(), "УД-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/certificates/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("ФИО;Организация"));
    assert!(text.contains("УД-1"));
}

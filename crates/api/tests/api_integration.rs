//! Integration tests for the API server.

use std::io::Cursor;
use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use calamine::{Reader, Xlsx, open_workbook_from_rs};
use domain::{CredentialSet, WorkflowSettings};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use sheet_store::{InMemorySessionStore, InMemorySheetStore, OrderLogSheetExt, RawInventoryRow};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with_sheets() -> (axum::Router, InMemorySheetStore) {
    let sheets = InMemorySheetStore::with_inventory(vec![
        RawInventoryRow::new("Blue Widget", "10"),
        RawInventoryRow::new("Gizmo", "2"),
    ]);
    let state = api::create_default_state(
        sheets.clone(),
        InMemorySessionStore::new(),
        CredentialSet::new().with("clerk", "hunter2"),
        WorkflowSettings::default(),
    );
    (api::create_app(state, get_metrics_handle()), sheets)
}

fn setup() -> axum::Router {
    setup_with_sheets().0
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &axum::Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&payload).unwrap()))
            .unwrap(),
    )
    .await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn open_session(app: &axum::Router) -> String {
    let (status, json) = post_json(app, "/sessions", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    json["session_id"].as_str().unwrap().to_string()
}

async fn interact(app: &axum::Router, id: &str, interaction: Value) -> Value {
    let (status, json) = post_json(app, &format!("/sessions/{id}/interactions"), interaction).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {json}");
    json
}

/// Drives a session from login to a submitted order of three widgets.
async fn submit_order(app: &axum::Router) -> String {
    let id = open_session(app).await;
    interact(app, &id, json!({"type": "login", "login_id": "clerk", "secret": "hunter2"})).await;
    interact(app, &id, json!({"type": "identify_customer", "customer_name": "Jane Doe"})).await;
    interact(app, &id, json!({"type": "browse", "search_term": "widget"})).await;
    interact(app, &id, json!({"type": "browse", "qty_edits": {"Blue Widget": 3}})).await;
    interact(app, &id, json!({"type": "view_cart"})).await;
    let json = interact(
        app,
        &id,
        json!({"type": "submit", "price_edits": {"Blue Widget": "9.99"}}),
    )
    .await;
    assert_eq!(json["phase"], "Committed");
    id
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "order-desk");
}

#[tokio::test]
async fn test_open_session_presents_login() {
    let app = setup();
    let (status, json) = post_json(&app, "/sessions", json!({})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["phase"], "Unauthenticated");
    assert_eq!(json["version"], 1);
    assert_eq!(json["presentation"]["view"]["kind"], "login");
}

#[tokio::test]
async fn test_failed_login_is_a_notice() {
    let app = setup();
    let id = open_session(&app).await;

    let json = interact(
        &app,
        &id,
        json!({"type": "login", "login_id": "clerk", "secret": "wrong"}),
    )
    .await;
    assert_eq!(json["phase"], "Unauthenticated");
    assert_eq!(json["presentation"]["notices"][0]["level"], "error");
}

#[tokio::test]
async fn test_catalog_view_after_identification() {
    let app = setup();
    let id = open_session(&app).await;
    interact(&app, &id, json!({"type": "login", "login_id": "clerk", "secret": "hunter2"})).await;
    let json = interact(
        &app,
        &id,
        json!({"type": "identify_customer", "customer_name": "Jane Doe"}),
    )
    .await;

    assert_eq!(json["phase"], "Browsing");
    assert!(json["presentation"]["customer_id"]
        .as_str()
        .unwrap()
        .starts_with("JAN-"));
    let view = &json["presentation"]["view"];
    assert_eq!(view["kind"], "catalog");
    assert_eq!(view["total_matches"], 2);
    assert_eq!(view["rows"][0]["sku_code"], "-");
    assert_eq!(view["rows"][1]["max_orderable"], 2);
}

#[tokio::test]
async fn test_full_order_through_http() {
    let (app, sheets) = setup_with_sheets();
    let id = submit_order(&app).await;

    assert_eq!(sheets.order_log_len().await.unwrap(), 1);

    let (status, json) = get_json(&app, &format!("/sessions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["presentation"]["view"]["kind"], "committed");
    assert_eq!(json["presentation"]["view"]["total_units"], 3);
    assert_eq!(json["presentation"]["view"]["priced_total"], "29.97");

    let replay = interact(&app, &id, json!({"type": "submit"})).await;
    assert_eq!(replay["phase"], "Committed");
    assert_eq!(sheets.order_log_len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_receipt_is_html() {
    let app = setup();
    let id = submit_order(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/sessions/{id}/receipt"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("window.print()"));
    assert!(html.contains("Jane Doe"));
}

#[tokio::test]
async fn test_export_is_an_xlsx_attachment() {
    let app = setup();
    let id = submit_order(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/sessions/{id}/export"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"order_Jane_Doe.xlsx\""
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(body.to_vec())).unwrap();
    let range = workbook.worksheet_range("Order Summary").unwrap();
    assert_eq!(range.rows().count(), 2);
}

#[tokio::test]
async fn test_receipt_before_commit_is_not_found() {
    let app = setup();
    let id = open_session(&app).await;
    let (status, json) = get_json(&app, &format!("/sessions/{id}/receipt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_delete_session() {
    let app = setup();
    let id = open_session(&app).await;
    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(format!("/sessions/{id}"))
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get_json(&app, &format!("/sessions/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = setup();
    let (status, _) = get_json(&app, "/sessions/00000000-0000-0000-0000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_session_id_is_bad_request() {
    let app = setup();
    let (status, json) = get_json(&app, "/sessions/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid session id"));
}

#[tokio::test]
async fn test_unknown_interaction_is_rejected() {
    let app = setup();
    let id = open_session(&app).await;
    let (status, _) = post_json(
        &app,
        &format!("/sessions/{id}/interactions"),
        json!({"type": "teleport"}),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let id = open_session(&app).await;
    interact(&app, &id, json!({"type": "refresh"})).await;

    let (status, body) = send(
        &app,
        Request::builder().uri("/metrics").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("order_desk_interactions_total"));
}

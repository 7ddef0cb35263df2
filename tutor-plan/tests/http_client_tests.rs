//! HttpProgressApi against an in-process axum server
//!
//! Tests cover:
//! - Wire names of catalog, preset and batch payloads
//! - Bearer header forwarding
//! - Error status and undecodable body classification

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tutor_common::config::ApiConfig;
use tutor_common::{AuthSession, Session};
use tutor_plan::{AddBooksSession, ApiError, CustomBookForm, HttpProgressApi, ProgressApi};

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth_headers: Arc<Mutex<Vec<String>>>,
}

fn record_auth(state: &Recorded, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.auth_headers.lock().unwrap().push(value.to_string());
    }
}

async fn master(State(state): State<Recorded>, headers: HeaderMap) -> Json<Value> {
    record_auth(&state, &headers);
    Json(json!([
        {"id": 1, "subject": "英語", "level": "基礎徹底", "book_name": "Book A", "duration": 20.0},
        {"id": 2, "subject": "英語", "level": "日大", "book_name": "Book B", "duration": null}
    ]))
}

async fn presets() -> Json<Value> {
    Json(json!([{
        "id": 5,
        "name": "Starter Pack",
        "subject": "英語",
        "books": [
            {"id": 1, "subject": "英語", "level": "基礎徹底", "book_name": "Book A", "duration": 20.0, "is_master": true},
            {"id": null, "subject": "英語", "level": "基礎徹底", "book_name": "Worksheet X", "duration": 2.0, "is_master": false}
        ]
    }]))
}

async fn batch(State(state): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    let count = body["book_ids"].as_array().map(Vec::len).unwrap_or(0)
        + body["custom_books"].as_array().map(Vec::len).unwrap_or(0);
    state.bodies.lock().unwrap().push(body);
    Json(json!({"message": format!("{} items added", count)}))
}

async fn list(Path(student_id): Path<i64>) -> Json<Value> {
    Json(json!([
        {"id": 10, "student_id": student_id, "subject": "英語", "level": "基礎徹底",
         "book_name": "Book A", "duration": 20.0, "completed_units": 1, "total_units": 2,
         "is_planned": true, "is_done": false}
    ]))
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

async fn start_server() -> (String, Recorded) {
    let state = Recorded::default();
    let router = Router::new()
        .route("/api/v1/dashboard/books/master", get(master))
        .route("/api/v1/dashboard/presets", get(presets))
        .route("/api/v1/dashboard/progress/batch", post(batch))
        .route("/api/v1/dashboard/list/:student_id", get(list))
        .with_state(state.clone());
    (spawn(router).await, state)
}

fn client(base_url: &str, token: Option<&str>) -> HttpProgressApi {
    let config = ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        token: None,
    };
    let auth = AuthSession::new(Session::student("kid", 42), token.map(str::to_string));
    HttpProgressApi::new(&config, &auth).unwrap()
}

#[tokio::test]
async fn test_catalog_and_presets_decode() {
    let (base, state) = start_server().await;
    let api = client(&base, Some("secret"));

    let catalog = api.master_catalog().await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[0].name, "Book A");
    assert_eq!(catalog[1].duration_hours, 0.0);

    let presets = api.presets().await.unwrap();
    assert_eq!(presets[0].books[0].catalog_id, Some(1));
    assert!(presets[0].books[0].is_from_catalog);
    assert_eq!(presets[0].books[1].catalog_id, None);

    assert_eq!(
        state.auth_headers.lock().unwrap().as_slice(),
        &["Bearer secret".to_string()]
    );
}

#[tokio::test]
async fn test_session_submit_over_http() {
    let (base, state) = start_server().await;
    let api = client(&base, None);

    let catalog = api.master_catalog().await.unwrap();
    let presets = api.presets().await.unwrap();

    let mut session = AddBooksSession::for_student(42);
    session.open();
    session.add_from_preset(&presets[0]).unwrap();
    session.add_from_catalog(&catalog[1]).unwrap();
    session
        .add_custom(&CustomBookForm::new("数学", "", "Notes", "abc"))
        .unwrap();

    let receipt = session.submit(&api).await.unwrap();

    assert_eq!(receipt.added, Some(4));
    assert_eq!(receipt.progress.as_ref().map(|p| p[0].student_id), Some(Some(42)));

    let bodies = state.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["student_id"], 42);
    assert_eq!(bodies[0]["book_ids"], json!([1, 2]));
    assert_eq!(bodies[0]["custom_books"][0]["book_name"], "Worksheet X");
    assert_eq!(bodies[0]["custom_books"][1]["level"], "custom");
    assert_eq!(bodies[0]["custom_books"][1]["duration"], 0.0);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let router = Router::new().route(
        "/api/v1/dashboard/progress/batch",
        post(|| async { (StatusCode::UNAUTHORIZED, "Could not validate credentials") }),
    );
    let base = spawn(router).await;
    let api = client(&base, Some("expired"));

    let mut session = AddBooksSession::for_student(42);
    session.open();
    session
        .add_custom(&CustomBookForm::new("数学", "", "Notes", "1"))
        .unwrap();

    let err = session.submit(&api).await.unwrap_err();
    match err {
        tutor_plan::PlanError::Submission(e) => {
            assert!(e.source.is_unauthorized());
            assert!(e.is_safe_to_retry());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(session.candidates().len(), 1);
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let router = Router::new().route(
        "/api/v1/dashboard/presets",
        get(|| async { "<html>maintenance</html>" }),
    );
    let base = spawn(router).await;

    let err = client(&base, None).presets().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
}

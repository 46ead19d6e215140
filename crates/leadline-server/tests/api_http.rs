use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use leadline_server::api_assign::franchisee_id;
use leadline_server::config::{Config, ConfigError};
use leadline_server::{app, AppState};
use serde_json::{json, Value};
use std::io::Write;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn default_state() -> AppState {
    AppState::from_config(&Config::default()).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = app(default_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn diag_runtime_hides_urls() {
    let mut config = Config::default();
    config.dialogue.speak_sleep_ms = 250;
    config.dispatch.assign_url = Some("http://secret.internal/assign".into());
    let state = AppState::from_config(&config).unwrap();

    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/diag_runtime")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["language"], "es-ES");
    assert_eq!(body["lexicon"], "es");
    assert_eq!(body["speak_sleep_ms"], 250);
    assert_eq!(body["cooldown_ms"], 1200);
    assert_eq!(body["knowledge_topics"], 8);
    assert_eq!(body["assign"]["default"], true);
    assert_eq!(body["assign"]["prospect"], false);
    assert_eq!(body["assign"]["timeout_ms"], 2000);
    assert_eq!(body["handoff_number"], "+34616232306");
    assert!(!body.to_string().contains("secret.internal"));
}

#[tokio::test]
async fn assign_builds_task() {
    let lead = json!({
        "call_id": "CA1",
        "lead_type": "lead",
        "role": "propietario",
        "city": " Madrid ",
        "zone": "Centro",
        "name": "Juan Pérez",
        "phone": "612345678"
    });
    let response = app(default_state())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assign")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(lead.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    let task = &body["task"];
    assert_eq!(task["title"], "Contactar lead");
    assert_eq!(task["zone_key"], "madrid-centro");
    assert_eq!(task["franchisee_id"], franchisee_id("madrid-centro"));
    assert_eq!(task["lead"], lead);
    assert!(task["created_at"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn assign_rejects_malformed_body() {
    let response = app(default_state())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/assign")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[test]
fn state_loads_custom_knowledge_table() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        b"[[topic]]\nid = \"parking\"\npatterns = [\"garaje\"]\nanswers = [\"Algunas viviendas tienen garaje.\"]\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.knowledge.path = Some(file.path().to_path_buf());
    let state = AppState::from_config(&config).unwrap();
    assert_eq!(state.dialogue.knowledge.topics().len(), 1);
}

#[test]
fn state_reports_bad_resources() {
    let mut config = Config::default();
    config.knowledge.path = Some("/nonexistent/knowledge.toml".into());
    assert!(matches!(
        AppState::from_config(&config),
        Err(ConfigError::Knowledge(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.dispatch.lead_log_path = Some(dir.path().join("missing").join("leads.jsonl"));
    assert!(matches!(
        AppState::from_config(&config),
        Err(ConfigError::LeadLog(_))
    ));
}

//! Integration test: dashboard routes and runner lifecycle

use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use explain_viz::dashboard::{
    create_router, DashboardConfig, DashboardRunner, DashboardState, ExplanationRegistry,
    RunnerState, ShutdownTrigger,
};
use explain_viz::explanation::ExplanationRecord;
use serde_json::json;
use tower::ServiceExt;

fn sample_record() -> ExplanationRecord {
    ExplanationRecord::from_value(json!({
        "explanation_type": "global",
        "name": "Income model",
        "feature_names": ["Age", "Age x Income"],
        "feature_types": ["continuous", "pairwise"],
        "overall": {"names": ["Age", "Age x Income"], "scores": [0.7, -0.2]},
        "specific": [
            {"names": [18, 40], "scores": [0.1, 0.3]},
            {"left_names": [18], "right_names": [0, 1], "scores": [[0.2, 0.4]]}
        ]
    }))
    .unwrap()
}

fn test_app() -> (axum::Router, Arc<ExplanationRegistry>, Arc<ShutdownTrigger>) {
    let registry = Arc::new(ExplanationRegistry::new());
    let (trigger, _rx) = ShutdownTrigger::new();
    let trigger = Arc::new(trigger);
    let state = Arc::new(DashboardState::new(Arc::clone(&registry), Arc::clone(&trigger)));
    (create_router(state), registry, trigger)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, bytes.to_vec())
}

// ============================================================================
// Routes
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _) = test_app();
    let (status, body) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_index_lists_registered_explanations() {
    let (app, registry, _) = test_app();
    let id = registry.register(Arc::new(sample_record()));
    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Income model"));
    assert!(html.contains(&format!("/api/explanations/{}/figure", id)));
}

#[tokio::test]
async fn test_list_and_get_explanation() {
    let (app, registry, _) = test_app();
    let id = registry.register(Arc::new(sample_record()));

    let (status, body) = get(app.clone(), "/api/explanations").await;
    assert_eq!(status, StatusCode::OK);
    let list: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["explanation_type"], "global");

    let (status, body) = get(app, &format!("/api/explanations/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let detail: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(detail["feature_types"], json!(["continuous", "pairwise"]));
    assert_eq!(detail["specific_count"], 2);
}

#[tokio::test]
async fn test_overall_figure() {
    let (app, registry, _) = test_app();
    let id = registry.register(Arc::new(sample_record()));
    let (status, body) = get(app, &format!("/api/explanations/{}/figure", id)).await;
    assert_eq!(status, StatusCode::OK);
    let figure: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(figure["kind"], "horizontal_bar");
    assert_eq!(figure["labels"], json!(["Age x Income", "Age"]));
}

#[tokio::test]
async fn test_pairwise_figure() {
    let (app, registry, _) = test_app();
    let id = registry.register(Arc::new(sample_record()));
    let (status, body) = get(app, &format!("/api/explanations/{}/figure?key=1", id)).await;
    assert_eq!(status, StatusCode::OK);
    let figure: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(figure["kind"], "heatmap");
    assert_eq!(figure["x_title"], "Age");
    assert_eq!(figure["y_title"], "Income");
}

#[tokio::test]
async fn test_no_visualization_is_no_content() {
    let (app, registry, _) = test_app();
    let record = ExplanationRecord::from_value(json!({
        "explanation_type": "local",
        "feature_names": ["a"],
        "feature_types": ["continuous"],
        "overall": {"names": ["a"], "scores": [1.0]}
    }))
    .unwrap();
    let id = registry.register(Arc::new(record));
    let (status, _) = get(app, &format!("/api/explanations/{}/figure?key=0", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unknown_explanation_is_not_found() {
    let (app, _, _) = test_app();
    let (status, body) = get(app, "/api/explanations/missing/figure").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_shutdown_route_fires_trigger() {
    let (app, _, trigger) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/shutdown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!trigger.fire());
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _, _) = test_app();
    let (status, _) = get(app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Runner lifecycle
// ============================================================================

fn wait_until_alive(runner: &mut DashboardRunner) -> bool {
    for _ in 0..50 {
        if runner.ping() {
            return true;
        }
        sleep(Duration::from_millis(100));
    }
    false
}

#[test]
fn test_random_port_lifecycle() {
    let mut runner = DashboardRunner::new(DashboardConfig::local()).unwrap();
    assert_eq!(runner.state(), RunnerState::NotRunning);

    runner.start().unwrap();
    assert_eq!(runner.state(), RunnerState::Running);
    assert!(wait_until_alive(&mut runner));
    assert!(runner.status().thread_alive);

    assert!(runner.stop());
    assert_eq!(runner.state(), RunnerState::Stopped);
    assert!(!runner.ping());
    assert!(runner.stop());
}

#[test]
fn test_stop_releases_port() {
    let mut runner = DashboardRunner::new(DashboardConfig::local()).unwrap();
    runner.start().unwrap();
    assert!(wait_until_alive(&mut runner));
    let port = runner.port();

    assert!(runner.stop());
    assert!(explain_viz::dashboard::port_available("127.0.0.1", port));
}

#[test]
fn test_concurrent_runners_are_independent() {
    let mut first = DashboardRunner::new(DashboardConfig::local()).unwrap();
    let mut second = DashboardRunner::new(DashboardConfig::local()).unwrap();
    first.start().unwrap();
    second.start().unwrap();
    assert_ne!(first.port(), second.port());

    assert!(wait_until_alive(&mut first));
    assert!(wait_until_alive(&mut second));

    assert!(first.stop());
    assert!(!first.ping());
    assert!(second.ping());
    assert!(second.stop());
}

#[test]
fn test_http_shutdown_is_detected() {
    let mut runner = DashboardRunner::new(DashboardConfig::local()).unwrap();
    runner.start().unwrap();
    assert!(wait_until_alive(&mut runner));

    let response = reqwest::blocking::Client::new()
        .post(format!("{}/api/shutdown", runner.base_url()))
        .send()
        .unwrap();
    assert!(response.status().is_success());
    drop(response);

    let mut detected = false;
    for _ in 0..50 {
        if !runner.ping() && runner.state() == RunnerState::Stopped {
            detected = true;
            break;
        }
        sleep(Duration::from_millis(100));
    }
    assert!(detected);
    assert!(runner.stop());
}

#[test]
fn test_registered_figure_served_over_http() {
    let mut runner = DashboardRunner::new(DashboardConfig::local()).unwrap();
    let id = runner.register(sample_record());
    runner.start().unwrap();
    assert!(wait_until_alive(&mut runner));

    let figure: serde_json::Value = reqwest::blocking::get(runner.display_link(&id, Some(0)))
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(figure["kind"], "line");
    assert_eq!(figure["title"], "Age");

    let status = runner.status();
    assert_eq!(status.explanations, 1);
    assert_eq!(status.state, RunnerState::Running);
    assert!(runner.stop());
}

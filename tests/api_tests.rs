mod common;

use common::TestApp;
use tokio::net::TcpListener;

pub struct SpawnedApp {
    pub address: String,
    // Keeps the upload directory alive while the server runs.
    _app: TestApp,
}

async fn spawn_app() -> SpawnedApp {
    let app = TestApp::builder()
        .config(|c| c.frontend_url = "http://localhost:5173".to_string())
        .build()
        .await;
    let router = app.router.clone();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    SpawnedApp {
        address: format!("http://127.0.0.1:{port}"),
        _app: app,
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({"status": "ok", "service": "portfolio-backend"})
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();

    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn test_cors_allows_only_the_frontend_origin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let allowed = client
        .get(format!("{}/api/galleries", app.address))
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );

    let foreign = client
        .get(format!("{}/api/galleries", app.address))
        .header("Origin", "https://evil.example")
        .send()
        .await
        .unwrap();
    assert!(foreign.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_openapi_document_lists_admin_security() {
    let app = spawn_app().await;

    let doc: serde_json::Value = reqwest::get(format!("{}/api-docs/openapi.json", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"]["/api/contact"].is_object());
    assert!(doc["paths"]["/api/admin/portfolio/sections/{id}/image"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}

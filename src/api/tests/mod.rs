use super::*;
use crate::converter::ProcessRunner;
use crate::converter::test_helpers::ScriptedRunner;
use crate::config::StorageConfig;
use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::response::Response;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

mod system;

const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

/// Config rooted in `temp` with a fake converter path
fn test_config(temp: &TempDir) -> Config {
    let mut config = Config {
        storage: StorageConfig {
            upload_dir: temp.path().join("uploads"),
            converted_dir: temp.path().join("converted"),
        },
        ..Default::default()
    };
    config.converter.launcher = None;
    config.converter.executable = PathBuf::from("/opt/converter");
    config
}

/// Router over a processor using `runner`, with `configure` applied to the config
async fn test_app(
    temp: &TempDir,
    runner: Arc<dyn ProcessRunner>,
    configure: impl FnOnce(&mut Config),
) -> Router {
    let mut config = test_config(temp);
    configure(&mut config);

    let processor = Arc::new(BatchProcessor::new(config.clone(), runner));
    processor.init().await.unwrap();
    create_router(processor, Arc::new(config))
}

/// Router whose converter succeeds and writes `outputs`
async fn converting_app(temp: &TempDir, outputs: Vec<&'static str>) -> Router {
    test_app(temp, ScriptedRunner::exiting(0, outputs), |_| {}).await
}

/// Build a multipart body with file parts under `files` and plain text fields
fn multipart_body(files: &[(&str, &[u8])], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, files: &[(&str, &[u8])], fields: &[(&str, &str)]) -> Request {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files, fields)))
        .unwrap()
}

fn get_request(uri: &str) -> Request {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response should be valid JSON")
}

#[tokio::test]
async fn test_cors_enabled() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, ScriptedRunner::exiting(0, vec![]), |config| {
        config.server.cors_enabled = true;
        config.server.cors_origins = vec!["*".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, ScriptedRunner::exiting(0, vec![]), |config| {
        config.server.cors_enabled = false;
    })
    .await;

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, ScriptedRunner::exiting(0, vec![]), |config| {
        config.server.cors_enabled = true;
        config.server.cors_origins = vec!["http://lab.example".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://lab.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://lab.example"
    );
}

#[tokio::test]
async fn test_api_key_guards_json_api_only() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, ScriptedRunner::exiting(0, vec![]), |config| {
        config.server.api_key = Some("secret-key-123".to_string());
    })
    .await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/formats"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");

    let request = Request::builder()
        .uri("/api/v1/formats")
        .header("X-Api-Key", "secret-key-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "upload page needs no key");
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let temp = TempDir::new().unwrap();

    let enabled = converting_app(&temp, vec![]).await;
    let response = enabled
        .oneshot(get_request("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["info"]["title"], "rawconv API");

    let disabled = test_app(&temp, ScriptedRunner::exiting(0, vec![]), |config| {
        config.server.swagger_ui = false;
    })
    .await;
    let response = disabled
        .oneshot(get_request("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_over_body_limit_is_rejected() {
    let temp = TempDir::new().unwrap();
    let runner = ScriptedRunner::exiting(0, vec![]);
    let app = test_app(&temp, runner.clone(), |config| {
        config.server.max_upload_bytes = Some(64);
    })
    .await;

    let big = vec![0u8; 4096];
    let response = app
        .oneshot(upload_request("/api/v1/batches", &[("a.raw", &big)], &[]))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let temp = TempDir::new().unwrap();
    let app = converting_app(&temp, vec![]).await;

    let response = app.oneshot(get_request("/history")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_serve_stops_on_shutdown_signal() {
    let temp = TempDir::new().unwrap();
    let app = converting_app(&temp, vec![]).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(serve(listener, app, async move {
        stop_rx.await.ok();
    }));

    let mut stream = tokio::net::TcpStream::connect(address).await.unwrap();
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream
        .write_all(b"GET /api/v1/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    assert!(reply.starts_with("HTTP/1.1 200"), "got: {reply}");
    assert!(reply.contains("\"status\":\"ok\""));

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

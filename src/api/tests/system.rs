use super::*;

#[tokio::test]
async fn test_health_endpoint() {
    let temp = TempDir::new().unwrap();
    let app = converting_app(&temp, vec![]).await;

    let response = app.oneshot(get_request("/api/v1/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let temp = TempDir::new().unwrap();
    let app = converting_app(&temp, vec![]).await;

    let response = app
        .oneshot(get_request("/api/v1/openapi.json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/api/v1/batches"]["post"].is_object());
    assert!(
        json["paths"]["/api/v1/batches"]["post"]["requestBody"]["content"]["multipart/form-data"]
            .is_object()
    );
    assert!(json["components"]["schemas"]["BatchReport"].is_object());
}

#[tokio::test]
async fn test_health_requires_key_when_configured() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, ScriptedRunner::exiting(0, vec![]), |config| {
        config.server.api_key = Some("k".to_string());
    })
    .await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("x-api-key", "wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["message"], "Invalid API key");
}

//! HTTP server
//!
//! Two surfaces share one router:
//!
//! - the browser page at `/` with its form post and download links
//! - a JSON API under `/api/v1`, documented with OpenAPI

use crate::batch::BatchProcessor;
use crate::{Config, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod page;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the router with every route
///
/// # Routes
///
/// ## Browser
/// - `GET /` - Upload form (`?notice=<code>` shows a download failure)
/// - `POST /upload-parse` - Convert a batch and render the results
/// - `GET /download-parsed/:batch_subdir/*filename` - Download an artifact
///
/// ## JSON API (`/api/v1`, `X-Api-Key` when configured)
/// - `POST /batches` - Convert a batch, returns a `BatchReport`
/// - `GET /batches/:batch_subdir/files/*filename` - Download an artifact
/// - `GET /formats` - Output formats
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI document
///
/// ## Docs
/// - `GET /swagger-ui` - Swagger UI (if enabled)
pub fn create_router(processor: Arc<BatchProcessor>, config: Arc<Config>) -> Router {
    let state = AppState::new(processor);
    let server = &config.server;

    let api = Router::new()
        .route("/batches", post(routes::create_batch))
        .route(
            "/batches/:batch_subdir/files/*filename",
            get(routes::download_artifact),
        )
        .route("/formats", get(routes::list_formats))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    let api = match &server.api_key {
        Some(key) => api.layer(middleware::from_fn_with_state(
            Arc::<str>::from(key.as_str()),
            auth::require_api_key,
        )),
        None => api,
    };

    let api = if server.cors_enabled {
        api.layer(build_cors_layer(&server.cors_origins))
    } else {
        api
    };

    let router = Router::new()
        .route("/", get(routes::index))
        .route("/upload-parse", post(routes::upload_parse))
        .route(
            "/download-parsed/:batch_subdir/*filename",
            get(routes::download_parsed),
        )
        .nest("/api/v1", api);

    // Swagger UI gets its own copy of the document so it stays reachable
    // without an API key
    let router = if server.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let body_limit = match server.max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    router
        .with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
}

/// Build a CORS layer for the configured origins (`"*"` allows any)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    let cors = if allow_any || origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
    };

    cors.allow_methods(Any).allow_headers(Any)
}

/// Bind the configured address and serve until `shutdown` resolves
///
/// # Example
///
/// ```no_run
/// use rawconv::{BatchProcessor, CliProcessRunner, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let processor = Arc::new(BatchProcessor::new(
///     (*config).clone(),
///     Arc::new(CliProcessRunner::new()),
/// ));
/// processor.init().await?;
///
/// rawconv::api::start_api_server(processor, config, async {
///     tokio::signal::ctrl_c().await.ok();
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server<F>(
    processor: Arc<BatchProcessor>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.server.bind_address;
    let app = create_router(processor, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, app, shutdown).await
}

/// Serve `app` on an already bound listener until `shutdown` resolves
///
/// In-flight requests, including running conversions, are allowed to finish.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    tracing::info!(address = %address, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

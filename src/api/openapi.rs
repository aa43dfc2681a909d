//! OpenAPI documentation for the JSON API

use utoipa::OpenApi;

/// OpenAPI document for `/api/v1`
///
/// Served at `/api/v1/openapi.json` and, when enabled, browsable at
/// `/swagger-ui`. The HTML upload page is not part of the document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rawconv API",
        version = "0.1.0",
        description = "Upload instrument RAW files, convert them with an external converter, and download the results",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local server")
    ),
    paths(
        crate::api::routes::create_batch,
        crate::api::routes::download_artifact,
        crate::api::routes::list_formats,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::BatchReport,
        crate::types::BatchId,
        crate::types::BatchOutcome,
        crate::types::StatusMessage,
        crate::types::MessageLevel,
        crate::types::OutputFormat,
        crate::types::FormatInfo,
        crate::api::routes::UploadForm,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "batches", description = "Batch conversion and artifact downloads"),
        (name = "system", description = "Health check and OpenAPI document"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Declares the optional `X-Api-Key` scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_api_path() {
        let spec = ApiDoc::openapi();

        let paths: Vec<&str> = spec.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/v1/batches",
            "/api/v1/batches/{batch_subdir}/files/{filename}",
            "/api/v1/formats",
            "/api/v1/health",
            "/api/v1/openapi.json",
        ] {
            assert!(paths.contains(&expected), "missing {expected}, got {paths:?}");
        }
    }

    #[test]
    fn document_has_schemas_and_security_scheme() {
        let components = ApiDoc::openapi().components.unwrap();

        assert!(components.schemas.contains_key("BatchReport"));
        assert!(components.schemas.contains_key("ApiError"));
        assert!(components.security_schemes.contains_key("api_key"));
    }

    #[test]
    fn document_serializes_as_openapi_3() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();

        assert!(json["openapi"].as_str().unwrap().starts_with("3."));
        assert_eq!(json["info"]["title"], "rawconv API");
        let tags: Vec<&str> = json["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(tags, vec!["batches", "system"]);
    }
}

//! # rawconv
//!
//! Web front end for converting vendor instrument RAW files with an external
//! command-line converter (ThermoRawFileParser by default).
//!
//! Each upload becomes a batch with its own input and output directories. The
//! converter is run once per batch, with a timeout, and whatever it writes to
//! the batch output directory is offered for download.
//!
//! ## Surfaces
//!
//! - a server-rendered upload page at `/`
//! - a JSON API under `/api/v1` with an OpenAPI document and Swagger UI
//!
//! ## Quick Start
//!
//! ```no_run
//! use rawconv::{BatchProcessor, CliProcessRunner, Config};
//! use rawconv::types::{OutputFormat, Submission, UploadedFile};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor = BatchProcessor::new(Config::default(), Arc::new(CliProcessRunner::new()));
//!     processor.init().await?;
//!
//!     let report = processor
//!         .process(Submission {
//!             files: vec![UploadedFile::new("sample.raw", std::fs::read("sample.raw")?)],
//!             format: OutputFormat::Mzml,
//!             extra_args: String::new(),
//!         })
//!         .await?;
//!
//!     for message in &report.messages {
//!         println!("{:?}: {}", message.level, message.text);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP server: upload page and JSON API
pub mod api;
/// Batch lifecycle orchestration
pub mod batch;
/// Artifact listing and outcome evaluation
pub mod collector;
/// Configuration types
pub mod config;
/// External converter invocation
pub mod converter;
/// Artifact download resolution
pub mod download;
/// Error types
pub mod error;
/// Core types
pub mod types;
/// Upload screening and filename sanitization
pub mod validation;
/// Per-batch directories
pub mod workspace;

// Re-export commonly used types
pub use batch::BatchProcessor;
pub use config::Config;
pub use converter::{CliProcessRunner, ProcessRunner};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use types::{BatchId, BatchOutcome, BatchReport, OutputFormat, StatusMessage};

use std::sync::Arc;

/// Run the HTTP server until a termination signal arrives
///
/// Prepares the storage roots, serves the configured address, and shuts down
/// gracefully on a signal, letting in-flight requests finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use rawconv::{Config, run_server_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env()?;
///     run_server_with_shutdown(config).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server_with_shutdown(config: Config) -> Result<()> {
    let processor = Arc::new(BatchProcessor::new(
        config.clone(),
        Arc::new(CliProcessRunner::new()),
    ));
    processor.init().await?;

    api::start_api_server(processor, Arc::new(config), wait_for_signal()).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

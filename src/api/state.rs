//! Application state for the HTTP server

use crate::batch::BatchProcessor;
use crate::download::DownloadGate;
use std::sync::Arc;

/// Shared state handed to every route handler
///
/// Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Runs upload batches
    pub processor: Arc<BatchProcessor>,

    /// Resolves artifact downloads under the converted-outputs root
    pub gate: DownloadGate,
}

impl AppState {
    /// Create state serving downloads from the processor's converted-outputs root
    pub fn new(processor: Arc<BatchProcessor>) -> Self {
        let gate = DownloadGate::new(processor.config().storage.converted_dir.clone());
        Self { processor, gate }
    }
}

use std::sync::Arc;

use crate::captioning::pipeline::PipelineConfig;
use crate::catalog::MemeCatalog;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main`; tests assemble it from in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn MemeCatalog>,
    pub llm: Arc<dyn TextGenerator>,
    /// Per-request generation settings: chunk bounds, retry policy, timeouts.
    pub pipeline: PipelineConfig,
    /// Request body cap for context uploads.
    pub max_upload_bytes: usize,
}

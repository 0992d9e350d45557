use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::extract::TextExtractor;
use crate::interview::store::SessionStore;
use crate::llm_client::LlmGateway;
use crate::screening::screener::BatchScreener;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured.
    pub llm: Option<Arc<dyn LlmGateway>>,
    pub extractor: Arc<dyn TextExtractor>,
    pub sessions: SessionStore,
    pub config: Config,
}

impl AppState {
    /// The configured gateway, or a precondition error when no credential is available.
    pub fn gateway(&self) -> Result<Arc<dyn LlmGateway>, AppError> {
        self.llm.clone().ok_or_else(|| {
            AppError::Precondition("No LLM API key configured (set OPENAI_API_KEY)".to_string())
        })
    }

    pub fn screener(&self) -> Result<BatchScreener, AppError> {
        Ok(BatchScreener::new(
            self.extractor.clone(),
            self.gateway()?,
            self.config.screening_concurrency,
        ))
    }
}

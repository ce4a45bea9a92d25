//! Inference service abstraction
//!
//! Provides a common interface for the completion backend driving the
//! conversation loop, plus a logging decorator.

mod anthropic;
mod error;
mod types;

pub use anthropic::{AnthropicClient, InferenceConfig};
pub use error::{InferenceError, InferenceErrorKind};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion backends
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, InferenceError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for inference services
pub struct LoggingService {
    inner: Arc<dyn InferenceService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn InferenceService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl InferenceService for LoggingService {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, InferenceError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    tool_uses = response.tool_uses().len(),
                    "completion finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "completion failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

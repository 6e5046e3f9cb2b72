//! LLM provider port
//!
//! Errors are per-call; the summarizer does not retry, it installs a
//! deterministic fallback instead.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM call failed: {0}")]
    Call(String),

    #[error("LLM call timed out after {0}ms")]
    Timeout(u64),
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// Port consumed for summary generation and embeddings
#[async_trait]
pub trait LlmPort: Send + Sync {
    /// Generate a completion; no streaming assumed
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> LlmResult<String>;

    /// Embed a batch of texts
    async fn embed(&self, texts: &[String]) -> LlmResult<Vec<Vec<f32>>>;
}

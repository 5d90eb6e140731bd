use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Boundary to the external language-model service.
///
/// One provider instance serves both the generation call and the embedding
/// function; corpus build and query embedding must go through the same
/// instance so every vector lives in one embedding space.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// text completion for an assembled grounding payload (non-streaming)
    async fn generate(&self, prompt: &str, model_id: &str) -> Result<String, ApiError>;

    /// generate embeddings, one vector per input, all of equal dimension
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}

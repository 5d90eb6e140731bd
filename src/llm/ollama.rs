use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::LlmProvider;
use crate::core::errors::ApiError;

/// Ollama-backed provider for generation and embeddings.
///
/// Any transport error or non-success status is collapsed into
/// `ApiError::ServiceUnavailable`; callers never see raw transport detail.
#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaProvider {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn generate(&self, prompt: &str, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": model_id,
            "prompt": prompt,
            "stream": false,
        });

        let res = self.client.post(&url).json(&body).send().await.map_err(|err| {
            tracing::warn!("Ollama generate request failed: {}", err);
            ApiError::ServiceUnavailable
        })?;

        if !res.status().is_success() {
            tracing::warn!("Ollama generate returned status {}", res.status());
            return Err(ApiError::ServiceUnavailable);
        }

        let payload: GenerateResponse = res.json().await.map_err(|err| {
            tracing::warn!("Ollama generate returned malformed payload: {}", err);
            ApiError::ServiceUnavailable
        })?;

        Ok(payload.response)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let mut vectors = Vec::with_capacity(inputs.len());

        for input in inputs {
            let body = json!({
                "model": model_id,
                "prompt": input,
            });

            let res = self.client.post(&url).json(&body).send().await.map_err(|err| {
                tracing::warn!("Ollama embeddings request failed: {}", err);
                ApiError::ServiceUnavailable
            })?;

            if !res.status().is_success() {
                tracing::warn!("Ollama embeddings returned status {}", res.status());
                return Err(ApiError::ServiceUnavailable);
            }

            let payload: EmbeddingResponse = res.json().await.map_err(|err| {
                tracing::warn!("Ollama embeddings returned malformed payload: {}", err);
                ApiError::ServiceUnavailable
            })?;
            vectors.push(payload.embedding);
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let provider = OllamaProvider::new("http://localhost:11434/".to_string(), 30);
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    #[ignore]
    async fn live_ollama_generate() {
        let provider = OllamaProvider::new("http://localhost:11434".to_string(), 60);
        let healthy = provider.health_check().await.expect("health check");
        assert!(healthy, "Ollama is not running");

        let answer = provider.generate("Say hello.", "llama3.2:3b").await;
        match answer {
            Ok(text) => println!("Ollama response: {}", text),
            Err(e) => panic!("Ollama generate failed: {}", e),
        }
    }
}

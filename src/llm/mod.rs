mod ollama;
mod provider;

pub use ollama::OllamaProvider;
pub use provider::LlmProvider;

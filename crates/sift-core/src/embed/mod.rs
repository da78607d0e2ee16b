//! Pluggable sentence-embedding backends
//!
//! The semantic stage only needs one capability from a model: turn a batch of
//! strings into dense vectors. Which model and which server produce them is
//! configuration.
//!
//! # Architecture
//!
//! - `Embedder` trait: the interface every backend implements
//! - `EmbeddingClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaEmbedder`, `OpenAICompatibleEmbedder`, `MockEmbedder`
//!
//! All calls are blocking. A failed request is returned to the caller as an
//! error; nothing here retries or substitutes a default vector.

mod mock;
mod ollama;
mod openai_compatible;

pub use mock::{MockEmbedder, MOCK_DIMENSIONS};
pub use ollama::OllamaEmbedder;
pub use openai_compatible::OpenAICompatibleEmbedder;

use crate::config::{BackendKind, EmbeddingSettings};
use crate::error::Result;

/// Interface for all embedding backends
pub trait Embedder: Send + Sync {
    /// Embed every input, returning one vector per input in input order
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Check if the backend is reachable
    fn health_check(&self) -> bool;

    /// Model identifier sent to the backend
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete embedding client enum
#[derive(Clone)]
pub enum EmbeddingClient {
    /// Ollama `/api/embed`
    Ollama(OllamaEmbedder),
    /// OpenAI-compatible `/v1/embeddings` (vLLM, LocalAI, llama-server, ...)
    OpenAICompatible(OpenAICompatibleEmbedder),
    /// Deterministic offline embedder
    Mock(MockEmbedder),
}

impl EmbeddingClient {
    /// Build the client selected by the settings
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let client = match settings.backend {
            BackendKind::Ollama => EmbeddingClient::Ollama(OllamaEmbedder::new(
                &settings.host,
                &settings.model,
                settings.timeout,
            )?),
            BackendKind::OpenAICompatible => {
                EmbeddingClient::OpenAICompatible(OpenAICompatibleEmbedder::new(
                    &settings.host,
                    &settings.model,
                    settings.api_key.as_deref(),
                    settings.timeout,
                )?)
            }
            BackendKind::Mock => EmbeddingClient::Mock(MockEmbedder::new()),
        };
        tracing::debug!(
            backend = %settings.backend,
            model = %client.model(),
            host = %client.host(),
            "Embedding client configured"
        );
        Ok(client)
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        EmbeddingClient::Mock(MockEmbedder::new())
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            EmbeddingClient::Ollama(_) => BackendKind::Ollama,
            EmbeddingClient::OpenAICompatible(_) => BackendKind::OpenAICompatible,
            EmbeddingClient::Mock(_) => BackendKind::Mock,
        }
    }
}

impl Embedder for EmbeddingClient {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            EmbeddingClient::Ollama(b) => b.embed(texts),
            EmbeddingClient::OpenAICompatible(b) => b.embed(texts),
            EmbeddingClient::Mock(b) => b.embed(texts),
        }
    }

    fn health_check(&self) -> bool {
        match self {
            EmbeddingClient::Ollama(b) => b.health_check(),
            EmbeddingClient::OpenAICompatible(b) => b.health_check(),
            EmbeddingClient::Mock(b) => b.health_check(),
        }
    }

    fn model(&self) -> &str {
        match self {
            EmbeddingClient::Ollama(b) => b.model(),
            EmbeddingClient::OpenAICompatible(b) => b.model(),
            EmbeddingClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            EmbeddingClient::Ollama(b) => b.host(),
            EmbeddingClient::OpenAICompatible(b) => b.host(),
            EmbeddingClient::Mock(b) => b.host(),
        }
    }
}

/// Cosine similarity of two dense vectors
///
/// Returns 0.0 when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_client_mock() {
        let client = EmbeddingClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert_eq!(client.kind(), BackendKind::Mock);
        assert!(client.health_check());
    }

    #[test]
    fn test_from_settings_selects_backend() {
        let settings = EmbeddingSettings {
            backend: BackendKind::OpenAICompatible,
            host: "http://localhost:8000/".to_string(),
            model: "bge-small".to_string(),
            ..Default::default()
        };
        let client = EmbeddingClient::from_settings(&settings).unwrap();
        assert_eq!(client.kind(), BackendKind::OpenAICompatible);
        assert_eq!(client.host(), "http://localhost:8000");
        assert_eq!(client.model(), "bge-small");
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}

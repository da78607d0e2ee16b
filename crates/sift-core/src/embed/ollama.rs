//! Ollama embedding backend
//!
//! Talks to Ollama's batch embedding endpoint:
//!
//! ```text
//! POST {host}/api/embed   {"model": "all-minilm", "input": ["...", "..."]}
//!                      -> {"model": "...", "embeddings": [[...], [...]]}
//! ```

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::Embedder;

/// Ollama embedding backend
#[derive(Clone)]
pub struct OllamaEmbedder {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

/// Request to Ollama embed API
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response from Ollama embed API
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .http_client
            .post(format!("{}/api/embed", self.base_url))
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Embedding(format!(
                "Ollama embed request failed ({}): {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response.json()?;
        debug!(
            inputs = texts.len(),
            model = %self.model,
            "Ollama embeddings received"
        );

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        Ok(parsed.embeddings)
    }

    fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

//! OpenAI-compatible embedding backend
//!
//! Works with any server exposing `/v1/embeddings`: vLLM, LocalAI,
//! llama-server, Text Embeddings Inference, or the hosted API.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::Embedder;

/// OpenAI-compatible embedding backend
#[derive(Clone)]
pub struct OpenAICompatibleEmbedder {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleEmbedder {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(String::from),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl Embedder for OpenAICompatibleEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .authorize(
                self.http_client
                    .post(format!("{}/v1/embeddings", self.base_url)),
            )
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Embedding(format!(
                "Embedding request failed ({}): {}",
                status, body
            )));
        }

        let mut parsed: EmbeddingsResponse = response.json()?;
        debug!(
            inputs = texts.len(),
            model = %self.model,
            "OpenAI-compatible embeddings received"
        );

        if parsed.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Server returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        // Servers may answer out of order; `index` is authoritative
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn health_check(&self) -> bool {
        let request = self.authorize(
            self.http_client
                .get(format!("{}/v1/models", self.base_url)),
        );
        match request.send() {
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

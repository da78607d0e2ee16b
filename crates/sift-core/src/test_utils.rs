//! Test utilities for sift-core
//!
//! A mock embedding server speaking both the Ollama and the OpenAI-compatible
//! embedding protocols. Vectors come from `MockEmbedder`, so results over
//! HTTP are identical to results from the in-process mock.
//!
//! The server runs on its own thread with a current-thread tokio runtime,
//! which lets blocking clients call it from plain `#[test]` functions.

use std::net::SocketAddr;
use std::thread::JoinHandle;

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::embed::{Embedder, MockEmbedder};

/// Mock embedding server for tests
pub struct MockEmbeddingServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockEmbeddingServer {
    /// Requests naming this model get a 500
    pub const FAILING_MODEL: &'static str = "broken";

    /// Start the mock server on an available port
    pub fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/embed", post(handle_ollama_embed))
            .route("/v1/models", get(handle_models))
            .route("/v1/embeddings", post(handle_openai_embeddings));

        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("bind mock embedding server");
        let addr = listener.local_addr().expect("mock server address");
        listener
            .set_nonblocking(true)
            .expect("non-blocking mock listener");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock server runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("tokio mock listener");
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        shutdown_rx.await.ok();
                    })
                    .await
                    .expect("mock embedding server");
            });
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockEmbeddingServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Serialize)]
struct OllamaEmbedResponse {
    model: String,
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingsResponse {
    object: &'static str,
    model: String,
    data: Vec<OpenAIEmbedding>,
}

#[derive(Debug, Serialize)]
struct OpenAIEmbedding {
    object: &'static str,
    index: usize,
    embedding: Vec<f32>,
}

fn failure(model: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("model '{}' failed to load", model),
    )
        .into_response()
}

fn vectors(input: &[String]) -> Vec<Vec<f32>> {
    MockEmbedder::new()
        .embed(input)
        .unwrap_or_else(|_| vec![Vec::new(); input.len()])
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "models": [{ "name": "all-minilm:latest", "size": 45_000_000 }]
    }))
}

/// Ollama embed endpoint
async fn handle_ollama_embed(Json(request): Json<EmbedRequest>) -> Response {
    if request.model == MockEmbeddingServer::FAILING_MODEL {
        return failure(&request.model);
    }
    Json(OllamaEmbedResponse {
        embeddings: vectors(&request.input),
        model: request.model,
    })
    .into_response()
}

/// OpenAI-compatible models endpoint (health check)
async fn handle_models() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "object": "list",
        "data": [{ "id": "all-minilm", "object": "model" }]
    }))
}

/// OpenAI-compatible embeddings endpoint
///
/// Answers in reverse order so clients must honor `index`.
async fn handle_openai_embeddings(Json(request): Json<EmbedRequest>) -> Response {
    if request.model == MockEmbeddingServer::FAILING_MODEL {
        return failure(&request.model);
    }
    let mut data: Vec<OpenAIEmbedding> = vectors(&request.input)
        .into_iter()
        .enumerate()
        .map(|(index, embedding)| OpenAIEmbedding {
            object: "embedding",
            index,
            embedding,
        })
        .collect();
    data.reverse();

    Json(OpenAIEmbeddingsResponse {
        object: "list",
        model: request.model,
        data,
    })
    .into_response()
}

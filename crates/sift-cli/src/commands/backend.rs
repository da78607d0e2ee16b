//! Embedding backend check

use anyhow::{Context, Result};
use sift_core::{BackendKind, Embedder, EmbeddingClient};

use super::core::{load_settings, EngineOptions};

/// Show the configured backend, check health and embed a probe text
pub fn cmd_backend(opts: &EngineOptions) -> Result<()> {
    let settings = load_settings(opts)?;
    let embedding = &settings.embedding;

    println!("🔍 Embedding backend\n");
    println!("  Backend: {}", embedding.backend);
    println!("  Model:   {}", embedding.model);
    if embedding.backend != BackendKind::Mock {
        println!("  Host:    {}", embedding.host);
    }
    println!("  Timeout: {}s", embedding.timeout.as_secs());
    println!();

    let client =
        EmbeddingClient::from_settings(embedding).context("Failed to create embedding client")?;

    print!("Checking availability... ");
    if !client.health_check() {
        println!("❌ Failed");
        println!("\n⚠️  Could not reach {} at {}", embedding.backend, client.host());
        match embedding.backend {
            BackendKind::Ollama => {
                println!("\nTo set up Ollama:");
                println!("  1. Start the server: ollama serve");
                println!("  2. Pull the model: ollama pull {}", embedding.model);
                println!("  3. Set environment variable: export OLLAMA_HOST={}", embedding.host);
            }
            BackendKind::OpenAICompatible => {
                println!("\nCheck OPENAI_COMPATIBLE_HOST and OPENAI_COMPATIBLE_API_KEY");
            }
            BackendKind::Mock => {}
        }
        return Ok(());
    }
    println!("✅ Connected");

    let probe = vec!["netflix subscription".to_string()];
    let vectors = client
        .embed(&probe)
        .with_context(|| format!("Embedding probe failed for model {}", client.model()))?;
    let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
    println!("  Probe embedding: {} dimensions", dimensions);

    Ok(())
}

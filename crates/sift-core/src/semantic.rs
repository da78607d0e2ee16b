//! Embedding-similarity fallback
//!
//! Category labels and the tag vocabulary are embedded once when the
//! classifier is built. A description is then scored against both sets by
//! cosine similarity: the best category always wins (earliest label on a
//! tie), and tags above the threshold are kept, best first.

use tracing::{debug, info};

use crate::embed::{cosine_similarity, Embedder, EmbeddingClient};
use crate::error::{Error, Result};
use crate::rules::TagTriple;

/// Default minimum similarity for a tag to be attached
pub const DEFAULT_TAG_THRESHOLD: f32 = 0.4;

/// Default descriptions per embedding request
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Outcome of semantic classification
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch {
    pub category: String,
    /// Raw cosine similarity of the winning category
    pub confidence: f32,
    pub tags: TagTriple,
}

/// A label with its precomputed embedding
#[derive(Debug, Clone)]
struct EmbeddedLabel {
    name: String,
    vector: Vec<f32>,
}

#[derive(Clone)]
pub struct SemanticClassifier {
    client: EmbeddingClient,
    categories: Vec<EmbeddedLabel>,
    tags: Vec<EmbeddedLabel>,
    tag_threshold: f32,
    max_tags: usize,
    batch_size: usize,
}

impl SemanticClassifier {
    /// Embed the category set and tag vocabulary
    ///
    /// Fails with `EmptyCategorySet` when there is nothing to classify into.
    pub fn new(
        client: EmbeddingClient,
        categories: Vec<String>,
        tags: Vec<String>,
    ) -> Result<Self> {
        Self::with_batch_size(client, categories, tags, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(
        client: EmbeddingClient,
        categories: Vec<String>,
        tags: Vec<String>,
        batch_size: usize,
    ) -> Result<Self> {
        if categories.is_empty() {
            return Err(Error::EmptyCategorySet);
        }
        let batch_size = batch_size.max(1);

        let categories = embed_labels(&client, categories, batch_size)?;
        let tags = embed_labels(&client, tags, batch_size)?;

        info!(
            categories = categories.len(),
            tags = tags.len(),
            model = %client.model(),
            "Semantic label embeddings ready"
        );

        Ok(Self {
            client,
            categories,
            tags,
            tag_threshold: DEFAULT_TAG_THRESHOLD,
            max_tags: 3,
            batch_size,
        })
    }

    /// Minimum similarity for a tag
    pub fn tag_threshold(mut self, threshold: f32) -> Self {
        self.tag_threshold = threshold;
        self
    }

    /// Tags attached per description, capped at 3
    pub fn max_tags(mut self, max_tags: usize) -> Self {
        self.max_tags = max_tags.min(3);
        self
    }

    pub fn client(&self) -> &EmbeddingClient {
        &self.client
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|l| l.name.as_str())
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|l| l.name.as_str())
    }

    /// Classify one normalized, non-empty description
    pub fn classify(&self, normalized: &str) -> Result<SemanticMatch> {
        let vectors = self.client.embed(&[normalized.to_string()])?;
        let vector = vectors.into_iter().next().ok_or_else(|| {
            Error::Embedding("backend returned no embedding for description".into())
        })?;
        self.score(&vector)
    }

    /// Classify many normalized descriptions, one embedding call per chunk
    pub fn classify_batch(&self, normalized: &[String]) -> Result<Vec<SemanticMatch>> {
        let mut results = Vec::with_capacity(normalized.len());
        for chunk in normalized.chunks(self.batch_size) {
            let vectors = self.client.embed(chunk)?;
            if vectors.len() != chunk.len() {
                return Err(Error::Embedding(format!(
                    "expected {} embeddings, got {}",
                    chunk.len(),
                    vectors.len()
                )));
            }
            for vector in &vectors {
                results.push(self.score(vector)?);
            }
            debug!(chunk = chunk.len(), "Semantic chunk classified");
        }
        Ok(results)
    }

    fn score(&self, vector: &[f32]) -> Result<SemanticMatch> {
        let expected = self.categories[0].vector.len();
        if vector.len() != expected {
            return Err(Error::Embedding(format!(
                "embedding dimension {} does not match label dimension {}",
                vector.len(),
                expected
            )));
        }

        // Strictly greater keeps the earliest category on ties
        let mut best = &self.categories[0];
        let mut best_score = cosine_similarity(vector, &best.vector);
        for label in &self.categories[1..] {
            let score = cosine_similarity(vector, &label.vector);
            if score > best_score {
                best = label;
                best_score = score;
            }
        }

        let mut scored: Vec<(&str, f32)> = self
            .tags
            .iter()
            .map(|t| (t.name.as_str(), cosine_similarity(vector, &t.vector)))
            .filter(|(_, score)| *score >= self.tag_threshold)
            .collect();
        // Stable: equal scores stay in vocabulary order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut tags: TagTriple = [None, None, None];
        for (slot, (name, _)) in tags.iter_mut().zip(scored.into_iter().take(self.max_tags)) {
            *slot = Some(name.to_string());
        }

        Ok(SemanticMatch {
            category: best.name.clone(),
            confidence: best_score,
            tags,
        })
    }
}

fn embed_labels(
    client: &EmbeddingClient,
    names: Vec<String>,
    batch_size: usize,
) -> Result<Vec<EmbeddedLabel>> {
    let mut vectors = Vec::with_capacity(names.len());
    for chunk in names.chunks(batch_size) {
        let embedded = client.embed(chunk)?;
        if embedded.len() != chunk.len() {
            return Err(Error::Embedding(format!(
                "expected {} label embeddings, got {}",
                chunk.len(),
                embedded.len()
            )));
        }
        vectors.extend(embedded);
    }

    Ok(names
        .into_iter()
        .zip(vectors)
        .map(|(name, vector)| EmbeddedLabel { name, vector })
        .collect())
}

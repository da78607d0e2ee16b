//! Mock embedder for testing
//!
//! Produces a deterministic hashed bag-of-words vector: every normalized
//! token adds 1.0 to the bucket its FNV-1a hash selects. Texts sharing words
//! get positive cosine similarity, texts sharing none get zero. Aliases map a
//! word onto another word's bucket so tests can express "movie is close to
//! entertainment" without a real model.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::normalize::{normalize, tokens};

use super::Embedder;

/// Vector width produced by the mock
pub const MOCK_DIMENSIONS: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Mock embedding backend
#[derive(Debug, Clone, Default)]
pub struct MockEmbedder {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Fail every embed call, shared between clones
    failing: Arc<AtomicBool>,
    aliases: HashMap<String, String>,
    /// Embed calls made, shared between clones
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create a backend whose embed calls always fail
    pub fn failing() -> Self {
        let mock = Self::default();
        mock.set_failing(true);
        mock
    }

    /// Switch failure mode on or off for this mock and all its clones
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Embed `word` as if it were `target`
    pub fn with_alias(mut self, word: &str, target: &str) -> Self {
        self.aliases
            .insert(word.to_lowercase(), target.to_lowercase());
        self
    }

    /// Number of `embed` calls made through this mock or any clone of it
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Vector for a single text
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; MOCK_DIMENSIONS];
        let normalized = normalize(Some(text));
        for token in tokens(&normalized) {
            let word = self.aliases.get(token).map(String::as_str).unwrap_or(token);
            vector[bucket(word)] += 1.0;
        }
        vector
    }
}

fn bucket(word: &str) -> usize {
    let mut hash = FNV_OFFSET;
    for byte in word.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash % MOCK_DIMENSIONS as u64) as usize
}

impl Embedder for MockEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Embedding("mock embedder configured to fail".into()));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::cosine_similarity;

    #[test]
    fn test_vectors_are_deterministic() {
        let mock = MockEmbedder::new();
        assert_eq!(mock.vector("Netflix Subscription"), mock.vector("netflix subscription"));
        assert_eq!(mock.vector("x").len(), MOCK_DIMENSIONS);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let mock = MockEmbedder::new();
        let desc = mock.vector("streaming entertainment");
        let close = cosine_similarity(&desc, &mock.vector("Entertainment"));
        let far = cosine_similarity(&desc, &mock.vector("Housing"));
        assert!(close > 0.7);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn test_alias_maps_onto_target() {
        let mock = MockEmbedder::new().with_alias("movie", "entertainment");
        let sim = cosine_similarity(&mock.vector("movie"), &mock.vector("Entertainment"));
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let mock = MockEmbedder::new();
        assert!(mock.vector("").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_clones_share_call_count() {
        let mock = MockEmbedder::new();
        let clone = mock.clone();
        clone.embed(&["a".to_string()]).unwrap();
        clone.embed(&[]).unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_failing_mock() {
        let mock = MockEmbedder::failing();
        assert!(!mock.health_check());
        assert!(matches!(
            mock.embed(&["x".to_string()]),
            Err(Error::Embedding(_))
        ));

        let recovering = mock.clone();
        recovering.set_failing(false);
        assert!(mock.embed(&["x".to_string()]).is_ok());
    }
}

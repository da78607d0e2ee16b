//! Sift Core Library
//!
//! Hybrid categorization of bank transaction descriptions:
//! - Text normalization shared by every matching stage
//! - Merchant rule table with tiered phrase matching
//! - Transfer-marker and personal-name detection
//! - Pluggable embedding backends (Ollama, OpenAI-compatible, mock)
//! - Embedding-similarity fallback for categories and tags
//! - Batch runner over CSV tables, with optional cleaning and spend summary

pub mod batch;
pub mod clean;
pub mod config;
pub mod embed;
pub mod engine;
pub mod error;
pub mod names;
pub mod normalize;
pub mod rules;
pub mod semantic;
pub mod summary;

/// Test utilities including mock embedding server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use batch::{categorize_table, resolve_description_column, CategorizedTable, Table};
pub use clean::{clean_table, Cleaned};
pub use config::{BackendKind, EmbeddingSettings, EngineSettings, NameSettings, Settings};
pub use embed::{
    cosine_similarity, Embedder, EmbeddingClient, MockEmbedder, OllamaEmbedder,
    OpenAICompatibleEmbedder,
};
pub use engine::{CategorizationResult, Categorizer, Method};
pub use error::{Error, Result};
pub use names::NameDetector;
pub use normalize::normalize;
pub use rules::{MatchTier, MerchantRule, RuleMatch, RuleMatcher, RuleTable, TagTriple};
pub use semantic::{SemanticClassifier, SemanticMatch};
pub use summary::{summarize, CategorySpend, SpendBreakdown, SpendSummary};

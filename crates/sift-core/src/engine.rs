//! Categorization cascade
//!
//! Priority: rule table → transfer markers → known names → embedding
//! similarity → default label. The first stage that decides wins and later
//! stages are never consulted, so a rule hit or a transfer never costs an
//! embedding call.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{EngineSettings, Settings};
use crate::embed::{Embedder, EmbeddingClient};
use crate::error::Result;
use crate::names::{NameDetector, NAME_CONFIDENCE};
use crate::normalize::normalize;
use crate::rules::{MatchTier, RuleMatcher, RuleTable, TagTriple, FRIENDS_AND_FAMILY};
use crate::semantic::{SemanticClassifier, SemanticMatch};

/// Which stage produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Method {
    #[serde(rename = "Rule Engine")]
    RuleEngine,
    #[serde(rename = "Friend Filter")]
    FriendFilter,
    #[serde(rename = "Friend Family")]
    FriendFamily,
    #[serde(rename = "Semantic Fallback")]
    SemanticFallback,
    Default,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleEngine => "Rule Engine",
            Self::FriendFilter => "Friend Filter",
            Self::FriendFamily => "Friend Family",
            Self::SemanticFallback => "Semantic Fallback",
            Self::Default => "Default",
        }
    }

    /// Cascade order
    pub fn all() -> &'static [Method] {
        &[
            Self::RuleEngine,
            Self::FriendFilter,
            Self::FriendFamily,
            Self::SemanticFallback,
            Self::Default,
        ]
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision for one description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizationResult {
    pub category: String,
    pub tags: TagTriple,
    pub method: Method,
    /// Rule tier confidence, 0.99 for name stages, raw cosine for semantic
    /// decisions, 0 for the default
    pub confidence: f32,
    /// Set for rule decisions only
    pub tier: Option<MatchTier>,
    /// Semantic decision below the acceptance threshold
    pub low_confidence: bool,
}

impl CategorizationResult {
    fn fixed(category: &str, method: Method, confidence: f32) -> Self {
        Self {
            category: category.to_string(),
            tags: [None, None, None],
            method,
            confidence,
            tier: None,
            low_confidence: false,
        }
    }

    pub fn is_low_confidence(&self) -> bool {
        self.low_confidence
    }

    /// Present tags in order
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.iter().flatten().map(String::as_str).collect()
    }
}

/// The hybrid categorization engine
///
/// Immutable after construction; share it by reference.
#[derive(Clone)]
pub struct Categorizer {
    rules: RuleMatcher,
    names: NameDetector,
    semantic: SemanticClassifier,
    settings: EngineSettings,
}

impl Categorizer {
    /// Assemble an engine from already-loaded parts
    ///
    /// Embeds the category set and tag vocabulary derived from `table`.
    pub fn new(
        settings: &Settings,
        table: RuleTable,
        names: NameDetector,
        client: EmbeddingClient,
    ) -> Result<Self> {
        settings.validate()?;
        let engine = settings.engine.clone();

        let semantic = SemanticClassifier::with_batch_size(
            client,
            table.allowed_categories(),
            table.tag_vocabulary(),
            settings.embedding.batch_size,
        )?
        .tag_threshold(engine.tag_threshold)
        .max_tags(engine.max_tags);

        Ok(Self {
            rules: RuleMatcher::new(table, engine.rule_confidence),
            names,
            semantic,
            settings: engine,
        })
    }

    /// Load the rule table, names and embedding client described by `settings`
    pub fn from_settings(settings: &Settings, rules_path: Option<&Path>) -> Result<Self> {
        let table = RuleTable::load(rules_path)?;
        let names = NameDetector::from_settings(&settings.names)?;
        let client = EmbeddingClient::from_settings(&settings.embedding)?;

        info!(
            rules = table.len(),
            names = names.name_count(),
            backend = %client.kind(),
            model = %client.model(),
            "Building categorizer"
        );

        Self::new(settings, table, names, client)
    }

    pub fn rules(&self) -> &RuleMatcher {
        &self.rules
    }

    pub fn names(&self) -> &NameDetector {
        &self.names
    }

    pub fn semantic(&self) -> &SemanticClassifier {
        &self.semantic
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Categorize one description
    ///
    /// Empty or absent descriptions get the default label without touching
    /// the backend. Backend failures are returned, never masked.
    pub fn categorize(&self, description: Option<&str>) -> Result<CategorizationResult> {
        let raw = description.unwrap_or_default();
        let normalized = normalize(Some(raw));

        if let Some(result) = self.decide_locally(raw, &normalized) {
            return Ok(result);
        }

        let semantic = self.semantic.classify(&normalized)?;
        Ok(self.semantic_result(raw, semantic))
    }

    /// Categorize many descriptions, embedding the undecided ones in batches
    ///
    /// Output order matches input order. Any backend failure fails the
    /// whole call.
    pub fn categorize_many<S: AsRef<str>>(
        &self,
        descriptions: &[S],
    ) -> Result<Vec<CategorizationResult>> {
        let mut results: Vec<Option<CategorizationResult>> = Vec::with_capacity(descriptions.len());
        let mut pending_rows = Vec::new();
        let mut pending_text = Vec::new();

        for (row, description) in descriptions.iter().enumerate() {
            let raw = description.as_ref();
            let normalized = normalize(Some(raw));
            match self.decide_locally(raw, &normalized) {
                Some(result) => results.push(Some(result)),
                None => {
                    results.push(None);
                    pending_rows.push(row);
                    pending_text.push(normalized);
                }
            }
        }

        if !pending_text.is_empty() {
            debug!(
                total = descriptions.len(),
                semantic = pending_text.len(),
                "Embedding undecided descriptions"
            );
            let matches = self.semantic.classify_batch(&pending_text)?;
            for (row, semantic) in pending_rows.into_iter().zip(matches) {
                results[row] = Some(self.semantic_result(descriptions[row].as_ref(), semantic));
            }
        }

        // Every slot was filled by a local decision or by the semantic pass
        Ok(results.into_iter().flatten().collect())
    }

    /// Stages that need no embedding: empty input, rules, transfers, names
    fn decide_locally(&self, raw: &str, normalized: &str) -> Option<CategorizationResult> {
        let default_label = self.settings.default_label.as_str();

        // 0. Nothing left to match on
        if normalized.is_empty() {
            debug!("Empty description, using default label");
            return Some(CategorizationResult::fixed(default_label, Method::Default, 0.0));
        }

        // 1. Merchant rule table
        if let Some(hit) = self.rules.match_normalized(normalized) {
            debug!(
                "Rule matched for '{}': {} ({})",
                raw, hit.category, hit.tier
            );
            return Some(CategorizationResult {
                category: hit.category,
                tags: hit.tags,
                method: Method::RuleEngine,
                confidence: hit.confidence,
                tier: Some(hit.tier),
                low_confidence: false,
            });
        }

        // 2. Transfer markers: a transfer is not a spend category
        if self.names.matches_friend_pattern(raw) {
            debug!("Transfer marker matched for '{}'", raw);
            return Some(CategorizationResult::fixed(
                default_label,
                Method::FriendFilter,
                NAME_CONFIDENCE,
            ));
        }

        // 3. Known personal names
        if self.names.contains_known_name(raw) {
            debug!("Known name matched for '{}'", raw);
            return Some(CategorizationResult::fixed(
                FRIENDS_AND_FAMILY,
                Method::FriendFamily,
                NAME_CONFIDENCE,
            ));
        }

        None
    }

    /// 4./5. Semantic decision, or the default when it lands on the default label
    fn semantic_result(&self, raw: &str, semantic: SemanticMatch) -> CategorizationResult {
        if semantic.category == self.settings.default_label {
            debug!("Semantic match for '{}' is the default label", raw);
            return CategorizationResult::fixed(&self.settings.default_label, Method::Default, 0.0);
        }

        let low_confidence = semantic.confidence < self.settings.semantic_threshold;
        debug!(
            "Semantic match for '{}': {} (similarity: {:.3}{})",
            raw,
            semantic.category,
            semantic.confidence,
            if low_confidence { ", low confidence" } else { "" }
        );

        CategorizationResult {
            category: semantic.category,
            tags: semantic.tags,
            method: Method::SemanticFallback,
            confidence: semantic.confidence,
            tier: None,
            low_confidence,
        }
    }
}

//! Merchant rule table and rule matcher
//!
//! The rule table is data, not code: an ordered list of
//! `phrase -> (category, tags)` records loaded from TOML. The default table is
//! compiled into the binary and can be replaced by a file:
//!
//! ```toml
//! [[rule]]
//! phrase = "swiggy"
//! category = "Food & Beverage"
//! tags = ["Online Order", "Restaurant", "Delivery"]
//! ```
//!
//! Matching runs three tiers over the whole table, most specific first:
//! full phrase, all significant words, any word. A hit in an earlier tier
//! always beats a later tier, whatever the rule order.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::default_rules_path;
use crate::error::{Error, Result};
use crate::normalize::{normalize, tokens};

/// Embedded default rule table (compiled into binary)
const DEFAULT_RULES: &str = include_str!("../../../config/merchants.toml");

/// Synthetic category for peer-to-peer transfers to known people
pub const FRIENDS_AND_FAMILY: &str = "Friends and Family";

/// Up to three optional tags attached to a decision
pub type TagTriple = [Option<String>; 3];

/// Confidence multiplier for the all-significant-words tier
const ALL_WORDS_FACTOR: f32 = 0.90;
/// Confidence multiplier for the any-word tier
const ANY_WORD_FACTOR: f32 = 0.85;
/// Phrase tokens of this length or shorter are ignored by the all-words tier
const SIGNIFICANT_TOKEN_LEN: usize = 2;

/// One merchant rule
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantRule {
    /// Normalized key phrase
    pub phrase: String,
    pub category: String,
    pub tags: TagTriple,
}

impl MerchantRule {
    pub fn new(phrase: &str, category: &str, tags: &[&str]) -> Result<Self> {
        let owned: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        Self::from_parts(phrase, category, owned)
    }

    fn from_parts(phrase: &str, category: &str, tags: Vec<String>) -> Result<Self> {
        let normalized = normalize(Some(phrase));
        if normalized.is_empty() {
            return Err(Error::Config(format!(
                "Rule phrase {:?} is empty after normalization",
                phrase
            )));
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::Config(format!(
                "Rule {:?} has an empty category",
                phrase
            )));
        }
        if tags.len() > 3 {
            return Err(Error::Config(format!(
                "Rule {:?} has {} tags, at most 3 are allowed",
                phrase,
                tags.len()
            )));
        }

        let mut triple: TagTriple = Default::default();
        for (slot, tag) in triple.iter_mut().zip(tags) {
            let tag = tag.trim();
            if !tag.is_empty() {
                *slot = Some(tag.to_string());
            }
        }

        Ok(Self {
            phrase: normalized,
            category: category.to_string(),
            tags: triple,
        })
    }
}

/// How specific a rule match was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchTier {
    /// The whole phrase appears in the description
    #[serde(rename = "full_phrase")]
    FullPhrase,
    /// Every significant phrase word appears as a description token
    #[serde(rename = "all_words")]
    AllSignificantWords,
    /// At least one phrase word appears as a description token
    #[serde(rename = "any_word")]
    AnyWord,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullPhrase => "full_phrase",
            Self::AllSignificantWords => "all_words",
            Self::AnyWord => "any_word",
        }
    }

    /// Confidence for this tier given the configured base
    pub fn confidence(&self, base: f32) -> f32 {
        match self {
            Self::FullPhrase => base,
            Self::AllSignificantWords => base * ALL_WORDS_FACTOR,
            Self::AnyWord => base * ANY_WORD_FACTOR,
        }
    }

    fn all() -> &'static [MatchTier] {
        &[
            Self::FullPhrase,
            Self::AllSignificantWords,
            Self::AnyWord,
        ]
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw rule table for TOML parsing
#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    rule: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    phrase: String,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Ordered, immutable merchant rule table
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: Vec<MerchantRule>,
}

impl RuleTable {
    /// Build from rules, rejecting duplicate phrases
    pub fn from_rules(rules: Vec<MerchantRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.phrase.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate rule phrase: {:?}",
                    rule.phrase
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Parse a TOML rule table
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawTable = toml::from_str(content)?;
        let rules = raw
            .rule
            .into_iter()
            .map(|r| MerchantRule::from_parts(&r.phrase, &r.category, r.tags))
            .collect::<Result<Vec<_>>>()?;
        Self::from_rules(rules)
    }

    /// The table compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_RULES)
    }

    /// Load from an explicit file, the data-dir override, or the embedded table
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!(
                        "Failed to read rules file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml(&content)
            }
            None => match default_rules_path() {
                Some(default_path) if default_path.exists() => {
                    Self::from_toml(&fs::read_to_string(&default_path)?)
                }
                _ => Self::embedded(),
            },
        }
    }

    pub fn rules(&self) -> &[MerchantRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct categories in first-occurrence order, plus the synthetic
    /// "Friends and Family" category if no rule uses it
    ///
    /// The order is fixed so that equal similarity scores in the semantic
    /// stage always resolve to the same category.
    pub fn allowed_categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut categories: Vec<String> = self
            .rules
            .iter()
            .filter(|r| seen.insert(r.category.as_str()))
            .map(|r| r.category.clone())
            .collect();
        if !categories.iter().any(|c| c == FRIENDS_AND_FAMILY) {
            categories.push(FRIENDS_AND_FAMILY.to_string());
        }
        categories
    }

    /// Distinct tags across all rules in first-occurrence order
    pub fn tag_vocabulary(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .flat_map(|r| r.tags.iter().flatten())
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect()
    }
}

/// A rule decision
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub category: String,
    pub confidence: f32,
    pub tags: TagTriple,
    pub tier: MatchTier,
    pub phrase: String,
}

/// Applies a rule table to descriptions
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    table: RuleTable,
    base_confidence: f32,
}

impl RuleMatcher {
    pub fn new(table: RuleTable, base_confidence: f32) -> Self {
        Self {
            table,
            base_confidence,
        }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// First matching rule, tier by tier
    pub fn match_description(&self, description: &str) -> Option<RuleMatch> {
        let desc = normalize(Some(description));
        self.match_normalized(&desc)
    }

    /// Same as `match_description` for text that is already normalized
    pub fn match_normalized(&self, desc: &str) -> Option<RuleMatch> {
        if desc.is_empty() {
            return None;
        }
        let desc_tokens: HashSet<&str> = tokens(desc).into_iter().collect();

        for &tier in MatchTier::all() {
            if let Some(rule) = self
                .table
                .rules
                .iter()
                .find(|rule| rule_matches(rule, tier, desc, &desc_tokens))
            {
                debug!(
                    phrase = %rule.phrase,
                    tier = %tier,
                    category = %rule.category,
                    "Rule matched"
                );
                return Some(self.to_match(rule, tier));
            }
        }

        None
    }

    /// Every rule that matches at any tier, ordered by tier then table order
    pub fn explain(&self, description: &str) -> Vec<RuleMatch> {
        let desc = normalize(Some(description));
        if desc.is_empty() {
            return Vec::new();
        }
        let desc_tokens: HashSet<&str> = tokens(&desc).into_iter().collect();

        let mut matches = Vec::new();
        let mut seen = HashSet::new();
        for &tier in MatchTier::all() {
            for rule in &self.table.rules {
                if !seen.contains(rule.phrase.as_str())
                    && rule_matches(rule, tier, &desc, &desc_tokens)
                {
                    seen.insert(rule.phrase.as_str());
                    matches.push(self.to_match(rule, tier));
                }
            }
        }
        matches
    }

    fn to_match(&self, rule: &MerchantRule, tier: MatchTier) -> RuleMatch {
        RuleMatch {
            category: rule.category.clone(),
            confidence: tier.confidence(self.base_confidence),
            tags: rule.tags.clone(),
            tier,
            phrase: rule.phrase.clone(),
        }
    }
}

fn rule_matches(
    rule: &MerchantRule,
    tier: MatchTier,
    desc: &str,
    desc_tokens: &HashSet<&str>,
) -> bool {
    match tier {
        MatchTier::FullPhrase => desc.contains(rule.phrase.as_str()),
        MatchTier::AllSignificantWords => {
            let mut significant = tokens(&rule.phrase)
                .into_iter()
                .filter(|w| w.len() > SIGNIFICANT_TOKEN_LEN)
                .peekable();
            // A phrase made only of short words has nothing to check
            significant.peek().is_some() && significant.all(|w| desc_tokens.contains(w))
        }
        MatchTier::AnyWord => tokens(&rule.phrase)
            .into_iter()
            .any(|w| desc_tokens.contains(w)),
    }
}

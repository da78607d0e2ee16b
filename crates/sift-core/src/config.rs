//! Engine settings
//!
//! Settings are loaded with a two-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/sift/config/sift.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied last and only touch the embedding
//! backend section:
//! - `EMBEDDING_BACKEND`: ollama, openai_compatible or mock
//! - `EMBEDDING_MODEL`: model identifier sent to the backend
//! - `OLLAMA_HOST`: Ollama server URL (ollama backend)
//! - `OPENAI_COMPATIBLE_HOST`: server URL (openai_compatible backend)
//! - `OPENAI_COMPATIBLE_API_KEY`: bearer token if the server requires one

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/sift.toml");

/// Which embedding backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Ollama,
    OpenAICompatible,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAICompatible => "openai_compatible",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenAICompatible)
            }
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown embedding backend: {}", s)),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cascade tuning
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Confidence of a full-phrase rule match
    pub rule_confidence: f32,
    /// Semantic similarity under which a decision is reported as low confidence
    pub semantic_threshold: f32,
    /// Label used when no stage decides
    pub default_label: String,
    /// Minimum similarity for a semantic tag
    pub tag_threshold: f32,
    /// Tags attached per record (0..=3)
    pub max_tags: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rule_confidence: 0.95,
            semantic_threshold: 0.6,
            default_label: "Uncategorized".to_string(),
            tag_threshold: 0.4,
            max_tags: 3,
        }
    }
}

/// Peer-transfer detection inputs
#[derive(Debug, Clone, PartialEq)]
pub struct NameSettings {
    /// Transfer-marker phrases, matched case-insensitively
    pub friend_patterns: Vec<String>,
    /// Optional personal-name list, one per line
    pub file: Option<PathBuf>,
    /// Inline personal names
    pub known: Vec<String>,
}

impl Default for NameSettings {
    fn default() -> Self {
        Self {
            friend_patterns: ["TO RAHUL VERMA", "TO SNEHA VERMA", "IMPS TO", "IMPS FROM"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            file: None,
            known: Vec::new(),
        }
    }
}

/// Embedding backend connection
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSettings {
    pub backend: BackendKind,
    pub model: String,
    pub host: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Descriptions per embedding request in batch mode
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Ollama,
            model: "all-minilm".to_string(),
            host: "http://localhost:11434".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            batch_size: 64,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub engine: EngineSettings,
    pub names: NameSettings,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    /// Load settings from an explicit file, the data-dir override, or the
    /// embedded defaults, in that order
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config {}: {}", path.display(), e))
            })?,
            None => match default_config_path() {
                Some(default_path) if default_path.exists() => fs::read_to_string(&default_path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    /// Settings from the embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Apply `EMBEDDING_*` / host environment variables
    ///
    /// `backend` is a command-line choice: it beats `EMBEDDING_BACKEND` and
    /// selects which host and key variables are read.
    pub fn apply_env(&mut self, backend: Option<BackendKind>) -> Result<()> {
        self.apply_env_with(backend, |key| std::env::var(key).ok())
    }

    /// Apply environment overrides from an arbitrary lookup
    pub fn apply_env_with<F>(&mut self, backend: Option<BackendKind>, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let embedding = &mut self.embedding;

        if let Some(backend) = lookup("EMBEDDING_BACKEND") {
            embedding.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Some(backend) = backend {
            embedding.backend = backend;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            embedding.model = model;
        }

        match embedding.backend {
            BackendKind::Ollama => {
                if let Some(host) = lookup("OLLAMA_HOST") {
                    embedding.host = host;
                }
            }
            BackendKind::OpenAICompatible => {
                if let Some(host) = lookup("OPENAI_COMPATIBLE_HOST") {
                    embedding.host = host;
                }
                if let Some(key) = lookup("OPENAI_COMPATIBLE_API_KEY") {
                    embedding.api_key = Some(key);
                }
            }
            BackendKind::Mock => {}
        }

        Ok(())
    }

    /// Check ranges; called by `parse_config` and again by the engine builder
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        if !(0.0..=1.0).contains(&engine.rule_confidence) {
            return Err(Error::Config(format!(
                "rule_confidence must be within 0..=1, got {}",
                engine.rule_confidence
            )));
        }
        if !(0.0..=1.0).contains(&engine.semantic_threshold) {
            return Err(Error::Config(format!(
                "semantic_threshold must be within 0..=1, got {}",
                engine.semantic_threshold
            )));
        }
        if !(0.0..=1.0).contains(&engine.tag_threshold) {
            return Err(Error::Config(format!(
                "tag_threshold must be within 0..=1, got {}",
                engine.tag_threshold
            )));
        }
        if engine.default_label.trim().is_empty() {
            return Err(Error::Config("default_label must not be empty".into()));
        }
        if engine.max_tags > 3 {
            return Err(Error::Config(format!(
                "max_tags must be at most 3, got {}",
                engine.max_tags
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sift").join("config").join("sift.toml"))
}

/// Default merchant rule table override path
pub fn default_rules_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sift").join("config").join("merchants.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    engine: Option<RawEngine>,
    names: Option<RawNames>,
    embedding: Option<RawEmbedding>,
}

#[derive(Debug, Deserialize)]
struct RawEngine {
    rule_confidence: Option<f32>,
    semantic_threshold: Option<f32>,
    default_label: Option<String>,
    tag_threshold: Option<f32>,
    max_tags: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawNames {
    friend_patterns: Option<Vec<String>>,
    file: Option<PathBuf>,
    known: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawEmbedding {
    backend: Option<String>,
    model: Option<String>,
    host: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    batch_size: Option<usize>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<Settings> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut settings = Settings::default();

    if let Some(engine) = raw.engine {
        let target = &mut settings.engine;
        if let Some(v) = engine.rule_confidence {
            target.rule_confidence = v;
        }
        if let Some(v) = engine.semantic_threshold {
            target.semantic_threshold = v;
        }
        if let Some(v) = engine.default_label {
            target.default_label = v;
        }
        if let Some(v) = engine.tag_threshold {
            target.tag_threshold = v;
        }
        if let Some(v) = engine.max_tags {
            target.max_tags = v;
        }
    }

    if let Some(names) = raw.names {
        if let Some(patterns) = names.friend_patterns {
            settings.names.friend_patterns = patterns;
        }
        settings.names.file = names.file;
        if let Some(known) = names.known {
            settings.names.known = known;
        }
    }

    if let Some(embedding) = raw.embedding {
        let target = &mut settings.embedding;
        if let Some(backend) = embedding.backend {
            target.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Some(model) = embedding.model {
            target.model = model;
        }
        if let Some(host) = embedding.host {
            target.host = host;
        }
        target.api_key = embedding.api_key;
        if let Some(secs) = embedding.timeout_secs {
            target.timeout = Duration::from_secs(secs);
        }
        if let Some(size) = embedding.batch_size {
            target.batch_size = size;
        }
    }

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_default_config() {
        let settings = Settings::embedded().unwrap();
        assert_eq!(settings.engine, EngineSettings::default());
        assert_eq!(settings.names.friend_patterns.len(), 4);
        assert_eq!(settings.embedding.backend, BackendKind::Ollama);
        assert_eq!(settings.embedding.model, "all-minilm");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings = parse_config(
            r#"
            [engine]
            default_label = "Others"

            [embedding]
            backend = "mock"
            "#,
        )
        .unwrap();

        assert_eq!(settings.engine.default_label, "Others");
        assert_eq!(settings.engine.rule_confidence, 0.95);
        assert_eq!(settings.embedding.backend, BackendKind::Mock);
        assert_eq!(settings.embedding.batch_size, 64);
        assert_eq!(settings.names, NameSettings::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            parse_config("[engine]\nrule_confidence = 1.5"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config("[engine]\nmax_tags = 4"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config("[engine]\ndefault_label = \"  \""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config("[embedding]\nbackend = \"carrier-pigeon\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_backend_kind_round_trip() {
        for kind in [
            BackendKind::Ollama,
            BackendKind::OpenAICompatible,
            BackendKind::Mock,
        ] {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!(
            "vllm".parse::<BackendKind>().unwrap(),
            BackendKind::OpenAICompatible
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("EMBEDDING_BACKEND", "openai_compatible"),
            ("EMBEDDING_MODEL", "text-embedding-3-small"),
            ("OPENAI_COMPATIBLE_HOST", "http://gpu-box:8000"),
            ("OPENAI_COMPATIBLE_API_KEY", "secret"),
            ("OLLAMA_HOST", "http://ignored:11434"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_env_with(None, |k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.embedding.backend, BackendKind::OpenAICompatible);
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
        assert_eq!(settings.embedding.host, "http://gpu-box:8000");
        assert_eq!(settings.embedding.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_backend_choice_selects_host_variables() {
        let env: HashMap<&str, &str> = [
            ("EMBEDDING_BACKEND", "ollama"),
            ("OLLAMA_HOST", "http://ollama-box:11434"),
            ("OPENAI_COMPATIBLE_HOST", "http://gpu-box:8000"),
            ("OPENAI_COMPATIBLE_API_KEY", "secret"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_env_with(Some(BackendKind::OpenAICompatible), |k| {
                env.get(k).map(|v| v.to_string())
            })
            .unwrap();

        assert_eq!(settings.embedding.backend, BackendKind::OpenAICompatible);
        assert_eq!(settings.embedding.host, "http://gpu-box:8000");
        assert_eq!(settings.embedding.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_tag_threshold_range_checked() {
        assert!(matches!(
            parse_config("[engine]\ntag_threshold = 1.5"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config("[engine]\ntag_threshold = nan"),
            Err(Error::Config(_))
        ));

        let mut settings = Settings::default();
        settings.engine.tag_threshold = f32::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.toml");
        fs::write(&path, "[engine]\ntag_threshold = 0.25\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.engine.tag_threshold, 0.25);

        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Settings::load(Some(missing.as_path())),
            Err(Error::Config(_))
        ));
    }
}

//! Shared command utilities
//!
//! This module contains:
//! - `EngineOptions` - global flags that shape the engine
//! - `load_settings` / `load_settings_with` - settings file + environment + flag overrides
//! - `load_rules` / `build_engine` - shared loaders for the commands

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use sift_core::{BackendKind, Categorizer, RuleTable, Settings};

/// Global flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub config: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub names: Option<PathBuf>,
    pub backend: Option<String>,
}

/// Resolve settings
///
/// Priority: command-line flags > environment > settings file > built-in defaults
pub fn load_settings(opts: &EngineOptions) -> Result<Settings> {
    load_settings_with(opts, |key| std::env::var(key).ok())
}

/// Same as `load_settings` with an explicit environment lookup
pub fn load_settings_with<F>(opts: &EngineOptions, env: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::load(opts.config.as_deref()).context("Failed to load settings")?;

    let backend = opts
        .backend
        .as_deref()
        .map(|b| b.parse::<BackendKind>().map_err(|e| anyhow!(e)))
        .transpose()?;
    settings
        .apply_env_with(backend, env)
        .context("Invalid embedding settings in environment")?;

    if let Some(names) = &opts.names {
        settings.names.file = Some(names.clone());
    }

    tracing::debug!(
        backend = %settings.embedding.backend,
        model = %settings.embedding.model,
        host = %settings.embedding.host,
        "Resolved settings"
    );
    Ok(settings)
}

/// Load the merchant rule table without touching the embedding backend
pub fn load_rules(opts: &EngineOptions) -> Result<RuleTable> {
    RuleTable::load(opts.rules.as_deref()).context("Failed to load merchant rules")
}

/// Build the full categorizer (embeds the category set and tag vocabulary)
pub fn build_engine(opts: &EngineOptions) -> Result<Categorizer> {
    let settings = load_settings(opts)?;
    Categorizer::from_settings(&settings, opts.rules.as_deref()).with_context(|| {
        format!(
            "Failed to build categorizer ({} backend at {})",
            settings.embedding.backend, settings.embedding.host
        )
    })
}

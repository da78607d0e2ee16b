//! Rule table and vocabulary commands
//!
//! None of these touch the embedding backend.

use anyhow::{Context, Result};
use sift_core::{NameDetector, RuleMatcher, RuleTable};

use super::core::{load_rules, load_settings, EngineOptions};
use super::truncate;

pub fn cmd_rules_list(opts: &EngineOptions) -> Result<()> {
    let table = load_rules(opts)?;
    print!("{}", render_rules(&table));
    Ok(())
}

pub fn render_rules(table: &RuleTable) -> String {
    let mut out = format!("📋 {} rules (checked in this order)\n\n", table.len());
    for (i, rule) in table.rules().iter().enumerate() {
        let tags: Vec<&str> = rule.tags.iter().flatten().map(String::as_str).collect();
        out.push_str(&format!(
            "  {:>3}. {:<24} → {:<18} {}\n",
            i + 1,
            truncate(&rule.phrase, 24),
            rule.category,
            tags.join(", ")
        ));
    }
    out
}

/// Explain which rules and name checks fire for a description
pub fn cmd_rules_test(opts: &EngineOptions, description: &str) -> Result<()> {
    let settings = load_settings(opts)?;
    let table = load_rules(opts)?;
    let matcher = RuleMatcher::new(table, settings.engine.rule_confidence);
    let names =
        NameDetector::from_settings(&settings.names).context("Failed to load names file")?;

    print!(
        "{}",
        explain(&matcher, &names, description, &settings.engine.default_label)
    );
    Ok(())
}

pub fn explain(
    matcher: &RuleMatcher,
    names: &NameDetector,
    description: &str,
    default_label: &str,
) -> String {
    let mut out = format!("🔍 \"{}\"\n", description);
    out.push_str(&format!(
        "   normalized: \"{}\"\n\n",
        sift_core::normalize(Some(description))
    ));

    let matches = matcher.explain(description);
    if matches.is_empty() {
        out.push_str("   No rule matches\n");
    } else {
        for (i, m) in matches.iter().enumerate() {
            let marker = if i == 0 { "✅" } else { "  " };
            out.push_str(&format!(
                "   {} {:<24} {:<12} {:.3}  → {}\n",
                marker,
                m.phrase,
                m.tier.as_str(),
                m.confidence,
                m.category
            ));
        }
    }

    out.push('\n');
    if names.matches_friend_pattern(description) {
        out.push_str(&format!(
            "   Transfer marker matched → {}\n",
            default_label
        ));
    }
    if names.contains_known_name(description) {
        out.push_str("   Known name matched → Friends and Family\n");
    }
    if matches.is_empty()
        && !names.matches_friend_pattern(description)
        && !names.contains_known_name(description)
    {
        out.push_str("   Would fall through to semantic matching\n");
    }
    out
}

/// Print the category set and tag vocabulary the semantic stage embeds
pub fn cmd_vocab(opts: &EngineOptions) -> Result<()> {
    let table = load_rules(opts)?;
    print!("{}", render_vocab(&table));
    Ok(())
}

pub fn render_vocab(table: &RuleTable) -> String {
    let categories = table.allowed_categories();
    let tags = table.tag_vocabulary();

    let mut out = format!("🏷️  Categories ({})\n", categories.len());
    for category in &categories {
        out.push_str(&format!("   {}\n", category));
    }
    out.push_str(&format!("\n🔖 Tags ({})\n", tags.len()));
    for chunk in tags.chunks(4) {
        out.push_str(&format!("   {}\n", chunk.join(", ")));
    }
    out
}

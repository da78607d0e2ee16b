//! Single-description command

use anyhow::{Context, Result};
use sift_core::CategorizationResult;

use super::core::{build_engine, EngineOptions};

pub fn cmd_classify(opts: &EngineOptions, description: &str, json: bool) -> Result<()> {
    let engine = build_engine(opts)?;
    let result = engine
        .categorize(Some(description))
        .with_context(|| format!("Failed to categorize \"{}\"", description))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_result(description, &result));
    }
    Ok(())
}

pub fn render_result(description: &str, result: &CategorizationResult) -> String {
    let mut out = format!("\"{}\"\n", description);
    out.push_str(&format!("  Category:   {}\n", result.category));

    let tags = result.tag_list();
    if !tags.is_empty() {
        out.push_str(&format!("  Tags:       {}\n", tags.join(", ")));
    }

    match result.tier {
        Some(tier) => out.push_str(&format!("  Method:     {} ({})\n", result.method, tier)),
        None => out.push_str(&format!("  Method:     {}\n", result.method)),
    }
    out.push_str(&format!("  Confidence: {:.3}\n", result.confidence));
    if result.is_low_confidence() {
        out.push_str("  ⚠️  Low similarity, review this one\n");
    }
    out
}

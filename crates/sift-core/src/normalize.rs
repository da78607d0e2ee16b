//! Text normalization for matching
//!
//! Bank narrations arrive in every shape: `UPI/ZOMATO-ORDER@okaxis`,
//! `POS 4521 STARBUCKS #12`, `IMPS_TO_RAHUL`. Every matching stage works on the
//! same canonical form so that a rule phrase, a personal name and an embedding
//! input see identical text.

use std::sync::OnceLock;

use regex::Regex;

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[/\-_@]+").expect("valid separator regex"))
}

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s]").expect("valid character class regex"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Canonicalize a raw description
///
/// Lowercases, turns runs of `/ - _ @` into a single space, drops any other
/// character outside `[a-z0-9\s]`, collapses whitespace and trims.
/// `None` normalizes to the empty string.
pub fn normalize(text: Option<&str>) -> String {
    let lower = text.unwrap_or_default().to_lowercase();
    let spaced = separators().replace_all(&lower, " ");
    let stripped = disallowed().replace_all(&spaced, "");
    whitespace().replace_all(&stripped, " ").trim().to_string()
}

/// Split already-normalized text into tokens
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

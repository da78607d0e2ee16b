//! Peer-transfer detection
//!
//! Two checks run after the rule table finds nothing:
//! - transfer markers (`IMPS TO`, `TO <recipient>`) route the row to the
//!   default label, since a transfer is not a spend category;
//! - a dictionary of known personal names routes the row to
//!   "Friends and Family".
//!
//! The marker check always runs first. A transfer that also names a known
//! person still ends up under the default label.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::NameSettings;
use crate::error::Result;
use crate::normalize::{normalize, tokens};

/// Confidence reported by both name checks
pub const NAME_CONFIDENCE: f32 = 0.99;

#[derive(Debug, Clone, Default)]
pub struct NameDetector {
    /// Uppercased transfer markers
    friend_patterns: Vec<String>,
    /// Normalized personal names (single words or "first last")
    names: HashSet<String>,
}

impl NameDetector {
    pub fn new<P, N>(friend_patterns: P, names: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let friend_patterns = friend_patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_uppercase())
            .filter(|p| !p.is_empty())
            .collect();
        let names = names
            .into_iter()
            .map(|n| normalize(Some(n.as_ref())))
            .filter(|n| !n.is_empty())
            .collect();
        Self {
            friend_patterns,
            names,
        }
    }

    /// Build from settings, reading the names file if one is configured
    ///
    /// A configured file that does not exist is logged and skipped.
    pub fn from_settings(settings: &NameSettings) -> Result<Self> {
        let mut names = settings.known.clone();
        if let Some(path) = &settings.file {
            if path.exists() {
                names.extend(read_names_file(path)?);
            } else {
                warn!(path = %path.display(), "Names file not found, continuing without it");
            }
        }
        Ok(Self::new(&settings.friend_patterns, names))
    }

    /// Number of known personal names
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    pub fn friend_patterns(&self) -> &[String] {
        &self.friend_patterns
    }

    /// Description contains a transfer marker (case-insensitive)
    pub fn matches_friend_pattern(&self, description: &str) -> bool {
        let desc_upper = description.to_uppercase();
        let hit = self
            .friend_patterns
            .iter()
            .find(|p| desc_upper.contains(p.as_str()));
        if let Some(pattern) = hit {
            debug!(pattern = %pattern, "Transfer marker matched");
        }
        hit.is_some()
    }

    /// A token, or an adjacent token pair, is a known personal name
    pub fn contains_known_name(&self, description: &str) -> bool {
        if self.names.is_empty() {
            return false;
        }
        let normalized = normalize(Some(description));
        let words = tokens(&normalized);

        if words.iter().any(|w| self.names.contains(*w)) {
            return true;
        }
        words
            .windows(2)
            .any(|pair| self.names.contains(&format!("{} {}", pair[0], pair[1])))
    }
}

/// Read a names file: one name per line, blank lines ignored
pub fn read_names_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NameSettings;

    fn detector() -> NameDetector {
        NameDetector::new(
            ["TO RAHUL VERMA", "TO SNEHA VERMA", "IMPS TO", "IMPS FROM"],
            ["priya", "Arjun Mehta"],
        )
    }

    #[test]
    fn test_friend_pattern_case_insensitive() {
        let d = detector();
        assert!(d.matches_friend_pattern("TO RAHUL VERMA"));
        assert!(d.matches_friend_pattern("upi paid to rahul verma ref 1123"));
        assert!(d.matches_friend_pattern("Imps From 4433 ACME"));
        assert!(!d.matches_friend_pattern("NETFLIX.COM"));
        assert!(!d.matches_friend_pattern(""));
    }

    #[test]
    fn test_single_token_name() {
        let d = detector();
        assert!(d.contains_known_name("UPI/PRIYA/okicici"));
        assert!(!d.contains_known_name("PRIYANKA STORES"));
    }

    #[test]
    fn test_adjacent_pair_name() {
        let d = detector();
        assert!(d.contains_known_name("NEFT ARJUN MEHTA SALARY SHARE"));
        // Both words present but not adjacent
        assert!(!d.contains_known_name("ARJUN PAID MEHTA"));
    }

    #[test]
    fn test_empty_dictionary_never_matches() {
        let d = NameDetector::new(["IMPS TO"], Vec::<String>::new());
        assert!(!d.contains_known_name("PRIYA"));
        assert_eq!(d.name_count(), 0);
    }

    #[test]
    fn test_blank_patterns_dropped() {
        let d = NameDetector::new(["  ", "imps to"], ["", "  "]);
        assert_eq!(d.friend_patterns(), &["IMPS TO".to_string()]);
        assert_eq!(d.name_count(), 0);
    }

    #[test]
    fn test_read_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.txt");
        fs::write(&path, "Rahul\n\n  SNEHA  \nkiran rao\n").unwrap();

        let names = read_names_file(&path).unwrap();
        assert_eq!(names, vec!["rahul", "sneha", "kiran rao"]);
    }

    #[test]
    fn test_from_settings_merges_file_and_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.txt");
        fs::write(&path, "kiran rao\n").unwrap();

        let settings = NameSettings {
            file: Some(path),
            known: vec!["Meera".to_string()],
            ..Default::default()
        };
        let d = NameDetector::from_settings(&settings).unwrap();
        assert_eq!(d.name_count(), 2);
        assert!(d.contains_known_name("GPAY KIRAN RAO"));
        assert!(d.contains_known_name("meera"));
    }

    #[test]
    fn test_missing_names_file_is_not_fatal() {
        let settings = NameSettings {
            file: Some("/definitely/not/here/names.txt".into()),
            ..Default::default()
        };
        let d = NameDetector::from_settings(&settings).unwrap();
        assert_eq!(d.name_count(), 0);
        assert_eq!(d.friend_patterns().len(), 4);
    }
}

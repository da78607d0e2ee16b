//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (settings resolution, engine construction)
//! - `categorize` - CSV batch categorization and spend summary
//! - `classify` - Single-description categorization
//! - `rules` - Rule table listing, match explanation and vocabulary
//! - `backend` - Embedding backend check

pub mod backend;
pub mod categorize;
pub mod classify;
pub mod core;
pub mod rules;

// Re-export command functions for main.rs
pub use backend::*;
pub use categorize::*;
pub use classify::*;
pub use self::core::*;
pub use rules::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub mod adaptive;
pub mod config;
pub mod content;
pub mod insights;
pub mod rewards;
pub mod session;

use study_buddy_core::{AgeGroup, Config};

/// The explicit `--age`, or the one configured in `profile.age_group`.
pub fn resolve_age(explicit: Option<AgeGroup>) -> AgeGroup {
    explicit.unwrap_or_else(|| Config::load_or_default().profile.age_group)
}

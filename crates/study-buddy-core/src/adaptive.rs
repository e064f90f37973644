//! Adaptive check-in interval model.
//!
//! Each subject carries an ease score in `[0, 1]` (higher means easier for
//! the child). Interaction responses nudge the score; the average across
//! subjects shortens or stretches the check-in cadence by up to two minutes.
//!
//! State lives in the key-value store under `adaptiveModel`. Loading never
//! fails: absent, unparsable or out-of-range data yields an empty model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::AgeGroup;
use crate::services::{JsonStoreExt, KeyValueStore};
use crate::storage::StorageKey;

/// Score assumed for a subject with no history.
pub const DEFAULT_SCORE: f64 = 0.5;
/// Floor for [`adaptive_check_in_minutes`].
pub const MIN_CHECK_IN_MINUTES: u32 = 2;

const MAX_DAILY_DECAY: f64 = 0.05;
const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectScore {
    pub score: f64,
    /// Epoch milliseconds of the last update.
    pub updated_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveModel {
    #[serde(default)]
    pub subjects: BTreeMap<String, SubjectScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_week_start: Option<String>,
}

impl AdaptiveModel {
    pub fn is_valid(&self) -> bool {
        self.subjects
            .values()
            .all(|s| s.score.is_finite() && (0.0..=1.0).contains(&s.score))
    }

    pub fn score(&self, subject_id: &str) -> f64 {
        self.subjects
            .get(subject_id)
            .map_or(DEFAULT_SCORE, |s| s.score)
    }

    /// Mean score over recorded subjects, or the default when there are none.
    pub fn average(&self) -> f64 {
        if self.subjects.is_empty() {
            return DEFAULT_SCORE;
        }
        self.subjects.values().map(|s| s.score).sum::<f64>() / self.subjects.len() as f64
    }

    /// Apply one response to `subject_id` at `now_ms`.
    pub fn apply(&mut self, now_ms: u64, subject_id: &str, response: &str) -> f64 {
        let current = self
            .subjects
            .get(subject_id)
            .copied()
            .unwrap_or(SubjectScore {
                score: DEFAULT_SCORE,
                updated_at: now_ms,
            });
        let elapsed_ms = now_ms.saturating_sub(current.updated_at) as f64;
        let decay = (elapsed_ms / MS_PER_DAY).min(1.0);
        let decayed = current.score * (1.0 - MAX_DAILY_DECAY * decay);
        let score = (decayed + response_delta(response)).clamp(0.0, 1.0);
        self.subjects.insert(
            subject_id.to_string(),
            SubjectScore {
                score,
                updated_at: now_ms,
            },
        );
        score
    }

    /// Recommended cadence for `age` given the current scores.
    pub fn check_in_minutes(&self, age: AgeGroup) -> u32 {
        let base = age.adaptive_base_minutes() as i64;
        // Half-way values round up, e.g. -0.5 becomes 0.
        let adjustment = ((DEFAULT_SCORE - self.average()) * 4.0 + 0.5).floor() as i64;
        (base + adjustment).max(MIN_CHECK_IN_MINUTES as i64) as u32
    }
}

/// Score change for a normalized response id. Unknown ids change nothing.
pub fn response_delta(response: &str) -> f64 {
    match response {
        "easy" => 0.06,
        "ok" => 0.02,
        "hard" => -0.06,
        "help" => -0.08,
        "complete" => 0.04,
        "most" => 0.02,
        "half" => -0.02,
        "started" => -0.04,
        _ => 0.0,
    }
}

pub fn load_model(store: &dyn KeyValueStore) -> AdaptiveModel {
    store.get_json_checked(StorageKey::AdaptiveModel, AdaptiveModel::default(), |m| {
        m.is_valid()
    })
}

/// Persist `model`. Returns `false` if the store rejected the write.
pub fn save_model(store: &dyn KeyValueStore, model: &AdaptiveModel) -> bool {
    let saved = store.set_json(StorageKey::AdaptiveModel, model);
    if !saved {
        tracing::warn!("adaptive model was not saved");
    }
    saved
}

/// Decay then nudge the score for `subject_id`, and persist the result.
pub fn record_interaction(
    store: &dyn KeyValueStore,
    now_ms: u64,
    subject_id: &str,
    response: &str,
) -> AdaptiveModel {
    let mut model = load_model(store);
    let score = model.apply(now_ms, subject_id, response);
    tracing::debug!(subject = subject_id, response, score, "adaptive score updated");
    save_model(store, &model);
    model
}

/// Recommended check-in cadence in minutes for `age`, never below 2.
pub fn adaptive_check_in_minutes(store: &dyn KeyValueStore, age: AgeGroup) -> u32 {
    load_model(store).check_in_minutes(age)
}

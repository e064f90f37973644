//! Weekly summary computed from the last session log.

use serde::Serialize;

use crate::services::{JsonStoreExt, KeyValueStore};
use crate::session::SessionLogEntry;
use crate::storage::StorageKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpCount {
    pub id: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyInsights {
    pub total_minutes: u64,
    pub avg_session_minutes: u64,
    pub sessions: u32,
    pub top_helps: Vec<HelpCount>,
}

/// Summarize `lastSessionLog`.
///
/// Only the most recent session is stored, so `sessions` is at most 1 and
/// the average equals the total. Duration is taken from the last entry.
pub fn compute_weekly_insights(store: &dyn KeyValueStore) -> WeeklyInsights {
    let log: Vec<SessionLogEntry> = store.get_json(StorageKey::LastSessionLog, Vec::new());
    let Some(last) = log.last() else {
        return WeeklyInsights::default();
    };

    // Nearest minute, halves rounding up.
    let total_minutes = (last.time + 30) / 60;
    let helps = log.iter().filter(|e| e.response == "help").count() as u32;
    let top_helps = if helps > 0 {
        vec![HelpCount {
            id: "help".to_string(),
            count: helps,
        }]
    } else {
        Vec::new()
    };

    WeeklyInsights {
        total_minutes,
        avg_session_minutes: total_minutes,
        sessions: 1,
        top_helps,
    }
}

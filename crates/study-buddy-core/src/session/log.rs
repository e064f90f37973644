use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::{JsonStoreExt, KeyValueStore};
use crate::storage::StorageKey;

/// One answered interaction prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    /// Seconds since session start.
    pub time: u64,
    /// Question kind id.
    pub question: String,
    /// Normalized response id.
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Lifetime counters kept across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTotals {
    pub total_focus_secs: u64,
    pub streak: u64,
}

fn read_u64(store: &dyn KeyValueStore, key: StorageKey) -> u64 {
    store
        .get_string(key.as_str())
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}

impl SessionTotals {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            total_focus_secs: read_u64(store, StorageKey::TotalFocusTime),
            streak: read_u64(store, StorageKey::CurrentStreak),
        }
    }

    /// Write totals, the session date and the log. Returns the keys whose
    /// write was rejected.
    pub fn persist(
        &self,
        store: &dyn KeyValueStore,
        ended_at: DateTime<Utc>,
        log: &[SessionLogEntry],
    ) -> Vec<StorageKey> {
        let mut failed = Vec::new();
        let writes = [
            (StorageKey::TotalFocusTime, self.total_focus_secs.to_string()),
            (StorageKey::CurrentStreak, self.streak.to_string()),
            (StorageKey::LastSessionDate, ended_at.to_rfc3339()),
        ];
        for (key, value) in writes {
            if !store.set_string(key.as_str(), &value) {
                failed.push(key);
            }
        }
        if !store.set_json(StorageKey::LastSessionLog, &log) {
            failed.push(StorageKey::LastSessionLog);
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;

    #[test]
    fn totals_roundtrip_through_store() {
        let store = MemoryStore::new();
        let totals = SessionTotals {
            total_focus_secs: 1_500,
            streak: 4,
        };
        let at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert!(totals.persist(&store, at, &[]).is_empty());
        assert_eq!(SessionTotals::load(&store), totals);
        assert_eq!(store.get_string("lastSessionLog").as_deref(), Some("[]"));
    }

    #[test]
    fn garbage_totals_read_as_zero() {
        let store = MemoryStore::new();
        store.set_string("currentStreak", "many");
        assert_eq!(SessionTotals::load(&store), SessionTotals::default());
    }

    #[test]
    fn rejected_writes_are_reported() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let failed = SessionTotals::default().persist(&store, Utc::now(), &[]);
        assert_eq!(failed.len(), 4);
    }
}

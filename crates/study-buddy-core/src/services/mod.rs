//! Collaborator contracts the engine consumes.
//!
//! The engine never talks to a platform directly. Storage, speech, the OS
//! notification service, error capture and analytics all sit behind the
//! traits here, and a [`Services`] bundle carries one of each.
//!
//! Every method takes `&self`; implementations that record or mutate use
//! interior mutability. The engine is single-threaded, so the bundle holds
//! `Rc`s rather than `Arc`s.

mod logging;
pub mod memory;

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, NotificationError};
use crate::storage::StorageKey;

pub use logging::{SilentSpeech, TracingAnalytics, TracingErrorReporter, TracingNotifier};

// ── Storage ─────────────────────────────────────────────────────────

/// Opaque string key-value persistence.
pub trait KeyValueStore {
    fn get_string(&self, key: &str) -> Option<String>;

    /// Returns `false` when the write did not happen.
    fn set_string(&self, key: &str, value: &str) -> bool;
}

/// Typed JSON helpers layered over any [`KeyValueStore`].
///
/// Reads never fail: a missing key, unparsable JSON or a value that does not
/// match the target type all yield `fallback`.
pub trait JsonStoreExt {
    fn get_json<T: DeserializeOwned>(&self, key: StorageKey, fallback: T) -> T;

    /// Like [`get_json`](JsonStoreExt::get_json), additionally rejecting
    /// values for which `valid` returns `false`.
    fn get_json_checked<T, F>(&self, key: StorageKey, fallback: T, valid: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> bool;

    fn set_json<T: Serialize>(&self, key: StorageKey, value: &T) -> bool;
}

impl<S: KeyValueStore + ?Sized> JsonStoreExt for S {
    fn get_json<T: DeserializeOwned>(&self, key: StorageKey, fallback: T) -> T {
        self.get_json_checked(key, fallback, |_| true)
    }

    fn get_json_checked<T, F>(&self, key: StorageKey, fallback: T, valid: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> bool,
    {
        let Some(raw) = self.get_string(key.as_str()) else {
            return fallback;
        };
        if raw.is_empty() {
            return fallback;
        }
        match serde_json::from_str::<T>(&raw) {
            Ok(value) if valid(&value) => value,
            Ok(_) => {
                tracing::warn!(key = %key, "stored value failed validation, using default");
                fallback
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "stored value is not valid JSON, using default");
                fallback
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: StorageKey, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.set_string(key.as_str(), &json),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to serialize value");
                false
            }
        }
    }
}

// ── Speech ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    #[serde(default)]
    pub voice_id: Option<String>,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 1.0,
            pitch: 1.0,
            voice_id: None,
        }
    }
}

/// Text-to-speech output.
pub trait Speech {
    fn speak(&self, text: &str, options: &SpeechOptions);
    fn stop(&self);
    fn is_speaking(&self) -> bool;
}

// ── Notifications ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTrigger {
    /// Delay from scheduling time.
    pub seconds: u64,
}

/// The host's local notification service.
pub trait NotificationScheduler {
    fn schedule(
        &self,
        content: &NotificationContent,
        trigger: NotificationTrigger,
    ) -> Result<NotificationId, NotificationError>;

    fn cancel(&self, id: &NotificationId) -> Result<(), NotificationError>;
}

// ── Error capture & analytics ───────────────────────────────────────

/// Where a reported error happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
}

impl ErrorContext {
    pub fn op(op: &'static str) -> Self {
        Self {
            op,
            ..Self::default()
        }
    }
}

/// Fire-and-forget error capture.
pub trait ErrorReporter {
    fn capture_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Fire-and-forget product analytics.
pub trait Analytics {
    fn track(&self, event: &str, props: serde_json::Value);
}

// ── Bundle ──────────────────────────────────────────────────────────

/// One of each collaborator, shared by the engine's components.
#[derive(Clone)]
pub struct Services {
    pub store: Rc<dyn KeyValueStore>,
    pub speech: Rc<dyn Speech>,
    pub notifier: Rc<dyn NotificationScheduler>,
    pub errors: Rc<dyn ErrorReporter>,
    pub analytics: Rc<dyn Analytics>,
}

impl Services {
    /// Wire a store to the tracing-backed collaborators and a silent
    /// speech sink.
    pub fn with_store(store: Rc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            speech: Rc::new(SilentSpeech::default()),
            notifier: Rc::new(TracingNotifier::default()),
            errors: Rc::new(TracingErrorReporter),
            analytics: Rc::new(TracingAnalytics),
        }
    }

    pub fn report(&self, error: CoreError, context: ErrorContext) {
        self.errors.capture_error(&error, &context);
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Counter {
        count: u32,
    }

    #[test]
    fn get_json_falls_back_on_missing_and_garbage() {
        let store = MemoryStore::new();
        let fallback = Counter { count: 7 };
        assert_eq!(
            store.get_json(StorageKey::TotalFocusTime, Counter { count: 7 }),
            fallback
        );

        store.set_string(StorageKey::TotalFocusTime.as_str(), "{not json");
        assert_eq!(
            store.get_json(StorageKey::TotalFocusTime, Counter { count: 7 }),
            fallback
        );

        store.set_string(StorageKey::TotalFocusTime.as_str(), r#"{"count":"three"}"#);
        assert_eq!(
            store.get_json(StorageKey::TotalFocusTime, Counter { count: 7 }),
            fallback
        );
    }

    #[test]
    fn get_json_checked_rejects_invalid_values() {
        let store = MemoryStore::new();
        assert!(store.set_json(StorageKey::CurrentStreak, &Counter { count: 99 }));
        let loaded = store.get_json_checked(StorageKey::CurrentStreak, Counter { count: 0 }, |c| {
            c.count < 10
        });
        assert_eq!(loaded, Counter { count: 0 });
    }

    #[test]
    fn set_json_roundtrips() {
        let store = MemoryStore::new();
        assert!(store.set_json(StorageKey::CurrentStreak, &Counter { count: 3 }));
        assert_eq!(
            store.get_json(StorageKey::CurrentStreak, Counter { count: 0 }),
            Counter { count: 3 }
        );
    }
}

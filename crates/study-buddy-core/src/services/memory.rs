//! In-memory collaborators.
//!
//! Used by tests and by hosts that do not need durable state. Each recorder
//! keeps everything it was handed so assertions can inspect it afterwards.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::{
    Analytics, ErrorContext, ErrorReporter, KeyValueStore, NotificationContent, NotificationId,
    NotificationScheduler, NotificationTrigger, Services, Speech, SpeechOptions,
};
use crate::error::{CoreError, NotificationError};

/// HashMap-backed [`KeyValueStore`] with switchable write failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `set_string` is rejected.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> bool {
        if self.fail_writes.get() {
            return false;
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }
}

#[derive(Debug, Default)]
pub struct RecordingSpeech {
    spoken: RefCell<Vec<(String, SpeechOptions)>>,
    stops: Cell<usize>,
}

impl RecordingSpeech {
    /// Texts in the order they were spoken.
    pub fn lines(&self) -> Vec<String> {
        self.spoken.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn last(&self) -> Option<(String, SpeechOptions)> {
        self.spoken.borrow().last().cloned()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.get()
    }
}

impl Speech for RecordingSpeech {
    fn speak(&self, text: &str, options: &SpeechOptions) {
        self.spoken
            .borrow_mut()
            .push((text.to_string(), options.clone()));
    }

    fn stop(&self) {
        self.stops.set(self.stops.get() + 1);
    }

    fn is_speaking(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub id: NotificationId,
    pub content: NotificationContent,
    pub trigger: NotificationTrigger,
}

/// Notification scheduler that hands out sequential ids.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    scheduled: RefCell<Vec<ScheduledNotification>>,
    cancelled: RefCell<Vec<NotificationId>>,
    next_id: Cell<u64>,
    fail_after: Cell<Option<usize>>,
}

impl RecordingNotifier {
    /// Reject every `schedule` call once `n` notifications were accepted.
    pub fn fail_after(&self, n: usize) {
        self.fail_after.set(Some(n));
    }

    pub fn scheduled(&self) -> Vec<ScheduledNotification> {
        self.scheduled.borrow().clone()
    }

    pub fn cancelled(&self) -> Vec<NotificationId> {
        self.cancelled.borrow().clone()
    }
}

impl NotificationScheduler for RecordingNotifier {
    fn schedule(
        &self,
        content: &NotificationContent,
        trigger: NotificationTrigger,
    ) -> Result<NotificationId, NotificationError> {
        if let Some(limit) = self.fail_after.get() {
            if self.scheduled.borrow().len() >= limit {
                return Err(NotificationError::ScheduleFailed(
                    "scheduler unavailable".to_string(),
                ));
            }
        }
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let id = NotificationId(format!("notif-{n}"));
        self.scheduled.borrow_mut().push(ScheduledNotification {
            id: id.clone(),
            content: content.clone(),
            trigger,
        });
        Ok(id)
    }

    fn cancel(&self, id: &NotificationId) -> Result<(), NotificationError> {
        self.cancelled.borrow_mut().push(id.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingReporter {
    captured: RefCell<Vec<(String, ErrorContext)>>,
}

impl RecordingReporter {
    /// Rendered error messages with their context.
    pub fn captured(&self) -> Vec<(String, ErrorContext)> {
        self.captured.borrow().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn capture_error(&self, error: &CoreError, context: &ErrorContext) {
        self.captured
            .borrow_mut()
            .push((error.to_string(), context.clone()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    events: RefCell<Vec<(String, serde_json::Value)>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.events.borrow().clone()
    }
}

impl Analytics for RecordingAnalytics {
    fn track(&self, event: &str, props: serde_json::Value) {
        self.events.borrow_mut().push((event.to_string(), props));
    }
}

/// Concrete handles to a full set of recording collaborators.
#[derive(Debug, Default, Clone)]
pub struct MemoryServices {
    pub store: Rc<MemoryStore>,
    pub speech: Rc<RecordingSpeech>,
    pub notifier: Rc<RecordingNotifier>,
    pub errors: Rc<RecordingReporter>,
    pub analytics: Rc<RecordingAnalytics>,
}

impl MemoryServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same collaborators as trait objects.
    pub fn services(&self) -> Services {
        Services {
            store: self.store.clone(),
            speech: self.speech.clone(),
            notifier: self.notifier.clone(),
            errors: self.errors.clone(),
            analytics: self.analytics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_rejects_writes_when_failing() {
        let store = MemoryStore::new();
        assert!(store.set_string("a", "1"));
        store.set_fail_writes(true);
        assert!(!store.set_string("a", "2"));
        assert_eq!(store.get_string("a").as_deref(), Some("1"));
    }

    #[test]
    fn recording_notifier_fails_after_limit() {
        let notifier = RecordingNotifier::default();
        notifier.fail_after(1);
        let content = NotificationContent {
            title: "t".into(),
            body: "b".into(),
            category: "c".into(),
        };
        let trigger = NotificationTrigger { seconds: 5 };
        assert_eq!(
            notifier.schedule(&content, trigger),
            Ok(NotificationId("notif-1".into()))
        );
        assert!(notifier.schedule(&content, trigger).is_err());
        assert_eq!(notifier.scheduled().len(), 1);
    }
}

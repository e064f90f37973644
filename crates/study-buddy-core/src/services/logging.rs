//! Collaborators that only log.

use std::cell::Cell;

use super::{
    Analytics, ErrorContext, ErrorReporter, NotificationContent, NotificationId,
    NotificationScheduler, NotificationTrigger, Speech, SpeechOptions,
};
use crate::error::{CoreError, NotificationError};

/// Sends captured errors to `tracing` at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn capture_error(&self, error: &CoreError, context: &ErrorContext) {
        tracing::warn!(
            op = context.op,
            subject = context.subject_id.as_deref().unwrap_or(""),
            age = context.age_group.as_deref().unwrap_or(""),
            error = %error,
            "captured error"
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn track(&self, event: &str, props: serde_json::Value) {
        tracing::debug!(target: "study_buddy::analytics", event, %props, "track");
    }
}

/// Accepts every notification, logs it and hands back a fresh uuid.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl NotificationScheduler for TracingNotifier {
    fn schedule(
        &self,
        content: &NotificationContent,
        trigger: NotificationTrigger,
    ) -> Result<NotificationId, NotificationError> {
        let id = NotificationId(uuid::Uuid::new_v4().to_string());
        tracing::info!(
            id = %id,
            in_secs = trigger.seconds,
            body = %content.body,
            "notification scheduled"
        );
        Ok(id)
    }

    fn cancel(&self, id: &NotificationId) -> Result<(), NotificationError> {
        tracing::info!(id = %id, "notification cancelled");
        Ok(())
    }
}

/// Speech sink for hosts without audio. Lines are logged at `debug`.
#[derive(Debug, Default)]
pub struct SilentSpeech {
    speaking: Cell<bool>,
}

impl Speech for SilentSpeech {
    fn speak(&self, text: &str, options: &SpeechOptions) {
        tracing::debug!(text, lang = %options.language, "speak");
        self.speaking.set(false);
    }

    fn stop(&self) {
        self.speaking.set(false);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.get()
    }
}

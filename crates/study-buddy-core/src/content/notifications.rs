//! Background check-in notification payloads.

use serde::Serialize;

use super::lines::{LineContext, LineSelector, PeerLineRequest};
use crate::catalog::AgeGroup;
use crate::services::{NotificationContent, NotificationTrigger};

pub const CHECK_IN_TITLE: &str = "Study Buddy";
/// Category the host maps to the RESUME/BREAK/DONE action buttons.
pub const CHECK_IN_CATEGORY: &str = "checkin-actions";
/// Earliest delay the host accepts.
pub const MIN_TRIGGER_SECS: u64 = 5;

const DEFAULT_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckInRequest {
    pub age_group: AgeGroup,
    pub subject_id: String,
    /// Seconds elapsed in the session when scheduling.
    pub session_time: u64,
    /// Check-in cadence in milliseconds.
    pub interval_ms: u64,
    /// Planned session length in seconds.
    pub session_length: u64,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedNotification {
    pub content: NotificationContent,
    pub trigger: NotificationTrigger,
}

/// Drop everything except ASCII word characters and whitespace.
pub fn sanitize_body(line: &str) -> String {
    line.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// The next three check-in notifications.
pub fn build_check_in_notifications(req: &CheckInRequest) -> Vec<PlannedNotification> {
    build_notifications(req, DEFAULT_COUNT)
}

/// The next `count` check-in notifications, with strictly increasing
/// trigger delays of at least [`MIN_TRIGGER_SECS`].
pub fn build_notifications(req: &CheckInRequest, count: usize) -> Vec<PlannedNotification> {
    let mut selector = LineSelector::new();
    let mut prev = 0u64;
    (1..=count as u64)
        .map(|i| {
            let offset = (req.interval_ms.saturating_mul(i) / 1000)
                .max(MIN_TRIGGER_SECS)
                .max(prev.saturating_add(1));
            prev = offset;
            let line = selector.generate(&PeerLineRequest {
                age_group: req.age_group,
                buddy_personality: None,
                subject_id: req.subject_id.clone(),
                seconds: req.session_time.saturating_add(offset),
                session_length: req.session_length,
                context: LineContext::BackgroundReturn,
                session_id: req.session_id.clone(),
            });
            PlannedNotification {
                content: NotificationContent {
                    title: CHECK_IN_TITLE.to_string(),
                    body: sanitize_body(&line),
                    category: CHECK_IN_CATEGORY.to_string(),
                },
                trigger: NotificationTrigger { seconds: offset },
            }
        })
        .collect()
}

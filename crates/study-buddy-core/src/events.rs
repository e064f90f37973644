use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{AgeGroup, Question};
use crate::session::{PauseReason, SessionState};

/// Every state change in a session produces an Event.
/// Hosts render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: String,
        subject_id: String,
        age_group: AgeGroup,
        session_length_secs: u64,
        check_in_minutes: u32,
        interaction_minutes: u32,
        /// Mystery Monday twist, when the session starts on a Monday.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mystery_monday: Option<String>,
        at: DateTime<Utc>,
    },
    /// Emitted by the 1 s clock.
    ElapsedUpdated {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// The adaptive model replaced the static check-in cadence.
    CheckInIntervalAdjusted {
        minutes: u32,
        at: DateTime<Utc>,
    },
    CheckIn {
        line: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SurpriseTriggered {
        surprise_id: String,
        message: String,
        emoji: String,
        at: DateTime<Utc>,
    },
    InteractionPrompted {
        question: Question,
        at: DateTime<Utc>,
    },
    /// A prompt response was accepted.
    Feedback {
        response: String,
        message: Option<String>,
        at: DateTime<Utc>,
    },
    HelpRequested {
        subject_id: String,
        at: DateTime<Utc>,
    },
    BuddyFaded {
        at: DateTime<Utc>,
    },
    SessionPaused {
        reason: PauseReason,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    BreakOver {
        at: DateTime<Utc>,
    },
    /// The host returned to the foreground mid-session.
    WelcomeBack {
        message: String,
        at: DateTime<Utc>,
    },
    CheckInsScheduled {
        count: usize,
        at: DateTime<Utc>,
    },
    CheckInsCancelled {
        count: usize,
        at: DateTime<Utc>,
    },
    SessionEnded {
        session_id: String,
        elapsed_secs: u64,
        total_focus_secs: u64,
        streak: u64,
        tokens_awarded: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        session_id: Option<String>,
        subject_id: Option<String>,
        elapsed_secs: u64,
        check_in_minutes: u32,
        prompt_pending: bool,
        buddy_faded: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Event name as it appears in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "SessionStarted",
            Event::ElapsedUpdated { .. } => "ElapsedUpdated",
            Event::CheckInIntervalAdjusted { .. } => "CheckInIntervalAdjusted",
            Event::CheckIn { .. } => "CheckIn",
            Event::SurpriseTriggered { .. } => "SurpriseTriggered",
            Event::InteractionPrompted { .. } => "InteractionPrompted",
            Event::Feedback { .. } => "Feedback",
            Event::HelpRequested { .. } => "HelpRequested",
            Event::BuddyFaded { .. } => "BuddyFaded",
            Event::SessionPaused { .. } => "SessionPaused",
            Event::SessionResumed { .. } => "SessionResumed",
            Event::BreakOver { .. } => "BreakOver",
            Event::WelcomeBack { .. } => "WelcomeBack",
            Event::CheckInsScheduled { .. } => "CheckInsScheduled",
            Event::CheckInsCancelled { .. } => "CheckInsCancelled",
            Event::SessionEnded { .. } => "SessionEnded",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}

//! Study session orchestration.
//!
//! [`SessionOrchestrator`] is a tick-driven state machine over a virtual-time
//! [`Scheduler`](crate::scheduler::Scheduler). It owns every timer of a
//! session, speaks check-ins and prompts through the [`Services`] bundle, and
//! reports what happened as [`Event`](crate::events::Event)s.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Studying -> (Paused | Ended)
//! Paused -> (Studying | Ended)
//! Ended -> Studying   (a new start)
//! ```
//!
//! [`Services`]: crate::services::Services

mod log;
mod orchestrator;
mod timers;

pub use log::{SessionLogEntry, SessionTotals};
pub use orchestrator::SessionOrchestrator;
pub use timers::{SessionTimers, TimerRole};

use serde::{Deserialize, Serialize};

use crate::scheduler::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Studying,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    User,
    /// An interaction prompt went unanswered.
    PromptTimeout,
    Break,
}

/// What to study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub subject_id: String,
    /// Overrides the configured and age-default session length.
    #[serde(default)]
    pub session_minutes: Option<u32>,
}

impl SessionPlan {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            session_minutes: None,
        }
    }
}

/// Timing and content knobs that do not depend on the age profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub buddy_fade_delay_ms: u64,
    /// How long a check-in keeps the buddy visible.
    pub check_in_display_ms: u64,
    pub prompt_timeout_ms: u64,
    pub session_minutes: Option<u32>,
    pub surprise_frequency: f64,
    pub surprise_multiplier: f64,
    pub notifications_enabled: bool,
    pub notification_count: usize,
    pub buddy_personality: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            buddy_fade_delay_ms: 60_000,
            check_in_display_ms: 5_000,
            prompt_timeout_ms: 30_000,
            session_minutes: None,
            surprise_frequency: crate::catalog::DEFAULT_SURPRISE_FREQUENCY,
            surprise_multiplier: 1.0,
            notifications_enabled: true,
            notification_count: 3,
            buddy_personality: None,
        }
    }
}

impl SessionSettings {
    /// Chance that a check-in becomes a surprise.
    pub fn surprise_probability(&self) -> f64 {
        (self.surprise_frequency * self.surprise_multiplier).clamp(0.0, 1.0)
    }
}

/// Host input, as sent over the driver's command channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    Start(SessionPlan),
    Pause,
    Resume,
    End,
    Respond { value: String },
    TakeBreak,
    AppState { state: AppState },
    Snapshot,
}

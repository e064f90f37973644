//! # Study Buddy Core Library
//!
//! This library provides the session engine behind Study Buddy, a study
//! companion for children. It follows a CLI-first philosophy: every
//! operation is available through the standalone `study-buddy` binary, and
//! a mobile or desktop host is a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Session Orchestrator**: A tick-driven state machine that owns a
//!   session's timers (elapsed clock, check-ins, interaction prompts, buddy
//!   fade) and reacts to the host going to the background and back
//! - **Scheduler**: Virtual-time timer registry with lifecycle-aware pausing
//! - **Adaptive Model**: Per-subject ease scores that tune the check-in cadence
//! - **Content**: Seeded, repeat-avoiding encouragement lines and background
//!   notification payloads
//! - **Storage**: SQLite key-value persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionOrchestrator`]: Core session state machine
//! - [`LineSelector`]: Peer-line picker
//! - [`Database`]: Key-value persistence
//! - [`Config`]: Application configuration management
//! - [`Services`]: Collaborators the engine talks to (storage, speech,
//!   notifications, error reporting, analytics)

pub mod adaptive;
pub mod catalog;
pub mod clock;
pub mod content;
pub mod driver;
pub mod error;
pub mod events;
pub mod insights;
pub mod rewards;
pub mod scheduler;
pub mod services;
pub mod session;
pub mod storage;

pub use adaptive::{adaptive_check_in_minutes, record_interaction, AdaptiveModel};
pub use catalog::{AgeGroup, AgeProfile, Subject};
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use content::{build_check_in_notifications, seeded_rand, LineSelector, PeerLineRequest};
pub use error::{ConfigError, CoreError, DatabaseError, NotificationError};
pub use events::Event;
pub use insights::{compute_weekly_insights, WeeklyInsights};
pub use rewards::{RewardError, RewardLedger};
pub use scheduler::{AppState, Scheduler, TimerHandle};
pub use services::{KeyValueStore, Services};
pub use session::{SessionCommand, SessionOrchestrator, SessionPlan, SessionSettings, SessionState};
pub use storage::{Config, Database, StorageKey};

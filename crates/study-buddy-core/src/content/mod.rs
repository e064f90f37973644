//! Deterministic-but-varied buddy content.
//!
//! Everything here is a pure function of its inputs plus, for the line
//! selector, the per-run [`PhaseLineCache`].

mod lines;
mod notifications;
mod seeded;

pub use lines::{LineContext, LineSelector, PeerLineRequest, Phase, PhaseLineCache, HINT_SEPARATOR};
pub use notifications::{
    build_check_in_notifications, build_notifications, sanitize_body, CheckInRequest,
    PlannedNotification, CHECK_IN_CATEGORY, CHECK_IN_TITLE, MIN_TRIGGER_SECS,
};
pub use seeded::seeded_rand;

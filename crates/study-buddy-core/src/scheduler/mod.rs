//! Virtual-time timer registry.
//!
//! Holds interval and one-shot deadlines without running anything itself.
//! The owner asks [`Scheduler::pop_due`] which handle is due at "now" and
//! reacts to it; nothing fires between calls.
//!
//! ## Lifecycle
//!
//! Intervals registered with `pause_on_background` are dropped as soon as
//! the host reports [`AppState::Inactive`] or [`AppState::Background`];
//! the owner re-registers them on return.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Host application lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    #[default]
    Active,
    Inactive,
    Background,
}

impl AppState {
    pub fn is_away(&self) -> bool {
        matches!(self, AppState::Inactive | AppState::Background)
    }
}

impl std::str::FromStr for AppState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "foreground" => Ok(AppState::Active),
            "inactive" => Ok(AppState::Inactive),
            "background" => Ok(AppState::Background),
            other => Err(format!("unknown app state: {other}")),
        }
    }
}

/// Opaque id of a registered timer. Never reused by the same scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerOptions {
    pub pause_on_background: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Interval { period_ms: u64 },
    Timeout,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    kind: TimerKind,
    deadline_ms: u64,
    options: TimerOptions,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    timers: BTreeMap<TimerHandle, Entry>,
    next_id: u64,
    app_state: AppState,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, entry: Entry) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.timers.insert(handle, entry);
        handle
    }

    /// Fire every `period_ms` starting one period after `now_ms`.
    pub fn set_interval(&mut self, now_ms: u64, period_ms: u64, options: TimerOptions) -> TimerHandle {
        let period_ms = period_ms.max(1);
        self.insert(Entry {
            kind: TimerKind::Interval { period_ms },
            deadline_ms: now_ms.saturating_add(period_ms),
            options,
        })
    }

    /// Fire once, `delay_ms` after `now_ms`.
    pub fn set_timeout(&mut self, now_ms: u64, delay_ms: u64) -> TimerHandle {
        self.insert(Entry {
            kind: TimerKind::Timeout,
            deadline_ms: now_ms.saturating_add(delay_ms),
            options: TimerOptions::default(),
        })
    }

    /// Cancel `handle`. Unknown or already-cleared handles are ignored.
    pub fn clear(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    pub fn clear_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn app_state(&self) -> AppState {
        self.app_state
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.values().map(|e| e.deadline_ms).min()
    }

    /// Record a lifecycle change. Returns the intervals cancelled because the
    /// host went away.
    pub fn on_app_state_change(&mut self, next: AppState) -> Vec<TimerHandle> {
        let mut cancelled = Vec::new();
        if next.is_away() {
            self.timers.retain(|handle, entry| {
                let pausable = entry.options.pause_on_background
                    && matches!(entry.kind, TimerKind::Interval { .. });
                if pausable {
                    cancelled.push(*handle);
                }
                !pausable
            });
        }
        if !cancelled.is_empty() {
            tracing::debug!(count = cancelled.len(), state = ?next, "paused background intervals");
        }
        self.app_state = next;
        cancelled
    }

    /// Take the next timer due at `now_ms`, earliest deadline first, ties by
    /// registration order.
    ///
    /// Timeouts are removed. An interval that missed several periods fires
    /// once and moves to its next deadline after `now_ms` on the original
    /// phase.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<TimerHandle> {
        let (handle, entry) = self
            .timers
            .iter()
            .filter(|(_, e)| e.deadline_ms <= now_ms)
            .min_by_key(|(h, e)| (e.deadline_ms, **h))
            .map(|(h, e)| (*h, *e))?;

        match entry.kind {
            TimerKind::Timeout => {
                self.timers.remove(&handle);
            }
            TimerKind::Interval { period_ms } => {
                let missed = (now_ms - entry.deadline_ms) / period_ms;
                if let Some(e) = self.timers.get_mut(&handle) {
                    e.deadline_ms = entry
                        .deadline_ms
                        .saturating_add((missed + 1).saturating_mul(period_ms));
                }
            }
        }
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_fires_once() {
        let mut s = Scheduler::new();
        let h = s.set_timeout(0, 100);
        assert_eq!(s.pop_due(99), None);
        assert_eq!(s.pop_due(100), Some(h));
        assert_eq!(s.pop_due(1_000), None);
        assert!(!s.is_armed(h));
    }

    #[test]
    fn interval_keeps_phase_after_missed_periods() {
        let mut s = Scheduler::new();
        let h = s.set_interval(0, 1_000, TimerOptions::default());
        assert_eq!(s.pop_due(3_500), Some(h));
        assert_eq!(s.pop_due(3_500), None);
        assert_eq!(s.next_deadline(), Some(4_000));
        assert_eq!(s.pop_due(4_000), Some(h));
    }

    #[test]
    fn due_timers_come_out_in_deadline_order() {
        let mut s = Scheduler::new();
        let late = s.set_timeout(0, 500);
        let early = s.set_timeout(0, 200);
        let tie = s.set_timeout(0, 500);
        assert_eq!(s.pop_due(600), Some(early));
        assert_eq!(s.pop_due(600), Some(late));
        assert_eq!(s.pop_due(600), Some(tie));
        assert_eq!(s.pop_due(600), None);
    }

    #[test]
    fn background_cancels_only_opted_in_intervals() {
        let mut s = Scheduler::new();
        let clock = s.set_interval(0, 1_000, TimerOptions::default());
        let check_in = s.set_interval(
            0,
            60_000,
            TimerOptions {
                pause_on_background: true,
            },
        );
        let fade = s.set_timeout(0, 5_000);

        assert!(s.on_app_state_change(AppState::Active).is_empty());
        assert_eq!(s.on_app_state_change(AppState::Background), vec![check_in]);
        assert!(s.is_armed(clock));
        assert!(s.is_armed(fade));
        assert!(!s.is_armed(check_in));
        assert_eq!(s.app_state(), AppState::Background);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut s = Scheduler::new();
        let h = s.set_timeout(0, 10);
        assert!(s.clear(h));
        assert!(!s.clear(h));
        s.clear_all();
        assert!(s.is_empty());
    }

    #[test]
    fn handles_are_not_reused() {
        let mut s = Scheduler::new();
        let a = s.set_timeout(0, 10);
        s.clear(a);
        let b = s.set_timeout(0, 10);
        assert_ne!(a, b);
    }
}

//! Peer-style encouragement lines.
//!
//! A line is chosen from a small phase-specific pool (early, mid or late in
//! the session) through a seeded shuffle-bag, so a session walks through every
//! template before repeating and never says the same thing twice in a row.
//! Roughly 40% of lines get a subject hint appended.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::seeded::seeded_rand;
use crate::catalog::{subject_or_other, AgeGroup, Subject};

/// Joins a line and its hint.
pub const HINT_SEPARATOR: &str = " • ";

const RECENCY_MAX: usize = 3;
const HINT_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Early,
    Mid,
    Late,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Early => "early",
            Phase::Mid => "mid",
            Phase::Late => "late",
        }
    }

    /// Phase for `seconds` into a session of `session_length` seconds.
    ///
    /// Cut points are jittered by up to ±0.05 per session id.
    pub fn at(seconds: u64, session_length: u64, session_id: &str) -> Phase {
        let ratio = (seconds as f64 / session_length.max(1) as f64).clamp(0.0, 1.0);
        let jitter = (seeded_rand(&format!("{session_id}:jitter")) - 0.5) * 0.1;
        let early_cut = (0.33 + jitter).clamp(0.20, 0.40);
        let late_cut = (0.66 + jitter).clamp(0.60, 0.80);
        if ratio > late_cut {
            Phase::Late
        } else if ratio > early_cut {
            Phase::Mid
        } else {
            Phase::Early
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineContext {
    /// Regular in-session check-in.
    #[default]
    Tick,
    /// Text for a notification that invites the child back into the app.
    BackgroundReturn,
}

/// Everything a line depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerLineRequest {
    pub age_group: AgeGroup,
    #[serde(default)]
    pub buddy_personality: Option<String>,
    pub subject_id: String,
    /// Seconds since session start.
    pub seconds: u64,
    /// Planned session length in seconds.
    pub session_length: u64,
    #[serde(default)]
    pub context: LineContext,
    pub session_id: String,
}

fn templates(subject: &Subject, phase: Phase, simple: bool) -> [String; 3] {
    let (e, l) = (subject.emoji, subject.label);
    match (phase, simple) {
        (Phase::Early, true) => [
            format!("{e} Great start!"),
            format!("Nice focus on {l}!"),
            format!("Let's go! {l} time!"),
        ],
        (Phase::Mid, true) => [
            format!("Halfway vibes! {e}"),
            "Good rhythm. Keep going!".to_string(),
            format!("Nice work—stay with {l}!"),
        ],
        (Phase::Late, true) => [
            "Almost there!".to_string(),
            "Push to the finish!".to_string(),
            format!("Final stretch on {l}!"),
        ],
        (Phase::Early, false) => [
            format!("{e} Settling in. Keep a steady pace."),
            format!("Strong start on {l}. Stay consistent."),
            format!("Dial in. Small steps on {l}."),
        ],
        (Phase::Mid, false) => [
            "You're in the zone. Maintain pace.".to_string(),
            "Progress is stacking. Stay on task.".to_string(),
            format!("Solid momentum on {l}."),
        ],
        (Phase::Late, false) => [
            "Close it out with quality.".to_string(),
            "Finish strong—focus on the next small chunk.".to_string(),
            "Wrap-up time: check your last step.".to_string(),
        ],
    }
}

#[derive(Debug, Clone, Default)]
struct PhaseBag {
    queue: VecDeque<String>,
    recent: VecDeque<String>,
}

impl PhaseBag {
    fn refill(&mut self, cache_key: &str, pool: &[String]) {
        let mut keyed: Vec<(f64, &String)> = pool
            .iter()
            .map(|line| (seeded_rand(&format!("{cache_key}:{line}")), line))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.queue = keyed.into_iter().map(|(_, line)| line.clone()).collect();
    }

    fn next(&mut self, cache_key: &str, pool: &[String]) -> String {
        if self.queue.is_empty() {
            self.refill(cache_key, pool);
        }
        let Some(mut candidate) = self.queue.pop_front() else {
            return String::new();
        };

        let mut attempts = pool.len();
        while attempts > 0 && self.recent.contains(&candidate) && !self.queue.is_empty() {
            self.queue.push_back(candidate);
            candidate = self.queue.pop_front().unwrap_or_default();
            attempts -= 1;
        }
        if self.recent.back() == Some(&candidate) && !self.queue.is_empty() {
            self.queue.push_back(candidate);
            candidate = self.queue.pop_front().unwrap_or_default();
        }

        self.recent.retain(|l| l != &candidate);
        self.recent.push_back(candidate.clone());
        while self.recent.len() > RECENCY_MAX {
            self.recent.pop_front();
        }
        candidate
    }
}

/// Shuffle-bag state keyed by `(session id, subject id, phase)`.
#[derive(Debug, Clone, Default)]
pub struct PhaseLineCache {
    bags: HashMap<String, PhaseBag>,
}

impl PhaseLineCache {
    pub fn len(&self) -> usize {
        self.bags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }

    /// Lines recently emitted for `cache_key`, oldest first.
    pub fn recent(&self, cache_key: &str) -> Vec<String> {
        self.bags
            .get(cache_key)
            .map(|b| b.recent.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.bags.clear();
    }
}

/// Picks peer lines. Holds the cache for the lifetime of the app run.
#[derive(Debug, Clone, Default)]
pub struct LineSelector {
    cache: PhaseLineCache,
}

impl LineSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &PhaseLineCache {
        &self.cache
    }

    pub fn cache_key(session_id: &str, subject_id: &str, phase: Phase) -> String {
        format!("{session_id}:{subject_id}:{}", phase.as_str())
    }

    pub fn generate(&mut self, req: &PeerLineRequest) -> String {
        let subject = subject_or_other(&req.subject_id);
        let hint = Self::hint(req, subject);

        if req.context == LineContext::BackgroundReturn {
            return format!("{} Ready to jump back in?{hint}", subject.emoji);
        }

        let phase = Phase::at(req.seconds, req.session_length, &req.session_id);
        let pool = templates(subject, phase, req.age_group.profile().simple_tone());
        let cache_key = Self::cache_key(&req.session_id, subject.id, phase);
        let line = self
            .cache
            .bags
            .entry(cache_key.clone())
            .or_default()
            .next(&cache_key, &pool);
        tracing::debug!(key = %cache_key, line = %line, "picked peer line");
        format!("{line}{hint}")
    }

    fn hint(req: &PeerLineRequest, subject: &Subject) -> String {
        let h = seeded_rand(&format!(
            "{}:{}:{}:hint",
            req.session_id, req.seconds, req.subject_id
        ));
        if h <= HINT_THRESHOLD || subject.hints.is_empty() {
            return String::new();
        }
        let idx = ((h * subject.hints.len() as f64) as usize).min(subject.hints.len() - 1);
        format!("{HINT_SEPARATOR}{}", subject.hints[idx])
    }
}

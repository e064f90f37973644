//! Session timer orchestrator.
//!
//! Operates on the injected [`Clock`]; no internal thread. The caller is
//! responsible for calling [`SessionOrchestrator::tick`] periodically, at
//! least once a second for a smooth elapsed counter.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = SessionOrchestrator::new(services, clock, AgeGroup::Tween, settings);
//! session.start(SessionPlan::new("math"));
//! // In a loop:
//! for event in session.tick() { render(event) }
//! ```

use std::rc::Rc;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde_json::json;

use super::log::{SessionLogEntry, SessionTotals};
use super::timers::{SessionTimers, TimerRole};
use super::{PauseReason, SessionCommand, SessionPlan, SessionSettings, SessionState};
use crate::adaptive;
use crate::catalog::{
    encouragement_for, mystery_monday_change, question, subject_or_other, subjects_for_age,
    token_award, AgeGroup, AgeProfile, Question, QuestionKind, SURPRISE_EVENTS,
};
use crate::clock::Clock;
use crate::content::{
    build_notifications, sanitize_body, CheckInRequest, LineContext, LineSelector,
    PeerLineRequest,
};
use crate::error::CoreError;
use crate::events::Event;
use crate::rewards::RewardLedger;
use crate::scheduler::{AppState, Scheduler, TimerOptions};
use crate::services::{ErrorContext, NotificationId, Services, SpeechOptions};
use crate::storage::StorageKey;

const CLOCK_PERIOD_MS: u64 = 1_000;
const SALT_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SALT_LEN: usize = 8;

const NOTIF_ACTION_RESUME: &str = "RESUME";
const NOTIF_ACTION_BREAK: &str = "BREAK";
const NOTIF_ACTION_DONE: &str = "DONE";

/// Per-session state. Replaced wholesale by every `start`.
#[derive(Debug, Clone)]
struct ActiveSession {
    id: String,
    subject_id: String,
    start_ms: u64,
    elapsed_secs: u64,
    /// Part of `elapsed_secs` already added to the lifetime total.
    credited_secs: u64,
    session_length_secs: u64,
    check_in_ms: u64,
    adaptive_pending: bool,
    log: Vec<SessionLogEntry>,
    pending_prompt: Option<Question>,
    buddy_faded: bool,
}

pub struct SessionOrchestrator {
    services: Services,
    clock: Rc<dyn Clock>,
    rng: Pcg32,
    age: AgeGroup,
    settings: SessionSettings,
    scheduler: Scheduler,
    timers: SessionTimers,
    lines: LineSelector,
    state: SessionState,
    app_state: AppState,
    session: Option<ActiveSession>,
    last_subject: Option<String>,
    totals: SessionTotals,
    scheduled_notifications: Vec<NotificationId>,
}

impl SessionOrchestrator {
    /// Create an idle orchestrator. Lifetime totals are read from the store.
    pub fn new(
        services: Services,
        clock: Rc<dyn Clock>,
        age: AgeGroup,
        settings: SessionSettings,
    ) -> Self {
        let totals = SessionTotals::load(services.store.as_ref());
        Self {
            services,
            clock,
            rng: Pcg32::from_entropy(),
            age,
            settings,
            scheduler: Scheduler::new(),
            timers: SessionTimers::default(),
            lines: LineSelector::new(),
            state: SessionState::Idle,
            app_state: AppState::Active,
            session: None,
            last_subject: None,
            totals,
            scheduled_notifications: Vec::new(),
        }
    }

    /// Replace the random source, e.g. with a fixed seed.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn age_group(&self) -> AgeGroup {
        self.age
    }

    pub fn profile(&self) -> &'static AgeProfile {
        self.age.profile()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn app_state(&self) -> AppState {
        self.app_state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.subject_id.as_str())
    }

    /// Seconds studied in the current session, as of the last clock fire
    /// or pause.
    pub fn elapsed_secs(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.elapsed_secs)
    }

    /// Active check-in cadence in milliseconds.
    pub fn check_in_interval_ms(&self) -> u64 {
        self.session
            .as_ref()
            .map_or(self.profile().check_in_minutes as u64 * 60_000, |s| {
                s.check_in_ms
            })
    }

    pub fn pending_prompt(&self) -> Option<&Question> {
        self.session.as_ref().and_then(|s| s.pending_prompt.as_ref())
    }

    pub fn buddy_faded(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.buddy_faded)
    }

    pub fn log(&self) -> &[SessionLogEntry] {
        self.session
            .as_ref()
            .map(|s| s.log.as_slice())
            .unwrap_or_default()
    }

    pub fn totals(&self) -> SessionTotals {
        self.totals
    }

    pub fn timers(&self) -> &SessionTimers {
        &self.timers
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Notification ids this orchestrator scheduled and has not cancelled.
    pub fn scheduled_notifications(&self) -> &[NotificationId] {
        &self.scheduled_notifications
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            session_id: self.session_id().map(str::to_string),
            subject_id: self.subject_id().map(str::to_string),
            elapsed_secs: self.current_elapsed(),
            check_in_minutes: (self.check_in_interval_ms() / 60_000) as u32,
            prompt_pending: self.pending_prompt().is_some(),
            buddy_faded: self.buddy_faded(),
            at: self.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Dispatch a host command.
    pub fn apply(&mut self, command: SessionCommand) -> Vec<Event> {
        match command {
            SessionCommand::Start(plan) => self.start(plan).into_iter().collect(),
            SessionCommand::Pause => self.pause().into_iter().collect(),
            SessionCommand::Resume => {
                let before = self.scheduled_notifications.len();
                let mut events: Vec<Event> = self.resume().into_iter().collect();
                let count = self.scheduled_notifications.len();
                if count > before {
                    events.push(Event::CheckInsScheduled {
                        count,
                        at: self.now(),
                    });
                }
                events
            }
            SessionCommand::End => self.end().into_iter().collect(),
            SessionCommand::Respond { value } => self.respond(&value).into_iter().collect(),
            SessionCommand::TakeBreak => self.take_break().into_iter().collect(),
            SessionCommand::AppState { state } => self.set_app_state(state),
            SessionCommand::Snapshot => vec![self.snapshot()],
        }
    }

    /// Begin a fresh session, discarding any previous one.
    pub fn start(&mut self, plan: SessionPlan) -> Option<Event> {
        self.timers.clear_all(&mut self.scheduler);

        let now = self.clock.now_ms();
        let profile = self.profile();
        let subject = subject_or_other(&plan.subject_id);
        let minutes = plan
            .session_minutes
            .or(self.settings.session_minutes)
            .unwrap_or(profile.session_minutes);
        let salt = self.salt();
        let mystery = mystery_monday_change(self.now().date_naive());
        let session = ActiveSession {
            id: format!("{now}:{salt}"),
            subject_id: plan.subject_id.clone(),
            start_ms: now,
            elapsed_secs: 0,
            credited_secs: 0,
            session_length_secs: minutes as u64 * 60,
            check_in_ms: profile.check_in_minutes as u64 * 60_000,
            adaptive_pending: true,
            log: Vec::new(),
            pending_prompt: None,
            buddy_faded: false,
        };
        let event = Event::SessionStarted {
            session_id: session.id.clone(),
            subject_id: session.subject_id.clone(),
            age_group: self.age,
            session_length_secs: session.session_length_secs,
            check_in_minutes: profile.check_in_minutes,
            interaction_minutes: profile.interaction_minutes,
            mystery_monday: mystery.map(str::to_string),
            at: self.now(),
        };

        self.last_subject = Some(plan.subject_id.clone());
        self.session = Some(session);
        self.state = SessionState::Studying;
        self.arm_session_timers(now);

        self.speak(&format!(
            "Let's work on {}! {}",
            subject.label,
            profile.start_message()
        ));
        self.services.analytics.track(
            "session_start",
            json!({ "subjectId": plan.subject_id, "ageGroup": self.age.as_str() }),
        );
        if let Some(change) = mystery {
            tracing::info!(change, "mystery monday");
        }
        tracing::info!(subject = %plan.subject_id, age = %self.age, minutes, "session started");
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != SessionState::Studying {
            return None;
        }
        Some(self.pause_with(PauseReason::User))
    }

    /// Continue a paused session. While the host is away the cadences stay
    /// down and background check-ins are scheduled instead.
    pub fn resume(&mut self) -> Option<Event> {
        if self.state != SessionState::Paused {
            return None;
        }
        let now = self.clock.now_ms();
        let session = self.session.as_mut()?;
        session.start_ms = now.saturating_sub(session.elapsed_secs.saturating_mul(1000));
        let elapsed_secs = session.elapsed_secs;

        self.timers.clear_all(&mut self.scheduler);
        self.state = SessionState::Studying;
        self.arm_session_timers(now);
        if self.app_state.is_away()
            && self.settings.notifications_enabled
            && self.scheduled_notifications.is_empty()
        {
            self.schedule_background_check_ins();
        }
        tracing::info!(elapsed_secs, away = self.app_state.is_away(), "session resumed");
        Some(Event::SessionResumed {
            elapsed_secs,
            at: self.now(),
        })
    }

    /// Pause, save the focus time so far and arm the break-over timer for
    /// the age's break length.
    pub fn take_break(&mut self) -> Option<Event> {
        if self.state != SessionState::Studying {
            return None;
        }
        let event = self.pause_with(PauseReason::Break);
        self.checkpoint_focus(self.now());
        let now = self.clock.now_ms();
        let break_ms = self.profile().break_minutes as u64 * 60_000;
        let handle = self.scheduler.set_timeout(now, break_ms);
        self.timers
            .replace(&mut self.scheduler, TimerRole::BreakOver, handle);
        Some(event)
    }

    /// Finish the session: persist totals and log, award tokens.
    pub fn end(&mut self) -> Option<Event> {
        if !matches!(self.state, SessionState::Studying | SessionState::Paused) {
            return None;
        }
        let elapsed_secs = self.current_elapsed();
        self.timers.clear_all(&mut self.scheduler);
        self.scheduler.clear_all();
        self.cancel_scheduled_notifications();
        self.state = SessionState::Ended;

        let session = self.session.as_mut()?;
        session.elapsed_secs = elapsed_secs;
        session.pending_prompt = None;
        let session_id = session.id.clone();
        let subject_id = session.subject_id.clone();

        self.totals.streak += 1;
        let ended_at = self.now();
        self.checkpoint_focus(ended_at);

        let tokens = token_award(elapsed_secs / 60);
        if tokens > 0 {
            let ledger = RewardLedger::new(self.services.store.clone(), self.clock.clone());
            if let Err(e) = ledger.add_tokens(tokens as u64, "Study session") {
                self.report(CoreError::Custom(e.to_string()), "add_tokens");
            }
        }

        self.speak(self.profile().completion_message());
        self.services.analytics.track(
            "session_end",
            json!({
                "duration": elapsed_secs,
                "ageGroup": self.age.as_str(),
                "subjectId": subject_id,
            }),
        );
        tracing::info!(elapsed_secs, tokens, streak = self.totals.streak, "session ended");
        Some(Event::SessionEnded {
            session_id,
            elapsed_secs,
            total_focus_secs: self.totals.total_focus_secs,
            streak: self.totals.streak,
            tokens_awarded: tokens,
            at: ended_at,
        })
    }

    /// Answer the pending interaction prompt. Ignored when none is pending.
    pub fn respond(&mut self, value: &str) -> Option<Event> {
        if !matches!(self.state, SessionState::Studying | SessionState::Paused) {
            return None;
        }
        let elapsed = self.current_elapsed();
        let timestamp = self.now();
        let session = self.session.as_mut()?;
        let prompt = session.pending_prompt.take()?;
        session.log.push(SessionLogEntry {
            time: elapsed,
            question: prompt.kind.as_str().to_string(),
            response: value.to_string(),
            timestamp,
        });
        let subject_id = session.subject_id.clone();
        self.timers
            .cancel(&mut self.scheduler, TimerRole::PromptTimeout);

        adaptive::record_interaction(
            self.services.store.as_ref(),
            self.clock.now_ms(),
            &subject_id,
            value,
        );

        if value == "help" {
            self.services
                .analytics
                .track("help_requested", json!({ "subjectId": subject_id }));
            tracing::info!(subject = %subject_id, "help requested");
            return Some(Event::HelpRequested {
                subject_id,
                at: timestamp,
            });
        }

        let message = encouragement_for(value);
        if let Some(text) = message {
            self.speak(text);
        }
        Some(Event::Feedback {
            response: value.to_string(),
            message: message.map(str::to_string),
            at: timestamp,
        })
    }

    /// Record a host lifecycle change.
    ///
    /// Going away schedules background check-in notifications; coming back
    /// cancels them, re-arms the paused cadences and applies any pending
    /// notification action.
    pub fn set_app_state(&mut self, next: AppState) -> Vec<Event> {
        let mut events = Vec::new();
        let prev = self.app_state;
        self.app_state = next;

        for handle in self.scheduler.on_app_state_change(next) {
            self.timers.forget(handle);
        }

        if prev.is_away() && next == AppState::Active {
            if !self.scheduled_notifications.is_empty() {
                let count = self.cancel_scheduled_notifications();
                events.push(Event::CheckInsCancelled {
                    count,
                    at: self.now(),
                });
            }
            if self.state == SessionState::Studying {
                self.arm_cadences(self.clock.now_ms());
                let message = self.profile().welcome_back_message();
                self.speak(message);
                events.push(Event::WelcomeBack {
                    message: message.to_string(),
                    at: self.now(),
                });
            }
            events.extend(self.apply_notification_action());
        } else if next.is_away()
            && !prev.is_away()
            && self.state == SessionState::Studying
            && self.settings.notifications_enabled
            && self.scheduled_notifications.is_empty()
        {
            let count = self.schedule_background_check_ins();
            if count > 0 {
                events.push(Event::CheckInsScheduled {
                    count,
                    at: self.now(),
                });
            }
        }
        events
    }

    /// Fire every timer due now. Returns the resulting events in order.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        let now = self.clock.now_ms();

        if self.state == SessionState::Studying {
            if let Some(event) = self.resolve_adaptive_interval(now) {
                events.push(event);
            }
        }

        while let Some(handle) = self.scheduler.pop_due(now) {
            let Some(role) = self.timers.role_of(handle) else {
                continue;
            };
            if !matches!(role, TimerRole::Clock | TimerRole::CheckIn | TimerRole::Interaction) {
                self.timers.forget(handle);
            }
            tracing::debug!(?role, now, "timer fired");
            if let Some(event) = self.fire(role, now) {
                events.push(event);
            }
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn salt(&mut self) -> String {
        (0..SALT_LEN)
            .map(|_| SALT_ALPHABET[self.rng.gen_range(0..SALT_ALPHABET.len())] as char)
            .collect()
    }

    fn voice(&self) -> SpeechOptions {
        let voice = self.profile().voice;
        SpeechOptions {
            language: voice.language.to_string(),
            rate: voice.rate,
            pitch: voice.pitch,
            voice_id: None,
        }
    }

    fn speak(&self, text: &str) {
        self.services.speech.speak(text, &self.voice());
    }

    fn context(&self, op: &'static str) -> ErrorContext {
        ErrorContext {
            op,
            subject_id: self.subject_id().map(str::to_string),
            age_group: Some(self.age.as_str().to_string()),
        }
    }

    fn report(&self, error: CoreError, op: &'static str) {
        self.services.report(error, self.context(op));
    }

    /// Elapsed seconds recomputed from the absolute start while studying.
    fn current_elapsed(&self) -> u64 {
        match (&self.session, self.state) {
            (Some(s), SessionState::Studying) => {
                self.clock.now_ms().saturating_sub(s.start_ms) / 1000
            }
            (Some(s), _) => s.elapsed_secs,
            (None, _) => 0,
        }
    }

    fn pause_with(&mut self, reason: PauseReason) -> Event {
        let elapsed_secs = self.current_elapsed();
        self.timers.clear_all(&mut self.scheduler);
        if let Some(session) = self.session.as_mut() {
            session.elapsed_secs = elapsed_secs;
        }
        self.state = SessionState::Paused;
        tracing::info!(?reason, elapsed_secs, "session paused");
        Event::SessionPaused {
            reason,
            elapsed_secs,
            at: self.now(),
        }
    }

    /// Credit the uncredited part of the session to the lifetime total and
    /// persist totals, date and log.
    fn checkpoint_focus(&mut self, at: DateTime<Utc>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let fresh = session.elapsed_secs.saturating_sub(session.credited_secs);
        session.credited_secs = session.elapsed_secs;
        self.totals.total_focus_secs += fresh;
        let log = session.log.clone();
        for key in self
            .totals
            .persist(self.services.store.as_ref(), at, &log)
        {
            self.report(CoreError::Persist { key: key.to_string() }, "save_session_data");
        }
    }

    fn arm_session_timers(&mut self, now: u64) {
        let clock = self
            .scheduler
            .set_interval(now, CLOCK_PERIOD_MS, TimerOptions::default());
        self.timers
            .replace(&mut self.scheduler, TimerRole::Clock, clock);
        if !self.app_state.is_away() {
            self.arm_cadences(now);
        }
        let fade = self
            .scheduler
            .set_timeout(now, self.settings.buddy_fade_delay_ms);
        self.timers
            .replace(&mut self.scheduler, TimerRole::BuddyFade, fade);
    }

    /// (Re-)register the check-in and interaction cadences.
    fn arm_cadences(&mut self, now: u64) {
        let pausable = TimerOptions {
            pause_on_background: true,
        };
        let check_in_ms = self.check_in_interval_ms();
        let interaction_ms = self.profile().interaction_minutes as u64 * 60_000;
        let check_in = self.scheduler.set_interval(now, check_in_ms, pausable);
        self.timers
            .replace(&mut self.scheduler, TimerRole::CheckIn, check_in);
        let interaction = self.scheduler.set_interval(now, interaction_ms, pausable);
        self.timers
            .replace(&mut self.scheduler, TimerRole::Interaction, interaction);
    }

    fn resolve_adaptive_interval(&mut self, now: u64) -> Option<Event> {
        let pending = self.session.as_ref().is_some_and(|s| s.adaptive_pending);
        if !pending {
            return None;
        }
        let minutes = adaptive::adaptive_check_in_minutes(self.services.store.as_ref(), self.age);
        let session = self.session.as_mut()?;
        session.adaptive_pending = false;
        session.check_in_ms = minutes as u64 * 60_000;
        let period = session.check_in_ms;

        // Cadences may be paused while the host is away; they pick the new
        // period up when re-armed.
        if self.timers.check_in.is_some() {
            let handle = self.scheduler.set_interval(
                now,
                period,
                TimerOptions {
                    pause_on_background: true,
                },
            );
            self.timers
                .replace(&mut self.scheduler, TimerRole::CheckIn, handle);
        }
        tracing::info!(minutes, "check-in interval adjusted");
        Some(Event::CheckInIntervalAdjusted {
            minutes,
            at: self.now(),
        })
    }

    fn fire(&mut self, role: TimerRole, now: u64) -> Option<Event> {
        match role {
            TimerRole::Clock => {
                let session = self.session.as_mut()?;
                session.elapsed_secs = now.saturating_sub(session.start_ms) / 1000;
                Some(Event::ElapsedUpdated {
                    elapsed_secs: session.elapsed_secs,
                    at: self.now(),
                })
            }
            TimerRole::CheckIn => {
                if self.rng.gen::<f64>() < self.settings.surprise_probability() {
                    Some(self.surprise())
                } else {
                    self.check_in(now)
                }
            }
            TimerRole::Interaction => Some(self.prompt(now)),
            TimerRole::BuddyFade => {
                let session = self.session.as_mut()?;
                session.buddy_faded = true;
                Some(Event::BuddyFaded { at: self.now() })
            }
            TimerRole::PromptTimeout => {
                let pending = self.pending_prompt().is_some();
                if pending && self.state == SessionState::Studying {
                    Some(self.pause_with(PauseReason::PromptTimeout))
                } else {
                    None
                }
            }
            TimerRole::BreakOver => {
                self.speak("Break's over! Ready to get back to work?");
                Some(Event::BreakOver { at: self.now() })
            }
        }
    }

    fn surprise(&mut self) -> Event {
        let surprise = &SURPRISE_EVENTS[self.rng.gen_range(0..SURPRISE_EVENTS.len())];
        self.speak(surprise.message);
        tracing::info!(surprise = surprise.id, "surprise triggered");
        Event::SurpriseTriggered {
            surprise_id: surprise.id.to_string(),
            message: surprise.message.to_string(),
            emoji: surprise.emoji.to_string(),
            at: self.now(),
        }
    }

    fn check_in(&mut self, now: u64) -> Option<Event> {
        let elapsed_secs = self.current_elapsed();
        let session = self.session.as_mut()?;
        let request = PeerLineRequest {
            age_group: self.age,
            buddy_personality: self.settings.buddy_personality.clone(),
            subject_id: session.subject_id.clone(),
            seconds: elapsed_secs,
            session_length: session.session_length_secs,
            context: LineContext::Tick,
            session_id: session.id.clone(),
        };
        session.buddy_faded = false;
        let line = self.lines.generate(&request);

        let fade = self
            .scheduler
            .set_timeout(now, self.settings.check_in_display_ms);
        self.timers
            .replace(&mut self.scheduler, TimerRole::BuddyFade, fade);
        self.speak(&sanitize_body(&line));
        Some(Event::CheckIn {
            line,
            elapsed_secs,
            at: self.now(),
        })
    }

    fn prompt(&mut self, now: u64) -> Event {
        let kind = QuestionKind::ALL[self.rng.gen_range(0..QuestionKind::ALL.len())];
        let q = question(kind, self.age);
        if let Some(session) = self.session.as_mut() {
            session.pending_prompt = Some(q.clone());
        }
        let timeout = self
            .scheduler
            .set_timeout(now, self.settings.prompt_timeout_ms);
        self.timers
            .replace(&mut self.scheduler, TimerRole::PromptTimeout, timeout);
        self.speak(&q.text);
        Event::InteractionPrompted {
            question: q,
            at: self.now(),
        }
    }

    /// Schedule the next background check-ins. Returns how many were
    /// accepted; stops at the first failure.
    fn schedule_background_check_ins(&mut self) -> usize {
        let Some(session) = self.session.as_ref() else {
            return 0;
        };
        let request = CheckInRequest {
            age_group: self.age,
            subject_id: session.subject_id.clone(),
            session_time: self.current_elapsed(),
            interval_ms: session.check_in_ms,
            session_length: session.session_length_secs,
            session_id: session.id.clone(),
        };

        for planned in build_notifications(&request, self.settings.notification_count) {
            match self
                .services
                .notifier
                .schedule(&planned.content, planned.trigger)
            {
                Ok(id) => self.scheduled_notifications.push(id),
                Err(e) => {
                    self.report(e.into(), "schedule_background_check_ins");
                    break;
                }
            }
        }
        tracing::info!(
            count = self.scheduled_notifications.len(),
            "background check-ins scheduled"
        );
        self.scheduled_notifications.len()
    }

    /// Cancel every notification we scheduled. Returns how many ids were
    /// dropped.
    fn cancel_scheduled_notifications(&mut self) -> usize {
        let ids = std::mem::take(&mut self.scheduled_notifications);
        for id in &ids {
            if let Err(e) = self.services.notifier.cancel(id) {
                self.report(e.into(), "cancel_scheduled_check_ins");
            }
        }
        ids.len()
    }

    /// Apply and clear the action the child picked on a notification.
    fn apply_notification_action(&mut self) -> Vec<Event> {
        let key = StorageKey::LastNotifAction.as_str();
        let Some(action) = self.services.store.get_string(key) else {
            return Vec::new();
        };
        if action.is_empty() {
            return Vec::new();
        }
        if !self.services.store.set_string(key, "") {
            self.report(CoreError::Persist { key: key.to_string() }, "clear_notification_action");
        }
        tracing::info!(action = %action, "applying notification action");

        match action.as_str() {
            NOTIF_ACTION_RESUME if self.state != SessionState::Studying => {
                let subject = self.last_subject.clone().unwrap_or_else(|| {
                    subjects_for_age(self.age)
                        .first()
                        .map_or_else(|| "other".to_string(), |s| s.id.to_string())
                });
                self.start(SessionPlan::new(subject)).into_iter().collect()
            }
            NOTIF_ACTION_BREAK => self.take_break().into_iter().collect(),
            NOTIF_ACTION_DONE => self.end().into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::services::memory::MemoryServices;

    fn orchestrator(age: AgeGroup) -> (MemoryServices, ManualClock, SessionOrchestrator) {
        let mem = MemoryServices::new();
        let clock = ManualClock::new(1_700_000_000_000);
        let settings = SessionSettings {
            surprise_frequency: 0.0,
            ..SessionSettings::default()
        };
        let orch = SessionOrchestrator::new(mem.services(), Rc::new(clock.clone()), age, settings)
            .with_rng_seed(7);
        (mem, clock, orch)
    }

    fn tick_for(orch: &mut SessionOrchestrator, clock: &ManualClock, secs: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..secs {
            clock.advance_secs(1);
            events.extend(orch.tick());
        }
        events
    }

    #[test]
    fn session_id_is_start_time_and_salt() {
        let (_, _, mut orch) = orchestrator(AgeGroup::Tween);
        orch.start(SessionPlan::new("math"));
        let id = orch.session_id().unwrap();
        let (start, salt) = id.split_once(':').unwrap();
        assert_eq!(start, "1700000000000");
        assert_eq!(salt.len(), 8);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn first_tick_applies_adaptive_interval() {
        let (_, _, mut orch) = orchestrator(AgeGroup::Tween);
        orch.start(SessionPlan::new("math"));
        assert_eq!(orch.check_in_interval_ms(), 7 * 60_000);
        let events = orch.tick();
        assert!(matches!(
            events.as_slice(),
            [Event::CheckInIntervalAdjusted { minutes: 7, .. }]
        ));
        // Only once per session.
        assert!(orch.tick().is_empty());
    }

    #[test]
    fn elapsed_is_recomputed_from_start() {
        let (_, clock, mut orch) = orchestrator(AgeGroup::Teen);
        orch.start(SessionPlan::new("history"));
        clock.advance_secs(10);
        let events = orch.tick();
        let last = events
            .iter()
            .filter_map(|e| match e {
                Event::ElapsedUpdated { elapsed_secs, .. } => Some(*elapsed_secs),
                _ => None,
            })
            .last();
        assert_eq!(last, Some(10));
    }

    #[test]
    fn pause_and_resume_keep_elapsed() {
        let (_, clock, mut orch) = orchestrator(AgeGroup::Teen);
        orch.start(SessionPlan::new("history"));
        tick_for(&mut orch, &clock, 30);
        assert!(matches!(
            orch.pause(),
            Some(Event::SessionPaused {
                reason: PauseReason::User,
                elapsed_secs: 30,
                ..
            })
        ));
        assert!(orch.timers().is_empty());
        assert!(tick_for(&mut orch, &clock, 5).is_empty());
        clock.advance_secs(100);
        assert!(matches!(
            orch.resume(),
            Some(Event::SessionResumed {
                elapsed_secs: 30,
                ..
            })
        ));
        tick_for(&mut orch, &clock, 2);
        assert_eq!(orch.elapsed_secs(), 32);
    }

    #[test]
    fn contract_violations_are_ignored() {
        let (_, _, mut orch) = orchestrator(AgeGroup::Elementary);
        assert!(orch.pause().is_none());
        assert!(orch.resume().is_none());
        assert!(orch.end().is_none());
        assert!(orch.respond("easy").is_none());
        orch.start(SessionPlan::new("math"));
        assert!(orch.respond("easy").is_none());
        assert!(orch.end().is_some());
        assert!(orch.end().is_none());
    }

    #[test]
    fn check_in_unfades_buddy_and_speaks() {
        let (mem, clock, mut orch) = orchestrator(AgeGroup::Young);
        orch.start(SessionPlan::new("math"));
        orch.tick();
        let events = tick_for(&mut orch, &clock, 61);
        assert!(events.iter().any(|e| matches!(e, Event::BuddyFaded { .. })));
        assert!(orch.buddy_faded());

        // Young children default to a 2-minute cadence; the adaptive model
        // with no history recommends 4.
        let events = tick_for(&mut orch, &clock, 4 * 60);
        assert!(events.iter().any(|e| matches!(e, Event::CheckIn { .. })));
        assert!(orch.buddy_faded(), "fades again after the display time");
        assert!(mem.speech.lines().len() >= 2);
    }

    #[test]
    fn end_persists_and_awards_tokens() {
        let (mem, clock, mut orch) = orchestrator(AgeGroup::Elementary);
        orch.start(SessionPlan::new("math"));
        clock.advance_secs(20 * 60);
        let event = orch.end().unwrap();
        match event {
            Event::SessionEnded {
                elapsed_secs,
                streak,
                tokens_awarded,
                ..
            } => {
                assert_eq!(elapsed_secs, 1_200);
                assert_eq!(streak, 1);
                assert_eq!(tokens_awarded, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        use crate::services::KeyValueStore;
        assert_eq!(mem.store.get_string("totalFocusTime").as_deref(), Some("1200"));
        assert_eq!(mem.store.get_string("rewards:balance").as_deref(), Some("3"));
        assert_eq!(orch.state(), SessionState::Ended);
        assert!(orch.scheduler().is_empty());
    }

    #[test]
    fn break_saves_focus_time_once() {
        use crate::services::KeyValueStore;
        let (mem, clock, mut orch) = orchestrator(AgeGroup::Elementary);
        orch.start(SessionPlan::new("math"));
        clock.advance_secs(10 * 60);
        orch.take_break();
        assert_eq!(mem.store.get_string("totalFocusTime").as_deref(), Some("600"));
        assert_eq!(orch.totals().streak, 0);

        clock.advance_secs(5 * 60);
        orch.resume();
        clock.advance_secs(5 * 60);
        match orch.end() {
            Some(Event::SessionEnded {
                elapsed_secs,
                total_focus_secs,
                streak,
                ..
            }) => {
                assert_eq!(elapsed_secs, 900);
                assert_eq!(total_focus_secs, 900);
                assert_eq!(streak, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(mem.store.get_string("totalFocusTime").as_deref(), Some("900"));
    }

    #[test]
    fn abandoned_break_keeps_focus_time() {
        let (mem, clock, mut orch) = orchestrator(AgeGroup::Teen);
        orch.start(SessionPlan::new("history"));
        clock.advance_secs(12 * 60);
        orch.take_break();
        drop(orch);

        let next = SessionOrchestrator::new(
            mem.services(),
            Rc::new(clock.clone()),
            AgeGroup::Teen,
            SessionSettings::default(),
        );
        assert_eq!(next.totals().total_focus_secs, 720);
    }

    #[test]
    fn monday_start_carries_mystery_change() {
        let mem = MemoryServices::new();
        // 2024-01-15 09:00 UTC, the third Monday of the month.
        let clock = ManualClock::new(1_705_309_200_000);
        let mut orch = SessionOrchestrator::new(
            mem.services(),
            Rc::new(clock),
            AgeGroup::Tween,
            SessionSettings::default(),
        );
        match orch.start(SessionPlan::new("math")) {
            Some(Event::SessionStarted { mystery_monday, .. }) => {
                assert_eq!(mystery_monday.as_deref(), Some("Everything is backwards!"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn weekday_start_has_no_mystery_change() {
        let (_, _, mut orch) = orchestrator(AgeGroup::Tween);
        assert!(matches!(
            orch.start(SessionPlan::new("math")),
            Some(Event::SessionStarted {
                mystery_monday: None,
                ..
            })
        ));
    }
}

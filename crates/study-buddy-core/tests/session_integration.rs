//! Integration tests for the session orchestrator: lifecycle transitions,
//! background notifications, prompts and persistence.

use std::rc::Rc;

use study_buddy_core::services::memory::MemoryServices;
use study_buddy_core::session::PauseReason;
use study_buddy_core::{
    compute_weekly_insights, AgeGroup, AppState, Event, KeyValueStore, ManualClock,
    SessionCommand, SessionOrchestrator, SessionPlan, SessionSettings, SessionState,
};
use study_buddy_core::catalog::SURPRISE_EVENTS;

const START_MS: u64 = 1_700_000_000_000;

fn setup(age: AgeGroup) -> (MemoryServices, ManualClock, SessionOrchestrator) {
    let settings = SessionSettings {
        surprise_frequency: 0.0,
        ..SessionSettings::default()
    };
    setup_with(age, settings)
}

fn setup_with(
    age: AgeGroup,
    settings: SessionSettings,
) -> (MemoryServices, ManualClock, SessionOrchestrator) {
    let mem = MemoryServices::new();
    let clock = ManualClock::new(START_MS);
    let session = SessionOrchestrator::new(mem.services(), Rc::new(clock.clone()), age, settings)
        .with_rng_seed(42);
    (mem, clock, session)
}

/// Start a math session and run the first tick so the adaptive cadence is in place.
fn studying(age: AgeGroup) -> (MemoryServices, ManualClock, SessionOrchestrator) {
    let (mem, clock, mut session) = setup(age);
    session.start(SessionPlan::new("math"));
    session.tick();
    (mem, clock, session)
}

/// Tick once per simulated second until `done` matches an event or `limit`
/// seconds pass. Returns everything emitted.
fn run_until(
    session: &mut SessionOrchestrator,
    clock: &ManualClock,
    limit: u64,
    done: impl Fn(&Event) -> bool,
) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..limit {
        clock.advance_secs(1);
        let batch = session.tick();
        let stop = batch.iter().any(&done);
        events.extend(batch);
        if stop {
            break;
        }
    }
    events
}

fn is_prompt(e: &Event) -> bool {
    matches!(e, Event::InteractionPrompted { .. })
}

#[test]
fn background_schedules_three_check_ins() {
    let (mem, _, mut session) = studying(AgeGroup::Elementary);
    assert_eq!(session.check_in_interval_ms(), 5 * 60_000);

    let events = session.set_app_state(AppState::Background);
    assert!(matches!(
        events.as_slice(),
        [Event::CheckInsScheduled { count: 3, .. }]
    ));

    let scheduled = mem.notifier.scheduled();
    let secs: Vec<u64> = scheduled.iter().map(|n| n.trigger.seconds).collect();
    assert_eq!(secs, vec![300, 600, 900]);
    for n in &scheduled {
        assert_eq!(n.content.title, "Study Buddy");
        assert!(n.content.body.contains("Ready to jump back in"), "{}", n.content.body);
    }
    assert_eq!(session.scheduled_notifications().len(), 3);

    // Cadences pause while away; the elapsed clock keeps running.
    assert!(session.timers().check_in.is_none());
    assert!(session.timers().interaction.is_none());
    assert!(session.timers().clock.is_some());
}

#[test]
fn foreground_cancels_own_notifications_and_welcomes_back() {
    let (mem, clock, mut session) = studying(AgeGroup::Elementary);
    session.set_app_state(AppState::Background);
    clock.advance_secs(90);
    session.tick();

    let events = session.set_app_state(AppState::Active);
    assert!(matches!(
        events.as_slice(),
        [
            Event::CheckInsCancelled { count: 3, .. },
            Event::WelcomeBack { .. }
        ]
    ));

    let scheduled: Vec<_> = mem.notifier.scheduled().into_iter().map(|n| n.id).collect();
    assert_eq!(mem.notifier.cancelled(), scheduled);
    assert!(session.scheduled_notifications().is_empty());
    assert!(session.timers().check_in.is_some());
    assert!(session.timers().interaction.is_some());
    assert_eq!(
        mem.speech.last().map(|(text, _)| text).as_deref(),
        Some("Welcome back! Ready to continue?")
    );
}

#[test]
fn inactive_then_background_schedules_once() {
    let (mem, _, mut session) = studying(AgeGroup::Tween);
    assert_eq!(session.set_app_state(AppState::Inactive).len(), 1);
    assert!(session.set_app_state(AppState::Background).is_empty());
    assert_eq!(mem.notifier.scheduled().len(), 3);
}

#[test]
fn paused_session_schedules_nothing_in_background() {
    let (mem, _, mut session) = studying(AgeGroup::Tween);
    session.pause();
    assert!(session.set_app_state(AppState::Background).is_empty());
    assert!(mem.notifier.scheduled().is_empty());
}

#[test]
fn resume_while_backgrounded_waits_for_foreground() {
    let (mem, clock, mut session) = studying(AgeGroup::Elementary);
    session.pause();
    assert!(session.set_app_state(AppState::Background).is_empty());

    let events = session.apply(SessionCommand::Resume);
    assert!(matches!(
        events.as_slice(),
        [
            Event::SessionResumed { .. },
            Event::CheckInsScheduled { count: 3, .. }
        ]
    ));
    assert_eq!(mem.notifier.scheduled().len(), 3);
    assert!(session.timers().check_in.is_none());
    assert!(session.timers().interaction.is_none());
    assert!(session.timers().clock.is_some());

    let spoken = mem.speech.lines().len();
    let events = run_until(&mut session, &clock, 21 * 60, |_| false);
    assert!(!events.iter().any(|e| matches!(
        e,
        Event::CheckIn { .. }
            | Event::InteractionPrompted { .. }
            | Event::SurpriseTriggered { .. }
            | Event::SessionPaused { .. }
    )));
    assert_eq!(session.state(), SessionState::Studying);
    assert_eq!(mem.speech.lines().len(), spoken, "nothing spoken while away");

    let events = session.set_app_state(AppState::Active);
    assert!(matches!(
        events.as_slice(),
        [
            Event::CheckInsCancelled { count: 3, .. },
            Event::WelcomeBack { .. }
        ]
    ));
    assert!(session.timers().check_in.is_some());
    assert!(session.timers().interaction.is_some());
}

#[test]
fn partial_scheduling_failure_is_reported_and_kept() {
    let (mem, _, mut session) = studying(AgeGroup::Teen);
    mem.notifier.fail_after(1);

    let events = session.set_app_state(AppState::Background);
    assert!(matches!(
        events.as_slice(),
        [Event::CheckInsScheduled { count: 1, .. }]
    ));
    let errors = mem.errors.captured();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1.op, "schedule_background_check_ins");
    assert_eq!(errors[0].1.subject_id.as_deref(), Some("math"));
    assert_eq!(errors[0].1.age_group.as_deref(), Some("teen"));

    // The one that made it is still cancelled on return.
    session.set_app_state(AppState::Active);
    assert_eq!(mem.notifier.cancelled().len(), 1);
}

#[test]
fn notifications_can_be_disabled() {
    let mem = MemoryServices::new();
    let clock = ManualClock::new(START_MS);
    let settings = SessionSettings {
        notifications_enabled: false,
        ..SessionSettings::default()
    };
    let mut session =
        SessionOrchestrator::new(mem.services(), Rc::new(clock), AgeGroup::Teen, settings);
    session.start(SessionPlan::new("history"));
    assert!(session.set_app_state(AppState::Background).is_empty());
    assert!(mem.notifier.scheduled().is_empty());
}

#[test]
fn done_action_ends_session_on_return() {
    let (mem, clock, mut session) = studying(AgeGroup::Elementary);
    session.set_app_state(AppState::Background);
    clock.advance_secs(16 * 60);
    mem.store.set_string("lastNotifAction", "DONE");

    let events = session.set_app_state(AppState::Active);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SessionEnded { tokens_awarded: 3, .. })));
    assert_eq!(session.state(), SessionState::Ended);
    assert_eq!(mem.store.get_string("lastNotifAction").as_deref(), Some(""));
}

#[test]
fn break_action_pauses_then_break_over_fires() {
    let (mem, clock, mut session) = studying(AgeGroup::Elementary);
    session.set_app_state(AppState::Background);
    mem.store.set_string("lastNotifAction", "BREAK");

    let events = session.set_app_state(AppState::Active);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::SessionPaused {
            reason: PauseReason::Break,
            ..
        }
    )));
    assert_eq!(session.state(), SessionState::Paused);

    // Elementary breaks last five minutes.
    let events = run_until(&mut session, &clock, 5 * 60 + 1, |e| {
        matches!(e, Event::BreakOver { .. })
    });
    assert!(matches!(events.last(), Some(Event::BreakOver { .. })));
    assert_eq!(
        mem.speech.last().map(|(text, _)| text).as_deref(),
        Some("Break's over! Ready to get back to work?")
    );
}

#[test]
fn resume_action_restarts_last_subject() {
    let (mem, _, mut session) = studying(AgeGroup::Young);
    session.end();
    mem.store.set_string("lastNotifAction", "RESUME");

    session.set_app_state(AppState::Background);
    let events = session.set_app_state(AppState::Active);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::SessionStarted { subject_id, .. } if subject_id == "math"
    )));
    assert_eq!(session.state(), SessionState::Studying);
}

#[test]
fn unanswered_prompt_auto_pauses_after_timeout() {
    let (_, clock, mut session) = studying(AgeGroup::Elementary);

    // Elementary prompts every 20 minutes.
    let events = run_until(&mut session, &clock, 20 * 60, is_prompt);
    assert!(events.iter().any(is_prompt));
    assert!(session.pending_prompt().is_some());

    let events = run_until(&mut session, &clock, 30, |e| {
        matches!(e, Event::SessionPaused { .. })
    });
    assert!(matches!(
        events.last(),
        Some(Event::SessionPaused {
            reason: PauseReason::PromptTimeout,
            ..
        })
    ));
    assert_eq!(session.state(), SessionState::Paused);
    assert!(session.timers().is_empty());

    // The prompt can still be answered while paused.
    assert!(matches!(
        session.respond("easy"),
        Some(Event::Feedback { message: Some(_), .. })
    ));
    assert_eq!(session.log().len(), 1);
}

#[test]
fn answered_prompt_does_not_pause() {
    let (_, clock, mut session) = studying(AgeGroup::Elementary);
    run_until(&mut session, &clock, 20 * 60, is_prompt);
    session.respond("ok");

    let events = run_until(&mut session, &clock, 60, |_| false);
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::SessionPaused { .. })));
    assert_eq!(session.state(), SessionState::Studying);
}

#[test]
fn help_response_updates_model_and_insights() {
    let (mem, clock, mut session) = studying(AgeGroup::Elementary);
    run_until(&mut session, &clock, 20 * 60, is_prompt);

    let event = session.respond("help");
    assert!(matches!(event, Some(Event::HelpRequested { ref subject_id, .. }) if subject_id == "math"));
    assert!(mem
        .analytics
        .events()
        .iter()
        .any(|(name, _)| name == "help_requested"));

    let model = study_buddy_core::adaptive::load_model(&*mem.store);
    assert!((model.score("math") - 0.42).abs() < 1e-9);

    // A second answer without a new prompt is ignored.
    assert!(session.respond("easy").is_none());

    session.end();
    let insights = compute_weekly_insights(&*mem.store);
    assert_eq!(insights.sessions, 1);
    assert_eq!(insights.total_minutes, 20);
    assert_eq!(insights.top_helps.len(), 1);
    assert_eq!(insights.top_helps[0].count, 1);
}

#[test]
fn ticks_after_pause_are_silent() {
    let (_, clock, mut session) = studying(AgeGroup::Tween);
    run_until(&mut session, &clock, 10, |_| false);
    session.pause();
    let events = run_until(&mut session, &clock, 5, |_| false);
    assert!(events.is_empty());
}

#[test]
fn ticks_after_end_are_silent() {
    let (_, clock, mut session) = studying(AgeGroup::Tween);
    run_until(&mut session, &clock, 10, |_| false);
    assert!(session.end().is_some());
    let events = run_until(&mut session, &clock, 600, |_| false);
    assert!(events.is_empty());
    assert!(session.timers().is_empty());
    assert!(session.scheduler().is_empty());
}

fn is_check_in_or_surprise(e: &Event) -> bool {
    matches!(e, Event::CheckIn { .. } | Event::SurpriseTriggered { .. })
}

#[test]
fn check_in_becomes_surprise_at_full_frequency() {
    let settings = SessionSettings {
        surprise_frequency: 1.0,
        surprise_multiplier: 1.0,
        ..SessionSettings::default()
    };
    let (mem, clock, mut session) = setup_with(AgeGroup::Elementary, settings);
    session.start(SessionPlan::new("math"));
    session.tick();

    let events = run_until(&mut session, &clock, 6 * 60, is_check_in_or_surprise);
    assert!(!events.iter().any(|e| matches!(e, Event::CheckIn { .. })));
    let (id, message) = events
        .iter()
        .find_map(|e| match e {
            Event::SurpriseTriggered {
                surprise_id,
                message,
                ..
            } => Some((surprise_id.clone(), message.clone())),
            _ => None,
        })
        .expect("surprise on the first check-in");
    let known = SURPRISE_EVENTS
        .iter()
        .find(|s| s.id == id)
        .expect("surprise from the catalog");
    assert_eq!(known.message, message);
    assert!(mem.speech.lines().contains(&message));
    // Surprises leave the faded buddy alone.
    assert!(session.buddy_faded());
}

#[test]
fn zero_multiplier_suppresses_surprises() {
    let settings = SessionSettings {
        surprise_frequency: 1.0,
        surprise_multiplier: 0.0,
        ..SessionSettings::default()
    };
    let (_, clock, mut session) = setup_with(AgeGroup::Elementary, settings);
    session.start(SessionPlan::new("math"));
    session.tick();

    let events = run_until(&mut session, &clock, 6 * 60, is_check_in_or_surprise);
    assert!(events.iter().any(|e| matches!(e, Event::CheckIn { .. })));
    assert!(!events.iter().any(|e| matches!(e, Event::SurpriseTriggered { .. })));
}

#[test]
fn end_reports_failed_persistence_without_aborting() {
    let (mem, clock, mut session) = studying(AgeGroup::Teen);
    clock.advance_secs(25 * 60);
    mem.store.set_fail_writes(true);

    let event = session.end();
    assert!(matches!(
        event,
        Some(Event::SessionEnded {
            tokens_awarded: 5,
            streak: 1,
            ..
        })
    ));
    let ops: Vec<&str> = mem.errors.captured().iter().map(|(_, ctx)| ctx.op).collect();
    assert!(ops.contains(&"save_session_data"));
    assert!(ops.contains(&"add_tokens"));
}

#[test]
fn streak_and_focus_time_accumulate_across_sessions() {
    let (mem, clock, mut session) = setup(AgeGroup::Tween);
    for _ in 0..2 {
        session.start(SessionPlan::new("reading"));
        clock.advance_secs(10 * 60);
        session.end();
    }
    assert_eq!(session.totals().streak, 2);
    assert_eq!(mem.store.get_string("totalFocusTime").as_deref(), Some("1200"));
    assert_eq!(mem.store.get_string("currentStreak").as_deref(), Some("2"));
    assert_eq!(mem.store.get_string("rewards:balance").as_deref(), Some("2"));

    let analytics: Vec<String> = mem.analytics.events().into_iter().map(|(n, _)| n).collect();
    assert_eq!(
        analytics,
        vec!["session_start", "session_end", "session_start", "session_end"]
    );
}

//! Integration tests for the async session driver, run on tokio's paused
//! clock.

use std::rc::Rc;
use std::time::Duration;

use tokio::sync::mpsc;

use study_buddy_core::driver::{run_session, DriverExit};
use study_buddy_core::services::memory::MemoryServices;
use study_buddy_core::{
    AgeGroup, Event, KeyValueStore, SessionCommand, SessionOrchestrator, SessionPlan,
    SessionSettings, TokioClock,
};

fn orchestrator(mem: &MemoryServices) -> SessionOrchestrator {
    let clock = TokioClock::anchored_at(1_700_000_000_000);
    let settings = SessionSettings {
        surprise_frequency: 0.0,
        ..SessionSettings::default()
    };
    SessionOrchestrator::new(mem.services(), Rc::new(clock), AgeGroup::Elementary, settings)
        .with_rng_seed(3)
}

#[tokio::test(start_paused = true)]
async fn twenty_minute_session_runs_to_end() {
    let mem = MemoryServices::new();
    let mut session = orchestrator(&mem);
    let (tx, rx) = mpsc::channel(8);
    tx.send(SessionCommand::Start(SessionPlan::new("math")))
        .await
        .unwrap();

    let mut kinds: Vec<&'static str> = Vec::new();
    let host = async {
        tokio::time::sleep(Duration::from_secs(20 * 60)).await;
        tx.send(SessionCommand::End).await.unwrap();
    };
    let (exit, ()) = tokio::join!(run_session(&mut session, rx, |e| kinds.push(e.kind())), host);

    match exit {
        DriverExit::Ended(Event::SessionEnded {
            elapsed_secs,
            tokens_awarded,
            ..
        }) => {
            assert_eq!(elapsed_secs, 1_200);
            assert_eq!(tokens_awarded, 3);
        }
        other => panic!("unexpected exit {other:?}"),
    }
    assert_eq!(kinds.first(), Some(&"SessionStarted"));
    assert_eq!(kinds.last(), Some(&"SessionEnded"));
    // Elementary checks in every five minutes.
    assert!(kinds.iter().filter(|k| **k == "CheckIn").count() >= 3);
    assert_eq!(mem.store.get_string("rewards:balance").as_deref(), Some("3"));
}

#[tokio::test(start_paused = true)]
async fn dropped_sender_stops_driver() {
    let mem = MemoryServices::new();
    let mut session = orchestrator(&mem);
    let (tx, rx) = mpsc::channel::<SessionCommand>(1);
    drop(tx);

    let exit = run_session(&mut session, rx, |_| {}).await;
    assert_eq!(exit, DriverExit::ChannelClosed);
}

#[tokio::test(start_paused = true)]
async fn paused_session_emits_nothing_until_resumed() {
    let mem = MemoryServices::new();
    let mut session = orchestrator(&mem);
    let (tx, rx) = mpsc::channel(8);

    let mut events: Vec<Event> = Vec::new();
    let host = async {
        tx.send(SessionCommand::Start(SessionPlan::new("reading")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        tx.send(SessionCommand::Pause).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        tx.send(SessionCommand::End).await.unwrap();
    };
    let (exit, ()) = tokio::join!(run_session(&mut session, rx, |e| events.push(e.clone())), host);

    assert!(matches!(exit, DriverExit::Ended(_)));
    let paused_at = events
        .iter()
        .position(|e| matches!(e, Event::SessionPaused { .. }))
        .unwrap();
    // Only the end event follows the pause.
    assert_eq!(events.len(), paused_at + 2);
    assert!(matches!(
        events.last(),
        Some(Event::SessionEnded { elapsed_secs: 3, .. })
    ));
}

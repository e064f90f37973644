//! Async driver for a [`SessionOrchestrator`].
//!
//! Ticks the orchestrator from a tokio interval and applies host commands
//! from an `mpsc` channel. Runs on the calling task: the orchestrator holds
//! `Rc`s and is not `Send`, so use a current-thread runtime or a
//! `LocalSet`.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::events::Event;
use crate::session::{SessionCommand, SessionOrchestrator};

/// How often the orchestrator is ticked.
pub const TICK_PERIOD: Duration = Duration::from_millis(250);

/// Why [`run_session`] returned.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverExit {
    /// The session ended; carries the `SessionEnded` event.
    Ended(Event),
    /// Every command sender was dropped.
    ChannelClosed,
}

/// Drive `session` until it ends or `commands` closes, handing every event
/// to `sink` in order.
pub async fn run_session<F>(
    session: &mut SessionOrchestrator,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut sink: F,
) -> DriverExit
where
    F: FnMut(&Event),
{
    let mut ticker = interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(target: "study_buddy::driver", "driver started ({}ms tick)", TICK_PERIOD.as_millis());

    loop {
        let events = tokio::select! {
            _ = ticker.tick() => session.tick(),
            command = commands.recv() => match command {
                Some(command) => {
                    tracing::debug!(target: "study_buddy::driver", ?command, "command received");
                    session.apply(command)
                }
                None => {
                    tracing::info!(target: "study_buddy::driver", "command channel closed");
                    return DriverExit::ChannelClosed;
                }
            },
        };

        for event in events {
            sink(&event);
            if matches!(event, Event::SessionEnded { .. }) {
                tracing::info!(target: "study_buddy::driver", "session ended, driver stopping");
                return DriverExit::Ended(event);
            }
        }
    }
}

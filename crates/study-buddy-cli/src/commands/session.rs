use std::io::BufRead;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;
use study_buddy_core::driver::{run_session, DriverExit};
use study_buddy_core::services::{Speech, SpeechOptions};
use study_buddy_core::session::SessionTotals;
use study_buddy_core::{
    AgeGroup, AppState, Config, Database, Event, KeyValueStore, SessionCommand,
    SessionOrchestrator, SessionPlan, Services, StorageKey, TokioClock,
};
use tokio::sync::mpsc;

use super::resolve_age;

const COMMAND_BUFFER: usize = 16;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run an interactive session.
    ///
    /// Events are printed to stdout as JSON lines. Commands are read from
    /// stdin, one per line: pause, resume, break, end, status,
    /// respond <value>, background, inactive, active. A JSON object such as
    /// {"command":"respond","value":"easy"} is accepted too. Closing stdin
    /// ends the session.
    Run {
        /// Subject ID (e.g. "math")
        #[arg(long, default_value = "math")]
        subject: String,
        /// Session length in minutes; defaults to the config or age profile
        #[arg(long)]
        minutes: Option<u32>,
        /// Age group; defaults to the profile's
        #[arg(long)]
        age: Option<AgeGroup>,
    },
    /// Lifetime totals and the last session date
    Status,
}

/// Speaks by writing to stderr.
struct ConsoleSpeech;

impl Speech for ConsoleSpeech {
    fn speak(&self, text: &str, _options: &SpeechOptions) {
        eprintln!("🗣  {text}");
    }

    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Parse one stdin line into a command.
pub fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let line = line.trim();
    if line.starts_with('{') {
        return serde_json::from_str(line).map_err(|e| format!("invalid command: {e}"));
    }
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match word.to_ascii_lowercase().as_str() {
        "pause" => Ok(SessionCommand::Pause),
        "resume" => Ok(SessionCommand::Resume),
        "break" => Ok(SessionCommand::TakeBreak),
        "end" | "done" => Ok(SessionCommand::End),
        "status" => Ok(SessionCommand::Snapshot),
        "respond" if !rest.is_empty() => Ok(SessionCommand::Respond {
            value: rest.to_string(),
        }),
        "respond" => Err("respond needs a value".to_string()),
        "background" | "inactive" | "active" => Ok(SessionCommand::AppState {
            state: word.parse::<AppState>()?,
        }),
        "" => Err("empty command".to_string()),
        other => Err(format!("unknown command: {other}")),
    }
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, kind = event.kind(), "event not printable"),
    }
}

/// Forward stdin lines to the driver from a plain thread. Dropping the
/// sender on EOF closes the channel.
fn spawn_stdin_reader(tx: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(command) => {
                    if tx.blocking_send(command).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("error: {e}"),
            }
        }
        tracing::debug!("stdin closed");
    });
}

fn run_interactive(
    subject: String,
    minutes: Option<u32>,
    age: Option<AgeGroup>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let age = resolve_age(age);
    let db = Rc::new(Database::open()?);
    let services = Services {
        speech: Rc::new(ConsoleSpeech),
        ..Services::with_store(db)
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        let clock = Rc::new(TokioClock::new());
        let mut session =
            SessionOrchestrator::new(services, clock, age, config.session_settings());
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let plan = SessionPlan {
            subject_id: subject,
            session_minutes: minutes,
        };
        tx.send(SessionCommand::Start(plan)).await?;
        spawn_stdin_reader(tx);

        if run_session(&mut session, rx, print_event).await == DriverExit::ChannelClosed {
            if let Some(event) = session.end() {
                print_event(&event);
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            subject,
            minutes,
            age,
        } => run_interactive(subject, minutes, age),
        SessionAction::Status => {
            let db = Database::open()?;
            let totals = SessionTotals::load(&db);
            let last = db
                .get_string(StorageKey::LastSessionDate.as_str())
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|at| at.with_timezone(&Utc));
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "totalFocusSecs": totals.total_focus_secs,
                    "streak": totals.streak,
                    "lastSessionDate": last,
                    "daysSinceLastSession": last.map(|at| (Utc::now() - at).num_days()),
                }))?
            );
            Ok(())
        }
    }
}

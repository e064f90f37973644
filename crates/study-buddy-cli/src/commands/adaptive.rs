use clap::Subcommand;
use serde_json::json;
use study_buddy_core::adaptive::{load_model, record_interaction};
use study_buddy_core::clock::{Clock, SystemClock};
use study_buddy_core::{adaptive_check_in_minutes, AgeGroup, Database};

use super::resolve_age;

#[derive(Subcommand)]
pub enum AdaptiveAction {
    /// Print the stored per-subject scores
    Show,
    /// Record one interaction response for a subject
    Record {
        /// Subject ID (e.g. "math")
        subject: String,
        /// Response ID (easy, ok, hard, help, complete, most, half, started)
        response: String,
    },
    /// Print the recommended check-in interval in minutes
    Interval {
        /// Age group (young, elementary, tween, teen); defaults to the profile's
        #[arg(long)]
        age: Option<AgeGroup>,
    },
}

pub fn run(action: AdaptiveAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        AdaptiveAction::Show => {
            let model = load_model(&db);
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        AdaptiveAction::Record { subject, response } => {
            let model = record_interaction(&db, SystemClock.now_ms(), &subject, &response);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "subjectId": subject,
                    "score": model.score(&subject),
                }))?
            );
        }
        AdaptiveAction::Interval { age } => {
            let age = resolve_age(age);
            let minutes = adaptive_check_in_minutes(&db, age);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "ageGroup": age,
                    "minutes": minutes,
                }))?
            );
        }
    }
    Ok(())
}

use clap::Args;
use serde_json::json;
use study_buddy_core::content::{build_notifications, CheckInRequest, LineContext, Phase};
use study_buddy_core::{AgeGroup, Config, LineSelector, PeerLineRequest};

use super::resolve_age;

#[derive(Args)]
pub struct LineArgs {
    /// Subject ID (unknown IDs fall back to "other")
    #[arg(long, default_value = "math")]
    subject: String,
    /// Seconds into the session
    #[arg(long, default_value = "0")]
    seconds: u64,
    /// Planned session length in seconds; defaults to the age profile's
    #[arg(long)]
    length: Option<u64>,
    /// Session ID used to seed the choice
    #[arg(long, default_value = "cli")]
    session_id: String,
    /// Age group; defaults to the profile's
    #[arg(long)]
    age: Option<AgeGroup>,
    /// Produce the invitation text used by background notifications
    #[arg(long)]
    background: bool,
}

#[derive(Args)]
pub struct NotificationArgs {
    /// Subject ID
    #[arg(long, default_value = "math")]
    subject: String,
    /// Seconds already studied
    #[arg(long, default_value = "0")]
    session_time: u64,
    /// Check-in interval in milliseconds; defaults to the age profile's
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Planned session length in seconds; defaults to the age profile's
    #[arg(long)]
    length: Option<u64>,
    /// Session ID used to seed the lines
    #[arg(long, default_value = "cli")]
    session_id: String,
    /// How many notifications to build; defaults to `notifications.count`
    #[arg(long)]
    count: Option<usize>,
    /// Age group; defaults to the profile's
    #[arg(long)]
    age: Option<AgeGroup>,
}

pub fn line(args: LineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let age = resolve_age(args.age);
    let session_length = args.length.unwrap_or_else(|| age.profile().session_secs());
    let request = PeerLineRequest {
        age_group: age,
        buddy_personality: config.profile.buddy_personality,
        subject_id: args.subject,
        seconds: args.seconds,
        session_length,
        context: if args.background {
            LineContext::BackgroundReturn
        } else {
            LineContext::Tick
        },
        session_id: args.session_id,
    };
    let text = LineSelector::new().generate(&request);
    let phase = Phase::at(request.seconds, session_length, &request.session_id);
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "phase": phase,
            "line": text,
        }))?
    );
    Ok(())
}

pub fn notifications(args: NotificationArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let age = resolve_age(args.age);
    let profile = age.profile();
    let request = CheckInRequest {
        age_group: age,
        subject_id: args.subject,
        session_time: args.session_time,
        interval_ms: args
            .interval_ms
            .unwrap_or(profile.check_in_minutes as u64 * 60_000),
        session_length: args.length.unwrap_or_else(|| profile.session_secs()),
        session_id: args.session_id,
    };
    let count = args
        .count
        .unwrap_or_else(|| config.session_settings().notification_count);
    let planned = build_notifications(&request, count);
    println!("{}", serde_json::to_string_pretty(&planned)?);
    Ok(())
}

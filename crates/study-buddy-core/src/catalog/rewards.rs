//! Fixed gamification tables: surprise events, encouragement lines, token awards.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurpriseEvent {
    pub id: &'static str,
    pub message: &'static str,
    pub emoji: &'static str,
}

/// Base probability that a check-in becomes a surprise instead.
pub const DEFAULT_SURPRISE_FREQUENCY: f64 = 0.05;

pub static SURPRISE_EVENTS: [SurpriseEvent; 8] = [
    SurpriseEvent {
        id: "power_hour",
        message: "Power Hour! Everything counts double!",
        emoji: "⚡",
    },
    SurpriseEvent {
        id: "buddy_birthday",
        message: "It's Buddy's Birthday!",
        emoji: "🎂",
    },
    SurpriseEvent {
        id: "opposite_day",
        message: "Opposite Day! Breaks are longer!",
        emoji: "🔄",
    },
    SurpriseEvent {
        id: "challenge_mode",
        message: "Challenge Mode! Beat yesterday!",
        emoji: "🏆",
    },
    SurpriseEvent {
        id: "guest_buddy",
        message: "Guest Buddy visiting!",
        emoji: "👋",
    },
    SurpriseEvent {
        id: "speed_round",
        message: "Speed Round! Quick focus!",
        emoji: "💨",
    },
    SurpriseEvent {
        id: "quiet_mode",
        message: "Shh... Library Mode!",
        emoji: "🤫",
    },
    SurpriseEvent {
        id: "party_mode",
        message: "Party Mode! Extra celebrations!",
        emoji: "🎉",
    },
];

/// Monday twists, one per week of the month.
pub static MYSTERY_MONDAY_CHANGES: [&str; 8] = [
    "Buddy has a hat today!",
    "Timer counts UP instead of down!",
    "Everything is backwards!",
    "Night mode activated!",
    "Speed mode - shorter sessions!",
    "Buddy is feeling quiet today",
    "Double points day!",
    "Surprise colors everywhere!",
];

/// The Mystery Monday twist for `date`, or `None` on other weekdays.
pub fn mystery_monday_change(date: NaiveDate) -> Option<&'static str> {
    if date.weekday() != Weekday::Mon {
        return None;
    }
    let week = date.day() as usize / 7;
    Some(MYSTERY_MONDAY_CHANGES[week % MYSTERY_MONDAY_CHANGES.len()])
}

/// Spoken feedback for an interaction response. `None` means stay quiet.
pub fn encouragement_for(response: &str) -> Option<&'static str> {
    match response {
        "easy" => Some("Great! Keep crushing it!"),
        "ok" => Some("Nice steady progress!"),
        "hard" => Some("You're doing great even though it's tough!"),
        "complete" => Some("Amazing! You finished!"),
        "most" => Some("Almost there, fantastic!"),
        "half" => Some("Halfway is great progress!"),
        "started" => Some("Good start, keep going!"),
        _ => None,
    }
}

/// Tokens earned for a session of `minutes` whole minutes.
pub fn token_award(minutes: u64) -> u32 {
    match minutes {
        25.. => 5,
        15..=24 => 3,
        5..=14 => 1,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u64,
}

pub static REWARD_CATALOG: [RewardItem; 3] = [
    RewardItem {
        id: "confetti",
        name: "Confetti Burst",
        description: "Celebrate a win with confetti!",
        cost: 20,
    },
    RewardItem {
        id: "sticker_pack",
        name: "Sticker Pack",
        description: "Unlock fun study stickers!",
        cost: 50,
    },
    RewardItem {
        id: "buddy_hat",
        name: "Buddy Hat",
        description: "A stylish hat for your buddy",
        cost: 75,
    },
];

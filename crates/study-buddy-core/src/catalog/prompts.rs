//! Two-way interaction questions.

use serde::{Deserialize, Serialize};

use super::age::AgeGroup;
use super::subjects::subjects_for_age;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Subject,
    Progress,
    Difficulty,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 3] = [
        QuestionKind::Subject,
        QuestionKind::Progress,
        QuestionKind::Difficulty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Subject => "subject",
            QuestionKind::Progress => "progress",
            QuestionKind::Difficulty => "difficulty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOption {
    pub label: String,
    /// Normalized response id fed to the adaptive model.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub kind: QuestionKind,
    pub text: String,
    pub options: Vec<ResponseOption>,
}

fn option(label: &str, value: &str) -> ResponseOption {
    ResponseOption {
        label: label.to_string(),
        value: value.to_string(),
    }
}

/// Build the question of `kind` for a child in `age`.
pub fn question(kind: QuestionKind, age: AgeGroup) -> Question {
    match kind {
        QuestionKind::Subject => Question {
            kind,
            text: "What are you working on?".to_string(),
            options: subjects_for_age(age)
                .into_iter()
                .take(4)
                .map(|s| option(&format!("{} {}", s.emoji, s.label), s.id))
                .collect(),
        },
        QuestionKind::Progress => Question {
            kind,
            text: "How much have you finished?".to_string(),
            options: vec![
                option("All done! ✅", "complete"),
                option("Most 🔵", "most"),
                option("Half 🟡", "half"),
                option("Just started 🔴", "started"),
            ],
        },
        QuestionKind::Difficulty => Question {
            kind,
            text: "How's it going?".to_string(),
            options: vec![
                option("Easy! 😊", "easy"),
                option("OK 😐", "ok"),
                option("Hard 😟", "hard"),
                option("Need help 🆘", "help"),
            ],
        },
    }
}

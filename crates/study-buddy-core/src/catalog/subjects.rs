//! Subject catalog: labels, emoji and per-subject study hints.

use serde::Serialize;

use super::age::AgeGroup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    /// Short study hints appended to peer lines.
    pub hints: &'static [&'static str],
}

pub const OTHER_SUBJECT_ID: &str = "other";

pub static SUBJECTS: [Subject; 9] = [
    Subject {
        id: "math",
        label: "Math",
        emoji: "🔢",
        hints: &["Check your steps", "One problem at a time", "Show your work"],
    },
    Subject {
        id: "reading",
        label: "Reading",
        emoji: "📚",
        hints: &[
            "Summarize the paragraph",
            "Who is the main character?",
            "Predict what happens next",
        ],
    },
    Subject {
        id: "writing",
        label: "Writing",
        emoji: "✏️",
        hints: &["Add one detail", "Check punctuation", "Reread your sentence"],
    },
    Subject {
        id: "science",
        label: "Science",
        emoji: "🔬",
        hints: &[
            "State your hypothesis",
            "Measure carefully",
            "Record observations",
        ],
    },
    Subject {
        id: "chemistry",
        label: "Chemistry",
        emoji: "⚗️",
        hints: &[
            "Balance the equation",
            "Units matter",
            "Mind safety rules",
        ],
    },
    Subject {
        id: "biology",
        label: "Biology",
        emoji: "🧬",
        hints: &[
            "Name the parts",
            "Think about the process",
            "Use correct terms",
        ],
    },
    Subject {
        id: "history",
        label: "History",
        emoji: "🏛️",
        hints: &[
            "Think causes and effects",
            "Check the timeline",
            "Who did what?",
        ],
    },
    Subject {
        id: "geography",
        label: "Geography",
        emoji: "🌍",
        hints: &["Picture the map", "Relate places", "Climate matters"],
    },
    Subject {
        id: OTHER_SUBJECT_ID,
        label: "Other",
        emoji: "📝",
        hints: &["Stay with it", "You got this", "Small steps add up"],
    },
];

/// Look up a subject by id.
pub fn find_subject(id: &str) -> Option<&'static Subject> {
    SUBJECTS.iter().find(|s| s.id == id)
}

/// Look up a subject, falling back to `other` for unknown ids.
pub fn subject_or_other(id: &str) -> &'static Subject {
    find_subject(id).unwrap_or_else(other_subject)
}

pub fn other_subject() -> &'static Subject {
    // `other` is always the last catalog entry.
    &SUBJECTS[SUBJECTS.len() - 1]
}

/// Subjects offered to an age group, in display order.
pub fn subjects_for_age(age: AgeGroup) -> Vec<&'static Subject> {
    let ids: &[&str] = match age {
        AgeGroup::Young | AgeGroup::Elementary => &["math", "reading", "writing", "other"],
        AgeGroup::Tween => &[
            "math",
            "reading",
            "writing",
            "science",
            "history",
            "geography",
            "other",
        ],
        AgeGroup::Teen => &[
            "math",
            "reading",
            "writing",
            "science",
            "chemistry",
            "biology",
            "history",
            "geography",
            "other",
        ],
    };
    ids.iter().filter_map(|id| find_subject(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_subject_resolves_to_other() {
        let subject = subject_or_other("astrology");
        assert_eq!(subject.id, OTHER_SUBJECT_ID);
        assert_eq!(subject.emoji, "📝");
    }

    #[test]
    fn every_subject_has_hints() {
        for subject in &SUBJECTS {
            assert!(
                (3..=5).contains(&subject.hints.len()),
                "{} has {} hints",
                subject.id,
                subject.hints.len()
            );
        }
    }

    #[test]
    fn teen_catalog_covers_everything() {
        assert_eq!(subjects_for_age(AgeGroup::Teen).len(), SUBJECTS.len());
        assert_eq!(subjects_for_age(AgeGroup::Young)[0].id, "math");
    }
}

//! Static content tables: age profiles, subjects, prompts and rewards.

mod age;
mod prompts;
mod rewards;
mod subjects;

pub use age::{AgeGroup, AgeProfile, EncouragementLevel, LanguageComplexity, VoiceProfile};
pub use prompts::{question, Question, QuestionKind, ResponseOption};
pub use rewards::{
    encouragement_for, mystery_monday_change, token_award, RewardItem, SurpriseEvent,
    DEFAULT_SURPRISE_FREQUENCY, MYSTERY_MONDAY_CHANGES, REWARD_CATALOG, SURPRISE_EVENTS,
};
pub use subjects::{
    find_subject, other_subject, subject_or_other, subjects_for_age, Subject, OTHER_SUBJECT_ID,
    SUBJECTS,
};

//! Age-group profiles.
//!
//! Every age-dependent knob of a session (default cadences, tone of voice,
//! which subjects are offered) hangs off [`AgeGroup::profile`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Young,
    #[default]
    Elementary,
    Tween,
    Teen,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Young,
        AgeGroup::Elementary,
        AgeGroup::Tween,
        AgeGroup::Teen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Young => "young",
            AgeGroup::Elementary => "elementary",
            AgeGroup::Tween => "tween",
            AgeGroup::Teen => "teen",
        }
    }

    /// Parse an age-group id, falling back to `Elementary` for anything unknown.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn profile(&self) -> &'static AgeProfile {
        match self {
            AgeGroup::Young => &YOUNG,
            AgeGroup::Elementary => &ELEMENTARY,
            AgeGroup::Tween => &TWEEN,
            AgeGroup::Teen => &TEEN,
        }
    }

    /// Base check-in minutes used by the adaptive model before adjustment.
    ///
    /// Differs from [`AgeProfile::check_in_minutes`], which is
    /// the static cadence a session starts with.
    pub fn adaptive_base_minutes(&self) -> u32 {
        match self {
            AgeGroup::Young => 4,
            AgeGroup::Elementary => 5,
            AgeGroup::Tween => 7,
            AgeGroup::Teen => 9,
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "young" => Ok(AgeGroup::Young),
            "elementary" => Ok(AgeGroup::Elementary),
            "tween" => Ok(AgeGroup::Tween),
            "teen" => Ok(AgeGroup::Teen),
            other => Err(format!("unknown age group: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncouragementLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageComplexity {
    Simple,
    Moderate,
    Advanced,
    Mature,
}

/// Speech parameters for the buddy's voice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceProfile {
    pub language: &'static str,
    pub rate: f32,
    pub pitch: f32,
}

/// Static per-age configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeProfile {
    pub group: AgeGroup,
    pub display_range: &'static str,
    /// Default session length (minutes).
    pub session_minutes: u32,
    pub break_minutes: u32,
    /// Static check-in cadence a session starts with (minutes).
    pub check_in_minutes: u32,
    /// Interaction prompt cadence (minutes).
    pub interaction_minutes: u32,
    pub max_minutes: u32,
    pub encouragement: EncouragementLevel,
    pub language: LanguageComplexity,
    pub voice: VoiceProfile,
}

impl AgeProfile {
    pub fn session_secs(&self) -> u64 {
        self.session_minutes as u64 * 60
    }

    /// Whether lines for this age use the short, enthusiastic tone.
    pub fn simple_tone(&self) -> bool {
        self.group == AgeGroup::Young || self.encouragement == EncouragementLevel::High
    }

    pub fn start_message(&self) -> &'static str {
        match self.language {
            LanguageComplexity::Simple => "Yay! Let's learn together! You're amazing!",
            LanguageComplexity::Moderate => "Let's do this! I'm right here with you.",
            LanguageComplexity::Advanced => "Let's get this done.",
            LanguageComplexity::Mature => "Focus mode activated.",
        }
    }

    pub fn welcome_back_message(&self) -> &'static str {
        match self.language {
            LanguageComplexity::Simple => "Welcome back superstar!",
            LanguageComplexity::Moderate => "Welcome back! Ready to continue?",
            LanguageComplexity::Advanced => "Back at it. Nice.",
            LanguageComplexity::Mature => "Resuming.",
        }
    }

    pub fn completion_message(&self) -> &'static str {
        match self.language {
            LanguageComplexity::Simple => "Amazing job! You're a superstar!",
            LanguageComplexity::Moderate => "Excellent work! You did it!",
            LanguageComplexity::Advanced => "Solid work today.",
            LanguageComplexity::Mature => "Session complete.",
        }
    }
}

static YOUNG: AgeProfile = AgeProfile {
    group: AgeGroup::Young,
    display_range: "5-7",
    session_minutes: 10,
    break_minutes: 3,
    check_in_minutes: 2,
    interaction_minutes: 15,
    max_minutes: 20,
    encouragement: EncouragementLevel::High,
    language: LanguageComplexity::Simple,
    voice: VoiceProfile {
        language: "en-US",
        rate: 0.9,
        pitch: 1.2,
    },
};

static ELEMENTARY: AgeProfile = AgeProfile {
    group: AgeGroup::Elementary,
    display_range: "8-10",
    session_minutes: 15,
    break_minutes: 5,
    check_in_minutes: 5,
    interaction_minutes: 20,
    max_minutes: 30,
    encouragement: EncouragementLevel::Medium,
    language: LanguageComplexity::Moderate,
    voice: VoiceProfile {
        language: "en-US",
        rate: 1.0,
        pitch: 1.1,
    },
};

static TWEEN: AgeProfile = AgeProfile {
    group: AgeGroup::Tween,
    display_range: "11-13",
    session_minutes: 20,
    break_minutes: 5,
    check_in_minutes: 7,
    interaction_minutes: 25,
    max_minutes: 45,
    encouragement: EncouragementLevel::Medium,
    language: LanguageComplexity::Advanced,
    voice: VoiceProfile {
        language: "en-US",
        rate: 1.0,
        pitch: 1.0,
    },
};

static TEEN: AgeProfile = AgeProfile {
    group: AgeGroup::Teen,
    display_range: "14+",
    session_minutes: 25,
    break_minutes: 5,
    check_in_minutes: 10,
    interaction_minutes: 30,
    max_minutes: 60,
    encouragement: EncouragementLevel::Low,
    language: LanguageComplexity::Mature,
    voice: VoiceProfile {
        language: "en-US",
        rate: 1.05,
        pitch: 0.95,
    },
};

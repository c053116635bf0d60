use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::party::Party;

pub const MIN_QUESTION_COUNT: u32 = 5;
pub const MAX_QUESTION_COUNT: u32 = 120;
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

pub const DEFAULT_PARTY_ONE_NAME: &str = "Player 1";
pub const DEFAULT_PARTY_TWO_NAME: &str = "Player 2";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("exam name cannot be empty")]
    EmptyExam,

    #[error("subject name cannot be empty")]
    EmptySubject,

    #[error("question count must be between {min} and {max}, got {got}")]
    InvalidQuestionCount { got: u32, min: u32, max: u32 },

    #[error("at least one topic is required unless general syllabus generation is allowed")]
    MissingTopics,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("unknown quiz mode: {0}")]
    UnknownMode(String),
}

//
// ─── DIFFICULTY / MODE ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ConfigError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Whether one party plays alone or two parties alternate on every question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Solo,
    #[serde(alias = "1vs1")]
    Versus,
}

impl QuizMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Solo => "solo",
            QuizMode::Versus => "versus",
        }
    }

    /// Number of parties taking turns in this mode.
    #[must_use]
    pub fn party_count(self) -> usize {
        self.parties().len()
    }

    /// Parties in turn order.
    #[must_use]
    pub fn parties(self) -> &'static [Party] {
        match self {
            QuizMode::Solo => &[Party::One],
            QuizMode::Versus => &[Party::One, Party::Two],
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(Self::Solo),
            "versus" | "1vs1" | "vs" => Ok(Self::Versus),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Loose, caller-editable quiz setup. Call [`QuizConfigDraft::validate`] to obtain a
/// [`QuizConfig`] before starting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfigDraft {
    pub exam: String,
    pub subject: String,
    pub topics: Vec<String>,
    pub question_count: u32,
    pub difficulty: Difficulty,
    pub mode: QuizMode,
    pub party_one_name: Option<String>,
    pub party_two_name: Option<String>,
    pub allow_general_syllabus: bool,
}

impl Default for QuizConfigDraft {
    fn default() -> Self {
        Self {
            exam: String::new(),
            subject: String::new(),
            topics: Vec::new(),
            question_count: DEFAULT_QUESTION_COUNT,
            difficulty: Difficulty::default(),
            mode: QuizMode::default(),
            party_one_name: None,
            party_two_name: None,
            allow_general_syllabus: false,
        }
    }
}

impl QuizConfigDraft {
    #[must_use]
    pub fn new(exam: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            exam: exam.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_question_count(mut self, count: u32) -> Self {
        self.question_count = count;
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: QuizMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_party_names(mut self, one: Option<String>, two: Option<String>) -> Self {
        self.party_one_name = one;
        self.party_two_name = two;
        self
    }

    #[must_use]
    pub fn allow_general_syllabus(mut self, allow: bool) -> Self {
        self.allow_general_syllabus = allow;
        self
    }

    /// Validate the draft and resolve defaults once.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if exam/subject are blank, the question count is out of
    /// range, or topics are empty without general-syllabus permission.
    pub fn validate(self) -> Result<QuizConfig, ConfigError> {
        let exam = self.exam.trim().to_string();
        if exam.is_empty() {
            return Err(ConfigError::EmptyExam);
        }
        let subject = self.subject.trim().to_string();
        if subject.is_empty() {
            return Err(ConfigError::EmptySubject);
        }
        if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&self.question_count) {
            return Err(ConfigError::InvalidQuestionCount {
                got: self.question_count,
                min: MIN_QUESTION_COUNT,
                max: MAX_QUESTION_COUNT,
            });
        }

        let mut topics: Vec<String> = Vec::with_capacity(self.topics.len());
        for topic in self.topics {
            let topic = topic.trim();
            if !topic.is_empty() && !topics.iter().any(|t| t == topic) {
                topics.push(topic.to_string());
            }
        }
        if topics.is_empty() && !self.allow_general_syllabus {
            return Err(ConfigError::MissingTopics);
        }

        let party_one_name = resolve_name(self.party_one_name, DEFAULT_PARTY_ONE_NAME);
        let party_two_name = match self.mode {
            QuizMode::Solo => None,
            QuizMode::Versus => Some(resolve_name(self.party_two_name, DEFAULT_PARTY_TWO_NAME)),
        };

        Ok(QuizConfig {
            exam,
            subject,
            topics,
            question_count: self.question_count,
            difficulty: self.difficulty,
            mode: self.mode,
            party_one_name,
            party_two_name,
            allow_general_syllabus: self.allow_general_syllabus,
        })
    }
}

fn resolve_name(raw: Option<String>, fallback: &str) -> String {
    raw.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Immutable quiz setup, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizConfig {
    exam: String,
    subject: String,
    topics: Vec<String>,
    question_count: u32,
    difficulty: Difficulty,
    mode: QuizMode,
    party_one_name: String,
    party_two_name: Option<String>,
    allow_general_syllabus: bool,
}

impl QuizConfig {
    #[must_use]
    pub fn exam(&self) -> &str {
        &self.exam
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Requested count. The question list actually delivered is authoritative for loop bounds.
    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn party_one_name(&self) -> &str {
        &self.party_one_name
    }

    #[must_use]
    pub fn party_two_name(&self) -> Option<&str> {
        self.party_two_name.as_deref()
    }

    /// Display name for `party`; party two falls back to its default outside versus mode.
    #[must_use]
    pub fn party_name(&self, party: Party) -> &str {
        match party {
            Party::One => &self.party_one_name,
            Party::Two => self.party_two_name().unwrap_or(DEFAULT_PARTY_TWO_NAME),
        }
    }

    #[must_use]
    pub fn allows_general_syllabus(&self) -> bool {
        self.allow_general_syllabus
    }
}

/// Per-user preferences forwarded to the question provider as a hint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub preferred_topics: Vec<String>,
}

impl UserPreferences {
    #[must_use]
    pub fn with_topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            preferred_topics: topics.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuizConfigDraft {
        QuizConfigDraft::new("RRB NTPC", "Quantitative Aptitude").with_topics(["Algebra"])
    }

    #[test]
    fn validate_resolves_default_names_once() {
        let config = draft().with_mode(QuizMode::Versus).validate().unwrap();
        assert_eq!(config.party_one_name(), "Player 1");
        assert_eq!(config.party_two_name(), Some("Player 2"));
    }

    #[test]
    fn solo_has_no_party_two() {
        let config = draft()
            .with_party_names(Some("Asha".into()), Some("Ravi".into()))
            .validate()
            .unwrap();
        assert_eq!(config.party_one_name(), "Asha");
        assert_eq!(config.party_two_name(), None);
    }

    #[test]
    fn blank_names_fall_back() {
        let config = draft()
            .with_mode(QuizMode::Versus)
            .with_party_names(Some("   ".into()), Some(" Ravi ".into()))
            .validate()
            .unwrap();
        assert_eq!(config.party_one_name(), "Player 1");
        assert_eq!(config.party_two_name(), Some("Ravi"));
    }

    #[test]
    fn question_count_bounds_are_enforced() {
        let err = draft().with_question_count(4).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQuestionCount { got: 4, .. }));
        let err = draft().with_question_count(121).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQuestionCount { got: 121, .. }));
        assert!(draft().with_question_count(120).validate().is_ok());
    }

    #[test]
    fn empty_topics_need_permission() {
        let base = QuizConfigDraft::new("SBI PO", "English");
        assert_eq!(base.clone().validate().unwrap_err(), ConfigError::MissingTopics);
        let config = base.allow_general_syllabus(true).validate().unwrap();
        assert!(config.topics().is_empty());
    }

    #[test]
    fn topics_are_trimmed_and_deduplicated() {
        let config = draft()
            .with_topics(["Algebra", " Algebra ", "", "Geometry"])
            .validate()
            .unwrap();
        assert_eq!(config.topics(), ["Algebra", "Geometry"]);
    }

    #[test]
    fn blank_exam_is_rejected() {
        let err = QuizConfigDraft::new("  ", "English")
            .allow_general_syllabus(true)
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyExam);
    }

    #[test]
    fn mode_parses_legacy_label() {
        assert_eq!("1vs1".parse::<QuizMode>().unwrap(), QuizMode::Versus);
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn parties_follow_turn_order() {
        assert_eq!(QuizMode::Solo.parties(), &[Party::One]);
        assert_eq!(QuizMode::Versus.parties(), &[Party::One, Party::Two]);
        assert_eq!(QuizMode::Versus.party_count(), 2);
    }
}

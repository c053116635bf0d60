//! Static exam and syllabus catalog offered on the setup screen.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::model::{
    ConfigError, Difficulty, MAX_QUESTION_COUNT, MIN_QUESTION_COUNT, QuizConfig, QuizConfigDraft,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamCategory {
    pub name: &'static str,
    pub exams: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyllabusSubject {
    pub key: &'static str,
    pub name: &'static str,
    pub subtopics: &'static [&'static str],
}

pub const EXAM_CATEGORIES: &[ExamCategory] = &[
    ExamCategory {
        name: "Railway",
        exams: &["RRB NTPC", "RRB Group D", "RRB JE", "RRB ALP", "RPF"],
    },
    ExamCategory {
        name: "Bank",
        exams: &[
            "IBPS PO",
            "IBPS Clerk",
            "SBI PO",
            "SBI Clerk",
            "RBI Grade B",
            "RBI Assistant",
        ],
    },
];

pub const SYLLABUS: &[SyllabusSubject] = &[
    SyllabusSubject {
        key: "gs",
        name: "General Studies",
        subtopics: &[
            "Current Affairs",
            "History",
            "Geography",
            "Polity",
            "Economy",
            "Science",
        ],
    },
    SyllabusSubject {
        key: "quant",
        name: "Quantitative Aptitude",
        subtopics: &[
            "Arithmetic",
            "Algebra",
            "Geometry",
            "Trigonometry",
            "Mensuration",
            "DI",
        ],
    },
    SyllabusSubject {
        key: "english",
        name: "English",
        subtopics: &[
            "Reading Comprehension",
            "Cloze Test",
            "Error Spotting",
            "Vocabulary",
        ],
    },
    SyllabusSubject {
        key: "reasoning",
        name: "Reasoning",
        subtopics: &[
            "Puzzles",
            "Syllogism",
            "Coding-Decoding",
            "Blood Relations",
            "Series",
        ],
    },
];

/// Look a subject up by display name or short key, ignoring case.
#[must_use]
pub fn find_subject(name_or_key: &str) -> Option<&'static SyllabusSubject> {
    let needle = name_or_key.trim();
    SYLLABUS
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(needle) || s.key.eq_ignore_ascii_case(needle))
}

/// Iterate every exam across all categories.
pub fn all_exams() -> impl Iterator<Item = &'static str> {
    EXAM_CATEGORIES.iter().flat_map(|c| c.exams.iter().copied())
}

#[must_use]
pub fn is_known_exam(exam: &str) -> bool {
    all_exams().any(|e| e.eq_ignore_ascii_case(exam.trim()))
}

/// Setup-screen starting point: first exam, first subject, no topics.
#[must_use]
pub fn default_draft() -> QuizConfigDraft {
    let exam = all_exams().next().unwrap_or_default();
    let subject = SYLLABUS.first().map(|s| s.name).unwrap_or_default();
    QuizConfigDraft::new(exam, subject)
}

/// Randomize exam, subject, a single topic, question count and difficulty.
///
/// Mode and party names are carried over from `base`.
#[must_use]
pub fn surprise_draft<R: Rng + ?Sized>(rng: &mut R, base: QuizConfigDraft) -> QuizConfigDraft {
    let mut draft = base;

    if let Some(category) = EXAM_CATEGORIES.choose(rng) {
        if let Some(exam) = category.exams.choose(rng) {
            draft.exam = (*exam).to_string();
        }
    }
    if let Some(subject) = SYLLABUS.choose(rng) {
        draft.subject = subject.name.to_string();
        draft.topics = subject
            .subtopics
            .choose(rng)
            .map(|t| vec![(*t).to_string()])
            .unwrap_or_default();
    }
    draft.question_count = rng.random_range(MIN_QUESTION_COUNT..MAX_QUESTION_COUNT);
    if let Some(difficulty) = Difficulty::ALL.choose(rng) {
        draft.difficulty = *difficulty;
    }
    draft
}

/// Random solo quiz drawn from the catalog.
///
/// # Errors
///
/// Returns `ConfigError` only if the catalog itself is inconsistent.
pub fn surprise_config<R: Rng + ?Sized>(rng: &mut R) -> Result<QuizConfig, ConfigError> {
    surprise_draft(rng, default_draft()).validate()
}

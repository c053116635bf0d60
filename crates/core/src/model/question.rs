use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Every question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question list is empty")]
    Empty,

    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id} has no text")]
    EmptyText { id: QuestionId },

    #[error("question {id} must have exactly 4 options, got {count}")]
    WrongOptionCount { id: QuestionId, count: usize },

    #[error("question {id} has correct index {index} outside 0..=3")]
    CorrectIndexOutOfRange { id: QuestionId, index: u8 },

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Worked explanation attached to a question for the review screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub concept: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub tricks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_aid: Option<String>,
}

/// A multiple-choice question as produced by the question provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: u8,
    pub explanation: Explanation,
}

impl Question {
    /// Check the shape invariants: non-blank id and text, four options, index in range.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` found.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.id.is_blank() {
            return Err(QuestionError::EmptyId);
        }
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText {
                id: self.id.clone(),
            });
        }
        if self.options.len() != OPTION_COUNT {
            return Err(QuestionError::WrongOptionCount {
                id: self.id.clone(),
                count: self.options.len(),
            });
        }
        if usize::from(self.correct_index) >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange {
                id: self.id.clone(),
                index: self.correct_index,
            });
        }
        Ok(())
    }

    /// `None` never matches: an unanswered question is always incorrect.
    #[must_use]
    pub fn is_correct(&self, selected: Option<u8>) -> bool {
        selected == Some(self.correct_index)
    }

    #[must_use]
    pub fn option_text(&self, index: u8) -> Option<&str> {
        self.options.get(usize::from(index)).map(String::as_str)
    }

    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.option_text(self.correct_index)
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

/// Non-empty, validated, id-unique question list fixed for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// # Errors
    ///
    /// Returns `QuestionError::Empty` for an empty list, `DuplicateId` if ids repeat, or
    /// the first per-question validation failure.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::Empty);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            question.validate()?;
            if !seen.insert(&question.id) {
                return Err(QuestionError::DuplicateId(question.id.clone()));
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Question> {
        self.questions
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::question;
    use super::*;

    #[test]
    fn unanswered_is_never_correct() {
        let q = question("q1", 0);
        assert!(!q.is_correct(None));
        assert!(q.is_correct(Some(0)));
        assert!(!q.is_correct(Some(3)));
    }

    #[test]
    fn validate_rejects_wrong_option_count() {
        let mut q = question("q1", 1);
        q.options.pop();
        assert!(matches!(
            q.validate(),
            Err(QuestionError::WrongOptionCount { count: 3, .. })
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let q = question("q1", 4);
        assert!(matches!(
            q.validate(),
            Err(QuestionError::CorrectIndexOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn question_set_rejects_empty_and_duplicates() {
        assert_eq!(QuestionSet::new(Vec::new()), Err(QuestionError::Empty));
        let err = QuestionSet::new(vec![question("q1", 0), question("q1", 2)]).unwrap_err();
        assert_eq!(err, QuestionError::DuplicateId(QuestionId::new("q1")));
    }

    #[test]
    fn deserializes_provider_shape() {
        let json = r#"{
            "id": "ai-gen-0",
            "text": "2 + 2 = ?",
            "options": ["1", "2", "3", "4"],
            "correctIndex": 3,
            "explanation": {"concept": "Addition", "steps": ["add"], "tricks": [], "visualAid": "<svg/>"}
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_option(), Some("4"));
        assert_eq!(q.explanation.visual_aid.as_deref(), Some("<svg/>"));
        assert!(q.validate().is_ok());
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::config::QuizMode;
use crate::model::ids::QuestionId;
use crate::model::party::Party;
use crate::model::question::Question;

/// Outcome of one question for one party, kept so the review screen can be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question_id: QuestionId,
    pub selected_option: Option<u8>,
    pub is_correct: bool,
}

/// Scored result for a single party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub name: String,
    pub score: u32,
    pub accuracy: f64,
    pub time_taken: u32,
    pub answers: Vec<AnsweredQuestion>,
}

impl PlayerResult {
    /// Number of questions the party left unanswered.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.selected_option.is_none())
            .count()
    }
}

/// Terminal artifact of a finished quiz.
///
/// `questions` holds the full list, explanations included, so the review screen needs
/// no second fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub mode: QuizMode,
    pub total_questions: u32,
    pub questions: Vec<Question>,
    pub party_one: PlayerResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_two: Option<PlayerResult>,
}

/// Who won a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Solo,
    Winner(Party),
    Tie,
}

/// One row of the versus comparison table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadToHeadRow {
    pub index: usize,
    pub question_id: QuestionId,
    pub party_one_correct: bool,
    pub party_two_correct: bool,
}

/// A party's answer joined with the question it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem<'a> {
    pub question: &'a Question,
    pub selected_option: Option<u8>,
    pub selected_text: Option<&'a str>,
    pub correct_text: Option<&'a str>,
    pub is_correct: bool,
}

impl QuizResult {
    #[must_use]
    pub fn player(&self, party: Party) -> Option<&PlayerResult> {
        match party {
            Party::One => Some(&self.party_one),
            Party::Two => self.party_two.as_ref(),
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        let Some(two) = self.party_two.as_ref() else {
            return Outcome::Solo;
        };
        match self.party_one.score.cmp(&two.score) {
            std::cmp::Ordering::Greater => Outcome::Winner(Party::One),
            std::cmp::Ordering::Less => Outcome::Winner(Party::Two),
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }

    /// Per-question comparison of both parties. Empty for solo results.
    #[must_use]
    pub fn head_to_head(&self) -> Vec<HeadToHeadRow> {
        let Some(two) = self.party_two.as_ref() else {
            return Vec::new();
        };
        self.party_one
            .answers
            .iter()
            .zip(&two.answers)
            .enumerate()
            .map(|(index, (a, b))| HeadToHeadRow {
                index,
                question_id: a.question_id.clone(),
                party_one_correct: a.is_correct,
                party_two_correct: b.is_correct,
            })
            .collect()
    }

    /// Resolve each of `party`'s answers to its question by id.
    #[must_use]
    pub fn review_items(&self, party: Party) -> Vec<ReviewItem<'_>> {
        let Some(player) = self.player(party) else {
            return Vec::new();
        };
        let by_id: HashMap<&QuestionId, &Question> =
            self.questions.iter().map(|q| (&q.id, q)).collect();

        player
            .answers
            .iter()
            .filter_map(|answer| {
                let question = *by_id.get(&answer.question_id)?;
                Some(ReviewItem {
                    question,
                    selected_option: answer.selected_option,
                    selected_text: answer
                        .selected_option
                        .and_then(|idx| question.option_text(idx)),
                    correct_text: question.correct_option(),
                    is_correct: answer.is_correct,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::fixtures::question;

    fn player(name: &str, score: u32, answers: Vec<AnsweredQuestion>) -> PlayerResult {
        PlayerResult {
            name: name.into(),
            score,
            accuracy: 0.0,
            time_taken: 0,
            answers,
        }
    }

    fn answer(id: &str, selected: Option<u8>, is_correct: bool) -> AnsweredQuestion {
        AnsweredQuestion {
            question_id: QuestionId::new(id),
            selected_option: selected,
            is_correct,
        }
    }

    fn versus(one_score: u32, two_score: u32) -> QuizResult {
        QuizResult {
            mode: QuizMode::Versus,
            total_questions: 2,
            questions: vec![question("q1", 0), question("q2", 1)],
            party_one: player(
                "Asha",
                one_score,
                vec![answer("q1", Some(0), true), answer("q2", None, false)],
            ),
            party_two: Some(player(
                "Ravi",
                two_score,
                vec![answer("q1", Some(2), false), answer("q2", Some(1), true)],
            )),
        }
    }

    #[test]
    fn outcome_prefers_higher_score_and_reports_ties() {
        assert_eq!(versus(2, 1).outcome(), Outcome::Winner(Party::One));
        assert_eq!(versus(0, 1).outcome(), Outcome::Winner(Party::Two));
        assert_eq!(versus(1, 1).outcome(), Outcome::Tie);
    }

    #[test]
    fn head_to_head_lines_up_answers() {
        let rows = versus(1, 1).head_to_head();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].party_one_correct && !rows[0].party_two_correct);
        assert!(!rows[1].party_one_correct && rows[1].party_two_correct);
    }

    #[test]
    fn review_items_resolve_text_and_skips() {
        let result = versus(1, 1);
        let items = result.review_items(Party::One);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].selected_text, Some("A"));
        assert_eq!(items[1].selected_text, None);
        assert_eq!(items[1].correct_text, Some("B"));
        assert_eq!(result.party_one.skipped(), 1);
    }

    #[test]
    fn solo_result_serializes_without_party_two() {
        let mut result = versus(1, 0);
        result.mode = QuizMode::Solo;
        result.party_two = None;
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("partyTwo"));
        let back: QuizResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.outcome(), Outcome::Solo);
        assert!(back.head_to_head().is_empty());
    }
}

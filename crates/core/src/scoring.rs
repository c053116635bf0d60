//! Reduction of raw per-party answers into scored results.

use crate::model::{AnsweredQuestion, PlayerResult, Question, QuizMode, QuizResult};

/// Percentage of `score` over `total`, `0.0` when there is nothing to score.
#[must_use]
pub fn accuracy(score: u32, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    // Question lists are bounded well below f64's exact integer range.
    #[allow(clippy::cast_precision_loss)]
    let total = total as f64;
    100.0 * f64::from(score) / total
}

/// Score one party's answers against `questions`.
///
/// `answers[i]` belongs to `questions[i]`; missing trailing entries count as unanswered.
#[must_use]
pub fn score_party(
    questions: &[Question],
    answers: &[Option<u8>],
    elapsed_seconds: u32,
    name: &str,
) -> PlayerResult {
    let mut score = 0_u32;
    let answers: Vec<AnsweredQuestion> = questions
        .iter()
        .enumerate()
        .map(|(idx, question)| {
            let selected = answers.get(idx).copied().flatten();
            let is_correct = question.is_correct(selected);
            if is_correct {
                score = score.saturating_add(1);
            }
            AnsweredQuestion {
                question_id: question.id.clone(),
                selected_option: selected,
                is_correct,
            }
        })
        .collect();

    PlayerResult {
        name: name.to_string(),
        score,
        accuracy: accuracy(score, questions.len()),
        time_taken: elapsed_seconds,
        answers,
    }
}

/// Assemble the terminal result, retaining the full question list for review.
#[must_use]
pub fn build_result(
    mode: QuizMode,
    questions: Vec<Question>,
    party_one: PlayerResult,
    party_two: Option<PlayerResult>,
) -> QuizResult {
    let total_questions = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    QuizResult {
        mode,
        total_questions,
        questions,
        party_one,
        party_two: match mode {
            QuizMode::Solo => None,
            QuizMode::Versus => party_two,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::question;

    fn questions() -> Vec<Question> {
        vec![
            question("q1", 0),
            question("q2", 1),
            question("q3", 2),
            question("q4", 3),
        ]
    }

    #[test]
    fn score_counts_matching_answers() {
        let qs = questions();
        let result = score_party(&qs, &[Some(0), Some(0), Some(2), None], 42, "Asha");
        assert_eq!(result.score, 2);
        assert!((result.accuracy - 50.0).abs() < f64::EPSILON);
        assert_eq!(result.time_taken, 42);
        assert_eq!(result.name, "Asha");
        let flags: Vec<bool> = result.answers.iter().map(|a| a.is_correct).collect();
        assert_eq!(flags, [true, false, true, false]);
    }

    #[test]
    fn null_answers_are_incorrect_even_when_correct_index_is_zero() {
        let qs = vec![question("q1", 0), question("q2", 0)];
        let result = score_party(&qs, &[None, None], 0, "Solo");
        assert_eq!(result.score, 0);
        assert!(result.answers.iter().all(|a| !a.is_correct));
        assert_eq!(result.skipped(), 2);
    }

    #[test]
    fn short_answer_list_treats_missing_as_unanswered() {
        let qs = questions();
        let result = score_party(&qs, &[Some(0)], 5, "Asha");
        assert_eq!(result.score, 1);
        assert_eq!(result.answers.len(), 4);
        assert_eq!(result.answers[3].selected_option, None);
    }

    #[test]
    fn accuracy_guards_empty_lists() {
        assert!((accuracy(0, 0)).abs() < f64::EPSILON);
        let result = score_party(&[], &[], 0, "Nobody");
        assert_eq!(result.score, 0);
        assert!(result.accuracy.abs() < f64::EPSILON);
    }

    #[test]
    fn accuracy_matches_formula_for_thirds() {
        let value = accuracy(1, 3);
        assert!((value - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn every_answer_references_a_retained_question() {
        let qs = questions();
        let one = score_party(&qs, &[Some(1), None, Some(2), Some(3)], 10, "Asha");
        let two = score_party(&qs, &[None, Some(1), None, None], 12, "Ravi");
        let result = build_result(QuizMode::Versus, qs, one, Some(two));
        assert_eq!(result.total_questions, 4);
        for player in [&result.party_one, result.party_two.as_ref().unwrap()] {
            for answer in &player.answers {
                assert!(result.questions.iter().any(|q| q.id == answer.question_id));
            }
        }
    }

    #[test]
    fn solo_result_drops_party_two() {
        let qs = questions();
        let one = score_party(&qs, &[], 0, "Asha");
        let two = score_party(&qs, &[], 0, "Ravi");
        let result = build_result(QuizMode::Solo, qs, one, Some(two));
        assert!(result.party_two.is_none());
    }
}

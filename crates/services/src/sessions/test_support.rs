use quiz_core::model::{
    Explanation, Question, QuestionId, QuestionSet, QuizConfig, QuizConfigDraft, QuizMode,
};

/// Question `i` has `correct_index == i % 4`.
pub(crate) fn question_list(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question {
            id: QuestionId::new(format!("q{i}")),
            text: format!("Question {i}"),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index: u8::try_from(i % 4).unwrap(),
            explanation: Explanation {
                concept: format!("Concept {i}"),
                ..Explanation::default()
            },
        })
        .collect()
}

pub(crate) fn questions(n: usize) -> QuestionSet {
    QuestionSet::new(question_list(n)).unwrap()
}

pub(crate) fn config(mode: QuizMode) -> QuizConfig {
    QuizConfigDraft::new("RRB NTPC", "Reasoning")
        .with_topics(["Puzzles"])
        .with_mode(mode)
        .with_party_names(Some("Asha".into()), Some("Ravi".into()))
        .validate()
        .unwrap()
}

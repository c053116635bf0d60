mod config;
mod history;
mod ids;
mod party;
mod question;
mod result;

pub use config::{
    ConfigError, DEFAULT_PARTY_ONE_NAME, DEFAULT_PARTY_TWO_NAME, DEFAULT_QUESTION_COUNT,
    Difficulty, MAX_QUESTION_COUNT, MIN_QUESTION_COUNT, QuizConfig, QuizConfigDraft, QuizMode,
    UserPreferences,
};
pub use history::{AccuracyBand, HistoryRecord};
pub use ids::{HistoryId, ParseIdError, QuestionId, UserId};
pub use party::Party;
pub use question::{Explanation, OPTION_COUNT, Question, QuestionError, QuestionSet};
pub use result::{AnsweredQuestion, HeadToHeadRow, Outcome, PlayerResult, QuizResult, ReviewItem};

#[cfg(test)]
pub(crate) use question::fixtures;

use chrono::{DateTime, Utc};

use crate::model::ids::{HistoryId, UserId};

/// Summary row of one completed quiz, as read back from the history store.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub owner_id: UserId,
    pub recorded_at: DateTime<Utc>,
    pub exam: String,
    pub subject: String,
    pub score: u32,
    pub accuracy: f64,
    pub total_questions: u32,
}

impl HistoryRecord {
    #[must_use]
    pub fn band(&self) -> AccuracyBand {
        AccuracyBand::from_accuracy(self.accuracy)
    }
}

/// Coarse grouping of an accuracy percentage for activity lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyBand {
    Strong,
    Fair,
    Weak,
}

impl AccuracyBand {
    pub const STRONG_THRESHOLD: f64 = 80.0;
    pub const FAIR_THRESHOLD: f64 = 50.0;

    #[must_use]
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= Self::STRONG_THRESHOLD {
            Self::Strong
        } else if accuracy >= Self::FAIR_THRESHOLD {
            Self::Fair
        } else {
            Self::Weak
        }
    }
}

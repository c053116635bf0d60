use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{HistoryId, HistoryRecord, QuizResult, UserId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A finished quiz about to be appended to a user's history.
///
/// The summary columns are derived from party one of `result`; the full result is stored
/// alongside so the report can be rebuilt later.
#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    pub owner_id: UserId,
    pub recorded_at: DateTime<Utc>,
    pub exam: String,
    pub subject: String,
    pub result: QuizResult,
}

impl NewHistoryRecord {
    #[must_use]
    pub fn new(
        owner_id: UserId,
        recorded_at: DateTime<Utc>,
        exam: impl Into<String>,
        subject: impl Into<String>,
        result: QuizResult,
    ) -> Self {
        Self {
            owner_id,
            recorded_at,
            exam: exam.into(),
            subject: subject.into(),
            result,
        }
    }

    /// Summary row as it will read back once stored under `id`.
    #[must_use]
    pub fn summary(&self, id: HistoryId) -> HistoryRecord {
        HistoryRecord {
            id,
            owner_id: self.owner_id.clone(),
            recorded_at: self.recorded_at,
            exam: self.exam.clone(),
            subject: self.subject.clone(),
            score: self.result.party_one.score,
            accuracy: self.result.party_one.accuracy,
            total_questions: self.result.total_questions,
        }
    }
}

/// Repository contract for per-user quiz history.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a finished quiz and return its new identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_result(&self, record: &NewHistoryRecord) -> Result<HistoryId, StorageError>;

    /// List up to `limit` summaries for `owner`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_history(
        &self,
        owner: &UserId,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, StorageError>;

    /// List every summary for `owner`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_all_history(&self, owner: &UserId) -> Result<Vec<HistoryRecord>, StorageError>;

    /// Fetch the full stored result of one history entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: HistoryId) -> Result<QuizResult, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    history: Arc<Mutex<BTreeMap<HistoryId, NewHistoryRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn rows_for(&self, owner: &UserId) -> Result<Vec<HistoryRecord>, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<HistoryRecord> = guard
            .iter()
            .filter(|(_, record)| &record.owner_id == owner)
            .map(|(id, record)| record.summary(*id))
            .collect();
        rows.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append_result(&self, record: &NewHistoryRecord) -> Result<HistoryId, StorageError> {
        let mut guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = guard.keys().next_back().map_or(1, |id| id.value() + 1);
        let id = HistoryId::new(next);
        guard.insert(id, record.clone());
        Ok(id)
    }

    async fn list_history(
        &self,
        owner: &UserId,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        let mut rows = self.rows_for(owner)?;
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn list_all_history(&self, owner: &UserId) -> Result<Vec<HistoryRecord>, StorageError> {
        self.rows_for(owner)
    }

    async fn get_result(&self, id: HistoryId) -> Result<QuizResult, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&id)
            .map(|record| record.result.clone())
            .ok_or(StorageError::NotFound)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn HistoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let history: Arc<dyn HistoryRepository> = Arc::new(InMemoryRepository::new());
        Self { history }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::NewHistoryRecord;
    use chrono::{DateTime, Utc};
    use quiz_core::model::{
        AnsweredQuestion, Explanation, PlayerResult, Question, QuestionId, QuizMode, QuizResult,
        UserId,
    };

    pub(crate) fn solo_result(score: u32, total: u32) -> QuizResult {
        let questions: Vec<Question> = (0..total)
            .map(|i| Question {
                id: QuestionId::new(format!("q{i}")),
                text: format!("Question {i}"),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_index: 0,
                explanation: Explanation::default(),
            })
            .collect();
        let answers = questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let correct = u32::try_from(i).unwrap() < score;
                AnsweredQuestion {
                    question_id: q.id.clone(),
                    selected_option: Some(if correct { 0 } else { 1 }),
                    is_correct: correct,
                }
            })
            .collect();
        QuizResult {
            mode: QuizMode::Solo,
            total_questions: total,
            questions,
            party_one: PlayerResult {
                name: "Player 1".into(),
                score,
                accuracy: 100.0 * f64::from(score) / f64::from(total),
                time_taken: 30,
                answers,
            },
            party_two: None,
        }
    }

    pub(crate) fn record(owner: &str, at: DateTime<Utc>, score: u32) -> NewHistoryRecord {
        NewHistoryRecord::new(
            UserId::new(owner),
            at,
            "RRB NTPC",
            "Reasoning",
            solo_result(score, 10),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;
    use chrono::Duration;
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn lists_most_recent_first_per_owner() {
        let storage = Storage::in_memory();
        let now = fixed_now();
        storage
            .history
            .append_result(&record("u1", now - Duration::days(2), 3))
            .await
            .unwrap();
        let newest = storage
            .history
            .append_result(&record("u1", now, 7))
            .await
            .unwrap();
        storage
            .history
            .append_result(&record("u2", now, 9))
            .await
            .unwrap();

        let rows = storage
            .history
            .list_history(&UserId::new("u1"), 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, newest);
        assert_eq!(rows[0].score, 7);
        assert!((rows[0].accuracy - 70.0).abs() < 1e-9);
        assert_eq!(rows[1].score, 3);

        let limited = storage
            .history
            .list_history(&UserId::new("u1"), 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn list_all_history_ignores_any_page_size() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        for minutes in 0..600 {
            repo.append_result(&record("u1", now + Duration::minutes(minutes), 5))
                .await
                .unwrap();
        }
        repo.append_result(&record("u2", now, 9)).await.unwrap();

        let owner = UserId::new("u1");
        let all = repo.list_all_history(&owner).await.unwrap();
        assert_eq!(all.len(), 600);
        assert_eq!(all[0].recorded_at, now + Duration::minutes(599));
        assert_eq!(all[599].recorded_at, now);
        assert_eq!(repo.list_history(&owner, 500).await.unwrap().len(), 500);
    }

    #[tokio::test]
    async fn get_result_returns_full_copy() {
        let repo = InMemoryRepository::new();
        let id = repo
            .append_result(&record("u1", fixed_now(), 4))
            .await
            .unwrap();
        let result = repo.get_result(id).await.unwrap();
        assert_eq!(result.questions.len(), 10);
        assert_eq!(result.party_one.score, 4);

        let missing = repo.get_result(HistoryId::new(99)).await;
        assert!(matches!(missing, Err(StorageError::NotFound)));
    }
}

use quiz_core::model::{HistoryId, HistoryRecord, QuizResult, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, decode_result, encode_result, map_history_row, ser};
use crate::repository::{HistoryRepository, NewHistoryRecord, StorageError};

#[async_trait::async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append_result(&self, record: &NewHistoryRecord) -> Result<HistoryId, StorageError> {
        let full_result = encode_result(&record.result)?;
        let party_one = &record.result.party_one;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_history (
                    owner_id, recorded_at, exam, subject,
                    score, accuracy, total_questions, full_result
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(record.owner_id.as_str())
        .bind(record.recorded_at)
        .bind(&record.exam)
        .bind(&record.subject)
        .bind(i64::from(party_one.score))
        .bind(party_one.accuracy)
        .bind(i64::from(record.result.total_questions))
        .bind(full_result)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(HistoryId::new(res.last_insert_rowid()))
    }

    async fn list_history(
        &self,
        owner: &UserId,
        limit: u32,
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, owner_id, recorded_at, exam, subject,
                    score, accuracy, total_questions
                FROM quiz_history
                WHERE owner_id = ?1
                ORDER BY recorded_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(owner.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_history_row).collect()
    }

    async fn list_all_history(&self, owner: &UserId) -> Result<Vec<HistoryRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, owner_id, recorded_at, exam, subject,
                    score, accuracy, total_questions
                FROM quiz_history
                WHERE owner_id = ?1
                ORDER BY recorded_at DESC, id DESC
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_history_row).collect()
    }

    async fn get_result(&self, id: HistoryId) -> Result<QuizResult, StorageError> {
        let row = sqlx::query("SELECT full_result FROM quiz_history WHERE id = ?1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        let raw: String = row.try_get("full_result").map_err(ser)?;
        decode_result(&raw)
    }
}

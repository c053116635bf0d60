use quiz_core::model::{HistoryId, HistoryRecord, QuizResult, UserId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn encode_result(result: &QuizResult) -> Result<String, StorageError> {
    serde_json::to_string(result).map_err(ser)
}

pub(crate) fn decode_result(raw: &str) -> Result<QuizResult, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_history_row(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryRecord, StorageError> {
    let accuracy: f64 = row.try_get("accuracy").map_err(ser)?;
    if !accuracy.is_finite() {
        return Err(StorageError::Serialization(format!(
            "invalid accuracy: {accuracy}"
        )));
    }

    Ok(HistoryRecord {
        id: HistoryId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        owner_id: UserId::new(row.try_get::<String, _>("owner_id").map_err(ser)?),
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
        exam: row.try_get("exam").map_err(ser)?,
        subject: row.try_get("subject").map_err(ser)?,
        score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        accuracy,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counts_are_rejected() {
        assert!(matches!(
            u32_from_i64("score", -1),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(u32_from_i64("score", 7).unwrap(), 7);
    }

    #[test]
    fn malformed_result_json_is_a_serialization_error() {
        let err = decode_result("{\"mode\":\"solo\"").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}

use exam_core::model::{Difficulty, OptionLabel, Question, QuestionDraft, QuestionId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization("question_id sign overflow".into()))
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    let correct: String = row.try_get("correct").map_err(ser)?;

    QuestionDraft {
        id,
        prompt: row.try_get("prompt").map_err(ser)?,
        options: [
            row.try_get("option_a").map_err(ser)?,
            row.try_get("option_b").map_err(ser)?,
            row.try_get("option_c").map_err(ser)?,
            row.try_get("option_d").map_err(ser)?,
        ],
        category: row.try_get("category").map_err(ser)?,
        difficulty: difficulty.parse::<Difficulty>().map_err(ser)?,
        correct: correct.parse::<OptionLabel>().map_err(ser)?,
        explanation: row.try_get("explanation").map_err(ser)?,
    }
    .validate()
    .map_err(ser)
}

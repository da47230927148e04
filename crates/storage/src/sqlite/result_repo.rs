use exam_core::model::{Answer, ExamId, SessionId};
use exam_core::scoring::ExamResult;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, u32_from_i64};
use crate::repository::{ExamResultRecord, ExamResultRepository, ExamResultRow, StorageError};

fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<ExamResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let exam_id = ExamId::new(row.try_get::<String, _>("exam_id").map_err(ser)?).map_err(ser)?;
    let session_id = row
        .try_get::<String, _>("session_id")
        .map_err(ser)?
        .parse::<SessionId>()
        .map_err(ser)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let score = u8::try_from(row.try_get::<i64, _>("score").map_err(ser)?).map_err(ser)?;
    let time_spent =
        u32_from_i64("time_spent", row.try_get::<i64, _>("time_spent").map_err(ser)?)?;
    let answers: Vec<Answer> =
        serde_json::from_str(&row.try_get::<String, _>("answers").map_err(ser)?).map_err(ser)?;
    let answered = u32::try_from(answers.len()).map_err(ser)?;

    if correct > total || answered > total {
        return Err(StorageError::Serialization(format!(
            "inconsistent counts for result {id}"
        )));
    }

    Ok(ExamResultRow {
        id,
        record: ExamResultRecord {
            exam_id,
            session_id,
            completed_at: row.try_get("completed_at").map_err(ser)?,
            result: ExamResult {
                total,
                correct,
                wrong: total - correct,
                unanswered: total - answered,
                score,
                time_spent,
                answers,
            },
        },
    })
}

#[async_trait::async_trait]
impl ExamResultRepository for SqliteRepository {
    async fn append_result(&self, record: &ExamResultRecord) -> Result<i64, StorageError> {
        let answers = serde_json::to_string(&record.result.answers).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO exam_results (
                    exam_id, session_id, completed_at, total, correct, score, time_spent, answers
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(record.exam_id.as_str())
        .bind(record.session_id.to_string())
        .bind(record.completed_at)
        .bind(i64::from(record.result.total))
        .bind(i64::from(record.result.correct))
        .bind(i64::from(record.result.score))
        .bind(i64::from(record.result.time_spent))
        .bind(answers)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn recent_results(
        &self,
        exam_id: &ExamId,
        limit: u32,
    ) -> Result<Vec<ExamResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, exam_id, session_id, completed_at, total, correct,
                    score, time_spent, answers
                FROM exam_results
                WHERE exam_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(exam_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}

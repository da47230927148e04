use exam_core::model::{OptionLabel, Question};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_question_row, ser};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (
                id, prompt, option_a, option_b, option_c, option_d,
                category, difficulty, correct, explanation
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                prompt = excluded.prompt,
                option_a = excluded.option_a,
                option_b = excluded.option_b,
                option_c = excluded.option_c,
                option_d = excluded.option_d,
                category = excluded.category,
                difficulty = excluded.difficulty,
                correct = excluded.correct,
                explanation = excluded.explanation
            ",
        )
        .bind(id_i64("question_id", question.id().value())?)
        .bind(question.prompt())
        .bind(question.option(OptionLabel::A))
        .bind(question.option(OptionLabel::B))
        .bind(question.option(OptionLabel::C))
        .bind(question.option(OptionLabel::D))
        .bind(question.category())
        .bind(question.difficulty().as_str())
        .bind(question.correct().as_str())
        .bind(question.explanation())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn random_questions(
        &self,
        limit: u32,
        categories: &[String],
    ) -> Result<Vec<Question>, StorageError> {
        let mut sql = String::from(
            r"
            SELECT
                id, prompt, option_a, option_b, option_c, option_d,
                category, difficulty, correct, explanation
            FROM questions
            ",
        );

        if !categories.is_empty() {
            sql.push_str("WHERE category IN (");
            for i in 0..categories.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push('?');
                sql.push_str(&(i + 1).to_string());
            }
            sql.push_str(")\n");
        }
        sql.push_str("ORDER BY RANDOM() LIMIT ?");
        sql.push_str(&(categories.len() + 1).to_string());

        let mut query = sqlx::query(&sql);
        for category in categories {
            query = query.bind(category.as_str());
        }
        query = query.bind(i64::from(limit));

        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        let n: i64 = row.try_get("n").map_err(ser)?;
        u64::try_from(n).map_err(ser)
    }
}

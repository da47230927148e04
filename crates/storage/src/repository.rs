use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{ExamId, Question, QuestionId, SessionId, SessionSnapshot};
use exam_core::scoring::ExamResult;
use rand::seq::SliceRandom;
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

/// A finished exam as kept in the local history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamResultRecord {
    pub exam_id: ExamId,
    pub session_id: SessionId,
    pub completed_at: DateTime<Utc>,
    pub result: ExamResult,
}

/// Stored exam result with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamResultRow {
    pub id: i64,
    pub record: ExamResultRecord,
}

/// Local pool of questions, used when the remote question service is unavailable.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or replace a question by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Fetch up to `limit` questions in random order.
    ///
    /// An empty `categories` slice means any category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn random_questions(
        &self,
        limit: u32,
        categories: &[String],
    ) -> Result<Vec<Question>, StorageError>;

    /// Number of stored questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn count_questions(&self) -> Result<u64, StorageError>;
}

/// History of completed exams.
#[async_trait]
pub trait ExamResultRepository: Send + Sync {
    /// Append a result and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, record: &ExamResultRecord) -> Result<i64, StorageError>;

    /// Most recent results for an exam, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn recent_results(
        &self,
        exam_id: &ExamId,
        limit: u32,
    ) -> Result<Vec<ExamResultRow>, StorageError>;
}

/// Single-slot store for the session in progress.
#[async_trait]
pub trait SessionSnapshotRepository: Send + Sync {
    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;

    /// Load the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored payload is unreadable.
    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Remove the stored snapshot. Removing a missing snapshot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn clear_snapshot(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    results: Arc<Mutex<Vec<ExamResultRow>>>,
    snapshot: Arc<Mutex<Option<SessionSnapshot>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(lock_err)?;
        guard.insert(question.id(), question.clone());
        Ok(())
    }

    async fn random_questions(
        &self,
        limit: u32,
        categories: &[String],
    ) -> Result<Vec<Question>, StorageError> {
        let mut picked: Vec<Question> = {
            let guard = self.questions.lock().map_err(lock_err)?;
            guard
                .values()
                .filter(|q| categories.is_empty() || categories.iter().any(|c| c == q.category()))
                .cloned()
                .collect()
        };
        picked.shuffle(&mut rand::rng());
        picked.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(picked)
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let guard = self.questions.lock().map_err(lock_err)?;
        Ok(guard.len() as u64)
    }
}

#[async_trait]
impl ExamResultRepository for InMemoryRepository {
    async fn append_result(&self, record: &ExamResultRecord) -> Result<i64, StorageError> {
        let mut guard = self.results.lock().map_err(lock_err)?;
        if guard
            .iter()
            .any(|row| row.record.session_id == record.session_id)
        {
            return Err(StorageError::Conflict);
        }
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("result id overflow".into()))?;
        guard.push(ExamResultRow {
            id,
            record: record.clone(),
        });
        Ok(id)
    }

    async fn recent_results(
        &self,
        exam_id: &ExamId,
        limit: u32,
    ) -> Result<Vec<ExamResultRow>, StorageError> {
        let guard = self.results.lock().map_err(lock_err)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard
            .iter()
            .rev()
            .filter(|row| &row.record.exam_id == exam_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionSnapshotRepository for InMemoryRepository {
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let mut guard = self.snapshot.lock().map_err(lock_err)?;
        *guard = Some(snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self.snapshot.lock().map_err(lock_err)?;
        Ok(guard.clone())
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        let mut guard = self.snapshot.lock().map_err(lock_err)?;
        *guard = None;
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub results: Arc<dyn ExamResultRepository>,
    pub snapshots: Arc<dyn SessionSnapshotRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            questions: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            snapshots: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_questions;
    use exam_core::model::{ExamConfig, ExamSession};
    use exam_core::time::fixed_now;

    async fn seeded() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        for q in sample_questions() {
            repo.upsert_question(&q).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn random_questions_respects_limit_and_category() {
        let repo = seeded().await;

        let any = repo.random_questions(3, &[]).await.unwrap();
        assert_eq!(any.len(), 3);

        let net = repo
            .random_questions(100, &["Netzwerk".to_string()])
            .await
            .unwrap();
        assert!(!net.is_empty());
        assert!(net.iter().all(|q| q.category() == "Netzwerk"));
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let repo = seeded().await;
        let before = repo.count_questions().await.unwrap();
        let first = sample_questions().remove(0);
        repo.upsert_question(&first).await.unwrap();
        assert_eq!(repo.count_questions().await.unwrap(), before);
    }

    #[tokio::test]
    async fn recent_results_are_newest_first_per_exam() {
        let repo = InMemoryRepository::new();
        let exam_a = ExamId::new("a").unwrap();
        let exam_b = ExamId::new("b").unwrap();
        let result = exam_core::scoring::score(&[], &Default::default(), 60, 0);

        for exam in [&exam_a, &exam_b, &exam_a] {
            let record = ExamResultRecord {
                exam_id: exam.clone(),
                session_id: SessionId::new(),
                completed_at: fixed_now(),
                result: result.clone(),
            };
            repo.append_result(&record).await.unwrap();
        }

        let rows = repo.recent_results(&exam_a, 10).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn snapshot_slot_round_trips_and_clears() {
        let repo = seeded().await;
        let exam = ExamConfig::new(ExamId::new("x").unwrap(), "X", 5, 2).unwrap();
        let questions = repo.random_questions(2, &[]).await.unwrap();
        let session = ExamSession::start(SessionId::new(), exam, questions, fixed_now()).unwrap();
        let snapshot = session.snapshot().unwrap();

        repo.save_snapshot(&snapshot).await.unwrap();
        assert_eq!(repo.load_snapshot().await.unwrap(), Some(snapshot));

        repo.clear_snapshot().await.unwrap();
        assert_eq!(repo.load_snapshot().await.unwrap(), None);
    }
}

use std::sync::Arc;

use exam_core::model::ExamId;
use storage::repository::{ExamResultRow, SessionSnapshotRepository, Storage, StorageError};

use crate::Clock;
use crate::error::AppServicesError;
use crate::exam::{
    ExamController, HttpQuestionSource, HttpResultReporter, PoolQuestionSource,
    QuestionSetLoader, ReporterSet, ResultReporter, StoredResultReporter,
};
use crate::exam_api::{ApiConfig, ExamApiClient};

/// Assembles the exam runtime from storage and an optional remote backend.
///
/// With a backend, questions come from the exam endpoint with the random pool
/// endpoint as fallback, and results are posted as well as stored locally.
/// Without one, the local question pool is used.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    api: Option<ExamApiClient>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the HTTP client fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        api: Option<ApiConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api = api.map(ExamApiClient::new).transpose()?;
        Ok(Self {
            clock,
            storage,
            api,
        })
    }

    /// Build services over in-memory storage without a backend.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self {
            clock,
            storage: Storage::in_memory(),
            api: None,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn has_api(&self) -> bool {
        self.api.is_some()
    }

    #[must_use]
    pub fn loader(&self) -> QuestionSetLoader {
        match &self.api {
            Some(api) => QuestionSetLoader::new(Arc::new(HttpQuestionSource::exam(api.clone())))
                .with_fallback(Arc::new(HttpQuestionSource::random(api.clone()))),
            None => QuestionSetLoader::new(Arc::new(PoolQuestionSource::new(Arc::clone(
                &self.storage.questions,
            )))),
        }
    }

    #[must_use]
    pub fn reporter(&self) -> Arc<dyn ResultReporter> {
        let mut set = ReporterSet::new().with(Arc::new(StoredResultReporter::new(Arc::clone(
            &self.storage.results,
        ))));
        if let Some(api) = &self.api {
            set = set.with(Arc::new(HttpResultReporter::new(api.clone())));
        }
        Arc::new(set)
    }

    /// A fresh controller wired to this configuration.
    #[must_use]
    pub fn controller(&self) -> ExamController {
        ExamController::new(self.clock, self.loader(), self.reporter())
    }

    #[must_use]
    pub fn snapshots(&self) -> Arc<dyn SessionSnapshotRepository> {
        Arc::clone(&self.storage.snapshots)
    }

    /// Most recent results for `exam_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    pub async fn history(
        &self,
        exam_id: &ExamId,
        limit: u32,
    ) -> Result<Vec<ExamResultRow>, StorageError> {
        self.storage.results.recent_results(exam_id, limit).await
    }
}

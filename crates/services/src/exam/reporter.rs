use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{ExamId, SessionId};
use exam_core::scoring::ExamResult;
use storage::repository::{ExamResultRecord, ExamResultRepository};
use tracing::{debug, warn};

use crate::error::ReportError;
use crate::exam_api::ExamApiClient;

/// A scored session ready to be reported.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedExam {
    pub exam_id: ExamId,
    pub session_id: SessionId,
    pub completed_at: DateTime<Utc>,
    pub result: ExamResult,
}

/// Destination for completed exam results.
#[async_trait]
pub trait ResultReporter: Send + Sync {
    /// # Errors
    ///
    /// Returns `ReportError` if the result could not be delivered.
    async fn report(&self, exam: &CompletedExam) -> Result<(), ReportError>;
}

/// Posts results to the exam backend.
#[derive(Clone)]
pub struct HttpResultReporter {
    api: ExamApiClient,
}

impl HttpResultReporter {
    #[must_use]
    pub fn new(api: ExamApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResultReporter for HttpResultReporter {
    async fn report(&self, exam: &CompletedExam) -> Result<(), ReportError> {
        self.api.submit_result(exam).await?;
        Ok(())
    }
}

/// Appends results to the local history.
#[derive(Clone)]
pub struct StoredResultReporter {
    results: Arc<dyn ExamResultRepository>,
}

impl StoredResultReporter {
    #[must_use]
    pub fn new(results: Arc<dyn ExamResultRepository>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl ResultReporter for StoredResultReporter {
    async fn report(&self, exam: &CompletedExam) -> Result<(), ReportError> {
        let record = ExamResultRecord {
            exam_id: exam.exam_id.clone(),
            session_id: exam.session_id,
            completed_at: exam.completed_at,
            result: exam.result.clone(),
        };
        let id = self.results.append_result(&record).await?;
        debug!(row = id, session = %exam.session_id, "result stored");
        Ok(())
    }
}

/// Fans a result out to several reporters.
///
/// Every reporter is tried; the first failure is returned after all ran.
#[derive(Clone, Default)]
pub struct ReporterSet {
    reporters: Vec<Arc<dyn ResultReporter>>,
}

impl ReporterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, reporter: Arc<dyn ResultReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

#[async_trait]
impl ResultReporter for ReporterSet {
    async fn report(&self, exam: &CompletedExam) -> Result<(), ReportError> {
        let mut first_error = None;
        for reporter in &self.reporters {
            if let Err(err) = reporter.report(exam).await {
                warn!(session = %exam.session_id, error = %err, "result reporter failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

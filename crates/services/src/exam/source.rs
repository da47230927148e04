use std::sync::Arc;

use async_trait::async_trait;
use exam_core::model::{ExamConfig, Question};
use storage::repository::QuestionRepository;

use crate::error::SourceError;
use crate::exam_api::ExamApiClient;

/// What to ask a question source for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    pub count: u32,
    /// Empty means any category.
    pub categories: Vec<String>,
}

impl QuestionQuery {
    #[must_use]
    pub fn for_exam(exam: &ExamConfig) -> Self {
        Self {
            count: exam.question_count(),
            categories: exam.categories().to_vec(),
        }
    }
}

/// A place questions can be fetched from.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Short label used in logs and errors.
    fn name(&self) -> &str;

    /// Fetch questions for `query`. May return fewer than requested.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the source cannot answer.
    async fn fetch(&self, query: &QuestionQuery) -> Result<Vec<Question>, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Exam,
    Random,
}

/// Question source backed by the remote exam API.
#[derive(Clone)]
pub struct HttpQuestionSource {
    api: ExamApiClient,
    endpoint: Endpoint,
}

impl HttpQuestionSource {
    /// Exam-specific endpoint honoring the category filter.
    #[must_use]
    pub fn exam(api: ExamApiClient) -> Self {
        Self {
            api,
            endpoint: Endpoint::Exam,
        }
    }

    /// General random pool; ignores categories.
    #[must_use]
    pub fn random(api: ExamApiClient) -> Self {
        Self {
            api,
            endpoint: Endpoint::Random,
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    fn name(&self) -> &str {
        match self.endpoint {
            Endpoint::Exam => "api:exam",
            Endpoint::Random => "api:random",
        }
    }

    async fn fetch(&self, query: &QuestionQuery) -> Result<Vec<Question>, SourceError> {
        let questions = match self.endpoint {
            Endpoint::Exam => self.api.exam_questions(query).await?,
            Endpoint::Random => self.api.random_questions(query.count).await?,
        };
        Ok(questions)
    }
}

/// Question source backed by the local question pool.
#[derive(Clone)]
pub struct PoolQuestionSource {
    questions: Arc<dyn QuestionRepository>,
}

impl PoolQuestionSource {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QuestionSource for PoolQuestionSource {
    fn name(&self) -> &str {
        "pool"
    }

    async fn fetch(&self, query: &QuestionQuery) -> Result<Vec<Question>, SourceError> {
        Ok(self
            .questions
            .random_questions(query.count, &query.categories)
            .await?)
    }
}

//! HTTP client for the remote exam backend.

use std::env;
use std::time::Duration;

use exam_core::model::{
    Answer, Difficulty, OptionLabel, Question, QuestionDraft, QuestionError, QuestionId,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::ApiError;
use crate::exam::{CompletedExam, QuestionQuery};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut raw = base_url.trim().to_owned();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| ApiError::InvalidBaseUrl(format!("{raw}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(raw));
        }

        Ok(Self {
            base_url: url,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Attach a bearer token issued by the session-token service.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `EXAM_API_BASE_URL`, `EXAM_API_TOKEN` and `EXAM_API_TIMEOUT_SECS`.
    ///
    /// Returns `Ok(None)` when no base url is configured.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if the configured url is malformed.
    pub fn from_env() -> Result<Option<Self>, ApiError> {
        let Some(base_url) = env::var("EXAM_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
        else {
            return Ok(None);
        };

        let mut config = Self::new(&base_url)?;
        if let Ok(token) = env::var("EXAM_API_TOKEN") {
            config = config.with_token(token);
        }
        if let Some(secs) = env::var("EXAM_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(Some(config))
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Typed access to the exam backend endpoints.
#[derive(Clone)]
pub struct ExamApiClient {
    client: Client,
    config: ApiConfig,
}

impl ExamApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// `GET exam/questions?count=N&categories=a,b`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures, non-success status, or a
    /// response that does not validate.
    #[instrument(skip(self, query), fields(count = query.count))]
    pub async fn exam_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, ApiError> {
        let mut url = self.endpoint("exam/questions")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("count", &query.count.to_string());
            if !query.categories.is_empty() {
                pairs.append_pair("categories", &query.categories.join(","));
            }
        }
        self.fetch_questions(url).await
    }

    /// `GET questions/random?count=N`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures, non-success status, or a
    /// response that does not validate.
    #[instrument(skip(self))]
    pub async fn random_questions(&self, count: u32) -> Result<Vec<Question>, ApiError> {
        let mut url = self.endpoint("questions/random")?;
        url.query_pairs_mut()
            .append_pair("count", &count.to_string());
        self.fetch_questions(url).await
    }

    /// `POST exam/submit`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or a non-success status.
    #[instrument(skip(self, exam), fields(exam = %exam.exam_id, session = %exam.session_id))]
    pub async fn submit_result(&self, exam: &CompletedExam) -> Result<(), ApiError> {
        let url = self.endpoint("exam/submit")?;
        let body = SubmitRequest {
            exam_id: exam.exam_id.as_str(),
            session_id: exam.session_id.to_string(),
            answers: &exam.result.answers,
            time_spent: exam.result.time_spent,
        };

        let response = self.request(Method::POST, url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(())
    }

    async fn fetch_questions(&self, url: Url) -> Result<Vec<Question>, ApiError> {
        let response = self.request(Method::GET, url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let records: Vec<QuestionRecord> =
            serde_json::from_str(&body).map_err(|e| ApiError::Schema(e.to_string()))?;

        records
            .into_iter()
            .map(|record| {
                let id = record.id;
                record
                    .into_question()
                    .map_err(|e| ApiError::Schema(format!("question {id}: {e}")))
            })
            .collect()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    id: u64,
    question_text: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    correct_answer: String,
    category: String,
    #[serde(default)]
    difficulty: Option<DifficultyRecord>,
    #[serde(default)]
    explanation: Option<String>,
}

/// The backend sends either a tier number or an upper-case label.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DifficultyRecord {
    Tier(u8),
    Label(String),
}

impl QuestionRecord {
    fn into_question(self) -> Result<Question, QuestionError> {
        let difficulty = match self.difficulty {
            None => Difficulty::default(),
            Some(DifficultyRecord::Tier(tier)) => Difficulty::from_tier(tier)?,
            Some(DifficultyRecord::Label(label)) => label.parse()?,
        };

        QuestionDraft {
            id: QuestionId::new(self.id),
            prompt: self.question_text,
            options: [self.option_a, self.option_b, self.option_c, self.option_d],
            category: self.category,
            difficulty,
            correct: self.correct_answer.parse::<OptionLabel>()?,
            explanation: self.explanation,
        }
        .validate()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    exam_id: &'a str,
    session_id: String,
    answers: &'a [Answer],
    time_spent: u32,
}

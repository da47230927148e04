use std::collections::HashSet;
use std::sync::Arc;

use exam_core::model::Question;
use tracing::{debug, warn};

use super::source::{QuestionQuery, QuestionSource};
use crate::error::{LoadError, SourceError};

/// Fetches the question set for a session, falling back to a second source.
///
/// Never yields an empty set. Duplicate ids are dropped (first wins) and
/// overlong results are cut to `query.count`.
#[derive(Clone)]
pub struct QuestionSetLoader {
    primary: Arc<dyn QuestionSource>,
    fallback: Option<Arc<dyn QuestionSource>>,
}

impl QuestionSetLoader {
    #[must_use]
    pub fn new(primary: Arc<dyn QuestionSource>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn QuestionSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Load questions for `query`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Unavailable` when the only source fails and
    /// `LoadError::Exhausted` when primary and fallback both fail.
    pub async fn load(&self, query: &QuestionQuery) -> Result<Vec<Question>, LoadError> {
        let primary = match fetch_normalized(self.primary.as_ref(), query).await {
            Ok(questions) => return Ok(questions),
            Err(err) => err,
        };

        let Some(fallback) = &self.fallback else {
            return Err(LoadError::Unavailable {
                source_name: self.primary.name().to_owned(),
                cause: primary,
            });
        };

        warn!(
            primary = self.primary.name(),
            fallback = fallback.name(),
            error = %primary,
            "primary question source failed; using fallback"
        );

        fetch_normalized(fallback.as_ref(), query)
            .await
            .map_err(|fallback| LoadError::Exhausted { primary, fallback })
    }
}

async fn fetch_normalized(
    source: &dyn QuestionSource,
    query: &QuestionQuery,
) -> Result<Vec<Question>, SourceError> {
    let fetched = source.fetch(query).await?;
    let questions = normalize(fetched, query.count as usize);
    if questions.is_empty() {
        return Err(SourceError::Empty);
    }

    if questions.len() < query.count as usize {
        warn!(
            source = source.name(),
            requested = query.count,
            received = questions.len(),
            "question source returned a short set"
        );
    } else {
        debug!(source = source.name(), count = questions.len(), "questions loaded");
    }
    Ok(questions)
}

fn normalize(questions: Vec<Question>, limit: usize) -> Vec<Question> {
    let mut seen = HashSet::new();
    questions
        .into_iter()
        .filter(|q| seen.insert(q.id()))
        .take(limit)
        .collect()
}

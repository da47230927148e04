use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ExamId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamConfigError {
    #[error("exam title must not be empty")]
    EmptyTitle,

    #[error("exam duration must be at least one minute")]
    ZeroDuration,

    #[error("exam must ask at least one question")]
    ZeroQuestions,
}

/// Definition of a timed mock exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamConfig {
    id: ExamId,
    title: String,
    duration_minutes: u32,
    question_count: u32,
    categories: Vec<String>,
}

impl ExamConfig {
    /// # Errors
    ///
    /// Returns `ExamConfigError` if the title is blank or duration/count is zero.
    pub fn new(
        id: ExamId,
        title: impl Into<String>,
        duration_minutes: u32,
        question_count: u32,
    ) -> Result<Self, ExamConfigError> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(ExamConfigError::EmptyTitle);
        }
        if duration_minutes == 0 {
            return Err(ExamConfigError::ZeroDuration);
        }
        if question_count == 0 {
            return Err(ExamConfigError::ZeroQuestions);
        }

        Ok(Self {
            id,
            title: title.to_owned(),
            duration_minutes,
            question_count,
            categories: Vec::new(),
        })
    }

    /// Restrict the exam to the given categories. Blank entries are ignored.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories
            .into_iter()
            .map(Into::into)
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn id(&self) -> &ExamId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Total time budget in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

/// Built-in mock exams.
#[must_use]
pub fn catalog() -> Vec<ExamConfig> {
    const PRESETS: [(&str, &str, u32, u32, &[&str]); 4] = [
        ("ap1-mock", "AP1 Probeklausur", 90, 40, &[]),
        ("netzwerk-exam", "Netzwerktechnik Prüfung", 45, 25, &["Netzwerk"]),
        ("database-exam", "Datenbank Prüfung", 60, 30, &["Datenbanken"]),
        ("programming-exam", "Programmierung Prüfung", 75, 35, &["Programmierung"]),
    ];

    PRESETS
        .iter()
        .filter_map(|(id, title, minutes, count, categories)| {
            let id = ExamId::new(*id).ok()?;
            let exam = ExamConfig::new(id, *title, *minutes, *count).ok()?;
            Some(exam.with_categories(categories.iter().copied()))
        })
        .collect()
}

/// Look up a built-in exam by id.
#[must_use]
pub fn find_in_catalog(id: &str) -> Option<ExamConfig> {
    catalog().into_iter().find(|exam| exam.id().as_str() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_duration_and_count() {
        let id = ExamId::new("x").unwrap();
        assert_eq!(
            ExamConfig::new(id.clone(), "X", 0, 5).unwrap_err(),
            ExamConfigError::ZeroDuration
        );
        assert_eq!(
            ExamConfig::new(id.clone(), "X", 5, 0).unwrap_err(),
            ExamConfigError::ZeroQuestions
        );
        assert_eq!(
            ExamConfig::new(id, "  ", 5, 5).unwrap_err(),
            ExamConfigError::EmptyTitle
        );
    }

    #[test]
    fn duration_is_reported_in_seconds() {
        let exam = ExamConfig::new(ExamId::new("x").unwrap(), "X", 45, 25).unwrap();
        assert_eq!(exam.duration_secs(), 2700);
    }

    #[test]
    fn catalog_contains_all_presets() {
        let exams = catalog();
        assert_eq!(exams.len(), 4);
        let ap1 = find_in_catalog("ap1-mock").unwrap();
        assert_eq!(ap1.duration_minutes(), 90);
        assert_eq!(ap1.question_count(), 40);
        assert!(ap1.categories().is_empty());
        let net = find_in_catalog("netzwerk-exam").unwrap();
        assert_eq!(net.categories(), ["Netzwerk".to_string()]);
    }

    #[test]
    fn with_categories_skips_blank_entries() {
        let exam = ExamConfig::new(ExamId::new("x").unwrap(), "X", 1, 1)
            .unwrap()
            .with_categories(["", " SQL ", "  "]);
        assert_eq!(exam.categories(), ["SQL".to_string()]);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt must not be empty")]
    EmptyPrompt,

    #[error("option {0} must not be empty")]
    EmptyOption(OptionLabel),

    #[error("question category must not be empty")]
    EmptyCategory,

    #[error("invalid option label: {0:?}")]
    InvalidLabel(String),

    #[error("invalid difficulty: {0:?}")]
    InvalidDifficulty(String),
}

//
// ─── OPTION LABEL ─────────────────────────────────────────────────────────────
//

/// One of the four answer slots of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [Self::A, Self::B, Self::C, Self::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Position of this label within `OptionLabel::ALL`.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            "C" | "c" => Ok(Self::C),
            "D" | "d" => Ok(Self::D),
            other => Err(QuestionError::InvalidLabel(other.to_owned())),
        }
    }
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Maps a numeric tier (1 = easy, 2 = medium, 3 = hard).
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidDifficulty` for tiers outside 1..=3.
    pub fn from_tier(tier: u8) -> Result<Self, QuestionError> {
        match tier {
            1 => Ok(Self::Easy),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Hard),
            other => Err(QuestionError::InvalidDifficulty(other.to_string())),
        }
    }

    #[must_use]
    pub fn tier(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(QuestionError::InvalidDifficulty(s.to_owned())),
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Unvalidated question data as it arrives from a source or a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub options: [String; 4],
    pub category: String,
    pub difficulty: Difficulty,
    pub correct: OptionLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Check the draft and turn it into an immutable `Question`.
    ///
    /// Text fields are trimmed; a blank explanation is dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt, any option, or the category is blank.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(QuestionError::EmptyCategory);
        }

        let mut options: [String; 4] = Default::default();
        for label in OptionLabel::ALL {
            let text = self.options[label.index()].trim();
            if text.is_empty() {
                return Err(QuestionError::EmptyOption(label));
            }
            options[label.index()] = text.to_owned();
        }

        let explanation = self
            .explanation
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        Ok(Question {
            id: self.id,
            prompt: prompt.to_owned(),
            options,
            category: category.to_owned(),
            difficulty: self.difficulty,
            correct: self.correct,
            explanation,
        })
    }
}

/// A multiple-choice question with four options and one correct label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: [String; 4],
    category: String,
    difficulty: Difficulty,
    correct: OptionLabel,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    /// Options paired with their labels, in A..D order.
    pub fn options(&self) -> impl Iterator<Item = (OptionLabel, &str)> {
        OptionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.option(label)))
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn correct(&self) -> OptionLabel {
        self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, selected: OptionLabel) -> bool {
        self.correct == selected
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            prompt: q.prompt,
            options: q.options,
            category: q.category,
            difficulty: q.difficulty,
            correct: q.correct,
            explanation: q.explanation,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(7),
            prompt: "  Which layer does TCP belong to?  ".into(),
            options: [
                "Network".into(),
                "Transport".into(),
                "Session".into(),
                "Application".into(),
            ],
            category: "Netzwerk".into(),
            difficulty: Difficulty::Easy,
            correct: OptionLabel::B,
            explanation: Some("   ".into()),
        }
    }

    #[test]
    fn validate_trims_and_drops_blank_explanation() {
        let q = draft().validate().unwrap();
        assert_eq!(q.prompt(), "Which layer does TCP belong to?");
        assert_eq!(q.explanation(), None);
        assert_eq!(q.option(OptionLabel::B), "Transport");
        assert!(q.is_correct(OptionLabel::B));
        assert!(!q.is_correct(OptionLabel::A));
    }

    #[test]
    fn validate_rejects_blank_option() {
        let mut d = draft();
        d.options[2] = " ".into();
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyOption(OptionLabel::C));
    }

    #[test]
    fn validate_rejects_blank_prompt_and_category() {
        let mut d = draft();
        d.prompt = String::new();
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyPrompt);

        let mut d = draft();
        d.category = "\t".into();
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyCategory);
    }

    #[test]
    fn label_parses_case_insensitively() {
        assert_eq!("c".parse::<OptionLabel>().unwrap(), OptionLabel::C);
        assert_eq!(" D ".parse::<OptionLabel>().unwrap(), OptionLabel::D);
        assert!("E".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn difficulty_accepts_words_and_tiers() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(Difficulty::from_tier(1).unwrap(), Difficulty::Easy);
        assert!(Difficulty::from_tier(4).is_err());
    }

    #[test]
    fn deserialize_runs_validation() {
        let q = draft().validate().unwrap();
        let json = serde_json::to_string(&q).unwrap();
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);

        let bad = json.replace("Transport", " ");
        assert!(serde_json::from_str::<Question>(&bad).is_err());
    }
}

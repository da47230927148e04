use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::{OptionLabel, Question};

/// A user's selection for one question, graded when it is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    question_id: QuestionId,
    #[serde(rename = "selectedAnswer")]
    selected: OptionLabel,
    is_correct: bool,
}

impl Answer {
    /// Grade `selected` against `question`.
    #[must_use]
    pub fn grade(question: &Question, selected: OptionLabel) -> Self {
        Self {
            question_id: question.id(),
            selected,
            is_correct: question.is_correct(selected),
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn selected(&self) -> OptionLabel {
        self.selected
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

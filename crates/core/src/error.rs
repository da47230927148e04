use thiserror::Error;

use crate::model::{ExamConfigError, ParseIdError, QuestionError, SessionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    ExamConfig(#[from] ExamConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}

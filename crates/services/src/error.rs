//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{SessionError, SessionId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::exam::ExamPhase;

/// Errors emitted by `ExamApiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(String),
    #[error("exam api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("exam api response did not match the expected shape: {0}")]
    Schema(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by a single `QuestionSource`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("question source returned no questions")]
    Empty,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionSetLoader`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("question source {source_name} failed: {cause}")]
    Unavailable {
        source_name: String,
        #[source]
        cause: SourceError,
    },
    #[error("primary ({primary}) and fallback ({fallback}) question sources both failed")]
    Exhausted {
        primary: SourceError,
        fallback: SourceError,
    },
}

/// Errors emitted by result reporters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ExamController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("cannot do that while the exam is {0}")]
    InvalidPhase(ExamPhase),
    #[error("no exam session in progress")]
    NoSession,
    #[error("load response belongs to a superseded session")]
    StaleLoad,
    #[error("session {0} was already finished")]
    AlreadyFinished(SessionId),
    #[error("exam timer needs a running tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

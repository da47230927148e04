#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod exam;
pub mod exam_api;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use error::{ApiError, AppServicesError, ExamError, LoadError, ReportError, SourceError};
pub use exam::{
    CompletedExam, ExamController, ExamPhase, ExamTimer, HttpQuestionSource, HttpResultReporter,
    LoadTicket, PoolQuestionSource, QuestionQuery, QuestionSetLoader, QuestionSource,
    ReporterSet, ResultReporter, StoredResultReporter, TimerHandle, TimerTick,
};
pub use exam_api::{ApiConfig, ExamApiClient};

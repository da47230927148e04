//! Timed exam sessions: question loading, the countdown, and result reporting.

mod controller;
mod loader;
mod reporter;
mod source;
mod timer;

pub use controller::{ExamController, ExamPhase, LoadTicket};
pub use loader::QuestionSetLoader;
pub use reporter::{
    CompletedExam, HttpResultReporter, ReporterSet, ResultReporter, StoredResultReporter,
};
pub use source::{HttpQuestionSource, PoolQuestionSource, QuestionQuery, QuestionSource};
pub use timer::{ExamTimer, TimerHandle, TimerTick};

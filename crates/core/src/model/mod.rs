mod answer;
mod exam;
mod ids;
mod question;
mod session;
mod snapshot;

pub use answer::Answer;
pub use exam::{ExamConfig, ExamConfigError, catalog, find_in_catalog};
pub use ids::{ExamId, ParseIdError, QuestionId, SessionId};
pub use question::{Difficulty, OptionLabel, Question, QuestionDraft, QuestionError};
pub use session::{
    ExamSession, LOW_TIME_THRESHOLD_SECS, SessionError, SessionProgress, SessionStatus,
    SubmissionCheck, TickOutcome,
};
pub use snapshot::SessionSnapshot;

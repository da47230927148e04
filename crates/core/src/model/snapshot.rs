use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Answer, ExamConfig, Question, SessionId};

/// Serializable copy of an active session.
///
/// Produced by `ExamSession::snapshot` and consumed by `ExamSession::restore`,
/// which re-checks every session invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub exam: ExamConfig,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub current_index: usize,
    pub remaining_secs: u32,
    pub low_time_warned: bool,
    pub started_at: DateTime<Utc>,
}

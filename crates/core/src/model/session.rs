use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    Answer, ExamConfig, OptionLabel, Question, QuestionId, SessionId, SessionSnapshot,
};
use crate::scoring::{self, ExamResult};

/// Remaining time (seconds) at which the one-time low-time warning fires.
pub const LOW_TIME_THRESHOLD_SECS: u32 = 300;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),

    #[error("session is {actual}, expected {expected}")]
    InvalidState {
        expected: SessionStatus,
        actual: SessionStatus,
    },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(&'static str),
}

//
// ─── STATUS / OUTCOMES ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Submitting,
    Completed,
    Abandoned,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    /// True once the session reached a terminal state.
    #[must_use]
    pub fn is_ended(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session was not active; nothing changed.
    Ignored,
    Running { remaining: u32 },
    /// Remaining time just crossed the low-time threshold. Fires once.
    LowTime { remaining: u32 },
    /// Time ran out; the session moved to `Submitting`. Fires once.
    Expired,
}

/// What the caller should confirm before submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionCheck {
    Ready,
    Unanswered { unanswered: usize, total: usize },
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub current_index: usize,
    pub remaining_secs: u32,
    pub status: SessionStatus,
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// One timed attempt at a fixed sequence of questions.
///
/// The question sequence is fixed at start. `current_index` always points at a
/// valid question, the answer map only holds ids from the sequence, and no
/// answer is accepted once the session has left `Active`.
#[derive(Debug, Clone)]
pub struct ExamSession {
    id: SessionId,
    exam: ExamConfig,
    questions: Vec<Question>,
    answers: HashMap<QuestionId, Answer>,
    current: usize,
    remaining_secs: u32,
    status: SessionStatus,
    low_time_warned: bool,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Start an active session with the full time budget.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty, or
    /// `SessionError::DuplicateQuestion` if an id repeats.
    pub fn start(
        id: SessionId,
        exam: ExamConfig,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        check_questions(&questions)?;
        let remaining_secs = exam.duration_secs();

        Ok(Self {
            id,
            exam,
            questions,
            answers: HashMap::new(),
            current: 0,
            remaining_secs,
            status: SessionStatus::Active,
            low_time_warned: false,
            started_at,
            ended_at: None,
        })
    }

    /// Rebuild an active session from a snapshot.
    ///
    /// Answers are re-graded against the snapshot's questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the snapshot breaks a session invariant.
    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, SessionError> {
        check_questions(&snapshot.questions)?;
        if snapshot.current_index >= snapshot.questions.len() {
            return Err(SessionError::InvalidSnapshot("current index out of range"));
        }
        if snapshot.remaining_secs == 0 {
            return Err(SessionError::InvalidSnapshot("no time left"));
        }
        if snapshot.remaining_secs > snapshot.exam.duration_secs() {
            return Err(SessionError::InvalidSnapshot(
                "remaining time exceeds exam duration",
            ));
        }

        let mut session = Self {
            id: snapshot.session_id,
            exam: snapshot.exam,
            questions: snapshot.questions,
            answers: HashMap::new(),
            current: snapshot.current_index,
            remaining_secs: snapshot.remaining_secs,
            status: SessionStatus::Active,
            low_time_warned: snapshot.low_time_warned,
            started_at: snapshot.started_at,
            ended_at: None,
        };
        for answer in snapshot.answers {
            session.answer(answer.question_id(), answer.selected())?;
        }
        Ok(session)
    }

    /// Capture the fields needed to resume this session later.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is active.
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.ensure(SessionStatus::Active)?;
        Ok(SessionSnapshot {
            session_id: self.id,
            exam: self.exam.clone(),
            questions: self.questions.clone(),
            answers: self.answers_in_order(),
            current_index: self.current,
            remaining_secs: self.remaining_secs,
            low_time_warned: self.low_time_warned,
            started_at: self.started_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn exam(&self) -> &ExamConfig {
        &self.exam
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    /// Captured answers in question order.
    #[must_use]
    pub fn answers_in_order(&self) -> Vec<Answer> {
        self.questions
            .iter()
            .filter_map(|q| self.answers.get(&q.id()).copied())
            .collect()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.questions.len().saturating_sub(self.answers.len())
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.exam.duration_secs()
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.duration_secs().saturating_sub(self.remaining_secs)
    }

    #[must_use]
    pub fn low_time_warned(&self) -> bool {
        self.low_time_warned
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answered_count(),
            current_index: self.current,
            remaining_secs: self.remaining_secs,
            status: self.status,
        }
    }

    /// Record (or replace) the answer for `question_id`.
    ///
    /// Does not move the current position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is not active, or
    /// `SessionError::UnknownQuestion` if the id is not in this session.
    pub fn answer(
        &mut self,
        question_id: QuestionId,
        selected: OptionLabel,
    ) -> Result<Answer, SessionError> {
        self.ensure(SessionStatus::Active)?;
        let question = self
            .questions
            .iter()
            .find(|q| q.id() == question_id)
            .ok_or(SessionError::UnknownQuestion(question_id))?;

        let answer = Answer::grade(question, selected);
        self.answers.insert(question_id, answer);
        Ok(answer)
    }

    /// Answer the question at the current position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is not active.
    pub fn answer_current(&mut self, selected: OptionLabel) -> Result<Answer, SessionError> {
        let id = self.current_question().id();
        self.answer(id, selected)
    }

    /// Move to the next question, staying on the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is not active.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        self.go_to(self.current.saturating_add(1))
    }

    /// Move to the previous question, staying on the first one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is not active.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.go_to(self.current.saturating_sub(1))
    }

    /// Jump to `index`, clamped to the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is not active.
    pub fn go_to(&mut self, index: usize) -> Result<usize, SessionError> {
        self.ensure(SessionStatus::Active)?;
        let last = self.questions.len() - 1;
        self.current = index.min(last);
        Ok(self.current)
    }

    /// Advance the countdown by one second.
    ///
    /// A tick on a session that already left `Active` changes nothing.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SessionStatus::Active {
            return TickOutcome::Ignored;
        }

        let before = self.remaining_secs;
        self.remaining_secs = before.saturating_sub(1);

        if self.remaining_secs == 0 {
            self.status = SessionStatus::Submitting;
            return TickOutcome::Expired;
        }

        if !self.low_time_warned
            && before > LOW_TIME_THRESHOLD_SECS
            && self.remaining_secs <= LOW_TIME_THRESHOLD_SECS
        {
            self.low_time_warned = true;
            return TickOutcome::LowTime {
                remaining: self.remaining_secs,
            };
        }

        TickOutcome::Running {
            remaining: self.remaining_secs,
        }
    }

    /// Whether the caller should confirm before submitting. Never blocks.
    #[must_use]
    pub fn submission_check(&self) -> SubmissionCheck {
        match self.unanswered_count() {
            0 => SubmissionCheck::Ready,
            unanswered => SubmissionCheck::Unanswered {
                unanswered,
                total: self.questions.len(),
            },
        }
    }

    /// Stop accepting answers and wait for scoring.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is active.
    pub fn submit(&mut self) -> Result<(), SessionError> {
        self.ensure(SessionStatus::Active)?;
        self.status = SessionStatus::Submitting;
        Ok(())
    }

    /// Score the session and mark it completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is submitting.
    pub fn complete(&mut self, ended_at: DateTime<Utc>) -> Result<ExamResult, SessionError> {
        self.ensure(SessionStatus::Submitting)?;
        let result = scoring::score(
            &self.questions,
            &self.answers,
            self.duration_secs(),
            self.remaining_secs,
        );
        self.status = SessionStatus::Completed;
        self.ended_at = Some(ended_at);
        Ok(result)
    }

    /// Cancel the session without scoring.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is active.
    pub fn abandon(&mut self, ended_at: DateTime<Utc>) -> Result<(), SessionError> {
        self.ensure(SessionStatus::Active)?;
        self.status = SessionStatus::Abandoned;
        self.ended_at = Some(ended_at);
        Ok(())
    }

    fn ensure(&self, expected: SessionStatus) -> Result<(), SessionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                expected,
                actual: self.status,
            })
        }
    }
}

fn check_questions(questions: &[Question]) -> Result<(), SessionError> {
    if questions.is_empty() {
        return Err(SessionError::Empty);
    }
    let mut seen = HashSet::with_capacity(questions.len());
    for q in questions {
        if !seen.insert(q.id()) {
            return Err(SessionError::DuplicateQuestion(q.id()));
        }
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, ExamId, QuestionDraft};
    use crate::time::fixed_now;

    fn question(id: u64) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Question {id}"),
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            category: "General".into(),
            difficulty: Difficulty::Medium,
            correct: OptionLabel::A,
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    fn session(minutes: u32, count: u64) -> ExamSession {
        let exam = ExamConfig::new(ExamId::new("test").unwrap(), "Test", minutes, 5).unwrap();
        let questions = (1..=count).map(question).collect();
        ExamSession::start(SessionId::new(), exam, questions, fixed_now()).unwrap()
    }

    #[test]
    fn start_initializes_budget_and_position() {
        let s = session(2, 3);
        assert_eq!(s.status(), SessionStatus::Active);
        assert_eq!(s.remaining_secs(), 120);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.answered_count(), 0);
    }

    #[test]
    fn start_rejects_empty_and_duplicates() {
        let exam = ExamConfig::new(ExamId::new("t").unwrap(), "T", 1, 1).unwrap();
        let err = ExamSession::start(SessionId::new(), exam.clone(), vec![], fixed_now());
        assert_eq!(err.unwrap_err(), SessionError::Empty);

        let err = ExamSession::start(
            SessionId::new(),
            exam,
            vec![question(1), question(1)],
            fixed_now(),
        );
        assert_eq!(
            err.unwrap_err(),
            SessionError::DuplicateQuestion(QuestionId::new(1))
        );
    }

    #[test]
    fn answering_twice_keeps_last_value() {
        let mut s = session(1, 3);
        s.answer(QuestionId::new(2), OptionLabel::B).unwrap();
        s.answer(QuestionId::new(2), OptionLabel::A).unwrap();

        assert_eq!(s.answered_count(), 1);
        let answer = s.answer_for(QuestionId::new(2)).unwrap();
        assert_eq!(answer.selected(), OptionLabel::A);
        assert!(answer.is_correct());
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn answer_for_unknown_question_is_rejected() {
        let mut s = session(1, 2);
        let err = s.answer(QuestionId::new(42), OptionLabel::A).unwrap_err();
        assert_eq!(err, SessionError::UnknownQuestion(QuestionId::new(42)));
        assert_eq!(s.answered_count(), 0);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut s = session(1, 3);
        assert_eq!(s.previous().unwrap(), 0);
        assert_eq!(s.next().unwrap(), 1);
        assert_eq!(s.next().unwrap(), 2);
        assert_eq!(s.next().unwrap(), 2);
        assert_eq!(s.go_to(usize::MAX).unwrap(), 2);
        assert_eq!(s.go_to(0).unwrap(), 0);
        assert_eq!(s.current_question().id(), QuestionId::new(1));
    }

    #[test]
    fn ticks_count_down_and_expire_once() {
        let mut s = session(1, 5);
        let mut last = s.remaining_secs();
        for _ in 0..59 {
            assert!(matches!(s.tick(), TickOutcome::Running { .. }));
            assert!(s.remaining_secs() <= last);
            last = s.remaining_secs();
        }
        assert_eq!(s.tick(), TickOutcome::Expired);
        assert_eq!(s.status(), SessionStatus::Submitting);
        assert_eq!(s.remaining_secs(), 0);
        assert_eq!(s.tick(), TickOutcome::Ignored);
        assert_eq!(s.elapsed_secs(), 60);
    }

    #[test]
    fn low_time_warning_fires_once_when_crossing_threshold() {
        let mut s = session(6, 1);
        let mut warnings = 0;
        for _ in 0..100 {
            if let TickOutcome::LowTime { remaining } = s.tick() {
                assert_eq!(remaining, LOW_TIME_THRESHOLD_SECS);
                warnings += 1;
            }
        }
        assert_eq!(warnings, 1);
        assert!(s.low_time_warned());
    }

    #[test]
    fn short_session_never_warns() {
        let mut s = session(5, 1);
        for _ in 0..10 {
            assert!(matches!(s.tick(), TickOutcome::Running { .. }));
        }
    }

    #[test]
    fn ended_session_rejects_mutations() {
        let mut s = session(1, 2);
        s.abandon(fixed_now()).unwrap();
        assert_eq!(s.status(), SessionStatus::Abandoned);
        assert!(s.answer(QuestionId::new(1), OptionLabel::A).is_err());
        assert!(s.next().is_err());
        assert_eq!(s.tick(), TickOutcome::Ignored);
        assert!(s.submit().is_err());
    }

    #[test]
    fn submission_check_reports_unanswered() {
        let mut s = session(1, 3);
        assert_eq!(
            s.submission_check(),
            SubmissionCheck::Unanswered {
                unanswered: 3,
                total: 3
            }
        );
        for id in 1..=3 {
            s.answer(QuestionId::new(id), OptionLabel::C).unwrap();
        }
        assert_eq!(s.submission_check(), SubmissionCheck::Ready);
    }

    #[test]
    fn submit_then_complete_scores_session() {
        let mut s = session(1, 3);
        s.answer_current(OptionLabel::A).unwrap();
        for _ in 0..15 {
            s.tick();
        }
        assert!(s.complete(fixed_now()).is_err());

        s.submit().unwrap();
        assert!(s.answer(QuestionId::new(2), OptionLabel::A).is_err());
        let result = s.complete(fixed_now()).unwrap();

        assert_eq!(s.status(), SessionStatus::Completed);
        assert_eq!(result.correct, 1);
        assert_eq!(result.score, 33);
        assert_eq!(result.time_spent, 15);
        assert_eq!(s.ended_at(), Some(fixed_now()));
    }

    #[test]
    fn snapshot_restores_active_session() {
        let mut s = session(10, 4);
        s.answer(QuestionId::new(3), OptionLabel::D).unwrap();
        s.go_to(2).unwrap();
        s.tick();

        let snapshot = s.snapshot().unwrap();
        let restored = ExamSession::restore(snapshot).unwrap();

        assert_eq!(restored.id(), s.id());
        assert_eq!(restored.current_index(), 2);
        assert_eq!(restored.remaining_secs(), 599);
        assert_eq!(
            restored.answer_for(QuestionId::new(3)).unwrap().selected(),
            OptionLabel::D
        );
    }

    #[test]
    fn restore_rejects_out_of_range_index() {
        let s = session(1, 2);
        let mut snapshot = s.snapshot().unwrap();
        snapshot.current_index = 2;
        assert!(matches!(
            ExamSession::restore(snapshot),
            Err(SessionError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn restore_rejects_expired_snapshot() {
        let s = session(1, 2);
        let mut snapshot = s.snapshot().unwrap();
        snapshot.remaining_secs = 0;
        assert!(matches!(
            ExamSession::restore(snapshot),
            Err(SessionError::InvalidSnapshot("no time left"))
        ));
    }

    #[test]
    fn snapshot_requires_active_session() {
        let mut s = session(1, 2);
        s.submit().unwrap();
        assert!(s.snapshot().is_err());
    }
}

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use exam_core::Clock;
use exam_core::model::{
    Answer, ExamConfig, ExamSession, OptionLabel, Question, QuestionId, SessionId,
    SessionProgress, SessionSnapshot, SessionStatus, SubmissionCheck, TickOutcome,
};
use exam_core::scoring::ExamResult;
use storage::repository::SessionSnapshotRepository;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::loader::QuestionSetLoader;
use super::reporter::{CompletedExam, ResultReporter};
use super::source::QuestionQuery;
use super::timer::{ExamTimer, TimerHandle, TimerTick};
use crate::error::{ExamError, LoadError};

/// Where the controller is in the exam lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    Idle,
    Loading,
    Active,
    Submitting,
    Completed,
    Abandoned,
}

impl ExamPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamPhase::Idle => "idle",
            ExamPhase::Loading => "loading",
            ExamPhase::Active => "active",
            ExamPhase::Submitting => "submitting",
            ExamPhase::Completed => "completed",
            ExamPhase::Abandoned => "abandoned",
        }
    }

    /// Phases from which a new session may be loaded.
    #[must_use]
    pub fn can_begin_load(self) -> bool {
        matches!(
            self,
            ExamPhase::Idle | ExamPhase::Loading | ExamPhase::Completed | ExamPhase::Abandoned
        )
    }
}

impl fmt::Display for ExamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof that a load was started for a particular session.
///
/// Only the ticket of the most recent `begin_load` is accepted by
/// `finish_load`; older tickets are stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    session_id: SessionId,
    exam: ExamConfig,
    query: QuestionQuery,
}

impl LoadTicket {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn exam(&self) -> &ExamConfig {
        &self.exam
    }

    #[must_use]
    pub fn query(&self) -> &QuestionQuery {
        &self.query
    }
}

/// Drives one exam session at a time: loading, answering, the countdown,
/// submission, scoring and reporting.
pub struct ExamController {
    clock: Clock,
    loader: QuestionSetLoader,
    reporter: Arc<dyn ResultReporter>,
    tick_period: Duration,
    phase: ExamPhase,
    pending: Option<SessionId>,
    session: Option<ExamSession>,
    timer: Option<TimerHandle>,
    generation: u64,
    ticks_tx: Sender<TimerTick>,
    ticks_rx: Receiver<TimerTick>,
    last_result: Option<ExamResult>,
    report_task: Option<JoinHandle<()>>,
}

impl ExamController {
    #[must_use]
    pub fn new(clock: Clock, loader: QuestionSetLoader, reporter: Arc<dyn ResultReporter>) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::channel(ExamTimer::BACKLOG);
        Self {
            clock,
            loader,
            reporter,
            tick_period: ExamTimer::PERIOD,
            phase: ExamPhase::Idle,
            pending: None,
            session: None,
            timer: None,
            generation: 0,
            ticks_tx,
            ticks_rx,
            last_result: None,
            report_task: None,
        }
    }

    /// Override the wall-clock length of one countdown second.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    #[must_use]
    pub fn session(&self) -> Option<&ExamSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.session.as_ref().map(ExamSession::progress)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().map(ExamSession::current_question)
    }

    /// Result of the most recently finished session.
    #[must_use]
    pub fn last_result(&self) -> Option<&ExamResult> {
        self.last_result.as_ref()
    }

    #[must_use]
    pub fn loader(&self) -> &QuestionSetLoader {
        &self.loader
    }

    //
    // ─── LOADING ───────────────────────────────────────────────────────────────
    //

    /// Start loading questions for `exam` under a fresh session id.
    ///
    /// A load already in progress is superseded.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::InvalidPhase` while a session is active or submitting.
    pub fn begin_load(&mut self, exam: ExamConfig) -> Result<LoadTicket, ExamError> {
        if !self.phase.can_begin_load() {
            return Err(ExamError::InvalidPhase(self.phase));
        }

        self.cancel_timer();
        self.session = None;
        self.last_result = None;

        let ticket = LoadTicket {
            session_id: SessionId::new(),
            query: QuestionQuery::for_exam(&exam),
            exam,
        };
        if let Some(previous) = self.pending.replace(ticket.session_id) {
            debug!(session = %previous, "pending load superseded");
        }
        self.phase = ExamPhase::Loading;
        debug!(session = %ticket.session_id, exam = %ticket.exam.id(), "loading questions");
        Ok(ticket)
    }

    /// Apply the outcome of the load started with `ticket`.
    ///
    /// On success the session becomes active and the countdown starts. A load
    /// failure for the current ticket returns the controller to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::StaleLoad` for a ticket that is no longer current,
    /// leaving the controller untouched, and `ExamError::NoRuntime` outside a
    /// tokio runtime, leaving the load pending. Otherwise returns the load or
    /// session error that prevented the start.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        loaded: Result<Vec<Question>, LoadError>,
    ) -> Result<SessionId, ExamError> {
        if self.phase != ExamPhase::Loading || self.pending != Some(ticket.session_id) {
            debug!(session = %ticket.session_id, "ignoring stale load");
            return Err(ExamError::StaleLoad);
        }
        let runtime = Handle::try_current().map_err(|_| ExamError::NoRuntime)?;
        self.pending = None;

        let started = loaded.map_err(ExamError::from).and_then(|questions| {
            ExamSession::start(ticket.session_id, ticket.exam, questions, self.clock.now())
                .map_err(ExamError::from)
        });
        let session = match started {
            Ok(session) => session,
            Err(err) => {
                warn!(session = %ticket.session_id, error = %err, "exam could not start");
                self.phase = ExamPhase::Idle;
                return Err(err);
            }
        };

        info!(
            session = %session.id(),
            exam = %session.exam().id(),
            questions = session.questions().len(),
            seconds = session.remaining_secs(),
            "exam started"
        );
        Ok(self.activate(&runtime, session))
    }

    /// Load questions for `exam` and start the session.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` if the controller is busy or loading fails.
    pub async fn start(&mut self, exam: ExamConfig) -> Result<SessionId, ExamError> {
        let ticket = self.begin_load(exam)?;
        let loaded = self.loader.load(ticket.query()).await;
        self.finish_load(ticket, loaded)
    }

    /// Continue a session saved with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::InvalidPhase` while another session is in flight,
    /// `ExamError::AlreadyFinished` for a snapshot of the session that was just
    /// scored, `ExamError::NoRuntime` outside a tokio runtime and
    /// `ExamError::Session` if the snapshot is inconsistent. The controller is
    /// unchanged on error.
    pub fn resume(&mut self, snapshot: SessionSnapshot) -> Result<SessionId, ExamError> {
        if !matches!(
            self.phase,
            ExamPhase::Idle | ExamPhase::Completed | ExamPhase::Abandoned
        ) {
            return Err(ExamError::InvalidPhase(self.phase));
        }
        if self.phase == ExamPhase::Completed
            && self.session.as_ref().map(ExamSession::id) == Some(snapshot.session_id)
        {
            return Err(ExamError::AlreadyFinished(snapshot.session_id));
        }
        let runtime = Handle::try_current().map_err(|_| ExamError::NoRuntime)?;

        let session = ExamSession::restore(snapshot)?;
        self.last_result = None;
        info!(
            session = %session.id(),
            remaining = session.remaining_secs(),
            answered = session.answered_count(),
            "exam resumed"
        );
        Ok(self.activate(&runtime, session))
    }

    fn activate(&mut self, runtime: &Handle, session: ExamSession) -> SessionId {
        let session_id = session.id();
        self.cancel_timer();
        self.generation = self.generation.wrapping_add(1);
        let tick = TimerTick {
            session_id,
            generation: self.generation,
        };
        self.timer = Some(ExamTimer::start(
            runtime,
            tick,
            self.tick_period,
            self.ticks_tx.clone(),
        ));
        self.session = Some(session);
        self.phase = ExamPhase::Active;
        session_id
    }

    //
    // ─── ANSWERING & NAVIGATION ────────────────────────────────────────────────
    //

    /// Record `selected` for `question_id`. Does not move the cursor.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` unless a session is active and owns the question.
    pub fn answer(
        &mut self,
        question_id: QuestionId,
        selected: OptionLabel,
    ) -> Result<Answer, ExamError> {
        Ok(self.active_session()?.answer(question_id, selected)?)
    }

    /// Record `selected` for the question under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` unless a session is active.
    pub fn answer_current(&mut self, selected: OptionLabel) -> Result<Answer, ExamError> {
        Ok(self.active_session()?.answer_current(selected)?)
    }

    /// # Errors
    ///
    /// Returns `ExamError` unless a session is active.
    pub fn next(&mut self) -> Result<usize, ExamError> {
        Ok(self.active_session()?.next()?)
    }

    /// # Errors
    ///
    /// Returns `ExamError` unless a session is active.
    pub fn previous(&mut self) -> Result<usize, ExamError> {
        Ok(self.active_session()?.previous()?)
    }

    /// Jump to `index`, clamped to the last question.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` unless a session is active.
    pub fn go_to(&mut self, index: usize) -> Result<usize, ExamError> {
        Ok(self.active_session()?.go_to(index)?)
    }

    fn active_session(&mut self) -> Result<&mut ExamSession, ExamError> {
        if self.phase != ExamPhase::Active {
            return Err(ExamError::InvalidPhase(self.phase));
        }
        self.session.as_mut().ok_or(ExamError::NoSession)
    }

    //
    // ─── COUNTDOWN ─────────────────────────────────────────────────────────────
    //

    /// Wait for the next timer tick.
    ///
    /// Pending forever while no timer runs, which makes it safe to use as a
    /// `select!` branch.
    pub async fn next_tick(&mut self) -> TimerTick {
        loop {
            if let Some(tick) = self.ticks_rx.recv().await {
                return tick;
            }
        }
    }

    /// Apply one tick to the active session.
    ///
    /// Ticks for another session or an earlier activation, or arriving after
    /// the session left `Active`, are ignored.
    pub fn apply_tick(&mut self, tick: TimerTick) -> TickOutcome {
        if self.phase != ExamPhase::Active {
            return TickOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Ignored;
        };
        if session.id() != tick.session_id || tick.generation != self.generation {
            debug!(
                tick = %tick.session_id,
                session = %session.id(),
                generation = tick.generation,
                "dropping foreign tick"
            );
            return TickOutcome::Ignored;
        }

        let outcome = session.tick();
        match outcome {
            TickOutcome::LowTime { remaining } => {
                info!(session = %tick.session_id, remaining, "exam time running low");
            }
            TickOutcome::Expired => {
                info!(session = %tick.session_id, "exam time expired; submitting");
                self.cancel_timer();
                self.phase = ExamPhase::Submitting;
            }
            TickOutcome::Running { .. } | TickOutcome::Ignored => {}
        }
        outcome
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// Whether submitting now would leave questions unanswered.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NoSession` when no session exists.
    pub fn submission_check(&self) -> Result<SubmissionCheck, ExamError> {
        self.session
            .as_ref()
            .map(ExamSession::submission_check)
            .ok_or(ExamError::NoSession)
    }

    /// Stop the countdown and freeze answers.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` unless a session is active.
    pub fn submit(&mut self) -> Result<(), ExamError> {
        self.active_session()?.submit()?;
        self.cancel_timer();
        self.phase = ExamPhase::Submitting;
        debug!("exam submitted");
        Ok(())
    }

    /// Score a submitted session and dispatch its report.
    ///
    /// Reporting runs in the background; a failed report is logged and does
    /// not affect the returned result.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::InvalidPhase` unless the session is submitting.
    pub fn finish(&mut self) -> Result<ExamResult, ExamError> {
        if self.phase != ExamPhase::Submitting {
            return Err(ExamError::InvalidPhase(self.phase));
        }
        let session = self.session.as_mut().ok_or(ExamError::NoSession)?;
        let completed_at = self.clock.now();
        let result = session.complete(completed_at)?;

        let completed = CompletedExam {
            exam_id: session.exam().id().clone(),
            session_id: session.id(),
            completed_at,
            result: result.clone(),
        };
        info!(
            session = %completed.session_id,
            exam = %completed.exam_id,
            score = result.score,
            correct = result.correct,
            total = result.total,
            "exam completed"
        );

        self.phase = ExamPhase::Completed;
        self.last_result = Some(result.clone());
        self.dispatch_report(completed);
        Ok(result)
    }

    /// Discard the session in flight without scoring or reporting.
    ///
    /// A pending load is cancelled; its result will be rejected as stale.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::InvalidPhase` unless loading or active.
    pub fn abandon(&mut self) -> Result<(), ExamError> {
        match self.phase {
            ExamPhase::Loading => {
                if let Some(pending) = self.pending.take() {
                    debug!(session = %pending, "pending load abandoned");
                }
            }
            ExamPhase::Active => {
                let ended_at = self.clock.now();
                let session = self.session.as_mut().ok_or(ExamError::NoSession)?;
                session.abandon(ended_at)?;
                let session_id = session.id();
                self.cancel_timer();
                info!(session = %session_id, "exam abandoned");
            }
            phase => return Err(ExamError::InvalidPhase(phase)),
        }
        self.phase = ExamPhase::Abandoned;
        Ok(())
    }

    /// Wait for the last dispatched report to settle.
    pub async fn flush_report(&mut self) {
        let Some(task) = self.report_task.take() else {
            return;
        };
        if let Err(err) = task.await {
            warn!(error = %err, "result report task failed");
        }
    }

    fn dispatch_report(&mut self, exam: CompletedExam) {
        let reporter = Arc::clone(&self.reporter);
        match Handle::try_current() {
            Ok(handle) => {
                self.report_task = Some(handle.spawn(async move {
                    if let Err(err) = reporter.report(&exam).await {
                        warn!(
                            session = %exam.session_id,
                            error = %err,
                            "exam result not reported"
                        );
                    }
                }));
            }
            Err(_) => {
                warn!(session = %exam.session_id, "no async runtime; exam result not reported");
            }
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
        while self.ticks_rx.try_recv().is_ok() {}
    }

    //
    // ─── PERSISTENCE ───────────────────────────────────────────────────────────
    //

    /// Capture the active session for later `resume`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` unless a session is active.
    pub fn snapshot(&self) -> Result<SessionSnapshot, ExamError> {
        let session = self.session.as_ref().ok_or(ExamError::NoSession)?;
        if session.status() != SessionStatus::Active {
            return Err(ExamError::InvalidPhase(self.phase));
        }
        Ok(session.snapshot()?)
    }

    /// Store the active session in `repo`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` if there is no active session or the write fails.
    pub async fn save_snapshot(
        &self,
        repo: &dyn SessionSnapshotRepository,
    ) -> Result<(), ExamError> {
        let snapshot = self.snapshot()?;
        repo.save_snapshot(&snapshot).await?;
        debug!(
            session = %snapshot.session_id,
            remaining = snapshot.remaining_secs,
            "snapshot saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReportError, SourceError};
    use crate::exam::source::QuestionSource;
    use async_trait::async_trait;
    use exam_core::model::{Difficulty, ExamId, QuestionDraft};
    use exam_core::time::fixed_clock;

    fn question(id: u64, correct: OptionLabel) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Q{id}"),
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            category: "Netzwerk".into(),
            difficulty: Difficulty::Easy,
            correct,
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    struct Pool;

    #[async_trait]
    impl QuestionSource for Pool {
        fn name(&self) -> &str {
            "test"
        }

        async fn fetch(&self, query: &QuestionQuery) -> Result<Vec<Question>, SourceError> {
            Ok((1..=u64::from(query.count))
                .map(|id| question(id, OptionLabel::A))
                .collect())
        }
    }

    struct Silent;

    #[async_trait]
    impl ResultReporter for Silent {
        async fn report(&self, _exam: &CompletedExam) -> Result<(), ReportError> {
            Ok(())
        }
    }

    fn controller() -> ExamController {
        ExamController::new(
            fixed_clock(),
            QuestionSetLoader::new(Arc::new(Pool)),
            Arc::new(Silent),
        )
    }

    fn exam(minutes: u32, count: u32) -> ExamConfig {
        ExamConfig::new(ExamId::new("unit").unwrap(), "Unit", minutes, count).unwrap()
    }

    #[tokio::test]
    async fn start_answer_submit_finish() {
        let mut ctl = controller();
        ctl.start(exam(10, 3)).await.unwrap();
        assert_eq!(ctl.phase(), ExamPhase::Active);

        ctl.answer_current(OptionLabel::A).unwrap();
        assert_eq!(ctl.next().unwrap(), 1);
        ctl.answer_current(OptionLabel::B).unwrap();
        assert_eq!(ctl.go_to(99).unwrap(), 2);
        assert_eq!(
            ctl.submission_check().unwrap(),
            SubmissionCheck::Unanswered {
                unanswered: 1,
                total: 3
            }
        );

        ctl.submit().unwrap();
        assert!(matches!(
            ctl.answer_current(OptionLabel::A),
            Err(ExamError::InvalidPhase(ExamPhase::Submitting))
        ));

        let result = ctl.finish().unwrap();
        assert_eq!(result.correct, 1);
        assert_eq!(result.wrong, 2);
        assert_eq!(result.score, 33);
        assert_eq!(ctl.phase(), ExamPhase::Completed);
        assert_eq!(ctl.last_result(), Some(&result));
        ctl.flush_report().await;
    }

    #[tokio::test]
    async fn cannot_begin_load_while_active() {
        let mut ctl = controller();
        ctl.start(exam(10, 2)).await.unwrap();
        let err = ctl.begin_load(exam(10, 2)).unwrap_err();
        assert!(matches!(err, ExamError::InvalidPhase(ExamPhase::Active)));
    }

    #[tokio::test]
    async fn failed_load_returns_to_idle() {
        let mut ctl = controller();
        let ticket = ctl.begin_load(exam(10, 2)).unwrap();
        let err = ctl
            .finish_load(
                ticket,
                Err(LoadError::Unavailable {
                    source_name: "test".into(),
                    cause: SourceError::Empty,
                }),
            )
            .unwrap_err();
        assert!(matches!(err, ExamError::Load(_)));
        assert_eq!(ctl.phase(), ExamPhase::Idle);
        assert!(ctl.session().is_none());
    }

    #[tokio::test]
    async fn superseded_ticket_is_stale() {
        let mut ctl = controller();
        let first = ctl.begin_load(exam(10, 1)).unwrap();
        let second = ctl.begin_load(exam(10, 1)).unwrap();

        let err = ctl
            .finish_load(first, Ok(vec![question(1, OptionLabel::A)]))
            .unwrap_err();
        assert!(matches!(err, ExamError::StaleLoad));
        assert_eq!(ctl.phase(), ExamPhase::Loading);

        let id = ctl
            .finish_load(second.clone(), Ok(vec![question(1, OptionLabel::A)]))
            .unwrap();
        assert_eq!(id, second.session_id());
    }

    #[tokio::test]
    async fn foreign_tick_is_ignored() {
        let mut ctl = controller();
        ctl.start(exam(1, 1)).await.unwrap();
        let outcome = ctl.apply_tick(TimerTick {
            session_id: SessionId::new(),
            generation: ctl.generation,
        });
        assert_eq!(outcome, TickOutcome::Ignored);
        assert_eq!(ctl.session().unwrap().remaining_secs(), 60);
    }

    #[tokio::test]
    async fn snapshot_requires_active_session() {
        let mut ctl = controller();
        assert!(matches!(ctl.snapshot(), Err(ExamError::NoSession)));

        ctl.start(exam(5, 2)).await.unwrap();
        ctl.answer_current(OptionLabel::C).unwrap();
        let snapshot = ctl.snapshot().unwrap();
        ctl.abandon().unwrap();
        assert!(ctl.snapshot().is_err());

        let resumed = ctl.resume(snapshot.clone()).unwrap();
        assert_eq!(resumed, snapshot.session_id);
        assert_eq!(ctl.phase(), ExamPhase::Active);
        assert_eq!(ctl.session().unwrap().answered_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_ticks_do_not_reach_resumed_session() {
        let mut ctl = controller();
        ctl.start(exam(1, 1)).await.unwrap();
        let snapshot = ctl.snapshot().unwrap();
        let first_generation = ctl.generation;

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        ctl.abandon().unwrap();
        ctl.resume(snapshot.clone()).unwrap();

        let mut applied = 0;
        while let Ok(tick) = ctl.ticks_rx.try_recv() {
            if ctl.apply_tick(tick) != TickOutcome::Ignored {
                applied += 1;
            }
        }
        assert_eq!(applied, 0);
        assert_eq!(ctl.session().unwrap().remaining_secs(), 60);

        let old = TimerTick {
            session_id: snapshot.session_id,
            generation: first_generation,
        };
        assert_eq!(ctl.apply_tick(old), TickOutcome::Ignored);
        assert_eq!(ctl.session().unwrap().remaining_secs(), 60);

        let tick = ctl.next_tick().await;
        assert_eq!(
            ctl.apply_tick(tick),
            TickOutcome::Running { remaining: 59 }
        );
    }

    #[tokio::test]
    async fn finished_session_cannot_be_resumed() {
        let mut ctl = controller();
        ctl.start(exam(5, 2)).await.unwrap();
        let snapshot = ctl.snapshot().unwrap();
        ctl.submit().unwrap();
        let result = ctl.finish().unwrap();

        let err = ctl.resume(snapshot.clone()).unwrap_err();
        assert!(matches!(
            err,
            ExamError::AlreadyFinished(id) if id == snapshot.session_id
        ));
        assert_eq!(ctl.phase(), ExamPhase::Completed);
        assert_eq!(ctl.last_result(), Some(&result));
        ctl.flush_report().await;
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn finish_load_outside_runtime_keeps_load_pending() {
        let mut ctl = controller();
        let ticket = ctl.begin_load(exam(1, 1)).unwrap();

        let err = ctl
            .finish_load(ticket.clone(), Ok(vec![question(1, OptionLabel::A)]))
            .unwrap_err();
        assert!(matches!(err, ExamError::NoRuntime));
        assert_eq!(ctl.phase(), ExamPhase::Loading);
        assert!(ctl.session().is_none());

        let rt = runtime();
        let _guard = rt.enter();
        let id = ctl
            .finish_load(ticket.clone(), Ok(vec![question(1, OptionLabel::A)]))
            .unwrap();
        assert_eq!(id, ticket.session_id());
        assert_eq!(ctl.phase(), ExamPhase::Active);
    }

    #[test]
    fn resume_outside_runtime_leaves_controller_unchanged() {
        let rt = runtime();
        let mut ctl = controller();
        rt.block_on(ctl.start(exam(1, 1))).unwrap();
        let snapshot = ctl.snapshot().unwrap();
        ctl.abandon().unwrap();

        let err = ctl.resume(snapshot.clone()).unwrap_err();
        assert!(matches!(err, ExamError::NoRuntime));
        assert_eq!(ctl.phase(), ExamPhase::Abandoned);

        let _guard = rt.enter();
        assert_eq!(ctl.resume(snapshot.clone()).unwrap(), snapshot.session_id);
        assert_eq!(ctl.phase(), ExamPhase::Active);
    }

    #[test]
    fn finish_outside_runtime_scores_without_reporting() {
        let rt = runtime();
        let mut ctl = controller();
        rt.block_on(ctl.start(exam(1, 1))).unwrap();
        ctl.answer_current(OptionLabel::A).unwrap();
        ctl.submit().unwrap();

        let result = ctl.finish().unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(ctl.phase(), ExamPhase::Completed);
        assert!(ctl.report_task.is_none());
    }
}

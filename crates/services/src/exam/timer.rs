use std::time::Duration;

use exam_core::model::SessionId;
use tokio::runtime::Handle;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// One elapsed second for a single activation of a session.
///
/// `generation` changes every time a session becomes active, so ticks queued
/// before an abandon/resume never count against the resumed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub session_id: SessionId,
    pub generation: u64,
}

/// Periodic tick source for an active session.
pub struct ExamTimer;

impl ExamTimer {
    pub const PERIOD: Duration = Duration::from_secs(1);

    /// Ticks that may wait unread before the timer stalls.
    pub const BACKLOG: usize = 16;

    /// Spawn the tick task on `runtime`, sending `tick` once per `period`.
    ///
    /// The first tick arrives one `period` after the call. A full channel
    /// holds the timer back instead of growing. The task ends when the handle
    /// is cancelled or dropped, or when the receiver goes away.
    #[must_use]
    pub fn start(
        runtime: &Handle,
        tick: TimerTick,
        period: Duration,
        ticks: Sender<TimerTick>,
    ) -> TimerHandle {
        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(tick).await.is_err() {
                    debug!(session = %tick.session_id, "tick receiver closed; timer stops");
                    break;
                }
            }
        });

        TimerHandle {
            session_id: tick.session_id,
            task: Some(task),
        }
    }
}

/// Ownership of a running timer. Dropping it stops the timer.
#[derive(Debug)]
pub struct TimerHandle {
    session_id: SessionId,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(session = %self.session_id, "timer cancelled");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn tick() -> TimerTick {
        TimerTick {
            session_id: SessionId::new(),
            generation: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_until_cancelled() {
        let (tx, mut rx) = mpsc::channel(ExamTimer::BACKLOG);
        let expected = tick();
        let mut handle = ExamTimer::start(&Handle::current(), expected, ExamTimer::PERIOD, tx);

        for _ in 0..3 {
            assert_eq!(rx.recv().await.unwrap(), expected);
        }
        assert!(handle.is_running());

        handle.cancel();
        assert!(!handle.is_running());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_a_full_period() {
        let (tx, mut rx) = mpsc::channel(ExamTimer::BACKLOG);
        let _handle = ExamTimer::start(&Handle::current(), tick(), ExamTimer::PERIOD, tx);

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        time::advance(ExamTimer::PERIOD).await;
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn unread_ticks_stop_at_backlog() {
        let (tx, mut rx) = mpsc::channel(2);
        let _handle = ExamTimer::start(&Handle::current(), tick(), ExamTimer::PERIOD, tx);

        time::sleep(ExamTimer::PERIOD * 10).await;

        let mut queued = 0;
        while rx.try_recv().is_ok() {
            queued += 1;
        }
        assert_eq!(queued, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_ticks() {
        let (tx, mut rx) = mpsc::channel(ExamTimer::BACKLOG);
        drop(ExamTimer::start(&Handle::current(), tick(), ExamTimer::PERIOD, tx));
        assert!(rx.recv().await.is_none());
    }
}

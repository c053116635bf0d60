use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::QuizResult;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::service::{Advance, QuizSession, TickOutcome};

/// Single-writer handle shared by the ticker and the input loop.
pub type SharedSession = Arc<Mutex<QuizSession>>;

#[must_use]
pub fn share(session: QuizSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

/// Something the ticker observed while driving the turn clock.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Ticked { time_remaining: u32 },
    /// The clock expired and moved to the next turn.
    Advanced(Advance),
    /// The clock expired on the last turn.
    Finished(Box<QuizResult>),
}

/// Background task calling [`QuizSession::tick`] once per period.
///
/// Every new turn gets a full period before its first tick. A turn started outside the
/// ticker is picked up at the next tick, or immediately after [`TurnTicker::rearm`].
///
/// The task ends on its own once the session leaves `Active` or the receiver is dropped.
/// Dropping the ticker aborts it.
#[derive(Debug)]
pub struct TurnTicker {
    handle: JoinHandle<()>,
    rearm: Arc<Notify>,
}

impl TurnTicker {
    /// Spawn the ticker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(
        session: SharedSession,
        period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let period = period.max(Duration::from_millis(1));
        let rearm = Arc::new(Notify::new());
        let signal = Arc::clone(&rearm);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval completes immediately.
            interval.tick().await;
            let mut seen = session.lock().await.turn_number();

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    () = signal.notified() => {
                        seen = session.lock().await.turn_number();
                        interval.reset();
                        continue;
                    }
                }

                let event = {
                    let mut guard = session.lock().await;
                    if guard.turn_number() == seen {
                        let event = match guard.tick() {
                            Ok(TickOutcome::Counting { time_remaining }) => {
                                SessionEvent::Ticked { time_remaining }
                            }
                            Ok(TickOutcome::Expired(Advance::Finished)) => match guard.result() {
                                Some(result) => SessionEvent::Finished(Box::new(result.clone())),
                                None => break,
                            },
                            Ok(TickOutcome::Expired(step)) => SessionEvent::Advanced(step),
                            Err(_) => break,
                        };
                        seen = guard.turn_number();
                        Some(event)
                    } else {
                        // Advanced by hand since the last tick; start its period now.
                        seen = guard.turn_number();
                        None
                    }
                };

                let Some(event) = event else {
                    interval.reset();
                    continue;
                };
                let finished = matches!(event, SessionEvent::Finished(_));
                if tx.send(event).is_err() || finished {
                    break;
                }
            }
            tracing::debug!("turn ticker stopped");
        });

        (Self { handle, rearm }, rx)
    }

    /// Restart the period now because the turn just changed outside the ticker.
    pub fn rearm(&self) {
        self.rearm.notify_one();
    }

    /// Abort the ticker task. Safe to call more than once.
    pub fn stop(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TurnTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::{config, questions};
    use quiz_core::model::{Party, QuizMode};

    fn session(mode: QuizMode, n: usize, turn: u32) -> SharedSession {
        share(QuizSession::new(config(mode), questions(n)).with_turn_duration(turn))
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_counts_down_and_forces_advance() {
        let shared = session(QuizMode::Solo, 2, 3);
        let (_ticker, mut rx) = TurnTicker::spawn(Arc::clone(&shared), Duration::from_secs(1));

        assert_eq!(rx.recv().await, Some(SessionEvent::Ticked { time_remaining: 2 }));
        assert_eq!(rx.recv().await, Some(SessionEvent::Ticked { time_remaining: 1 }));
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Advanced(Advance::NextQuestion {
                party: Party::One,
                index: 1
            }))
        );

        let guard = shared.lock().await;
        assert_eq!(guard.current_index(), 1);
        assert_eq!(guard.time_remaining(), 3);
        assert_eq!(guard.elapsed(Party::One), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_emits_result_and_stops_on_last_turn() {
        let shared = session(QuizMode::Solo, 1, 2);
        shared.lock().await.select_option(0).unwrap();
        let (ticker, mut rx) = TurnTicker::spawn(Arc::clone(&shared), Duration::from_secs(1));

        assert_eq!(rx.recv().await, Some(SessionEvent::Ticked { time_remaining: 1 }));
        match rx.recv().await {
            Some(SessionEvent::Finished(result)) => assert_eq!(result.party_one.score, 1),
            other => panic!("expected finished event, got {other:?}"),
        }
        assert_eq!(rx.recv().await, None);
        tokio::task::yield_now().await;
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_stops_when_session_is_cancelled() {
        let shared = session(QuizMode::Versus, 3, 60);
        let (_ticker, mut rx) = TurnTicker::spawn(Arc::clone(&shared), Duration::from_secs(1));

        assert_eq!(rx.recv().await, Some(SessionEvent::Ticked { time_remaining: 59 }));
        shared.lock().await.cancel().unwrap();
        assert_eq!(rx.recv().await, None);
        assert!(shared.lock().await.result().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_advance_gets_a_full_period_before_first_tick() {
        let shared = session(QuizMode::Solo, 3, 60);
        let (_ticker, mut rx) = TurnTicker::spawn(Arc::clone(&shared), Duration::from_secs(1));
        assert_eq!(rx.recv().await, Some(SessionEvent::Ticked { time_remaining: 59 }));

        tokio::time::sleep(Duration::from_millis(500)).await;
        shared.lock().await.advance().unwrap();
        let advanced_at = tokio::time::Instant::now();

        // The tick that was already scheduled lands mid-turn and must not be charged.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(rx.try_recv().is_err());
        {
            let guard = shared.lock().await;
            assert_eq!(guard.current_index(), 1);
            assert_eq!(guard.time_remaining(), 60);
            assert_eq!(guard.elapsed(Party::One), 1);
        }

        assert_eq!(rx.recv().await, Some(SessionEvent::Ticked { time_remaining: 59 }));
        assert!(advanced_at.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_restarts_the_period_immediately() {
        let shared = session(QuizMode::Versus, 2, 60);
        let (ticker, mut rx) = TurnTicker::spawn(Arc::clone(&shared), Duration::from_secs(1));
        assert_eq!(rx.recv().await, Some(SessionEvent::Ticked { time_remaining: 59 }));

        tokio::time::sleep(Duration::from_millis(500)).await;
        shared.lock().await.advance().unwrap();
        ticker.rearm();
        let advanced_at = tokio::time::Instant::now();

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(shared.lock().await.elapsed(Party::Two), 0);

        assert_eq!(rx.recv().await, Some(SessionEvent::Ticked { time_remaining: 59 }));
        assert_eq!(advanced_at.elapsed(), Duration::from_secs(1));
        let guard = shared.lock().await;
        assert_eq!(guard.active_party(), Party::Two);
        assert_eq!(guard.elapsed(Party::Two), 1);
        assert_eq!(guard.elapsed(Party::One), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_ticker_stops_ticking() {
        let shared = session(QuizMode::Solo, 3, 60);
        let (ticker, mut rx) = TurnTicker::spawn(Arc::clone(&shared), Duration::from_secs(1));
        assert!(rx.recv().await.is_some());
        drop(ticker);
        assert_eq!(rx.recv().await, None);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(shared.lock().await.time_remaining(), 59);
    }
}

use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    HistoryId, QuestionError, QuestionSet, QuizConfig, QuizResult, UserId, UserPreferences,
};
use storage::repository::{HistoryRepository, NewHistoryRecord};
use tokio::task::JoinHandle;

use super::service::{QuizSession, SessionStatus, TURN_DURATION_SECS};
use super::ticker::{SharedSession, share};
use crate::Clock;
use crate::error::{GenerationError, SessionError};
use crate::question_provider::QuestionProvider;

//
// ─── RUN STATE ─────────────────────────────────────────────────────────────────
//

/// Lifecycle of one quiz attempt around its session.
///
/// `Loading → Active | Failed`, `Failed → Loading` on retry, `Active → Done | Cancelled`.
pub enum RunState {
    Loading,
    Active(SharedSession),
    Failed(GenerationError),
    Done(Box<QuizResult>),
    Cancelled,
}

impl RunState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Loading => "loading",
            RunState::Active(_) => "active",
            RunState::Failed(_) => "failed",
            RunState::Done(_) => "done",
            RunState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Debug for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// One quiz attempt: the configuration it was started with and where it stands.
#[derive(Debug)]
pub struct QuizRun {
    config: QuizConfig,
    preferences: UserPreferences,
    state: RunState,
    attempts: u32,
}

impl QuizRun {
    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Number of times questions were requested for this run.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn session(&self) -> Option<SharedSession> {
        match &self.state {
            RunState::Active(session) => Some(Arc::clone(session)),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&GenerationError> {
        match &self.state {
            RunState::Failed(err) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.state {
            RunState::Done(result) => Some(result),
            _ => None,
        }
    }
}

/// Background history write started by [`SessionLoopService::complete`].
///
/// Dropping it detaches the write.
#[derive(Debug)]
pub struct PendingSave {
    handle: JoinHandle<Option<HistoryId>>,
}

impl PendingSave {
    /// Wait for the write; `None` if it failed.
    pub async fn wait(self) -> Option<HistoryId> {
        self.handle.await.ok().flatten()
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates question loading, session completion and history hand-off.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    provider: Arc<dyn QuestionProvider>,
    history: Arc<dyn HistoryRepository>,
    turn_duration: u32,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        provider: Arc<dyn QuestionProvider>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            clock,
            provider,
            history,
            turn_duration: TURN_DURATION_SECS,
        }
    }

    #[must_use]
    pub fn with_turn_duration(mut self, seconds: u32) -> Self {
        self.turn_duration = seconds.max(1);
        self
    }

    /// Request questions and open a run.
    ///
    /// Provider failures are not returned; they leave the run in `Failed`.
    pub async fn start(&self, config: QuizConfig, preferences: UserPreferences) -> QuizRun {
        let mut run = QuizRun {
            config,
            preferences,
            state: RunState::Loading,
            attempts: 0,
        };
        self.load(&mut run).await;
        run
    }

    /// Request questions again for a failed run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RetryUnavailable` unless the run is `Failed`.
    pub async fn retry(&self, run: &mut QuizRun) -> Result<(), SessionError> {
        if !matches!(run.state, RunState::Failed(_)) {
            return Err(SessionError::RetryUnavailable);
        }
        self.load(run).await;
        Ok(())
    }

    async fn load(&self, run: &mut QuizRun) {
        run.state = RunState::Loading;
        run.attempts = run.attempts.saturating_add(1);

        let loaded = self
            .provider
            .generate(&run.config, &run.preferences)
            .await
            .and_then(|questions| QuestionSet::new(questions).map_err(generation_error));

        run.state = match loaded {
            Ok(questions) => {
                tracing::info!(
                    exam = run.config.exam(),
                    subject = run.config.subject(),
                    mode = %run.config.mode(),
                    requested = run.config.question_count(),
                    delivered = questions.len(),
                    "quiz session started"
                );
                let session = QuizSession::new(run.config.clone(), questions)
                    .with_turn_duration(self.turn_duration);
                RunState::Active(share(session))
            }
            Err(err) => {
                tracing::warn!(attempt = run.attempts, error = %err, "question generation failed");
                RunState::Failed(err)
            }
        };
    }

    /// Cancel a run that has not finished. Nothing is scored or persisted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if the run already finished.
    pub async fn cancel(&self, run: &mut QuizRun) -> Result<(), SessionError> {
        match &run.state {
            RunState::Done(_) => return Err(SessionError::NotActive),
            RunState::Cancelled => return Ok(()),
            RunState::Active(session) => session.lock().await.cancel()?,
            RunState::Loading | RunState::Failed(_) => {}
        }
        tracing::info!(exam = run.config.exam(), "quiz session cancelled");
        run.state = RunState::Cancelled;
        Ok(())
    }

    /// Close a finished run and hand its result to history on a background task.
    ///
    /// The result is returned right away; a failed write is only logged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while the session is still active, or
    /// `SessionError::NotActive` for runs that never became active or were cancelled.
    pub async fn complete(
        &self,
        run: &mut QuizRun,
        owner: &UserId,
    ) -> Result<(QuizResult, PendingSave), SessionError> {
        let result = {
            let RunState::Active(session) = &run.state else {
                return Err(SessionError::NotActive);
            };
            let guard = session.lock().await;
            match guard.status() {
                SessionStatus::Active => return Err(SessionError::NotFinished),
                SessionStatus::Cancelled => return Err(SessionError::NotActive),
                SessionStatus::Done => guard.result().cloned().ok_or(SessionError::NotFinished)?,
            }
        };

        tracing::info!(
            exam = run.config.exam(),
            score = result.party_one.score,
            total = result.total_questions,
            "quiz session finished"
        );
        run.state = RunState::Done(Box::new(result.clone()));

        let record = NewHistoryRecord::new(
            owner.clone(),
            self.clock.now(),
            run.config.exam(),
            run.config.subject(),
            result.clone(),
        );
        let history = Arc::clone(&self.history);
        let handle = tokio::spawn(async move {
            match history.append_result(&record).await {
                Ok(id) => {
                    tracing::info!(history_id = %id, owner = %record.owner_id, "quiz result saved");
                    Some(id)
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        owner = %record.owner_id,
                        "failed to save quiz result"
                    );
                    None
                }
            }
        });

        Ok((result, PendingSave { handle }))
    }
}

fn generation_error(err: QuestionError) -> GenerationError {
    match err {
        QuestionError::Empty => GenerationError::Empty,
        other => GenerationError::InvalidQuestion(other),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_provider::StaticQuestionProvider;
    use crate::sessions::test_support::{config, question_list};
    use async_trait::async_trait;
    use quiz_core::model::{Question, QuizMode};
    use quiz_core::time::fixed_clock;
    use std::sync::atomic::{AtomicU32, Ordering};
    use storage::repository::InMemoryRepository;

    /// Fails the first `failures` calls, then serves three questions.
    struct FlakyProvider {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl QuestionProvider for FlakyProvider {
        async fn generate(
            &self,
            _config: &QuizConfig,
            _preferences: &UserPreferences,
        ) -> Result<Vec<Question>, GenerationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(GenerationError::Malformed("truncated json".into()))
            } else {
                Ok(question_list(3))
            }
        }
    }

    fn service(provider: Arc<dyn QuestionProvider>, repo: &InMemoryRepository) -> SessionLoopService {
        SessionLoopService::new(fixed_clock(), provider, Arc::new(repo.clone()))
    }

    fn static_service(repo: &InMemoryRepository) -> SessionLoopService {
        service(Arc::new(StaticQuestionProvider::new(question_list(5))), repo)
    }

    #[tokio::test]
    async fn failure_lands_in_failed_and_retry_recovers() {
        let repo = InMemoryRepository::new();
        let provider = Arc::new(FlakyProvider {
            failures: 1,
            calls: AtomicU32::new(0),
        });
        let svc = service(provider, &repo);

        let mut run = svc.start(config(QuizMode::Solo), UserPreferences::default()).await;
        assert!(matches!(run.state(), RunState::Failed(GenerationError::Malformed(_))));
        assert!(run.session().is_none());

        svc.retry(&mut run).await.unwrap();
        assert_eq!(run.attempts(), 2);
        let session = run.session().unwrap();
        assert_eq!(session.lock().await.total_questions(), 3);
        assert_eq!(svc.retry(&mut run).await, Err(SessionError::RetryUnavailable));
    }

    #[tokio::test]
    async fn invalid_provider_output_fails_the_run() {
        let repo = InMemoryRepository::new();
        let mut broken = question_list(2);
        broken[1].options.pop();
        let svc = service(Arc::new(StaticQuestionProvider::new(broken)), &repo);
        let run = svc.start(config(QuizMode::Solo), UserPreferences::default()).await;
        assert!(matches!(
            run.error(),
            Some(GenerationError::InvalidQuestion(QuestionError::WrongOptionCount { .. }))
        ));

        let svc = service(Arc::new(StaticQuestionProvider::new(Vec::new())), &repo);
        let run = svc.start(config(QuizMode::Solo), UserPreferences::default()).await;
        assert!(matches!(run.error(), Some(GenerationError::Empty)));
    }

    #[tokio::test]
    async fn complete_returns_result_and_saves_history() {
        let repo = InMemoryRepository::new();
        let svc = static_service(&repo);
        let mut run = svc.start(config(QuizMode::Solo), UserPreferences::default()).await;

        let session = run.session().unwrap();
        {
            let mut guard = session.lock().await;
            guard.select_option(0).unwrap();
            while guard.is_active() {
                guard.advance().unwrap();
            }
        }

        let owner = UserId::new("u1");
        let (result, pending) = svc.complete(&mut run, &owner).await.unwrap();
        assert_eq!(result.party_one.score, 1);
        assert!(run.result().is_some());

        let id = pending.wait().await.unwrap();
        let stored = repo.get_result(id).await.unwrap();
        assert_eq!(stored, result);
        let rows = repo.list_history(&owner, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exam, "RRB NTPC");
    }

    #[tokio::test]
    async fn complete_requires_a_finished_session() {
        let repo = InMemoryRepository::new();
        let svc = static_service(&repo);
        let mut run = svc.start(config(QuizMode::Versus), UserPreferences::default()).await;
        let owner = UserId::new("u1");
        assert_eq!(
            svc.complete(&mut run, &owner).await.err(),
            Some(SessionError::NotFinished)
        );
    }

    #[tokio::test]
    async fn cancelled_runs_never_reach_history() {
        let repo = InMemoryRepository::new();
        let svc = static_service(&repo);
        let owner = UserId::new("u1");

        for advances in 0..5 {
            let mut run = svc.start(config(QuizMode::Solo), UserPreferences::default()).await;
            let session = run.session().unwrap();
            for _ in 0..advances {
                session.lock().await.advance().unwrap();
            }
            svc.cancel(&mut run).await.unwrap();
            assert!(matches!(run.state(), RunState::Cancelled));
            assert_eq!(
                svc.complete(&mut run, &owner).await.err(),
                Some(SessionError::NotActive)
            );
            assert!(session.lock().await.result().is_none());
        }

        assert!(repo.list_history(&owner, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_run_can_be_cancelled() {
        let repo = InMemoryRepository::new();
        let provider = Arc::new(FlakyProvider {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        });
        let svc = service(provider, &repo);
        let mut run = svc.start(config(QuizMode::Solo), UserPreferences::default()).await;
        svc.cancel(&mut run).await.unwrap();
        assert_eq!(svc.retry(&mut run).await, Err(SessionError::RetryUnavailable));
    }
}

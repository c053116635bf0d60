use std::sync::Arc;

use storage::repository::{HistoryRepository, Storage};

use crate::Clock;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::question_provider::{AiQuestionProvider, QuestionProvider};
use crate::sessions::SessionLoopService;

/// Assembles app-facing services over one storage backend and question provider.
#[derive(Clone)]
pub struct AppServices {
    history: Arc<dyn HistoryRepository>,
    session_loop: Arc<SessionLoopService>,
    dashboard: Arc<DashboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the environment-configured AI provider.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the provider
    /// configuration is invalid.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let provider: Arc<dyn QuestionProvider> = Arc::new(AiQuestionProvider::from_env(clock)?);
        Ok(Self::from_parts(clock, &storage, provider))
    }

    /// Build services from an existing storage aggregate and provider.
    #[must_use]
    pub fn from_parts(
        clock: Clock,
        storage: &Storage,
        provider: Arc<dyn QuestionProvider>,
    ) -> Self {
        let session_loop = Arc::new(SessionLoopService::new(
            clock,
            provider,
            Arc::clone(&storage.history),
        ));
        let dashboard = Arc::new(DashboardService::new(clock, Arc::clone(&storage.history)));
        Self {
            history: Arc::clone(&storage.history),
            session_loop,
            dashboard,
        }
    }

    /// Replace the question provider, keeping storage and clock.
    #[must_use]
    pub fn with_provider(self, clock: Clock, provider: Arc<dyn QuestionProvider>) -> Self {
        let session_loop = Arc::new(SessionLoopService::new(
            clock,
            provider,
            Arc::clone(&self.history),
        ));
        Self {
            session_loop,
            ..self
        }
    }

    #[must_use]
    pub fn history(&self) -> Arc<dyn HistoryRepository> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}

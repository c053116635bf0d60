use std::sync::Arc;

use chrono::{FixedOffset, Local, TimeZone};
use quiz_core::model::{HistoryRecord, UserId};
use quiz_core::stats::{
    DailyAccuracy, QuizStats, XpPolicy, calculate_streak, recent_activity, weekly_accuracy,
};
use storage::repository::HistoryRepository;

use crate::Clock;

/// Rows shown in the recent-activity list.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Presentation-agnostic dashboard data; formatting is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub streak: u32,
    pub stats: QuizStats,
    pub weekly: Vec<DailyAccuracy>,
    pub recent: Vec<HistoryRecord>,
}

/// Reads a user's history and derives streak and statistics from it.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    history: Arc<dyn HistoryRepository>,
    policy: XpPolicy,
    recent_limit: usize,
    offset: Option<FixedOffset>,
}

impl DashboardService {
    #[must_use]
    pub fn new(clock: Clock, history: Arc<dyn HistoryRepository>) -> Self {
        Self {
            clock,
            history,
            policy: XpPolicy::default(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            offset: None,
        }
    }

    /// Bucket calendar days in a fixed offset instead of the local time zone.
    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: XpPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    /// Build the dashboard for `owner` from their whole history.
    ///
    /// A failed history read is logged and yields an empty dashboard.
    pub async fn snapshot(&self, owner: &UserId) -> DashboardSnapshot {
        let history = match self.history.list_all_history(owner).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(owner = %owner, error = %err, "failed to load quiz history");
                Vec::new()
            }
        };

        match self.offset {
            Some(offset) => self.summarize(&history, &offset),
            None => self.summarize(&history, &Local),
        }
    }

    fn summarize<Tz: TimeZone>(&self, history: &[HistoryRecord], tz: &Tz) -> DashboardSnapshot {
        let now = self.clock.now_in(tz);
        DashboardSnapshot {
            streak: calculate_streak(history, &now),
            stats: QuizStats::from_history_with_policy(history, self.policy),
            weekly: weekly_accuracy(history, &now),
            recent: recent_activity(history, self.recent_limit)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

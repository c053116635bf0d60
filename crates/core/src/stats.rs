//! Streak and rolling statistics derived from quiz history.
//!
//! All functions take `now` in the time zone whose calendar days should be used;
//! records are projected into that zone before bucketing.

use chrono::{DateTime, Days, NaiveDate, TimeZone};

use crate::model::HistoryRecord;

/// Length of the trailing accuracy series, today included.
pub const CHART_DAYS: usize = 7;

/// Engagement-points coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpPolicy {
    pub per_quiz: u64,
    pub per_correct: u64,
    pub per_level: u64,
}

impl Default for XpPolicy {
    fn default() -> Self {
        Self {
            per_quiz: 10,
            per_correct: 5,
            per_level: 100,
        }
    }
}

impl XpPolicy {
    #[must_use]
    pub fn xp(&self, total_quizzes: usize, total_correct: u64) -> u64 {
        let quizzes = u64::try_from(total_quizzes).unwrap_or(u64::MAX);
        self.per_quiz
            .saturating_mul(quizzes)
            .saturating_add(self.per_correct.saturating_mul(total_correct))
    }

    #[must_use]
    pub fn level(&self, xp: u64) -> u64 {
        if self.per_level == 0 {
            return 1;
        }
        xp / self.per_level + 1
    }
}

/// Aggregate counters shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizStats {
    pub total_quizzes: usize,
    pub avg_accuracy: f64,
    pub xp: u64,
    pub level: u64,
}

impl QuizStats {
    #[must_use]
    pub fn from_history(history: &[HistoryRecord]) -> Self {
        Self::from_history_with_policy(history, XpPolicy::default())
    }

    #[must_use]
    pub fn from_history_with_policy(history: &[HistoryRecord], policy: XpPolicy) -> Self {
        let total_quizzes = history.len();
        let total_correct: u64 = history.iter().map(|r| u64::from(r.score)).sum();
        let xp = policy.xp(total_quizzes, total_correct);
        Self {
            total_quizzes,
            avg_accuracy: mean(history.iter().map(|r| r.accuracy)),
            xp,
            level: policy.level(xp),
        }
    }
}

/// One point of the trailing accuracy chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAccuracy {
    pub date: NaiveDate,
    pub label: String,
    pub avg_accuracy: f64,
    pub quizzes: usize,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0_f64, 0_u32), |(sum, count), v| {
        (sum + v, count.saturating_add(1))
    });
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

fn local_date<Tz: TimeZone>(record: &HistoryRecord, tz: &Tz) -> NaiveDate {
    record.recorded_at.with_timezone(tz).date_naive()
}

/// Consecutive calendar days, ending today or yesterday, with at least one quiz.
///
/// Several quizzes on the same day count once. Input order does not matter.
#[must_use]
pub fn calculate_streak<Tz: TimeZone>(history: &[HistoryRecord], now: &DateTime<Tz>) -> u32 {
    let tz = now.timezone();
    let mut dates: Vec<NaiveDate> = history.iter().map(|r| local_date(r, &tz)).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let Some((&latest, older)) = dates.split_first() else {
        return 0;
    };

    let today = now.date_naive();
    if latest != today && Some(latest) != today.pred_opt() {
        return 0;
    }

    let mut streak = 1_u32;
    let mut previous = latest;
    for &date in older {
        if previous.pred_opt() != Some(date) {
            break;
        }
        streak = streak.saturating_add(1);
        previous = date;
    }
    streak
}

/// Mean accuracy per calendar day for the trailing [`CHART_DAYS`] days, oldest first.
///
/// Days without quizzes report `0.0`.
#[must_use]
pub fn weekly_accuracy<Tz: TimeZone>(
    history: &[HistoryRecord],
    now: &DateTime<Tz>,
) -> Vec<DailyAccuracy> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..CHART_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
        .map(|date| {
            let day: Vec<f64> = history
                .iter()
                .filter(|r| local_date(r, &tz) == date)
                .map(|r| r.accuracy)
                .collect();
            DailyAccuracy {
                date,
                label: date.format("%a").to_string(),
                avg_accuracy: mean(day.iter().copied()),
                quizzes: day.len(),
            }
        })
        .collect()
}

/// Up to `limit` records, most recent first.
#[must_use]
pub fn recent_activity(history: &[HistoryRecord], limit: usize) -> Vec<&HistoryRecord> {
    let mut sorted: Vec<&HistoryRecord> = history.iter().collect();
    sorted.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    sorted.truncate(limit);
    sorted
}

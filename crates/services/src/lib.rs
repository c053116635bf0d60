#![forbid(unsafe_code)]

pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod question_provider;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use dashboard::{DashboardService, DashboardSnapshot};
pub use error::{AppServicesError, GenerationError, SessionError};
pub use question_provider::{AiQuestionProvider, QuestionProvider, StaticQuestionProvider};

pub use sessions::{
    Advance, NextAction, PendingSave, QuizRun, QuizSession, RunState, SessionEvent,
    SessionLoopService, SessionProgress, SessionStatus, SharedSession, TurnTicker,
};

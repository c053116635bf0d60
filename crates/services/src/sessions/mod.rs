mod progress;
mod service;
mod ticker;
mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{NextAction, SessionProgress};
pub use service::{
    Advance, LOW_TIME_THRESHOLD_SECS, QuizSession, SessionStatus, TURN_DURATION_SECS, TickOutcome,
};
pub use ticker::{SessionEvent, SharedSession, TurnTicker, share};
pub use workflow::{PendingSave, QuizRun, RunState, SessionLoopService};

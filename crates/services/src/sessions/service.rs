use std::fmt;

use quiz_core::model::{OPTION_COUNT, Party, Question, QuestionSet, QuizConfig, QuizMode, QuizResult};
use quiz_core::scoring::{build_result, score_party};

use super::progress::{NextAction, SessionProgress};
use crate::error::SessionError;

/// Seconds each party gets per question turn.
pub const TURN_DURATION_SECS: u32 = 60;

/// Below this many seconds the turn clock is shown as running out.
pub const LOW_TIME_THRESHOLD_SECS: u32 = 20;

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Done,
    Cancelled,
}

/// Result of one call to [`QuizSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Versus only: the same question passes to the other party.
    NextParty { party: Party, index: usize },
    /// A new question begins for `party`.
    NextQuestion { party: Party, index: usize },
    /// The last turn ended; the scored result is available via [`QuizSession::result`].
    Finished,
}

/// Result of one call to [`QuizSession::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Counting { time_remaining: u32 },
    /// The turn clock hit zero and forced a transition.
    Expired(Advance),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one quiz, solo or versus.
///
/// Every mutating call validates first and returns `SessionError` without touching state
/// when the call is not legal.
pub struct QuizSession {
    config: QuizConfig,
    questions: Vec<Question>,
    turn_duration: u32,
    status: SessionStatus,
    current_index: usize,
    active_party: Party,
    turn: u64,
    answers: Vec<Vec<Option<u8>>>,
    elapsed: Vec<u32>,
    time_remaining: u32,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// Start an active session over `questions`.
    ///
    /// The delivered question count, not `config.question_count()`, bounds the session.
    #[must_use]
    pub fn new(config: QuizConfig, questions: QuestionSet) -> Self {
        let questions = questions.into_vec();
        let parties = config.mode().party_count();
        Self {
            answers: vec![vec![None; questions.len()]; parties],
            elapsed: vec![0; parties],
            config,
            questions,
            turn_duration: TURN_DURATION_SECS,
            status: SessionStatus::Active,
            current_index: 0,
            active_party: Party::One,
            turn: 0,
            time_remaining: TURN_DURATION_SECS,
            result: None,
        }
    }

    /// Override the per-turn duration (at least one second).
    #[must_use]
    pub fn with_turn_duration(mut self, seconds: u32) -> Self {
        self.turn_duration = seconds.max(1);
        self.time_remaining = self.turn_duration;
        self
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.config.mode()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    #[must_use]
    pub fn active_party(&self) -> Party {
        self.active_party
    }

    /// Number of turn transitions so far. Back navigation does not count.
    #[must_use]
    pub fn turn_number(&self) -> u64 {
        self.turn
    }

    #[must_use]
    pub fn active_party_name(&self) -> &str {
        self.config.party_name(self.active_party)
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn turn_duration(&self) -> u32 {
        self.turn_duration
    }

    /// Seconds `party` has spent as the active party.
    #[must_use]
    pub fn elapsed(&self, party: Party) -> u32 {
        self.elapsed.get(party.index()).copied().unwrap_or(0)
    }

    /// Current selections of `party`, one slot per question. Empty for a party not in play.
    #[must_use]
    pub fn answers(&self, party: Party) -> &[Option<u8>] {
        self.answers.get(party.index()).map_or(&[], Vec::as_slice)
    }

    /// Selection of the active party on the current question.
    #[must_use]
    pub fn current_selection(&self) -> Option<u8> {
        self.answers(self.active_party)
            .get(self.current_index)
            .copied()
            .flatten()
    }

    /// Scored result, present once the session is `Done`.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SessionError::NotActive)
        }
    }

    fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// Record the active party's choice for the current question.
    ///
    /// A later selection for the same turn overwrites the earlier one; nothing advances.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidOption` for an index outside `0..4`, or
    /// `SessionError::NotActive` once the session is done or cancelled.
    pub fn select_option(&mut self, option: u8) -> Result<(), SessionError> {
        self.ensure_active()?;
        if usize::from(option) >= OPTION_COUNT {
            return Err(SessionError::InvalidOption(option));
        }
        let index = self.current_index;
        if let Some(slot) = self
            .answers
            .get_mut(self.active_party.index())
            .and_then(|answers| answers.get_mut(index))
        {
            *slot = Some(option);
        }
        Ok(())
    }

    /// Count one second off the active turn.
    ///
    /// Reaching zero runs [`Self::advance`]; the current selection, possibly none, stands.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` once the session is done or cancelled.
    pub fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        self.ensure_active()?;
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if let Some(elapsed) = self.elapsed.get_mut(self.active_party.index()) {
            *elapsed = elapsed.saturating_add(1);
        }
        if self.time_remaining == 0 {
            return self.advance().map(TickOutcome::Expired);
        }
        Ok(TickOutcome::Counting {
            time_remaining: self.time_remaining,
        })
    }

    /// End the current turn.
    ///
    /// This is the only turn transition; the manual action and timer expiry both go
    /// through it. Solo moves to the next question. Versus hands party one's turn to
    /// party two, then moves on after party two. The last turn finalizes the result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` once the session is done or cancelled.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        self.ensure_active()?;

        let step = match (self.mode(), self.active_party) {
            (QuizMode::Versus, Party::One) => {
                self.active_party = Party::Two;
                Advance::NextParty {
                    party: Party::Two,
                    index: self.current_index,
                }
            }
            _ if self.is_last_question() => {
                self.finalize();
                return Ok(Advance::Finished);
            }
            _ => {
                self.current_index += 1;
                self.active_party = Party::One;
                Advance::NextQuestion {
                    party: Party::One,
                    index: self.current_index,
                }
            }
        };

        self.turn += 1;
        self.time_remaining = self.turn_duration;
        Ok(step)
    }

    /// Step back one question in solo mode, keeping answers and the running clock.
    ///
    /// Returns the new index; at the first question this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::BackNavigationUnavailable` in versus mode, or
    /// `SessionError::NotActive` once the session is done or cancelled.
    pub fn go_back(&mut self) -> Result<usize, SessionError> {
        self.ensure_active()?;
        if self.mode() != QuizMode::Solo {
            return Err(SessionError::BackNavigationUnavailable);
        }
        self.current_index = self.current_index.saturating_sub(1);
        Ok(self.current_index)
    }

    /// Abandon the session, discarding all answers without producing a result.
    ///
    /// Cancelling twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if the session already finished.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Cancelled => Ok(()),
            SessionStatus::Done => Err(SessionError::NotActive),
            SessionStatus::Active => {
                self.status = SessionStatus::Cancelled;
                for answers in &mut self.answers {
                    answers.iter_mut().for_each(|slot| *slot = None);
                }
                self.elapsed.iter_mut().for_each(|e| *e = 0);
                self.time_remaining = 0;
                Ok(())
            }
        }
    }

    fn finalize(&mut self) {
        let score = |party: Party| {
            score_party(
                &self.questions,
                self.answers(party),
                self.elapsed(party),
                self.config.party_name(party),
            )
        };
        let party_one = score(Party::One);
        let party_two = match self.mode() {
            QuizMode::Solo => None,
            QuizMode::Versus => Some(score(Party::Two)),
        };
        self.result = Some(build_result(
            self.mode(),
            self.questions.clone(),
            party_one,
            party_two,
        ));
        self.status = SessionStatus::Done;
        self.time_remaining = 0;
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let percent = if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let (index, n) = (self.current_index as f64, total as f64);
            match self.mode() {
                QuizMode::Solo => (index + 1.0) / n * 100.0,
                QuizMode::Versus => {
                    let turn = if self.active_party == Party::Two { 1.0 } else { 0.5 };
                    index / n * 100.0 + (1.0 / n) * 100.0 * turn
                }
            }
        };
        SessionProgress {
            current_index: self.current_index,
            total,
            active_party: self.active_party,
            time_remaining: self.time_remaining,
            percent,
            low_time: self.time_remaining < LOW_TIME_THRESHOLD_SECS,
        }
    }

    #[must_use]
    pub fn next_action(&self) -> NextAction {
        let last = self.is_last_question();
        match (self.mode(), self.active_party) {
            (QuizMode::Versus, Party::One) => NextAction::NextPlayer,
            (QuizMode::Versus, Party::Two) if last => NextAction::FinishBattle,
            (QuizMode::Versus, Party::Two) => NextAction::NextQuestion,
            (QuizMode::Solo, _) if last => NextAction::SeeResults,
            (QuizMode::Solo, _) => NextAction::ProceedToNext,
        }
    }

    /// Whether `go_back` would currently move.
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.is_active() && self.mode() == QuizMode::Solo && self.current_index > 0
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("mode", &self.mode())
            .field("status", &self.status)
            .field("questions_len", &self.questions.len())
            .field("current_index", &self.current_index)
            .field("active_party", &self.active_party)
            .field("time_remaining", &self.time_remaining)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

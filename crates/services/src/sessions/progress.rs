use quiz_core::model::Party;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProgress {
    pub current_index: usize,
    pub total: usize,
    pub active_party: Party,
    pub time_remaining: u32,
    /// Completion in `0.0..=100.0`; versus mode counts half a question per turn.
    pub percent: f64,
    pub low_time: bool,
}

/// What the primary action button does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    NextPlayer,
    NextQuestion,
    FinishBattle,
    ProceedToNext,
    SeeResults,
}

impl NextAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            NextAction::NextPlayer => "NEXT PLAYER",
            NextAction::NextQuestion => "NEXT QUESTION",
            NextAction::FinishBattle => "FINISH BATTLE",
            NextAction::ProceedToNext => "PROCEED TO NEXT",
            NextAction::SeeResults => "SEE RESULTS",
        }
    }
}

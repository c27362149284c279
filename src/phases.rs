use crate::models::Stage;
use crate::storage::LocalStore;
use thiserror::Error;

pub const FIRST_PHASE: u8 = 1;
pub const LAST_PHASE: u8 = 7;

#[derive(Debug, Error)]
pub enum PhaseError {
    /// User-visible rejection; the engine state is unchanged.
    #[error("Complete this phase first: pick an industry and a question, then select and reveal a response")]
    NotReady,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given phase.
    Moved(u8),
    /// Phase 7 was complete; report generation is the terminal action, not a
    /// state transition.
    GenerateReport,
}

/// Sequencer for the ordered evaluation phases.
///
/// Phase 1 is the ungated chat sandbox. Phases 2..7 gate on an industry, a
/// question, and a selected-and-revealed response; advancing resets the
/// industry/question selection so the next phase starts from scratch.
pub struct PhaseEngine {
    current: u8,
    can_proceed: bool,
}

impl PhaseEngine {
    pub fn new() -> Self {
        Self {
            current: FIRST_PHASE,
            can_proceed: false,
        }
    }

    pub fn current_phase(&self) -> u8 {
        self.current
    }

    /// Evaluation stage for the current phase.
    pub fn stage(&self) -> Stage {
        // current stays within [1, 7] by construction.
        Stage::from_phase(self.current).unwrap_or(Stage::Comprehension)
    }

    pub fn can_proceed(&self) -> bool {
        self.current == FIRST_PHASE || self.can_proceed
    }

    pub fn note_industry_changed(&mut self) {
        self.can_proceed = false;
    }

    pub fn note_question_changed(&mut self) {
        self.can_proceed = false;
    }

    /// A response was selected and revealed for the current question.
    pub fn note_response_revealed(&mut self) {
        self.can_proceed = true;
    }

    /// Move to the next phase, or trigger report generation from phase 7.
    ///
    /// A rejected advance leaves every piece of state untouched. A
    /// successful one clears the selected industry and posts the one-shot
    /// phase-reset signal through the store.
    pub fn advance(&mut self, store: &mut LocalStore) -> Result<Advance, PhaseError> {
        if !self.can_proceed() {
            return Err(PhaseError::NotReady);
        }
        if self.current == LAST_PHASE {
            return Ok(Advance::GenerateReport);
        }
        store.clear_selected_industry()?;
        store.mark_reset_phase()?;
        self.current += 1;
        self.can_proceed = false;
        Ok(Advance::Moved(self.current))
    }
}

impl Default for PhaseEngine {
    fn default() -> Self {
        Self::new()
    }
}

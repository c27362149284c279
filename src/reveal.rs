use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Delay between selecting a card and revealing the rest.
pub const REVEAL_DELAY: Duration = Duration::from_millis(2000);
/// Grace period before unselected cards flip on their own in auto-flip mode.
pub const AUTO_FLIP_GRACE: Duration = Duration::from_millis(2000);

/// Which face of a flipped card is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

#[derive(Debug, Clone)]
pub struct Card {
    pub model_id: String,
    pub flipped: bool,
    pub face: Face,
}

#[derive(Debug, Clone, PartialEq)]
enum BoardState {
    Unselected,
    Selected { model_id: String, reveal_at: Instant },
    Revealed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("A response is already selected for this question")]
    AlreadySelected,
    #[error("Card is already flipped")]
    AlreadyFlipped,
    #[error("No such card")]
    UnknownCard,
}

/// Flip/reveal sequencing for one question's set of response cards.
///
/// Unselected -> Selected (that card flips at once) -> Revealed (all cards
/// flip), reached `REVEAL_DELAY` after selection, immediately via
/// `force_reveal`, or via the auto-flip grace period when no selection
/// happens. Deadlines are explicit: callers drive them through `poll`, or
/// let a `RevealTimer` do it.
pub struct RevealBoard {
    cards: Vec<Card>,
    state: BoardState,
    auto_flip_at: Option<Instant>,
}

impl RevealBoard {
    pub fn new<I, S>(model_ids: I, auto_flip: bool, now: Instant) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cards = model_ids
            .into_iter()
            .map(|id| Card {
                model_id: id.into(),
                flipped: false,
                face: Face::Front,
            })
            .collect();
        Self {
            cards,
            state: BoardState::Unselected,
            auto_flip_at: auto_flip.then(|| now + AUTO_FLIP_GRACE),
        }
    }

    /// Full reset for a new question: back to unselected, all cards unflipped.
    pub fn reset<I, S>(&mut self, model_ids: I, auto_flip: bool, now: Instant)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self = Self::new(model_ids, auto_flip, now);
    }

    /// Select a card. Only possible while that card is unflipped and nothing
    /// else has been selected for the current question. The selected card
    /// flips immediately; the rest reveal after `REVEAL_DELAY`.
    pub fn select(&mut self, model_id: &str, now: Instant) -> Result<(), SelectError> {
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.model_id == model_id)
            .ok_or(SelectError::UnknownCard)?;
        if card.flipped {
            return Err(SelectError::AlreadyFlipped);
        }
        if self.state != BoardState::Unselected {
            return Err(SelectError::AlreadySelected);
        }
        card.flipped = true;
        card.face = Face::Back;
        self.state = BoardState::Selected {
            model_id: model_id.to_string(),
            reveal_at: now + REVEAL_DELAY,
        };
        Ok(())
    }

    /// Presenter-forced reveal: all cards flip now.
    pub fn force_reveal(&mut self) {
        self.flip_all();
        self.state = BoardState::Revealed;
    }

    /// Apply any deadline that has come due.
    pub fn poll(&mut self, now: Instant) {
        match &self.state {
            BoardState::Selected { reveal_at, .. } if now >= *reveal_at => {
                self.flip_all();
                self.state = BoardState::Revealed;
            }
            BoardState::Unselected => {
                if let Some(at) = self.auto_flip_at
                    && now >= at
                {
                    self.flip_all();
                    self.state = BoardState::Revealed;
                }
            }
            _ => {}
        }
    }

    /// The next instant at which `poll` would change state, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            BoardState::Selected { reveal_at, .. } => Some(*reveal_at),
            BoardState::Unselected => self.auto_flip_at,
            BoardState::Revealed => None,
        }
    }

    /// Clicking a flipped card only toggles its own front/back display.
    pub fn toggle_face(&mut self, model_id: &str) {
        if let Some(card) = self.cards.iter_mut().find(|c| c.model_id == model_id)
            && card.flipped
        {
            card.face = match card.face {
                Face::Front => Face::Back,
                Face::Back => Face::Front,
            };
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.state {
            BoardState::Selected { model_id, .. } => Some(model_id),
            _ => None,
        }
    }

    pub fn revealed(&self) -> bool {
        self.state == BoardState::Revealed
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn is_flipped(&self, model_id: &str) -> Option<bool> {
        self.cards
            .iter()
            .find(|c| c.model_id == model_id)
            .map(|c| c.flipped)
    }

    fn flip_all(&mut self) {
        for card in &mut self.cards {
            if !card.flipped {
                card.flipped = true;
                card.face = Face::Back;
            }
        }
    }
}

/// Scheduled-callback driver for a board's deadlines.
///
/// Dropping the timer aborts the task, so a view that goes away never has
/// its board updated afterwards.
pub struct RevealTimer {
    handle: tokio::task::JoinHandle<()>,
}

impl RevealTimer {
    pub fn spawn(board: Arc<Mutex<RevealBoard>>) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                let deadline = {
                    let board = board.lock().expect("board mutex poisoned");
                    if board.revealed() {
                        break;
                    }
                    board.next_deadline()
                };
                match deadline {
                    Some(at) => {
                        tokio::time::sleep_until(at).await;
                        board
                            .lock()
                            .expect("board mutex poisoned")
                            .poll(Instant::now());
                    }
                    // No deadline pending yet (no selection, no auto-flip):
                    // wake periodically to pick one up.
                    None => tokio::time::sleep(Duration::from_millis(25)).await,
                }
            }
        });
        Self { handle }
    }
}

impl Drop for RevealTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

use crate::Card;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Shown,
    Revealed,
}

/// Where one conversation is in the show/reveal/grade cycle.
///
/// A card is attached to every phase except `Idle`, so the state can never
/// claim to show something it does not hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// `graded` is set once a grade has been submitted for this card; the card
    /// stays around for repeat queries but cannot be revealed or graded again.
    Shown { card: Card, graded: bool },
    Revealed { card: Card },
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Shown { .. } => Phase::Shown,
            SessionState::Revealed { .. } => Phase::Revealed,
        }
    }

    pub fn current(&self) -> Option<&Card> {
        match self {
            SessionState::Idle => None,
            SessionState::Shown { card, .. } | SessionState::Revealed { card } => Some(card),
        }
    }

    pub fn show(&mut self, card: Card) {
        *self = SessionState::Shown { card, graded: false };
    }

    pub fn clear(&mut self) {
        *self = SessionState::Idle;
    }

    /// Moves a freshly shown card to `Revealed`. Returns `None` (and leaves the
    /// state alone) from any other phase.
    pub fn reveal(&mut self) -> Option<&Card> {
        match std::mem::take(self) {
            SessionState::Shown { card, graded: false } => {
                *self = SessionState::Revealed { card };
            }
            other => {
                *self = other;
                return None;
            }
        }
        self.current()
    }

    /// Closes the reveal cycle for the current card. Only valid from `Revealed`.
    pub fn complete_grade(&mut self) -> Option<&Card> {
        match std::mem::take(self) {
            SessionState::Revealed { card } => {
                *self = SessionState::Shown { card, graded: true };
            }
            other => {
                *self = other;
                return None;
            }
        }
        self.current()
    }
}

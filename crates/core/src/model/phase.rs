use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("invalid phase number: {0}")]
    InvalidNumber(u8),
}

/// The three escalating exercise formats of a module.
///
/// - `Recognition`: multiple-choice identification of the right principle
/// - `Coaching`: free-text response graded by the completion service
/// - `Dialogue`: multi-turn conversation with an AI-played counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Recognition,
    Coaching,
    Dialogue,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Recognition, Phase::Coaching, Phase::Dialogue];

    /// Converts a 1-based phase number to a `Phase`.
    ///
    /// # Errors
    ///
    /// Returns `PhaseError::InvalidNumber` outside 1-3.
    pub fn from_number(value: u8) -> Result<Self, PhaseError> {
        match value {
            1 => Ok(Self::Recognition),
            2 => Ok(Self::Coaching),
            3 => Ok(Self::Dialogue),
            _ => Err(PhaseError::InvalidNumber(value)),
        }
    }

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Phase::Recognition => 1,
            Phase::Coaching => 2,
            Phase::Dialogue => 3,
        }
    }

    /// The phase whose completions gate this one, if any.
    #[must_use]
    pub fn previous(self) -> Option<Phase> {
        match self {
            Phase::Recognition => None,
            Phase::Coaching => Some(Phase::Recognition),
            Phase::Dialogue => Some(Phase::Coaching),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Recognition => "Identify & Apply",
            Phase::Coaching => "Coached Response",
            Phase::Dialogue => "Live Conversation",
        };
        write!(f, "Phase {}: {label}", self.number())
    }
}

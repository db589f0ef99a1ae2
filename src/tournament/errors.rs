//! Error types for tournament operations.

use thiserror::Error;
use uuid::Uuid;

use super::entities::{MatchId, PlayerId};
use super::state_machine::TournamentState;

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

/// Malformed configuration or result data, rejected before any state
/// is mutated.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    /// Player id not present in the tournament's player set
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Match id not present in the tournament's match set
    #[error("unknown match: {0}")]
    UnknownMatch(MatchId),

    /// Id collides with one already registered
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// Result submitted for a match that already has one
    #[error("match {0} is already complete")]
    MatchAlreadyComplete(MatchId),

    /// Game counts inconsistent with the configured best-of
    #[error("invalid result {player1_wins}-{player2_wins}-{draws} for match {id} at best-of-{best_of}")]
    InvalidResult {
        id: MatchId,
        player1_wins: u32,
        player2_wins: u32,
        draws: u32,
        best_of: u32,
    },

    /// Configuration rejected at creation or patch time
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Operation illegal in the tournament's current lifecycle state.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StateError {
    #[error("tournament {id} is {actual}, operation requires {expected}")]
    InvalidState {
        id: String,
        expected: TournamentState,
        actual: TournamentState,
    },

    /// `finish` called before the format's end condition holds
    #[error("tournament {id} has rounds left to play")]
    NotFinishable { id: String },

    /// Terminal-state tournament cannot be aborted again
    #[error("tournament {id} already ended as {actual}")]
    AlreadyEnded {
        id: String,
        actual: TournamentState,
    },

    #[error("tournament {id}: internal state inconsistency")]
    Internal { id: String },
}

/// The active generator cannot produce a legal round.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PairingError {
    #[error("round {round} has unresolved matches")]
    IncompleteRound { round: u32 },

    #[error("need at least {needed} active players, have {current}")]
    InsufficientPlayers { needed: usize, current: usize },

    #[error("round limit of {total} reached")]
    RoundLimitExceeded { total: u32 },

    #[error("playoff cut leaves only {eligible} eligible players")]
    NoPlayoffEligible { eligible: usize },
}

/// Union of all tournament error categories.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TournamentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Pairing(#[from] PairingError),
}

impl TournamentError {
    /// The match id the error refers to, if any.
    pub fn match_id(&self) -> Option<Uuid> {
        match self {
            Self::Validation(ValidationError::UnknownMatch(id))
            | Self::Validation(ValidationError::MatchAlreadyComplete(id))
            | Self::Validation(ValidationError::InvalidResult { id, .. }) => Some(*id),
            _ => None,
        }
    }
}

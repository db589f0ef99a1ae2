//! Tournament model: entities, configuration, errors, and the
//! lifecycle state machine.

pub mod config;
pub mod entities;
pub mod errors;
pub mod state_machine;

pub use config::{
    Format, PlayoffConfig, PlayoffCut, PlayoffFormat, ScoringConfig, ScoringPatch, Sorting,
    TiebreakMethod, TournamentConfig, TournamentPatch,
};
pub use entities::{Match, MatchId, MatchResult, Outcome, Player, PlayerId};
pub use errors::{
    PairingError, StateError, TournamentError, TournamentResult, ValidationError,
};
pub use state_machine::{RoundCounters, Tournament, TournamentOptions, TournamentState};

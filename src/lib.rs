//! # Tourney
//!
//! A tournament pairing and standings engine covering single and double
//! elimination, Swiss, and single and double round robin.
//!
//! The engine is synchronous and purely in-memory: pairing and
//! standings are deterministic functions of tournament state, and the
//! caller is responsible for serializing mutations to a given
//! tournament. Persistence and transport are likewise the caller's
//! concern; every entity derives `serde` traits for that purpose.
//!
//! ## Architecture
//!
//! - [`tournament`]: entities, configuration, and the lifecycle state
//!   machine (`setup -> active -> (playoffs)? -> finished`, with
//!   `aborted` reachable from any non-terminal state)
//! - [`pairing`]: one generator per format behind a common capability,
//!   fixed at tournament start - bracket skeletons for elimination,
//!   score-group pairing for Swiss, a precomputed circle-method
//!   schedule for round robin
//! - [`standings`]: points and the configurable tiebreak chain
//!   (Solkoff, median-Buchholz, Sonneborn-Berger, cumulative, versus,
//!   and the win-percentage family)
//!
//! ## Example
//!
//! ```
//! use tourney::{Format, Tournament, TournamentConfig};
//!
//! let config = TournamentConfig::new("t-1", "Friday Cup", Format::SingleElimination);
//! let mut tournament = Tournament::new(config).unwrap();
//! tournament.register_player("alice", "Alice").unwrap();
//! tournament.register_player("bob", "Bob").unwrap();
//!
//! let round1 = tournament.start().unwrap();
//! tournament.submit_result(round1[0], 1, 0, 0).unwrap();
//! tournament.finish().unwrap();
//! ```

/// Pairing generators, one strategy per format.
pub mod pairing;

/// Standings computation and tiebreaks.
pub mod standings;

/// Tournament entities, configuration, and lifecycle.
pub mod tournament;

pub use pairing::{PairingContext, PairingStrategy, RoundGenerator};
pub use standings::{PlayerStanding, StandingsCalculator};
pub use tournament::{
    Format, Match, MatchId, MatchResult, Outcome, PairingError, PlayerId, PlayoffConfig,
    PlayoffCut, PlayoffFormat, Player, RoundCounters, ScoringConfig, ScoringPatch, Sorting,
    StateError, TiebreakMethod, Tournament, TournamentConfig, TournamentError, TournamentOptions,
    TournamentPatch, TournamentResult, TournamentState, ValidationError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Pairing generators - one strategy per tournament format.
//!
//! A strategy is selected once at tournament start and fixed for the
//! tournament's lifetime. Dispatch uses `enum_dispatch` for zero-cost
//! forwarding to the format-specific generator.

pub mod elimination;
pub mod round_robin;
pub mod swiss;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::standings::PlayerStanding;
use crate::tournament::config::{Format, PlayoffFormat, ScoringConfig};
use crate::tournament::entities::{Match, MatchId, Player, PlayerId};
use crate::tournament::errors::PairingError;

pub use elimination::EliminationGenerator;
pub use round_robin::RoundRobinGenerator;
pub use swiss::SwissGenerator;

/// Read-only snapshot handed to a generator.
///
/// `round` is the round of interest: the round being generated for
/// `generate_round`, the current round for `is_complete`.
pub struct PairingContext<'a> {
    pub round: u32,
    pub players: &'a [Player],
    pub matches: &'a [Match],
    pub standings: &'a [PlayerStanding],
    pub scoring: &'a ScoringConfig,
}

impl PairingContext<'_> {
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn is_active(&self, id: &PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.active)
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// Whether the two players have already met in any prior match.
    pub fn have_played(&self, a: &PlayerId, b: &PlayerId) -> bool {
        self.matches.iter().any(|m| m.contains(a) && m.contains(b))
    }

    pub fn round_matches(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round == round)
    }
}

/// Capability shared by all pairing generators.
#[enum_dispatch]
pub trait PairingStrategy {
    /// Produce the matches of round `ctx.round`. Byes and walkovers in
    /// the output are already complete.
    fn generate_round(&mut self, ctx: &PairingContext<'_>) -> Result<Vec<Match>, PairingError>;

    /// Format end condition: the final round has been generated and
    /// every match in it is resolved.
    fn is_complete(&self, ctx: &PairingContext<'_>) -> bool;

    /// Number of rounds this generator produces, fixed at construction.
    fn total_rounds(&self) -> u32;
}

/// Format-specific round generator, fixed at tournament start.
#[enum_dispatch(PairingStrategy)]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RoundGenerator {
    Elimination(EliminationGenerator),
    Swiss(SwissGenerator),
    RoundRobin(RoundRobinGenerator),
}

impl RoundGenerator {
    /// Build the generator for a format from players in seed order.
    /// `first_round` is the absolute number its first round will carry.
    pub fn for_format(
        format: Format,
        seeds: Vec<PlayerId>,
        consolation: bool,
        requested_rounds: u32,
        first_round: u32,
    ) -> Result<Self, PairingError> {
        Ok(match format {
            Format::SingleElimination => {
                EliminationGenerator::new(seeds, false, consolation, first_round)?.into()
            }
            Format::DoubleElimination => {
                EliminationGenerator::new(seeds, true, false, first_round)?.into()
            }
            Format::Swiss => SwissGenerator::new(seeds, requested_rounds, first_round)?.into(),
            Format::RoundRobin => RoundRobinGenerator::new(&seeds, false, first_round)?.into(),
            Format::DoubleRoundRobin => {
                RoundRobinGenerator::new(&seeds, true, first_round)?.into()
            }
        })
    }

    /// Build the playoff-stage bracket from cut survivors in rank order.
    pub fn playoff(
        format: PlayoffFormat,
        seeds: Vec<PlayerId>,
        first_round: u32,
    ) -> Result<Self, PairingError> {
        let double = matches!(format, PlayoffFormat::DoubleElimination);
        Ok(EliminationGenerator::new(seeds, double, false, first_round)?.into())
    }
}

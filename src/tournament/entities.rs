//! Tournament entities: players and matches.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::config::ScoringConfig;
use super::errors::ValidationError;

/// Caller-provided player identifier, unique within a tournament.
pub type PlayerId = String;

/// Match identifier.
pub type MatchId = Uuid;

/// A tournament participant.
///
/// Dropped players stay in the player set with `active` cleared so their
/// match history keeps feeding opponents' tiebreaks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub active: bool,
    /// Explicit seed value when the tournament sorts by seed
    pub seed: Option<u32>,
    /// Byes received so far; Swiss bye assignment prefers the fewest
    pub byes: u32,
    matches: Vec<MatchId>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: true,
            seed: None,
            byes: 0,
            matches: Vec::new(),
        }
    }

    /// Matches this player has been paired into, in creation order.
    pub fn matches(&self) -> &[MatchId] {
        &self.matches
    }

    /// Record a match reference. Duplicates are ignored so the list
    /// never contains the same match twice.
    pub fn record_match(&mut self, id: MatchId) {
        if !self.matches.contains(&id) {
            self.matches.push(id);
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Which side took a completed match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Player1,
    Player2,
    Draw,
}

/// Result status of a match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum MatchResult {
    Pending,
    Complete {
        player1_wins: u32,
        player2_wins: u32,
        draws: u32,
        outcome: Outcome,
    },
}

/// A single pairing within a round.
///
/// `player2` is absent for a bye. Byes and walkovers are created already
/// complete with zero game counts, so game statistics only ever cover
/// games actually played.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub round: u32,
    pub player1: PlayerId,
    pub player2: Option<PlayerId>,
    result: MatchResult,
}

impl Match {
    /// A pending match between two players.
    pub fn new(round: u32, player1: PlayerId, player2: PlayerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            round,
            player1,
            player2: Some(player2),
            result: MatchResult::Pending,
        }
    }

    /// A bye: one player, completed at creation.
    pub fn bye(round: u32, player: PlayerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            round,
            player1: player,
            player2: None,
            result: MatchResult::Complete {
                player1_wins: 0,
                player2_wins: 0,
                draws: 0,
                outcome: Outcome::Player1,
            },
        }
    }

    /// A walkover against an opponent who can no longer play, completed
    /// at creation with the named winner and no games on record.
    pub fn walkover(round: u32, winner: PlayerId, loser: PlayerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            round,
            player1: winner,
            player2: Some(loser),
            result: MatchResult::Complete {
                player1_wins: 0,
                player2_wins: 0,
                draws: 0,
                outcome: Outcome::Player1,
            },
        }
    }

    pub fn result(&self) -> &MatchResult {
        &self.result
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.result, MatchResult::Complete { .. })
    }

    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn is_draw(&self) -> bool {
        matches!(
            self.result,
            MatchResult::Complete {
                outcome: Outcome::Draw,
                ..
            }
        )
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.player1 == *player || self.player2.as_ref() == Some(player)
    }

    /// The other player in this match, if there is one.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        if self.player1 == *player {
            self.player2.as_ref()
        } else if self.player2.as_ref() == Some(player) {
            Some(&self.player1)
        } else {
            None
        }
    }

    /// Winner id once complete; `None` while pending or on a draw.
    pub fn winner_id(&self) -> Option<&PlayerId> {
        match self.result {
            MatchResult::Complete {
                outcome: Outcome::Player1,
                ..
            } => Some(&self.player1),
            MatchResult::Complete {
                outcome: Outcome::Player2,
                ..
            } => self.player2.as_ref(),
            _ => None,
        }
    }

    /// Loser id once complete; `None` while pending, on a draw, or for
    /// a bye.
    pub fn loser_id(&self) -> Option<&PlayerId> {
        match self.result {
            MatchResult::Complete {
                outcome: Outcome::Player1,
                ..
            } => self.player2.as_ref(),
            MatchResult::Complete {
                outcome: Outcome::Player2,
                ..
            } => Some(&self.player1),
            _ => None,
        }
    }

    /// Game tallies (won, lost, drawn) from this player's side. All
    /// zeroes while pending or when the player is not in the match.
    pub fn games_of(&self, player: &PlayerId) -> (u32, u32, u32) {
        match self.result {
            MatchResult::Complete {
                player1_wins,
                player2_wins,
                draws,
                ..
            } => {
                if self.player1 == *player {
                    (player1_wins, player2_wins, draws)
                } else if self.player2.as_ref() == Some(player) {
                    (player2_wins, player1_wins, draws)
                } else {
                    (0, 0, 0)
                }
            }
            MatchResult::Pending => (0, 0, 0),
        }
    }

    /// Check game counts against the configured best-of without
    /// mutating anything, returning the outcome they would produce.
    ///
    /// A result is accepted when one side holds a majority of the
    /// best-of, or when every game has been played (equal wins with all
    /// games played is a draw). Anything else is rejected with
    /// `InvalidResult`, and resubmission on a complete match with
    /// `MatchAlreadyComplete`.
    pub fn validate_result(
        &self,
        player1_wins: u32,
        player2_wins: u32,
        draws: u32,
        scoring: &ScoringConfig,
    ) -> Result<Outcome, ValidationError> {
        if self.is_complete() {
            return Err(ValidationError::MatchAlreadyComplete(self.id));
        }
        let best_of = scoring.best_of;
        let majority = scoring.majority();
        let total = u64::from(player1_wins) + u64::from(player2_wins) + u64::from(draws);
        let invalid = || ValidationError::InvalidResult {
            id: self.id,
            player1_wins,
            player2_wins,
            draws,
            best_of,
        };
        if total > u64::from(best_of) {
            return Err(invalid());
        }
        if player1_wins >= majority {
            Ok(Outcome::Player1)
        } else if player2_wins >= majority {
            Ok(Outcome::Player2)
        } else if total == u64::from(best_of) {
            // All games played without a majority: the side ahead on
            // game wins takes the match, equal wins is a draw.
            match player1_wins.cmp(&player2_wins) {
                std::cmp::Ordering::Greater => Ok(Outcome::Player1),
                std::cmp::Ordering::Less => Ok(Outcome::Player2),
                std::cmp::Ordering::Equal => Ok(Outcome::Draw),
            }
        } else {
            Err(invalid())
        }
    }

    /// Record game counts for this match after validating them.
    pub fn record_result(
        &mut self,
        player1_wins: u32,
        player2_wins: u32,
        draws: u32,
        scoring: &ScoringConfig,
    ) -> Result<(), ValidationError> {
        let outcome = self.validate_result(player1_wins, player2_wins, draws, scoring)?;
        self.result = MatchResult::Complete {
            player1_wins,
            player2_wins,
            draws,
            outcome,
        };
        Ok(())
    }

    /// Complete a pending match as a walkover against the named loser.
    /// No games go on record. Complete matches are left untouched.
    pub(crate) fn concede(&mut self, loser: &PlayerId) {
        if self.is_complete() || !self.contains(loser) {
            return;
        }
        let outcome = if self.player1 == *loser {
            Outcome::Player2
        } else {
            Outcome::Player1
        };
        self.result = MatchResult::Complete {
            player1_wins: 0,
            player2_wins: 0,
            draws: 0,
            outcome,
        };
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.player2 {
            Some(player2) => write!(f, "r{}: {} vs {}", self.round, self.player1, player2),
            None => write!(f, "r{}: {} (bye)", self.round, self.player1),
        }
    }
}

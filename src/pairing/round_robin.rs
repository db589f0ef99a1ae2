//! Round-robin schedule generator (circle method).

use serde::{Deserialize, Serialize};

use super::{PairingContext, PairingStrategy};
use crate::tournament::entities::{Match, PlayerId};
use crate::tournament::errors::PairingError;

/// One scheduled pairing; `None` is the ghost slot for odd fields.
type Slot = Option<PlayerId>;

/// Round-robin generator with the full schedule precomputed at start.
///
/// Later rounds are pure lookups, so the schedule is identical
/// regardless of intermediate results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRobinGenerator {
    schedule: Vec<Vec<(Slot, Slot)>>,
    first_round: u32,
}

impl RoundRobinGenerator {
    /// Precompute the schedule by circle rotation. In double mode the
    /// mirrored cycle is appended with home/away reversed.
    pub fn new(seeds: &[PlayerId], double: bool, first_round: u32) -> Result<Self, PairingError> {
        if seeds.len() < 2 {
            return Err(PairingError::InsufficientPlayers {
                needed: 2,
                current: seeds.len(),
            });
        }
        let mut circle: Vec<Slot> = seeds.iter().cloned().map(Some).collect();
        if circle.len() % 2 != 0 {
            circle.push(None);
        }
        let size = circle.len();
        let mut schedule = Vec::with_capacity(size - 1);
        for _ in 0..size - 1 {
            let mut round = Vec::with_capacity(size / 2);
            for i in 0..size / 2 {
                round.push((circle[i].clone(), circle[size - 1 - i].clone()));
            }
            schedule.push(round);
            // Keep the first slot fixed, rotate the rest clockwise.
            let last = circle.pop().unwrap_or(None);
            circle.insert(1, last);
        }
        if double {
            let mirrored: Vec<Vec<(Slot, Slot)>> = schedule
                .iter()
                .map(|round| round.iter().map(|(a, b)| (b.clone(), a.clone())).collect())
                .collect();
            schedule.extend(mirrored);
        }
        Ok(Self {
            schedule,
            first_round,
        })
    }

    fn last_round(&self) -> u32 {
        self.first_round + self.schedule.len() as u32 - 1
    }
}

impl PairingStrategy for RoundRobinGenerator {
    fn generate_round(&mut self, ctx: &PairingContext<'_>) -> Result<Vec<Match>, PairingError> {
        if ctx.round < self.first_round || ctx.round > self.last_round() {
            return Err(PairingError::RoundLimitExceeded {
                total: self.last_round(),
            });
        }
        let index = (ctx.round - self.first_round) as usize;
        let mut matches = Vec::with_capacity(self.schedule[index].len());
        for (slot1, slot2) in &self.schedule[index] {
            let active1 = slot1.as_ref().filter(|id| ctx.is_active(id));
            let active2 = slot2.as_ref().filter(|id| ctx.is_active(id));
            let m = match (active1, active2) {
                (Some(a), Some(b)) => Match::new(ctx.round, a.clone(), b.clone()),
                // A scheduled opponent who dropped concedes a walkover;
                // the ghost slot is a true bye.
                (Some(a), None) => match slot2 {
                    Some(dropped) => Match::walkover(ctx.round, a.clone(), dropped.clone()),
                    None => Match::bye(ctx.round, a.clone()),
                },
                (None, Some(b)) => match slot1 {
                    Some(dropped) => Match::walkover(ctx.round, b.clone(), dropped.clone()),
                    None => Match::bye(ctx.round, b.clone()),
                },
                // Both sides gone: nothing to play.
                (None, None) => continue,
            };
            matches.push(m);
        }
        Ok(matches)
    }

    fn is_complete(&self, ctx: &PairingContext<'_>) -> bool {
        ctx.round >= self.last_round()
            && ctx
                .round_matches(self.last_round())
                .all(|m| m.is_complete())
    }

    fn total_rounds(&self) -> u32 {
        self.schedule.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::PlayerStanding;
    use crate::tournament::config::ScoringConfig;
    use crate::tournament::entities::Player;
    use std::collections::HashSet;

    fn ids(n: usize) -> Vec<PlayerId> {
        (1..=n).map(|i| format!("p{i}")).collect()
    }

    fn ctx_players(n: usize) -> Vec<Player> {
        ids(n).into_iter().map(|id| Player::new(id, "x")).collect()
    }

    fn ctx<'a>(
        round: u32,
        players: &'a [Player],
        matches: &'a [Match],
        standings: &'a [PlayerStanding],
        scoring: &'a ScoringConfig,
    ) -> PairingContext<'a> {
        PairingContext {
            round,
            players,
            matches,
            standings,
            scoring,
        }
    }

    fn collect_pairs(generator: &mut RoundRobinGenerator, players: &[Player]) -> Vec<(String, String)> {
        let scoring = ScoringConfig::default();
        let mut pairs = Vec::new();
        for round in 1..=generator.total_rounds() {
            let matches = generator
                .generate_round(&ctx(round, players, &[], &[], &scoring))
                .unwrap();
            for m in matches {
                if let Some(p2) = m.player2 {
                    pairs.push((m.player1, p2));
                }
            }
        }
        pairs
    }

    #[test]
    fn test_every_pair_meets_exactly_once() {
        for n in 2..=9 {
            let players = ctx_players(n);
            let mut generator = RoundRobinGenerator::new(&ids(n), false, 1).unwrap();
            let pairs = collect_pairs(&mut generator, &players);

            assert_eq!(pairs.len(), n * (n - 1) / 2, "n={n}");
            let unordered: HashSet<(String, String)> = pairs
                .into_iter()
                .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
                .collect();
            assert_eq!(unordered.len(), n * (n - 1) / 2, "n={n}");
        }
    }

    #[test]
    fn test_double_mode_mirrors_with_reversed_colors() {
        let n = 4;
        let players = ctx_players(n);
        let mut generator = RoundRobinGenerator::new(&ids(n), true, 1).unwrap();
        assert_eq!(generator.total_rounds(), 2 * (n as u32 - 1));
        let pairs = collect_pairs(&mut generator, &players);
        assert_eq!(pairs.len(), n * (n - 1));
        // Each ordered pair appears exactly once.
        let ordered: HashSet<(String, String)> = pairs.into_iter().collect();
        assert_eq!(ordered.len(), n * (n - 1));
    }

    #[test]
    fn test_odd_field_gets_one_bye_per_round() {
        let n = 5;
        let players = ctx_players(n);
        let scoring = ScoringConfig::default();
        let mut generator = RoundRobinGenerator::new(&ids(n), false, 1).unwrap();
        let mut byes = Vec::new();
        for round in 1..=generator.total_rounds() {
            let matches = generator
                .generate_round(&ctx(round, &players, &[], &[], &scoring))
                .unwrap();
            let round_byes: Vec<_> = matches.iter().filter(|m| m.is_bye()).collect();
            assert_eq!(round_byes.len(), 1);
            byes.push(round_byes[0].player1.clone());
        }
        // Everyone sits out exactly once.
        let unique: HashSet<_> = byes.iter().collect();
        assert_eq!(unique.len(), n);
    }

    #[test]
    fn test_round_past_schedule_is_rejected() {
        let players = ctx_players(4);
        let scoring = ScoringConfig::default();
        let mut generator = RoundRobinGenerator::new(&ids(4), false, 1).unwrap();
        let err = generator
            .generate_round(&ctx(4, &players, &[], &[], &scoring))
            .unwrap_err();
        assert_eq!(err, PairingError::RoundLimitExceeded { total: 3 });
    }

    #[test]
    fn test_dropped_player_concedes_walkover() {
        let mut players = ctx_players(4);
        players[3].active = false;
        let scoring = ScoringConfig::default();
        let mut generator = RoundRobinGenerator::new(&ids(4), false, 1).unwrap();
        let matches = generator
            .generate_round(&ctx(1, &players, &[], &[], &scoring))
            .unwrap();
        let walkover = matches
            .iter()
            .find(|m| m.contains(&"p4".to_string()))
            .unwrap();
        assert!(walkover.is_complete());
        assert_ne!(walkover.winner_id(), Some(&"p4".to_string()));
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let g1 = RoundRobinGenerator::new(&ids(7), false, 1).unwrap();
        let g2 = RoundRobinGenerator::new(&ids(7), false, 1).unwrap();
        assert_eq!(g1.schedule, g2.schedule);
    }
}

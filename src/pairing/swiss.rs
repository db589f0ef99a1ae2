//! Swiss pairing generator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{PairingContext, PairingStrategy};
use crate::tournament::entities::{Match, Player, PlayerId};
use crate::tournament::errors::PairingError;

/// Swiss generator: pairs within score groups, avoiding rematches.
///
/// The round total is fixed at construction (user value, or
/// ceil(log2(players)) when unspecified).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwissGenerator {
    seed_order: Vec<PlayerId>,
    total: u32,
    first_round: u32,
}

impl SwissGenerator {
    pub fn new(
        seeds: Vec<PlayerId>,
        requested_rounds: u32,
        first_round: u32,
    ) -> Result<Self, PairingError> {
        if seeds.len() < 2 {
            return Err(PairingError::InsufficientPlayers {
                needed: 2,
                current: seeds.len(),
            });
        }
        let total = if requested_rounds > 0 {
            requested_rounds
        } else {
            // ceil(log2(n))
            u32::BITS - (seeds.len() as u32 - 1).leading_zeros()
        };
        Ok(Self {
            seed_order: seeds,
            total,
            first_round,
        })
    }

    fn last_round(&self) -> u32 {
        self.first_round + self.total - 1
    }

    fn seed_position(&self, id: &PlayerId) -> usize {
        self.seed_order
            .iter()
            .position(|s| s == id)
            .unwrap_or(usize::MAX)
    }

    /// Pair the pool in order, backtracking when a tail cannot be
    /// completed. With `allow_rematch` false only fresh opponents are
    /// considered.
    fn pair_pool(
        pool: &[&Player],
        ctx: &PairingContext<'_>,
        allow_rematch: bool,
    ) -> Option<Vec<(PlayerId, PlayerId)>> {
        if pool.is_empty() {
            return Some(Vec::new());
        }
        let first = pool[0];
        for i in 1..pool.len() {
            let candidate = pool[i];
            if !allow_rematch && ctx.have_played(&first.id, &candidate.id) {
                continue;
            }
            let rest: Vec<&Player> = pool
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != 0 && j != i)
                .map(|(_, p)| *p)
                .collect();
            if let Some(mut tail) = Self::pair_pool(&rest, ctx, allow_rematch) {
                tail.insert(0, (first.id.clone(), candidate.id.clone()));
                return Some(tail);
            }
        }
        None
    }
}

impl PairingStrategy for SwissGenerator {
    fn generate_round(&mut self, ctx: &PairingContext<'_>) -> Result<Vec<Match>, PairingError> {
        if ctx.round < self.first_round || ctx.round > self.last_round() {
            return Err(PairingError::RoundLimitExceeded {
                total: self.last_round(),
            });
        }
        let mut active: Vec<&Player> = ctx.players.iter().filter(|p| p.active).collect();
        if active.len() < 2 {
            return Err(PairingError::InsufficientPlayers {
                needed: 2,
                current: active.len(),
            });
        }

        let points: HashMap<&str, f64> = ctx
            .standings
            .iter()
            .map(|s| (s.player_id.as_str(), s.points))
            .collect();
        let points_of = |id: &str| points.get(id).copied().unwrap_or(0.0);

        // Score groups descending; seed order within a group.
        active.sort_by(|a, b| {
            points_of(&b.id)
                .total_cmp(&points_of(&a.id))
                .then_with(|| self.seed_position(&a.id).cmp(&self.seed_position(&b.id)))
        });

        // The bye goes to the lowest score group, fewest historical
        // byes, lowest seed.
        let mut bye_player = None;
        if active.len() % 2 != 0 {
            let candidate = active
                .iter()
                .min_by(|a, b| {
                    points_of(&a.id)
                        .total_cmp(&points_of(&b.id))
                        .then_with(|| a.byes.cmp(&b.byes))
                        .then_with(|| self.seed_position(&b.id).cmp(&self.seed_position(&a.id)))
                        .then_with(|| a.id.cmp(&b.id))
                })
                .map(|p| p.id.clone());
            if let Some(id) = candidate {
                active.retain(|p| p.id != id);
                bye_player = Some(id);
            }
        }

        // Rematches only when no rematch-free pairing exists at all.
        let pairs = Self::pair_pool(&active, ctx, false)
            .or_else(|| Self::pair_pool(&active, ctx, true))
            .unwrap_or_default();

        let mut matches: Vec<Match> = pairs
            .into_iter()
            .map(|(a, b)| Match::new(ctx.round, a, b))
            .collect();
        if let Some(id) = bye_player {
            matches.push(Match::bye(ctx.round, id));
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
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::{PlayerStanding, StandingsCalculator};
    use crate::tournament::config::ScoringConfig;

    fn players(n: usize) -> Vec<Player> {
        (1..=n).map(|i| Player::new(format!("p{i}"), "x")).collect()
    }

    fn seed_ids(players: &[Player]) -> Vec<PlayerId> {
        players.iter().map(|p| p.id.clone()).collect()
    }

    fn standings_for(
        scoring: &ScoringConfig,
        players: &[Player],
        matches: &[Match],
    ) -> Vec<PlayerStanding> {
        StandingsCalculator::new(scoring, players, matches).compute()
    }

    fn win(m: &mut Match, first: bool, scoring: &ScoringConfig) {
        let majority = scoring.majority();
        if first {
            m.record_result(majority, 0, 0, scoring).unwrap();
        } else {
            m.record_result(0, majority, 0, scoring).unwrap();
        }
    }

    #[test]
    fn test_derived_round_total() {
        assert_eq!(
            SwissGenerator::new(seed_ids(&players(5)), 0, 1).unwrap().total_rounds(),
            3
        );
        assert_eq!(
            SwissGenerator::new(seed_ids(&players(8)), 0, 1).unwrap().total_rounds(),
            3
        );
        assert_eq!(
            SwissGenerator::new(seed_ids(&players(9)), 0, 1).unwrap().total_rounds(),
            4
        );
        assert_eq!(
            SwissGenerator::new(seed_ids(&players(2)), 0, 1).unwrap().total_rounds(),
            1
        );
    }

    #[test]
    fn test_requested_round_total_wins() {
        let generator = SwissGenerator::new(seed_ids(&players(8)), 5, 1).unwrap();
        assert_eq!(generator.total_rounds(), 5);
    }

    #[test]
    fn test_round_past_limit_rejected() {
        let players = players(5);
        let scoring = ScoringConfig::default();
        let mut generator = SwissGenerator::new(seed_ids(&players), 3, 1).unwrap();
        let standings = standings_for(&scoring, &players, &[]);
        let ctx = PairingContext {
            round: 4,
            players: &players,
            matches: &[],
            standings: &standings,
            scoring: &scoring,
        };
        let err = generator.generate_round(&ctx).unwrap_err();
        assert_eq!(err, PairingError::RoundLimitExceeded { total: 3 });
    }

    #[test]
    fn test_no_rematch_when_avoidable() {
        let players = players(4);
        let scoring = ScoringConfig::default();
        let mut generator = SwissGenerator::new(seed_ids(&players), 3, 1).unwrap();

        let standings = standings_for(&scoring, &players, &[]);
        let ctx = PairingContext {
            round: 1,
            players: &players,
            matches: &[],
            standings: &standings,
            scoring: &scoring,
        };
        let mut round1 = generator.generate_round(&ctx).unwrap();
        assert_eq!(round1.len(), 2);
        win(&mut round1[0], true, &scoring);
        win(&mut round1[1], true, &scoring);

        let standings = standings_for(&scoring, &players, &round1);
        let ctx = PairingContext {
            round: 2,
            players: &players,
            matches: &round1,
            standings: &standings,
            scoring: &scoring,
        };
        let round2 = generator.generate_round(&ctx).unwrap();
        assert_eq!(round2.len(), 2);
        for m in &round2 {
            let p2 = m.player2.clone().unwrap();
            assert!(
                !round1.iter().any(|r1| r1.contains(&m.player1) && r1.contains(&p2)),
                "rematch in round 2: {m}"
            );
        }
    }

    #[test]
    fn test_winners_face_winners() {
        let players = players(4);
        let scoring = ScoringConfig::default();
        let mut generator = SwissGenerator::new(seed_ids(&players), 2, 1).unwrap();

        let standings = standings_for(&scoring, &players, &[]);
        let ctx = PairingContext {
            round: 1,
            players: &players,
            matches: &[],
            standings: &standings,
            scoring: &scoring,
        };
        let mut round1 = generator.generate_round(&ctx).unwrap();
        let winners: Vec<PlayerId> = round1
            .iter_mut()
            .map(|m| {
                win(m, true, &scoring);
                m.winner_id().cloned().unwrap()
            })
            .collect();

        let standings = standings_for(&scoring, &players, &round1);
        let ctx = PairingContext {
            round: 2,
            players: &players,
            matches: &round1,
            standings: &standings,
            scoring: &scoring,
        };
        let round2 = generator.generate_round(&ctx).unwrap();
        let top = round2
            .iter()
            .find(|m| winners.contains(&m.player1))
            .unwrap();
        // The 1-point players are paired together.
        assert!(winners.contains(top.player2.as_ref().unwrap()));
    }

    #[test]
    fn test_bye_goes_to_lowest_group_fewest_byes() {
        let mut players = players(5);
        players[4].byes = 1; // p5 already had a bye
        let scoring = ScoringConfig::default();
        let mut generator = SwissGenerator::new(seed_ids(&players), 3, 1).unwrap();

        // p1 and p2 on 1 point, the rest on 0.
        let mut m1 = Match::new(1, "p1".to_string(), "p3".to_string());
        win(&mut m1, true, &scoring);
        let mut m2 = Match::new(1, "p2".to_string(), "p4".to_string());
        win(&mut m2, true, &scoring);
        let history = vec![m1, m2, Match::bye(1, "p5".to_string())];

        let standings = standings_for(&scoring, &players, &history);
        let ctx = PairingContext {
            round: 2,
            players: &players,
            matches: &history,
            standings: &standings,
            scoring: &scoring,
        };
        let round2 = generator.generate_round(&ctx).unwrap();
        let bye = round2.iter().find(|m| m.is_bye()).unwrap();
        // p3 and p4 are both on 0 with no byes; p5 is on 1 point. Lowest
        // group and fewest byes selects the lower seed, p4.
        assert_eq!(bye.player1, "p4");
    }

    #[test]
    fn test_unavoidable_rematch_still_pairs_everyone() {
        // Two players, two rounds: round 2 must be a rematch.
        let players = players(2);
        let scoring = ScoringConfig::default();
        let mut generator = SwissGenerator::new(seed_ids(&players), 2, 1).unwrap();

        let standings = standings_for(&scoring, &players, &[]);
        let ctx = PairingContext {
            round: 1,
            players: &players,
            matches: &[],
            standings: &standings,
            scoring: &scoring,
        };
        let mut round1 = generator.generate_round(&ctx).unwrap();
        win(&mut round1[0], true, &scoring);

        let standings = standings_for(&scoring, &players, &round1);
        let ctx = PairingContext {
            round: 2,
            players: &players,
            matches: &round1,
            standings: &standings,
            scoring: &scoring,
        };
        let round2 = generator.generate_round(&ctx).unwrap();
        assert_eq!(round2.len(), 1);
        assert!(!round2[0].is_bye());
    }
}

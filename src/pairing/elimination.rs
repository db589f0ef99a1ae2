//! Elimination bracket generator (single and double).

use serde::{Deserialize, Serialize};

use super::{PairingContext, PairingStrategy};
use crate::tournament::entities::{Match, MatchId, PlayerId};
use crate::tournament::errors::PairingError;

/// Where a bracket slot's player comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
enum SlotSource {
    /// 1-based seed number; seeds past the field size are byes
    Seed(u32),
    /// Winner of an earlier skeleton match
    WinnerOf(usize),
    /// Loser of an earlier skeleton match
    LoserOf(usize),
}

/// One precomputed bracket position.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SkeletonMatch {
    round: u32,
    player1: SlotSource,
    player2: SlotSource,
}

/// What became of a skeleton position once its round was generated.
#[derive(Clone, Debug, Serialize, Deserialize)]
enum SlotState {
    Pending,
    Played(MatchId),
    /// Neither side could play; nobody advances from here
    Void,
}

/// Elimination generator.
///
/// The whole bracket is computed once at construction as a skeleton of
/// slot sources; generating a round resolves its slots purely from the
/// winners and losers of prior completed matches. The bracket is never
/// re-seeded mid-tournament.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EliminationGenerator {
    seeds: Vec<PlayerId>,
    skeleton: Vec<SkeletonMatch>,
    slots: Vec<SlotState>,
    first_round: u32,
    rounds: u32,
}

/// Standard seeding order for a bracket: 1 faces the lowest remaining
/// seed, recursively interleaved ([1,4,2,3] for 4, [1,8,4,5,2,7,3,6]
/// for 8).
fn bracket_order(size: usize) -> Vec<u32> {
    let mut order = vec![1u32, 2];
    while order.len() < size {
        let mirror = order.len() as u32 * 2 + 1;
        order = order.iter().flat_map(|&s| [s, mirror - s]).collect();
    }
    order
}

impl EliminationGenerator {
    pub fn new(
        seeds: Vec<PlayerId>,
        double: bool,
        consolation: bool,
        first_round: u32,
    ) -> Result<Self, PairingError> {
        if seeds.len() < 2 {
            return Err(PairingError::InsufficientPlayers {
                needed: 2,
                current: seeds.len(),
            });
        }
        let bracket = seeds.len().next_power_of_two();
        let depth = bracket.trailing_zeros() as usize;
        let order = bracket_order(bracket);

        let mut sources: Vec<(SlotSource, SlotSource)> = Vec::new();
        let mut winners_rounds: Vec<Vec<usize>> = Vec::new();

        // Winners bracket, round by round.
        let mut current: Vec<usize> = Vec::with_capacity(bracket / 2);
        for pair in order.chunks(2) {
            sources.push((SlotSource::Seed(pair[0]), SlotSource::Seed(pair[1])));
            current.push(sources.len() - 1);
        }
        winners_rounds.push(current);
        for _ in 1..depth {
            let prev = winners_rounds[winners_rounds.len() - 1].clone();
            let mut current = Vec::with_capacity(prev.len() / 2);
            for pair in prev.chunks(2) {
                sources.push((SlotSource::WinnerOf(pair[0]), SlotSource::WinnerOf(pair[1])));
                current.push(sources.len() - 1);
            }
            winners_rounds.push(current);
        }
        let winners_final = winners_rounds[depth - 1][0];

        if double {
            if depth == 1 {
                // Two players: the loser gets an immediate rematch.
                sources.push((
                    SlotSource::WinnerOf(winners_final),
                    SlotSource::LoserOf(winners_final),
                ));
            } else {
                // Losers bracket: first pair the opening-round losers,
                // then alternate drop rounds with internal rounds.
                let mut alive: Vec<usize> = Vec::with_capacity(bracket / 4);
                for pair in winners_rounds[0].chunks(2) {
                    sources.push((SlotSource::LoserOf(pair[0]), SlotSource::LoserOf(pair[1])));
                    alive.push(sources.len() - 1);
                }
                for r in 1..depth {
                    let dropping = &winners_rounds[r];
                    let mut next: Vec<usize> = Vec::with_capacity(dropping.len());
                    // Cross the drops against the survivors in reverse
                    // order to delay rematches.
                    for (j, &survivor) in alive.iter().enumerate() {
                        let drop = dropping[dropping.len() - 1 - j];
                        sources.push((SlotSource::WinnerOf(survivor), SlotSource::LoserOf(drop)));
                        next.push(sources.len() - 1);
                    }
                    alive = next;
                    if r + 1 < depth {
                        let mut merged = Vec::with_capacity(alive.len() / 2);
                        for pair in alive.chunks(2) {
                            sources.push((
                                SlotSource::WinnerOf(pair[0]),
                                SlotSource::WinnerOf(pair[1]),
                            ));
                            merged.push(sources.len() - 1);
                        }
                        alive = merged;
                    }
                }
                // Grand final: winners champion vs losers champion.
                sources.push((
                    SlotSource::WinnerOf(winners_final),
                    SlotSource::WinnerOf(alive[0]),
                ));
            }
        } else if consolation && depth >= 2 {
            let semifinals = &winners_rounds[depth - 2];
            sources.push((
                SlotSource::LoserOf(semifinals[0]),
                SlotSource::LoserOf(semifinals[1]),
            ));
        }

        // A match plays one round after its latest dependency.
        let mut round_of = vec![0u32; sources.len()];
        for i in 0..sources.len() {
            let dep = |source: SlotSource, rounds: &[u32]| match source {
                SlotSource::Seed(_) => 0,
                SlotSource::WinnerOf(j) | SlotSource::LoserOf(j) => rounds[j],
            };
            let latest = dep(sources[i].0, &round_of).max(dep(sources[i].1, &round_of));
            round_of[i] = 1 + latest;
        }
        let rounds = round_of.iter().copied().max().unwrap_or(1);
        let skeleton = sources
            .into_iter()
            .zip(&round_of)
            .map(|((player1, player2), &r)| SkeletonMatch {
                round: first_round + r - 1,
                player1,
                player2,
            })
            .collect::<Vec<_>>();
        let slots = vec![SlotState::Pending; skeleton.len()];

        Ok(Self {
            seeds,
            skeleton,
            slots,
            first_round,
            rounds,
        })
    }

    fn last_round(&self) -> u32 {
        self.first_round + self.rounds - 1
    }

    /// The player a slot resolves to, dropped or not.
    fn resolve(&self, source: SlotSource, ctx: &PairingContext<'_>) -> Option<PlayerId> {
        match source {
            SlotSource::Seed(s) => self.seeds.get(s as usize - 1).cloned(),
            SlotSource::WinnerOf(j) => match &self.slots[j] {
                SlotState::Played(id) => {
                    ctx.match_by_id(*id).and_then(|m| m.winner_id()).cloned()
                }
                SlotState::Pending | SlotState::Void => None,
            },
            SlotSource::LoserOf(j) => match &self.slots[j] {
                SlotState::Played(id) => ctx.match_by_id(*id).and_then(|m| m.loser_id()).cloned(),
                SlotState::Pending | SlotState::Void => None,
            },
        }
    }
}

impl PairingStrategy for EliminationGenerator {
    fn generate_round(&mut self, ctx: &PairingContext<'_>) -> Result<Vec<Match>, PairingError> {
        let entries: Vec<usize> = (0..self.skeleton.len())
            .filter(|&i| self.skeleton[i].round == ctx.round)
            .collect();
        if entries.is_empty() {
            return Err(PairingError::RoundLimitExceeded {
                total: self.last_round(),
            });
        }
        let mut matches = Vec::with_capacity(entries.len());
        for i in entries {
            let resolved1 = self.resolve(self.skeleton[i].player1, ctx);
            let resolved2 = self.resolve(self.skeleton[i].player2, ctx);
            let active1 = resolved1.clone().filter(|p| ctx.is_active(p));
            let active2 = resolved2.clone().filter(|p| ctx.is_active(p));
            let m = match (active1, active2) {
                (Some(a), Some(b)) => Match::new(ctx.round, a, b),
                // An absent opponent who once existed concedes a
                // walkover; an empty slot is a plain bye.
                (Some(a), None) => match resolved2 {
                    Some(dropped) => Match::walkover(ctx.round, a, dropped),
                    None => Match::bye(ctx.round, a),
                },
                (None, Some(b)) => match resolved1 {
                    Some(dropped) => Match::walkover(ctx.round, b, dropped),
                    None => Match::bye(ctx.round, b),
                },
                (None, None) => {
                    self.slots[i] = SlotState::Void;
                    continue;
                }
            };
            self.slots[i] = SlotState::Played(m.id);
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
        self.rounds
    }
}

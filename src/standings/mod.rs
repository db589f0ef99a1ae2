//! Standings computation: points, tiebreaks, and ranking.
//!
//! The calculator is a pure function of the scoring configuration, the
//! player set, and the match history. Recomputing over unchanged
//! history yields identical standings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::tournament::config::{ScoringConfig, TiebreakMethod};
use crate::tournament::entities::{Match, Player, PlayerId};

/// Ranked record for one active player.
///
/// `rank` is an equivalence class: players still tied after every
/// configured tiebreak method share a rank (competition ranking).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub rank: u32,
    pub points: f64,
    pub matches_won: u32,
    pub matches_lost: u32,
    pub matches_drawn: u32,
    pub byes: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_drawn: u32,
    /// Values for the configured scalar tiebreak methods
    pub tiebreaks: HashMap<TiebreakMethod, f64>,
}

/// Per-player aggregates, built for every player (dropped players keep
/// feeding opponents' tiebreaks) but reported only for active ones.
#[derive(Clone, Debug, Default)]
struct Record {
    points: f64,
    matches_won: u32,
    matches_lost: u32,
    matches_drawn: u32,
    byes: u32,
    games_won: u32,
    games_lost: u32,
    games_drawn: u32,
    /// Match points over played (non-bye) matches only
    match_points: f64,
    matches_played: u32,
    /// One entry per played match, so double round robin counts twice
    opponents: Vec<usize>,
    cumulative: f64,
    match_win_pct: f64,
    game_win_pct: f64,
    solkoff: f64,
    median_buchholz: f64,
    sonneborn_berger: f64,
    opp_game_win_pct: f64,
    opp_match_win_pct: f64,
    opp_opp_match_win_pct: f64,
}

/// Computes ranked standings from completed matches.
pub struct StandingsCalculator<'a> {
    scoring: &'a ScoringConfig,
    players: &'a [Player],
    matches: &'a [Match],
}

impl<'a> StandingsCalculator<'a> {
    pub fn new(scoring: &'a ScoringConfig, players: &'a [Player], matches: &'a [Match]) -> Self {
        Self {
            scoring,
            players,
            matches,
        }
    }

    /// Full ranked standings over active players.
    #[must_use]
    pub fn compute(&self) -> Vec<PlayerStanding> {
        let index: HashMap<&str, usize> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.as_str(), i))
            .collect();
        let mut records = vec![Record::default(); self.players.len()];

        self.tally_matches(&index, &mut records);
        self.tally_cumulative(&index, &mut records);
        self.tally_opponent_values(&mut records);

        // Third pass: averages of opponents' opponent-averages.
        let opp_match_win_pcts: Vec<f64> = records.iter().map(|r| r.opp_match_win_pct).collect();
        for record in &mut records {
            record.opp_opp_match_win_pct =
                mean(record.opponents.iter().map(|&o| opp_match_win_pcts[o]));
        }

        self.rank(records)
    }

    fn tally_matches(&self, index: &HashMap<&str, usize>, records: &mut [Record]) {
        let scoring = self.scoring;
        for m in self.matches {
            if !m.is_complete() {
                continue;
            }
            let Some(&p1) = index.get(m.player1.as_str()) else {
                continue;
            };
            if m.is_bye() {
                records[p1].points += scoring.bye;
                records[p1].byes += 1;
                continue;
            }
            let Some(&p2) = m.player2.as_ref().and_then(|p| index.get(p.as_str())) else {
                continue;
            };
            let (w1, l1, d1) = m.games_of(&m.player1);
            records[p1].games_won += w1;
            records[p1].games_lost += l1;
            records[p1].games_drawn += d1;
            records[p2].games_won += l1;
            records[p2].games_lost += w1;
            records[p2].games_drawn += d1;
            records[p1].opponents.push(p2);
            records[p2].opponents.push(p1);
            records[p1].matches_played += 1;
            records[p2].matches_played += 1;

            let (pts1, pts2) = match m.winner_id() {
                Some(winner) if *winner == m.player1 => {
                    records[p1].matches_won += 1;
                    records[p2].matches_lost += 1;
                    (scoring.win, scoring.loss)
                }
                Some(_) => {
                    records[p2].matches_won += 1;
                    records[p1].matches_lost += 1;
                    (scoring.loss, scoring.win)
                }
                None => {
                    records[p1].matches_drawn += 1;
                    records[p2].matches_drawn += 1;
                    (scoring.draw, scoring.draw)
                }
            };
            records[p1].points += pts1;
            records[p1].match_points += pts1;
            records[p2].points += pts2;
            records[p2].match_points += pts2;
        }

        for record in records.iter_mut() {
            let games =
                u64::from(record.games_won) + u64::from(record.games_lost) + u64::from(record.games_drawn);
            record.game_win_pct = if games == 0 {
                0.0
            } else {
                f64::from(record.games_won) / games as f64
            };
            let denom = scoring.win * f64::from(record.matches_played);
            record.match_win_pct = if denom == 0.0 {
                0.0
            } else {
                record.match_points / denom
            };
        }
    }

    /// Sum of the player's own running total after each round.
    fn tally_cumulative(&self, index: &HashMap<&str, usize>, records: &mut [Record]) {
        let max_round = self
            .matches
            .iter()
            .filter(|m| m.is_complete())
            .map(|m| m.round)
            .max()
            .unwrap_or(0);
        if max_round == 0 {
            return;
        }
        let scoring = self.scoring;
        let mut per_round: Vec<HashMap<u32, f64>> = vec![HashMap::new(); records.len()];
        for m in self.matches {
            if !m.is_complete() {
                continue;
            }
            let mut add = |player: &PlayerId, pts: f64| {
                if let Some(&i) = index.get(player.as_str()) {
                    *per_round[i].entry(m.round).or_insert(0.0) += pts;
                }
            };
            if m.is_bye() {
                add(&m.player1, scoring.bye);
                continue;
            }
            match m.winner_id() {
                Some(winner) => {
                    add(winner, scoring.win);
                    if let Some(loser) = m.opponent_of(winner) {
                        add(loser, scoring.loss);
                    }
                }
                None => {
                    add(&m.player1, scoring.draw);
                    if let Some(p2) = &m.player2 {
                        add(p2, scoring.draw);
                    }
                }
            }
        }
        for (record, rounds) in records.iter_mut().zip(per_round) {
            let mut running = 0.0;
            for round in 1..=max_round {
                running += rounds.get(&round).copied().unwrap_or(0.0);
                record.cumulative += running;
            }
        }
    }

    fn tally_opponent_values(&self, records: &mut [Record]) {
        let points: Vec<f64> = records.iter().map(|r| r.points).collect();
        let game_pcts: Vec<f64> = records.iter().map(|r| r.game_win_pct).collect();
        let match_pcts: Vec<f64> = records.iter().map(|r| r.match_win_pct).collect();

        for record in records.iter_mut() {
            let opp_points: Vec<f64> = record.opponents.iter().map(|&o| points[o]).collect();
            record.solkoff = opp_points.iter().sum();
            record.median_buchholz = if opp_points.len() > 2 {
                let max = opp_points.iter().fold(f64::MIN, |a, &b| a.max(b));
                let min = opp_points.iter().fold(f64::MAX, |a, &b| a.min(b));
                record.solkoff - max - min
            } else {
                0.0
            };
            record.opp_game_win_pct = mean(record.opponents.iter().map(|&o| game_pcts[o]));
            record.opp_match_win_pct = mean(record.opponents.iter().map(|&o| match_pcts[o]));
        }

        // Sonneborn-Berger needs per-match outcomes, not just opponent lists.
        let index: HashMap<&str, usize> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.as_str(), i))
            .collect();
        for m in self.matches {
            if !m.is_complete() || m.is_bye() {
                continue;
            }
            let Some(&p1) = index.get(m.player1.as_str()) else {
                continue;
            };
            let Some(&p2) = m.player2.as_ref().and_then(|p| index.get(p.as_str())) else {
                continue;
            };
            match m.winner_id() {
                Some(winner) if *winner == m.player1 => {
                    records[p1].sonneborn_berger += points[p2];
                }
                Some(_) => {
                    records[p2].sonneborn_berger += points[p1];
                }
                None => {
                    records[p1].sonneborn_berger += points[p2] / 2.0;
                    records[p2].sonneborn_berger += points[p1] / 2.0;
                }
            }
        }
    }

    fn tiebreak_value(record: &Record, method: TiebreakMethod) -> f64 {
        match method {
            TiebreakMethod::MedianBuchholz => record.median_buchholz,
            TiebreakMethod::Solkoff => record.solkoff,
            TiebreakMethod::SonnebornBerger => record.sonneborn_berger,
            TiebreakMethod::Cumulative => record.cumulative,
            // Versus is pairwise; it carries no scalar.
            TiebreakMethod::Versus => 0.0,
            TiebreakMethod::GameWinPercentage => record.game_win_pct,
            TiebreakMethod::OpponentGameWinPercentage => record.opp_game_win_pct,
            TiebreakMethod::OpponentMatchWinPercentage => record.opp_match_win_pct,
            TiebreakMethod::OpponentOpponentMatchWinPercentage => record.opp_opp_match_win_pct,
        }
    }

    /// Head-to-head balance between two players over completed matches:
    /// positive when `a` leads the series.
    fn head_to_head(&self, a: &PlayerId, b: &PlayerId) -> i32 {
        let mut balance = 0;
        for m in self.matches {
            if !m.is_complete() || !m.contains(a) || !m.contains(b) || m.is_bye() {
                continue;
            }
            match m.winner_id() {
                Some(winner) if winner == a => balance += 1,
                Some(winner) if winner == b => balance -= 1,
                _ => {}
            }
        }
        balance
    }

    /// Order two records: points first, then the configured methods in
    /// order. Returns `Equal` only when every method ties.
    fn compare(&self, a: (&Player, &Record), b: (&Player, &Record)) -> Ordering {
        let ord = b.1.points.total_cmp(&a.1.points);
        if ord != Ordering::Equal {
            return ord;
        }
        for &method in &self.scoring.tiebreaks {
            let ord = if method == TiebreakMethod::Versus {
                // Unplayed head-to-heads fall through to the next method.
                match self.head_to_head(&a.0.id, &b.0.id) {
                    n if n > 0 => Ordering::Less,
                    n if n < 0 => Ordering::Greater,
                    _ => Ordering::Equal,
                }
            } else {
                Self::tiebreak_value(b.1, method).total_cmp(&Self::tiebreak_value(a.1, method))
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    fn rank(&self, records: Vec<Record>) -> Vec<PlayerStanding> {
        let mut order: Vec<(&Player, &Record)> = self
            .players
            .iter()
            .zip(records.iter())
            .filter(|(p, _)| p.active)
            .collect();
        // Deterministic within full ties: fall back on player id.
        order.sort_by(|a, b| self.compare(*a, *b).then_with(|| a.0.id.cmp(&b.0.id)));

        let mut standings = Vec::with_capacity(order.len());
        let mut rank = 1;
        for (i, &(player, record)) in order.iter().enumerate() {
            if i > 0 && self.compare(order[i - 1], (player, record)) != Ordering::Equal {
                rank = i as u32 + 1;
            }
            let tiebreaks = self
                .scoring
                .tiebreaks
                .iter()
                .filter(|&&m| m != TiebreakMethod::Versus)
                .map(|&m| (m, Self::tiebreak_value(record, m)))
                .collect();
            standings.push(PlayerStanding {
                player_id: player.id.clone(),
                rank,
                points: record.points,
                matches_won: record.matches_won,
                matches_lost: record.matches_lost,
                matches_drawn: record.matches_drawn,
                byes: record.byes,
                games_won: record.games_won,
                games_lost: record.games_lost,
                games_drawn: record.games_drawn,
                tiebreaks,
            });
        }
        standings
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

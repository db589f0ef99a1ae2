//! Tournament lifecycle state machine.
//!
//! Owns the transitions `setup -> active -> (playoffs)? -> finished`,
//! with `aborted` reachable from any non-terminal state. Every mutating
//! operation validates fully before touching state, so a failed call
//! never leaves the tournament half-updated.

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pairing::{PairingContext, PairingStrategy, RoundGenerator};
use crate::standings::{PlayerStanding, StandingsCalculator};

use super::config::{
    Format, PlayoffConfig, PlayoffCut, ScoringConfig, Sorting, TournamentConfig, TournamentPatch,
};
use super::entities::{Match, MatchId, Outcome, Player, PlayerId};
use super::errors::{PairingError, StateError, TournamentResult, ValidationError};

/// Lifecycle state. `Finished` and `Aborted` are the two inactive
/// terminal states; only `Finished` is reached by normal completion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentState {
    Setup,
    Active,
    Playoffs,
    Finished,
    Aborted,
}

impl TournamentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TournamentState::Finished | TournamentState::Aborted)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TournamentState::Active | TournamentState::Playoffs)
    }
}

impl fmt::Display for TournamentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            TournamentState::Setup => "setup",
            TournamentState::Active => "active",
            TournamentState::Playoffs => "playoffs",
            TournamentState::Finished => "finished",
            TournamentState::Aborted => "aborted",
        };
        write!(f, "{repr}")
    }
}

/// Planned and current round numbers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundCounters {
    pub total: u32,
    pub current: u32,
}

/// Immutable read view over a tournament's configuration and progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentOptions {
    pub id: String,
    pub name: String,
    pub format: Format,
    pub state: TournamentState,
    pub consolation: bool,
    pub playoffs: Option<PlayoffConfig>,
    pub scoring: ScoringConfig,
    pub sorting: Sorting,
    pub rounds: RoundCounters,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A tournament and everything it owns: players, matches, and the
/// pairing generator fixed at start.
///
/// Matches reference players by id only; the tournament is the single
/// owner of both sets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    config: TournamentConfig,
    state: TournamentState,
    players: Vec<Player>,
    matches: Vec<Match>,
    generator: Option<RoundGenerator>,
    rounds: RoundCounters,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create a tournament in `setup` from a validated configuration.
    ///
    /// Uniqueness of the tournament id across tournaments is the
    /// caller's concern; the core only validates the id is well formed.
    pub fn new(config: TournamentConfig) -> TournamentResult<Self> {
        config.validate()?;
        info!(
            "Created tournament {} ({}) as {}",
            config.id, config.name, config.format
        );
        Ok(Self {
            config,
            state: TournamentState::Setup,
            players: Vec::new(),
            matches: Vec::new(),
            generator: None,
            rounds: RoundCounters::default(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> TournamentState {
        self.state
    }

    pub fn rounds(&self) -> RoundCounters {
        self.rounds
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn round_matches(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// Read view over configuration and progress.
    #[must_use]
    pub fn options(&self) -> TournamentOptions {
        TournamentOptions {
            id: self.config.id.clone(),
            name: self.config.name.clone(),
            format: self.config.format,
            state: self.state,
            consolation: self.config.consolation,
            playoffs: self.config.playoffs,
            scoring: self.config.scoring.clone(),
            sorting: self.config.sorting,
            rounds: self.rounds,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    /// Apply a sparse configuration patch. Only legal during `setup`,
    /// before anything depends on the configuration.
    pub fn patch(&mut self, patch: &TournamentPatch) -> TournamentResult<TournamentOptions> {
        self.require_state(TournamentState::Setup)?;
        self.config = self.config.patched(patch)?;
        Ok(self.options())
    }

    /// Register a player. Only legal during `setup`.
    pub fn register_player(
        &mut self,
        id: impl Into<PlayerId>,
        name: impl Into<String>,
    ) -> TournamentResult<&Player> {
        self.require_state(TournamentState::Setup)?;
        let id = id.into();
        if self.players.iter().any(|p| p.id == id) {
            return Err(ValidationError::DuplicateId(id).into());
        }
        debug!("Tournament {}: registered player {}", self.config.id, id);
        self.players.push(Player::new(id, name));
        self.players.last().ok_or_else(|| {
            StateError::Internal {
                id: self.config.id.clone(),
            }
            .into()
        })
    }

    /// Assign a seed value to a registered player. Only legal during
    /// `setup`.
    pub fn seed_player(&mut self, id: &str, seed: u32) -> TournamentResult<()> {
        self.require_state(TournamentState::Setup)?;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ValidationError::UnknownPlayer(id.to_string()))?;
        player.seed = Some(seed);
        Ok(())
    }

    /// Remove a player. During `setup` the player is deleted outright;
    /// while running they are deactivated, excluded from future
    /// pairings, and any pending match is conceded to the opponent.
    /// Removing an already-dropped player is a no-op.
    pub fn remove_player(&mut self, id: &str) -> TournamentResult<()> {
        match self.state {
            TournamentState::Setup => {
                let index = self
                    .players
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| ValidationError::UnknownPlayer(id.to_string()))?;
                self.players.remove(index);
                Ok(())
            }
            TournamentState::Active | TournamentState::Playoffs => {
                let player = self
                    .players
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| ValidationError::UnknownPlayer(id.to_string()))?;
                if !player.active {
                    return Ok(());
                }
                player.active = false;
                let loser: PlayerId = id.to_string();
                for m in self.matches.iter_mut().filter(|m| !m.is_complete()) {
                    m.concede(&loser);
                }
                info!("Tournament {}: player {} dropped", self.config.id, id);
                Ok(())
            }
            state => Err(StateError::InvalidState {
                id: self.config.id.clone(),
                expected: TournamentState::Active,
                actual: state,
            }
            .into()),
        }
    }

    /// Start the tournament: fix the seed order, build the pairing
    /// generator for the configured format, and produce round 1.
    pub fn start(&mut self) -> TournamentResult<Vec<MatchId>> {
        self.require_state(TournamentState::Setup)?;
        let active = self.players.iter().filter(|p| p.active).count();
        if active < 2 {
            return Err(PairingError::InsufficientPlayers {
                needed: 2,
                current: active,
            }
            .into());
        }
        let seeds = self.seed_order();
        let mut generator = RoundGenerator::for_format(
            self.config.format,
            seeds,
            self.config.consolation,
            self.config.total_rounds,
            1,
        )?;
        let standings = self.standings();
        let ctx = PairingContext {
            round: 1,
            players: &self.players,
            matches: &self.matches,
            standings: &standings,
            scoring: &self.config.scoring,
        };
        let new_matches = generator.generate_round(&ctx)?;

        self.rounds = RoundCounters {
            total: generator.total_rounds(),
            current: 1,
        };
        self.generator = Some(generator);
        self.state = TournamentState::Active;
        self.started_at = Some(Utc::now());
        let ids = self.commit_matches(new_matches);
        info!(
            "Tournament {} started: {} players, {} planned rounds",
            self.config.id, active, self.rounds.total
        );
        Ok(ids)
    }

    /// Submit game counts for a match of the current round.
    pub fn submit_result(
        &mut self,
        match_id: MatchId,
        player1_wins: u32,
        player2_wins: u32,
        draws: u32,
    ) -> TournamentResult<&Match> {
        self.require_running()?;
        let elimination_phase =
            self.state == TournamentState::Playoffs || self.config.format.is_elimination();
        let index = self
            .matches
            .iter()
            .position(|m| m.id == match_id)
            .ok_or(ValidationError::UnknownMatch(match_id))?;
        let outcome = self.matches[index].validate_result(
            player1_wins,
            player2_wins,
            draws,
            &self.config.scoring,
        )?;
        // A bracket cannot advance a drawn match.
        if elimination_phase && outcome == Outcome::Draw {
            return Err(ValidationError::InvalidResult {
                id: match_id,
                player1_wins,
                player2_wins,
                draws,
                best_of: self.config.scoring.best_of,
            }
            .into());
        }
        self.matches[index].record_result(
            player1_wins,
            player2_wins,
            draws,
            &self.config.scoring,
        )?;
        debug!(
            "Tournament {}: match {} recorded {}-{}-{}",
            self.config.id, match_id, player1_wins, player2_wins, draws
        );
        Ok(&self.matches[index])
    }

    /// Generate the next round. Requires the current round to be fully
    /// resolved; transitions into playoffs at the boundary round when a
    /// playoff stage is configured.
    pub fn advance_round(&mut self) -> TournamentResult<Vec<MatchId>> {
        self.require_running()?;
        let current = self.rounds.current;
        if self.round_matches(current).any(|m| !m.is_complete()) {
            return Err(PairingError::IncompleteRound { round: current }.into());
        }

        let at_boundary = self.state == TournamentState::Active
            && self.config.playoffs.is_some()
            && current == self.rounds.total;
        if at_boundary {
            return self.enter_playoffs();
        }

        let next = current + 1;
        let standings = self.standings();
        let new_matches = {
            let ctx = PairingContext {
                round: next,
                players: &self.players,
                matches: &self.matches,
                standings: &standings,
                scoring: &self.config.scoring,
            };
            let Some(generator) = self.generator.as_mut() else {
                return Err(StateError::Internal {
                    id: self.config.id.clone(),
                }
                .into());
            };
            generator.generate_round(&ctx)?
        };
        self.rounds.current = next;
        let ids = self.commit_matches(new_matches);
        debug!(
            "Tournament {}: advanced to round {} ({} matches)",
            self.config.id,
            next,
            ids.len()
        );
        Ok(ids)
    }

    /// Current standings over active players.
    #[must_use]
    pub fn standings(&self) -> Vec<PlayerStanding> {
        StandingsCalculator::new(&self.config.scoring, &self.players, &self.matches).compute()
    }

    /// End the tournament normally. Legal only once the format's end
    /// condition holds: final round generated and fully resolved.
    pub fn finish(&mut self) -> TournamentResult<()> {
        self.require_running()?;
        let current = self.rounds.current;
        if self.round_matches(current).any(|m| !m.is_complete()) {
            return Err(PairingError::IncompleteRound { round: current }.into());
        }
        let standings = self.standings();
        let ctx = PairingContext {
            round: current,
            players: &self.players,
            matches: &self.matches,
            standings: &standings,
            scoring: &self.config.scoring,
        };
        let complete = self
            .generator
            .as_ref()
            .is_some_and(|g| g.is_complete(&ctx));
        if !complete {
            return Err(StateError::NotFinishable {
                id: self.config.id.clone(),
            }
            .into());
        }
        self.state = TournamentState::Finished;
        self.finished_at = Some(Utc::now());
        info!("Tournament {} finished", self.config.id);
        Ok(())
    }

    /// Abort from any non-terminal state. Completed matches stay in
    /// history; no further matches are generated.
    pub fn abort(&mut self) -> TournamentResult<()> {
        if self.state.is_terminal() {
            return Err(StateError::AlreadyEnded {
                id: self.config.id.clone(),
                actual: self.state,
            }
            .into());
        }
        self.state = TournamentState::Aborted;
        self.finished_at = Some(Utc::now());
        info!("Tournament {} aborted", self.config.id);
        Ok(())
    }

    fn require_state(&self, expected: TournamentState) -> Result<(), StateError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(StateError::InvalidState {
                id: self.config.id.clone(),
                expected,
                actual: self.state,
            })
        }
    }

    fn require_running(&self) -> Result<(), StateError> {
        if self.state.is_running() {
            Ok(())
        } else {
            Err(StateError::InvalidState {
                id: self.config.id.clone(),
                expected: TournamentState::Active,
                actual: self.state,
            })
        }
    }

    /// Initial seed order: by seed value when sorted, shuffled when
    /// unseeded.
    fn seed_order(&self) -> Vec<PlayerId> {
        let mut active: Vec<&Player> = self.players.iter().filter(|p| p.active).collect();
        match self.config.sorting {
            Sorting::Ascending => active.sort_by(|a, b| {
                a.seed
                    .unwrap_or(u32::MAX)
                    .cmp(&b.seed.unwrap_or(u32::MAX))
                    .then_with(|| a.id.cmp(&b.id))
            }),
            Sorting::Descending => active.sort_by(|a, b| {
                b.seed
                    .unwrap_or(0)
                    .cmp(&a.seed.unwrap_or(0))
                    .then_with(|| a.id.cmp(&b.id))
            }),
            Sorting::None => active.shuffle(&mut rand::rng()),
        }
        active.into_iter().map(|p| p.id.clone()).collect()
    }

    /// Cut to the playoff stage: survivors re-seed a fresh bracket in
    /// standings order.
    fn enter_playoffs(&mut self) -> TournamentResult<Vec<MatchId>> {
        let playoffs = self.config.playoffs.ok_or(StateError::Internal {
            id: self.config.id.clone(),
        })?;
        let standings = self.standings();
        let survivors: Vec<PlayerId> = match playoffs.cut {
            PlayoffCut::Rank(n) => standings
                .iter()
                .take(n as usize)
                .map(|s| s.player_id.clone())
                .collect(),
            PlayoffCut::Points(min) => standings
                .iter()
                .filter(|s| s.points >= min)
                .map(|s| s.player_id.clone())
                .collect(),
        };
        if survivors.len() < 2 {
            return Err(PairingError::NoPlayoffEligible {
                eligible: survivors.len(),
            }
            .into());
        }

        let next = self.rounds.current + 1;
        let mut generator = RoundGenerator::playoff(playoffs.format, survivors, next)?;
        let new_matches = {
            let ctx = PairingContext {
                round: next,
                players: &self.players,
                matches: &self.matches,
                standings: &standings,
                scoring: &self.config.scoring,
            };
            generator.generate_round(&ctx)?
        };
        self.rounds.total = self.rounds.current + generator.total_rounds();
        self.rounds.current = next;
        self.generator = Some(generator);
        self.state = TournamentState::Playoffs;
        let ids = self.commit_matches(new_matches);
        info!(
            "Tournament {}: cut to playoffs, {} bracket rounds",
            self.config.id,
            self.rounds.total - self.rounds.current + 1
        );
        Ok(ids)
    }

    /// Fold freshly generated matches into the tournament: record them
    /// on their players and count byes.
    fn commit_matches(&mut self, new_matches: Vec<Match>) -> Vec<MatchId> {
        let ids: Vec<MatchId> = new_matches.iter().map(|m| m.id).collect();
        for m in &new_matches {
            if let Some(player) = self.players.iter_mut().find(|p| p.id == m.player1) {
                player.record_match(m.id);
                if m.is_bye() {
                    player.byes += 1;
                }
            }
            if let Some(p2) = &m.player2 {
                if let Some(player) = self.players.iter_mut().find(|p| p.id == *p2) {
                    player.record_match(m.id);
                }
            }
        }
        self.matches.extend(new_matches);
        ids
    }
}

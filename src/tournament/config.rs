//! Tournament configuration models.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::ValidationError;

/// Tournament format, fixed for the tournament's lifetime once started.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    SingleElimination,
    DoubleElimination,
    Swiss,
    RoundRobin,
    DoubleRoundRobin,
}

impl Format {
    /// Whether the format is an elimination bracket (draws are illegal).
    pub fn is_elimination(&self) -> bool {
        matches!(self, Format::SingleElimination | Format::DoubleElimination)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Format::SingleElimination => "single-elimination",
            Format::DoubleElimination => "double-elimination",
            Format::Swiss => "swiss",
            Format::RoundRobin => "round-robin",
            Format::DoubleRoundRobin => "double-round-robin",
        };
        write!(f, "{repr}")
    }
}

/// Tiebreak methods, applied in the order they are configured.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TiebreakMethod {
    /// Sum of opponents' points, dropping the best and worst
    MedianBuchholz,
    /// Sum of opponents' points
    Solkoff,
    /// Sum of defeated opponents' points plus half of drawn opponents'
    SonnebornBerger,
    /// Sum of the player's own running score after each round
    Cumulative,
    /// Head-to-head result between the tied players
    Versus,
    GameWinPercentage,
    OpponentGameWinPercentage,
    OpponentMatchWinPercentage,
    OpponentOpponentMatchWinPercentage,
}

impl fmt::Display for TiebreakMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            TiebreakMethod::MedianBuchholz => "median-buchholz",
            TiebreakMethod::Solkoff => "solkoff",
            TiebreakMethod::SonnebornBerger => "sonneborn-berger",
            TiebreakMethod::Cumulative => "cumulative",
            TiebreakMethod::Versus => "versus",
            TiebreakMethod::GameWinPercentage => "game-win-percentage",
            TiebreakMethod::OpponentGameWinPercentage => "opponent-game-win-percentage",
            TiebreakMethod::OpponentMatchWinPercentage => "opponent-match-win-percentage",
            TiebreakMethod::OpponentOpponentMatchWinPercentage => {
                "opponent-opponent-match-win-percentage"
            }
        };
        write!(f, "{repr}")
    }
}

/// Scoring configuration: games per match and point values.
///
/// Point values are floating-point since draws are conventionally worth
/// half a win.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Games per match; a side wins the match outright by taking a
    /// majority
    pub best_of: u32,
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
    pub bye: f64,
    /// Tiebreak methods in application order
    pub tiebreaks: Vec<TiebreakMethod>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            best_of: 1,
            win: 1.0,
            draw: 0.5,
            loss: 0.0,
            bye: 1.0,
            tiebreaks: Vec::new(),
        }
    }
}

impl ScoringConfig {
    /// Default scoring for a format, including its customary tiebreaks.
    #[must_use]
    pub fn defaults_for(format: Format) -> Self {
        let tiebreaks = match format {
            Format::Swiss => vec![TiebreakMethod::Solkoff, TiebreakMethod::Cumulative],
            Format::RoundRobin | Format::DoubleRoundRobin => {
                vec![TiebreakMethod::SonnebornBerger, TiebreakMethod::Versus]
            }
            Format::SingleElimination | Format::DoubleElimination => Vec::new(),
        };
        Self {
            tiebreaks,
            ..Self::default()
        }
    }

    /// Game wins required to take a match outright.
    pub fn majority(&self) -> u32 {
        self.best_of / 2 + 1
    }
}

/// Playoff stage format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayoffFormat {
    SingleElimination,
    DoubleElimination,
}

/// Rule deciding who advances to the playoff stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayoffCut {
    /// Top N players by rank
    Rank(u32),
    /// Every player with at least this many points
    Points(f64),
}

/// Playoff stage configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayoffConfig {
    pub format: PlayoffFormat,
    pub cut: PlayoffCut,
}

/// Seed order direction. `None` means unseeded: initial order is
/// shuffled at tournament start.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sorting {
    Ascending,
    Descending,
    #[default]
    None,
}

/// Full tournament configuration, accepted at creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Caller-provided unique id. Uniqueness across tournaments is the
    /// caller's responsibility.
    pub id: String,
    pub name: String,
    pub format: Format,
    pub scoring: ScoringConfig,
    pub playoffs: Option<PlayoffConfig>,
    pub sorting: Sorting,
    /// Third-place match between semifinal losers (single elimination)
    pub consolation: bool,
    /// Swiss only: 0 derives ceil(log2(players)) at start
    pub total_rounds: u32,
}

impl TournamentConfig {
    /// Create a configuration with the format's customary defaults.
    pub fn new(id: impl Into<String>, name: impl Into<String>, format: Format) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            format,
            scoring: ScoringConfig::defaults_for(format),
            playoffs: None,
            sorting: Sorting::None,
            consolation: false,
            total_rounds: 0,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::InvalidConfig {
                reason: "tournament id must not be empty".to_string(),
            });
        }
        if self.scoring.best_of == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "best-of must be at least 1".to_string(),
            });
        }
        for (label, value) in [
            ("win", self.scoring.win),
            ("draw", self.scoring.draw),
            ("loss", self.scoring.loss),
            ("bye", self.scoring.bye),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::InvalidConfig {
                    reason: format!("{label} point value must be finite"),
                });
            }
        }
        if let Some(playoffs) = &self.playoffs {
            match playoffs.cut {
                PlayoffCut::Rank(n) if n < 2 => {
                    return Err(ValidationError::InvalidConfig {
                        reason: "playoff rank cut must keep at least 2 players".to_string(),
                    });
                }
                PlayoffCut::Points(p) if !p.is_finite() => {
                    return Err(ValidationError::InvalidConfig {
                        reason: "playoff points cut must be finite".to_string(),
                    });
                }
                _ => {}
            }
            if self.format.is_elimination() {
                return Err(ValidationError::InvalidConfig {
                    reason: "elimination tournaments cannot have a playoff stage".to_string(),
                });
            }
        }
        if self.consolation && self.format != Format::SingleElimination {
            return Err(ValidationError::InvalidConfig {
                reason: "consolation match requires single elimination".to_string(),
            });
        }
        Ok(())
    }

    /// Apply a sparse patch, returning the updated configuration or the
    /// first validation failure. The receiver is left untouched.
    ///
    /// `None` fields are left unchanged; `Some(v)` is applied verbatim,
    /// so zero and `false` are legitimate values rather than "unset".
    pub fn patched(&self, patch: &TournamentPatch) -> Result<TournamentConfig, ValidationError> {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.clone();
        }
        if let Some(format) = patch.format {
            next.format = format;
        }
        if let Some(consolation) = patch.consolation {
            next.consolation = consolation;
        }
        if let Some(playoffs) = &patch.playoffs {
            next.playoffs = *playoffs;
        }
        if let Some(sorting) = patch.sorting {
            next.sorting = sorting;
        }
        if let Some(total_rounds) = patch.total_rounds {
            next.total_rounds = total_rounds;
        }
        if let Some(scoring) = &patch.scoring {
            if let Some(best_of) = scoring.best_of {
                next.scoring.best_of = best_of;
            }
            if let Some(win) = scoring.win {
                next.scoring.win = win;
            }
            if let Some(draw) = scoring.draw {
                next.scoring.draw = draw;
            }
            if let Some(loss) = scoring.loss {
                next.scoring.loss = loss;
            }
            if let Some(bye) = scoring.bye {
                next.scoring.bye = bye;
            }
            if let Some(tiebreaks) = &scoring.tiebreaks {
                next.scoring.tiebreaks = tiebreaks.clone();
            }
        }
        next.validate()?;
        Ok(next)
    }
}

/// Sparse scoring update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringPatch {
    pub best_of: Option<u32>,
    pub win: Option<f64>,
    pub draw: Option<f64>,
    pub loss: Option<f64>,
    pub bye: Option<f64>,
    pub tiebreaks: Option<Vec<TiebreakMethod>>,
}

/// Sparse tournament configuration update.
///
/// The tournament id is deliberately not patchable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentPatch {
    pub name: Option<String>,
    pub format: Option<Format>,
    pub consolation: Option<bool>,
    /// Outer `None` leaves playoffs unchanged; `Some(None)` removes them
    pub playoffs: Option<Option<PlayoffConfig>>,
    pub scoring: Option<ScoringPatch>,
    pub sorting: Option<Sorting>,
    pub total_rounds: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_defaults() {
        let swiss = ScoringConfig::defaults_for(Format::Swiss);
        assert_eq!(
            swiss.tiebreaks,
            vec![TiebreakMethod::Solkoff, TiebreakMethod::Cumulative]
        );

        let rr = ScoringConfig::defaults_for(Format::RoundRobin);
        assert_eq!(
            rr.tiebreaks,
            vec![TiebreakMethod::SonnebornBerger, TiebreakMethod::Versus]
        );

        let elim = ScoringConfig::defaults_for(Format::SingleElimination);
        assert!(elim.tiebreaks.is_empty());
        assert_eq!(elim.best_of, 1);
        assert_eq!(elim.win, 1.0);
        assert_eq!(elim.draw, 0.5);
        assert_eq!(elim.bye, 1.0);
    }

    #[test]
    fn test_majority() {
        let mut scoring = ScoringConfig::default();
        assert_eq!(scoring.majority(), 1);
        scoring.best_of = 3;
        assert_eq!(scoring.majority(), 2);
        scoring.best_of = 5;
        assert_eq!(scoring.majority(), 3);
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let config = TournamentConfig::new("", "Test", Format::Swiss);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_best_of() {
        let mut config = TournamentConfig::new("t1", "Test", Format::Swiss);
        config.scoring.best_of = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_playoffs_on_elimination() {
        let mut config = TournamentConfig::new("t1", "Test", Format::SingleElimination);
        config.playoffs = Some(PlayoffConfig {
            format: PlayoffFormat::SingleElimination,
            cut: PlayoffCut::Rank(4),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_patch_applies_zero_values() {
        // Regression guard: a zero must be applied, not treated as unset.
        let config = TournamentConfig::new("t1", "Test", Format::Swiss);
        let patch = TournamentPatch {
            scoring: Some(ScoringPatch {
                win: Some(0.0),
                ..ScoringPatch::default()
            }),
            ..TournamentPatch::default()
        };
        let patched = config.patched(&patch).unwrap();
        assert_eq!(patched.scoring.win, 0.0);
        // Untouched fields survive.
        assert_eq!(patched.scoring.draw, 0.5);
        // The receiver is unchanged.
        assert_eq!(config.scoring.win, 1.0);
    }

    #[test]
    fn test_patch_can_remove_playoffs() {
        let mut config = TournamentConfig::new("t1", "Test", Format::Swiss);
        config.playoffs = Some(PlayoffConfig {
            format: PlayoffFormat::SingleElimination,
            cut: PlayoffCut::Rank(4),
        });
        let patch = TournamentPatch {
            playoffs: Some(None),
            ..TournamentPatch::default()
        };
        let patched = config.patched(&patch).unwrap();
        assert!(patched.playoffs.is_none());
    }

    #[test]
    fn test_patch_rejects_invalid_update() {
        let config = TournamentConfig::new("t1", "Test", Format::Swiss);
        let patch = TournamentPatch {
            scoring: Some(ScoringPatch {
                best_of: Some(0),
                ..ScoringPatch::default()
            }),
            ..TournamentPatch::default()
        };
        assert!(config.patched(&patch).is_err());
    }
}

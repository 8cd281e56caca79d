//! Aggregation engine: single runs, averages and shield-branch enumeration.
//!
//! # Determinism
//!
//! Parallel work is collected in index order and folded sequentially, so the
//! result never depends on the number of threads. Run `i` of an average uses
//! seed `seed + i`, which makes run 0 identical to a single run with the same
//! seed.
//!
//! # Branching
//!
//! A duel under branch control pauses at every charged hit on a side that
//! still has shields. The engine clones it, resumes one copy shielding and one
//! not, and combines the two children according to a [`BranchPolicy`]. A side
//! that declines once holds its shields for the rest of that branch, so a duel
//! with `s0` and `s1` shields has at most `(s0 + 1) * (s1 + 1)` leaves.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::Serialize;

use crate::battle::{
    BattleOutcome, Duel, DuelSettings, DuelStep, PveBattle, PveSettings, ShieldControl,
};
use crate::config::GameMaster;
use crate::entity::Duelist;
use crate::error::{ConfigError, InputError, Result};
use crate::party::Player;

/// Shield pairings averaged by the battle matrix.
pub const MATRIX_SHIELD_RANGE: std::ops::RangeInclusive<u32> = 0..=2;

// =============================================================================
// Modes
// =============================================================================

/// How runs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregation {
    /// One run, raw outcome and log.
    #[default]
    None,
    /// Mean of independently seeded runs.
    Average,
    /// Exhaustive shield-decision enumeration (PvP only).
    Branching,
}

impl Aggregation {
    /// Encoding-layer name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Average => "average",
            Self::Branching => "branching",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "enum" => Ok(Self::None),
            "average" | "avrg" => Ok(Self::Average),
            "branching" | "tree" => Ok(Self::Branching),
            _ => Err(ConfigError::UnknownAggregation(s.to_string())),
        }
    }
}

/// How the two children of a shield fork are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BranchPolicy {
    /// Both children weigh 0.5.
    #[default]
    Expectation,
    /// The shielding side takes the child that is better for itself.
    Minimax,
}

impl BranchPolicy {
    /// Encoding-layer name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Expectation => "expectation",
            Self::Minimax => "minimax",
        }
    }
}

impl FromStr for BranchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expectation" | "expected" => Ok(Self::Expectation),
            "minimax" => Ok(Self::Minimax),
            _ => Err(ConfigError::UnknownBranchPolicy(s.to_string())),
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// One fully decided shield schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaf {
    /// Probability weight; all leaves of a search sum to 1.
    pub weight: f64,
    /// Shields consumed by each side.
    pub shields_used: [u32; 2],
    /// Win value for side 0.
    pub win: f64,
    /// Duel length in milliseconds.
    pub duration: f64,
}

/// Expected outcome of a branch search plus its leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchingOutcome {
    /// Weighted combination of every leaf.
    pub outcome: BattleOutcome,
    /// Leaves in depth-first order (shield before decline).
    pub leaves: Vec<Leaf>,
}

/// Result of an aggregation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// Single run.
    Single(BattleOutcome),
    /// Mean over `num_sims` runs.
    Average {
        /// Mean outcome.
        outcome: BattleOutcome,
        /// Number of runs.
        num_sims: u32,
    },
    /// Branch search.
    Branching(BranchingOutcome),
}

impl Aggregate {
    /// The headline outcome.
    #[must_use]
    pub fn outcome(&self) -> &BattleOutcome {
        match self {
            Self::Single(outcome) | Self::Average { outcome, .. } => outcome,
            Self::Branching(b) => &b.outcome,
        }
    }
}

// =============================================================================
// PvE
// =============================================================================

/// Runs a PvE battle under `aggregation`.
///
/// # Errors
///
/// Rejects invalid players, zero simulations and branching aggregation before
/// any run starts.
pub fn simulate_pve(
    gm: &GameMaster,
    players: &[Player],
    settings: PveSettings,
    aggregation: Aggregation,
    num_sims: u32,
    seed: u64,
) -> Result<Aggregate> {
    // Validates everything once; later constructions cannot fail.
    let first = PveBattle::new(gm, players, settings, seed)?;
    tracing::info!(mode = "pve", %aggregation, num_sims, "simulation started");

    let result = match aggregation {
        Aggregation::None => Aggregate::Single(first.run()),
        Aggregation::Average => {
            if num_sims == 0 {
                return Err(InputError::ZeroSimulations.into());
            }
            let quiet = PveSettings {
                enable_log: false,
                ..settings
            };
            let outcomes = (0..num_sims)
                .into_par_iter()
                .map(|i| {
                    PveBattle::new(gm, players, quiet, seed.wrapping_add(u64::from(i)))
                        .map(PveBattle::run)
                })
                .collect::<Result<Vec<_>, InputError>>()?;
            Aggregate::Average {
                outcome: BattleOutcome::mean(&outcomes),
                num_sims,
            }
        }
        Aggregation::Branching => {
            return Err(InputError::UnsupportedAggregation {
                aggregation: Aggregation::Branching.name(),
                mode: "pve",
            }
            .into());
        }
    };

    tracing::info!(
        mode = "pve",
        %aggregation,
        win = result.outcome().statistics.win,
        "simulation finished"
    );
    Ok(result)
}

// =============================================================================
// PvP
// =============================================================================

/// Runs a duel under `aggregation`.
///
/// # Errors
///
/// Rejects invalid duelists and zero simulations before any run starts.
pub fn simulate_duel(
    gm: &GameMaster,
    duelists: &[Duelist; 2],
    settings: DuelSettings,
    aggregation: Aggregation,
    num_sims: u32,
    policy: BranchPolicy,
    seed: u64,
) -> Result<Aggregate> {
    let strategic = [ShieldControl::Strategy; 2];
    let first = Duel::new(gm, duelists, settings, strategic, seed)?;
    tracing::info!(mode = "pvp", %aggregation, num_sims, "simulation started");

    let result = match aggregation {
        Aggregation::None => Aggregate::Single(first.run_with(false)),
        Aggregation::Average => {
            if num_sims == 0 {
                return Err(InputError::ZeroSimulations.into());
            }
            let quiet = DuelSettings {
                enable_log: false,
                ..settings
            };
            let outcomes = (0..num_sims)
                .into_par_iter()
                .map(|i| {
                    Duel::new(gm, duelists, quiet, strategic, seed.wrapping_add(u64::from(i)))
                        .map(|duel| duel.run_with(false))
                })
                .collect::<Result<Vec<_>, InputError>>()?;
            Aggregate::Average {
                outcome: BattleOutcome::mean(&outcomes),
                num_sims,
            }
        }
        Aggregation::Branching => {
            Aggregate::Branching(branch_duel(gm, duelists, settings, policy, seed)?)
        }
    };

    tracing::info!(
        mode = "pvp",
        %aggregation,
        win = result.outcome().statistics.win,
        "simulation finished"
    );
    Ok(result)
}

/// Enumerates every shield schedule of a duel.
///
/// # Errors
///
/// Rejects invalid duelists.
pub fn branch_duel(
    gm: &GameMaster,
    duelists: &[Duelist; 2],
    settings: DuelSettings,
    policy: BranchPolicy,
    seed: u64,
) -> Result<BranchingOutcome> {
    let control = [ShieldControl::Branch { holding: false }; 2];
    let mut duel = Duel::new(gm, duelists, settings, control, seed)?;
    let step = duel.run_until_fork();
    Ok(explore(duel, step, policy))
}

fn explore(mut duel: Duel<'_>, step: DuelStep, policy: BranchPolicy) -> BranchingOutcome {
    let defender = match step {
        DuelStep::Finished(outcome) => {
            let leaf = Leaf {
                weight: 1.0,
                shields_used: duel.shields_used(),
                win: outcome.statistics.win,
                duration: outcome.statistics.duration,
            };
            return BranchingOutcome {
                outcome,
                leaves: vec![leaf],
            };
        }
        DuelStep::Fork { defender } => defender,
    };

    let mut declining = duel.clone();
    let (shielded, declined) = rayon::join(
        move || {
            let step = duel.resume(true);
            explore(duel, step, policy)
        },
        move || {
            let step = declining.resume(false);
            explore(declining, step, policy)
        },
    );

    let (w_shield, w_decline) = match policy {
        BranchPolicy::Expectation => (0.5, 0.5),
        BranchPolicy::Minimax => {
            if score(&shielded.outcome, defender) >= score(&declined.outcome, defender) {
                (1.0, 0.0)
            } else {
                (0.0, 1.0)
            }
        }
    };

    let outcome = BattleOutcome::weighted_sum([
        (w_shield, &shielded.outcome),
        (w_decline, &declined.outcome),
    ]);
    let leaves = scaled(shielded.leaves, w_shield)
        .chain(scaled(declined.leaves, w_decline))
        .collect();
    BranchingOutcome { outcome, leaves }
}

fn scaled(leaves: Vec<Leaf>, weight: f64) -> impl Iterator<Item = Leaf> {
    leaves.into_iter().map(move |mut leaf| {
        leaf.weight *= weight;
        leaf
    })
}

/// `(win value, own damage fraction)` from `side`'s point of view.
fn score(outcome: &BattleOutcome, side: usize) -> (f64, f64) {
    let win = if side == 0 {
        outcome.statistics.win
    } else {
        1.0 - outcome.statistics.win
    };
    let own = &outcome.pokemon[side][0][0];
    let other = &outcome.pokemon[1 - side][0][0];
    let fraction = if other.max_hp > 0.0 {
        own.tdo / other.max_hp
    } else {
        0.0
    };
    (win, fraction)
}

// =============================================================================
// Battle matrix
// =============================================================================

/// Shield setting of a battle matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixShields {
    /// Both sides use this many shields.
    Fixed(u32),
    /// Average over every pairing in [`MATRIX_SHIELD_RANGE`].
    AverageByShield,
}

/// Branching duel of every row against every column.
///
/// # Errors
///
/// Returns [`InputError::EmptyMatrix`] if either axis is empty, or the first
/// invalid duelist.
pub fn battle_matrix(
    gm: &GameMaster,
    rows: &[Duelist],
    cols: &[Duelist],
    settings: DuelSettings,
    shields: MatrixShields,
    policy: BranchPolicy,
    seed: u64,
) -> Result<Vec<Vec<BattleOutcome>>> {
    if rows.is_empty() || cols.is_empty() {
        return Err(InputError::EmptyMatrix.into());
    }
    for d in rows.iter().chain(cols) {
        d.combatant.validate()?;
    }
    tracing::info!(
        mode = "battlematrix",
        rows = rows.len(),
        cols = cols.len(),
        "simulation started"
    );

    let pairings: Vec<(u32, u32)> = match shields {
        MatrixShields::Fixed(n) => vec![(n, n)],
        MatrixShields::AverageByShield => MATRIX_SHIELD_RANGE
            .flat_map(|a| MATRIX_SHIELD_RANGE.map(move |b| (a, b)))
            .collect(),
    };
    let quiet = DuelSettings {
        enable_log: false,
        ..settings
    };

    let matrix = rows
        .par_iter()
        .map(|row| {
            cols.iter()
                .map(|col| -> Result<BattleOutcome> {
                    let outcomes = pairings
                        .iter()
                        .map(|&(a, b)| {
                            let pair = [
                                Duelist {
                                    shields: a,
                                    ..row.clone()
                                },
                                Duelist {
                                    shields: b,
                                    ..col.clone()
                                },
                            ];
                            branch_duel(gm, &pair, quiet, policy, seed).map(|b| b.outcome)
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Ok(BattleOutcome::mean(&outcomes))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(mode = "battlematrix", "simulation finished");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_aliases() {
        assert_eq!("enum".parse::<Aggregation>(), Ok(Aggregation::None));
        assert_eq!("AVRG".parse::<Aggregation>(), Ok(Aggregation::Average));
        assert_eq!("tree".parse::<Aggregation>(), Ok(Aggregation::Branching));
        assert!("median".parse::<Aggregation>().is_err());
    }

    #[test]
    fn branch_policy_names() {
        assert_eq!("Minimax".parse::<BranchPolicy>(), Ok(BranchPolicy::Minimax));
        assert_eq!(BranchPolicy::default(), BranchPolicy::Expectation);
        assert!(matches!(
            "coinflip".parse::<BranchPolicy>(),
            Err(ConfigError::UnknownBranchPolicy(_))
        ));
    }

    #[test]
    fn leaves_scale_by_weight() {
        let leaf = Leaf {
            weight: 0.5,
            shields_used: [1, 0],
            win: 1.0,
            duration: 1000.0,
        };
        let out: Vec<_> = scaled(vec![leaf], 0.5).collect();
        assert_eq!(out[0].weight, 0.25);
    }
}

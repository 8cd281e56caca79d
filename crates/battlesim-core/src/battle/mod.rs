//! Event schedulers and the outcome records they produce.
//!
//! # Architecture
//!
//! Both schedulers pop events from an [`EventQueue`] ordered by
//! `(time, priority, insertion)`:
//!
//! ```text
//! Enter ──► Free ──► strategy ──► Fast/Charged ──► Damage ──► faint? ──► Enter
//!             ▲                        │
//!             └──────── duration ──────┘
//! ```
//!
//! - [`PveBattle`]: raid/gym battles between players with parties.
//! - [`Duel`]: one-on-one PvP battles that pause at shield decisions so the
//!   aggregation engine can fork them.
//!
//! A run is a closed state machine: all validation happens in the
//! constructors, and `run` cannot fail.

mod pve;
mod pvp;
mod queue;

pub use pve::{validate_players, PveBattle, PveSettings, DEFAULT_TIME_LIMIT as PVE_TIME_LIMIT};
pub use pvp::{Duel, DuelSettings, DuelStep, ShieldControl, DEFAULT_TIME_LIMIT as PVP_TIME_LIMIT};
pub use queue::{EventQueue, Prioritized};

use serde::Serialize;

use crate::entity::{Combatant, CombatantState};
use crate::timeline::TimelineEvent;

// =============================================================================
// Outcome
// =============================================================================

/// Aggregate statistics of one run (or a weighted mean of runs).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Battle length in milliseconds.
    pub duration: f64,
    /// 1 for a win, 0 for a loss; fractional for means and PvP draws.
    pub win: f64,
    /// Attacking side's total damage output.
    pub tdo: f64,
    /// `tdo` as a percentage of the opposing side's total health.
    pub tdo_percent: f64,
    /// Attacking side's faints.
    pub num_deaths: f64,
}

impl Statistics {
    fn add_weighted(&mut self, other: &Self, weight: f64) {
        self.duration += other.duration * weight;
        self.win += other.win * weight;
        self.tdo += other.tdo * weight;
        self.tdo_percent += other.tdo_percent * weight;
        self.num_deaths += other.num_deaths * weight;
    }
}

/// Per-combatant statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantStats {
    /// Remaining health, clamped at 0.
    pub hp: f64,
    /// Maximum health.
    #[serde(rename = "maxHP")]
    pub max_hp: f64,
    /// Energy on first entry.
    pub starting_energy: f64,
    /// Remaining energy.
    pub energy: f64,
    /// Total damage dealt.
    pub tdo: f64,
    /// Damage dealt by fast moves.
    pub tdo_fast: f64,
    /// Times fainted.
    pub num_deaths: f64,
    /// Time on the field in milliseconds.
    pub duration: f64,
    /// Fast moves used.
    pub num_fast_attacks: f64,
    /// Charged moves used.
    pub num_charged_attacks: f64,
}

impl CombatantStats {
    /// Snapshot of a combatant at the end of a run.
    #[must_use]
    pub fn capture(def: &Combatant, state: &CombatantState) -> Self {
        Self {
            hp: f64::from(state.displayed_hp()),
            max_hp: f64::from(state.max_hp),
            starting_energy: f64::from(def.starting_energy),
            energy: f64::from(state.energy),
            tdo: f64::from(state.tdo),
            tdo_fast: f64::from(state.tdo_fast),
            num_deaths: f64::from(state.num_deaths),
            duration: f64::from(state.duration),
            num_fast_attacks: f64::from(state.num_fast_moves),
            num_charged_attacks: f64::from(state.num_charged_moves),
        }
    }

    fn add_weighted(&mut self, other: &Self, weight: f64) {
        self.hp += other.hp * weight;
        self.max_hp += other.max_hp * weight;
        self.starting_energy += other.starting_energy * weight;
        self.energy += other.energy * weight;
        self.tdo += other.tdo * weight;
        self.tdo_fast += other.tdo_fast * weight;
        self.num_deaths += other.num_deaths * weight;
        self.duration += other.duration * weight;
        self.num_fast_attacks += other.num_fast_attacks * weight;
        self.num_charged_attacks += other.num_charged_attacks * weight;
    }
}

/// Result of one run, or a weighted combination of runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleOutcome {
    /// Summary statistics.
    pub statistics: Statistics,
    /// Per-combatant statistics, nested player → party → member. PvP duels
    /// use one player per side with a single one-member party.
    pub pokemon: Vec<Vec<Vec<CombatantStats>>>,
    /// Time-sorted event log (empty unless logging was requested).
    pub battle_log: Vec<TimelineEvent>,
}

impl BattleOutcome {
    /// Weighted combination of outcomes that share the same shape. Logs are
    /// dropped.
    ///
    /// Terms are folded in iteration order, so the same inputs always give
    /// bit-identical results.
    #[must_use]
    pub fn weighted_sum<'b, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (f64, &'b BattleOutcome)>,
    {
        let mut total = Self::default();
        for (i, (weight, outcome)) in outcomes.into_iter().enumerate() {
            if i == 0 {
                total.pokemon = outcome
                    .pokemon
                    .iter()
                    .map(|player| {
                        player
                            .iter()
                            .map(|party| vec![CombatantStats::default(); party.len()])
                            .collect()
                    })
                    .collect();
            }
            total.statistics.add_weighted(&outcome.statistics, weight);
            for (acc, src) in total.pokemon.iter_mut().zip(&outcome.pokemon) {
                for (acc, src) in acc.iter_mut().zip(src) {
                    for (acc, src) in acc.iter_mut().zip(src) {
                        acc.add_weighted(src, weight);
                    }
                }
            }
        }
        total
    }

    /// Arithmetic mean of outcomes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(outcomes: &[BattleOutcome]) -> Self {
        let weight = 1.0 / outcomes.len().max(1) as f64;
        Self::weighted_sum(outcomes.iter().map(|o| (weight, o)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(win: f64, tdo: f64) -> BattleOutcome {
        BattleOutcome {
            statistics: Statistics {
                duration: 1000.0,
                win,
                tdo,
                tdo_percent: tdo,
                num_deaths: 0.0,
            },
            pokemon: vec![vec![vec![CombatantStats {
                tdo,
                ..CombatantStats::default()
            }]]],
            battle_log: Vec::new(),
        }
    }

    #[test]
    fn mean_averages_every_field() {
        let m = BattleOutcome::mean(&[outcome(1.0, 10.0), outcome(0.0, 30.0)]);
        assert_eq!(m.statistics.win, 0.5);
        assert_eq!(m.statistics.tdo, 20.0);
        assert_eq!(m.statistics.duration, 1000.0);
        assert_eq!(m.pokemon[0][0][0].tdo, 20.0);
    }

    #[test]
    fn weighted_sum_of_one_is_identity() {
        let o = outcome(1.0, 12.0);
        let sum = BattleOutcome::weighted_sum([(1.0, &o)]);
        assert_eq!(sum.statistics, o.statistics);
        assert_eq!(sum.pokemon, o.pokemon);
    }
}

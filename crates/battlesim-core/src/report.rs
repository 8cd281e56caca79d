//! Report encoding: outcomes to the response JSON.
//!
//! Internally everything is kept in milliseconds. Reports switch durations to
//! seconds and add damage-per-second figures.

use serde::Serialize;

use crate::aggregate::{Aggregate, Leaf};
use crate::battle::{BattleOutcome, CombatantStats, Statistics};
use crate::error::Result;
use crate::timeline::TimelineEvent;

fn per_second(tdo: f64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        tdo / seconds
    } else {
        0.0
    }
}

/// Summary statistics as reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsReport {
    /// Battle length in seconds.
    pub duration: f64,
    /// Win value in `[0, 1]`.
    pub win: f64,
    /// Attacking side's damage output.
    pub tdo: f64,
    /// `tdo` as a percentage of the opposing side's health.
    pub tdo_percent: f64,
    /// Damage per second.
    pub dps: f64,
    /// Attacking side's faints.
    pub num_deaths: f64,
}

impl From<&Statistics> for StatisticsReport {
    fn from(s: &Statistics) -> Self {
        let duration = s.duration / 1000.0;
        Self {
            duration,
            win: s.win,
            tdo: s.tdo,
            tdo_percent: s.tdo_percent,
            dps: per_second(s.tdo, duration),
            num_deaths: s.num_deaths,
        }
    }
}

/// Per-combatant statistics as reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantReport {
    /// Remaining health.
    pub hp: f64,
    /// Maximum health.
    #[serde(rename = "maxHP")]
    pub max_hp: f64,
    /// Energy on first entry.
    pub starting_energy: f64,
    /// Remaining energy.
    pub energy: f64,
    /// Damage dealt.
    pub tdo: f64,
    /// Damage dealt by fast moves.
    pub tdo_fast: f64,
    /// Faints.
    pub num_deaths: f64,
    /// Time on the field in seconds.
    pub duration: f64,
    /// Damage per second on the field.
    pub dps: f64,
    /// Fast moves used.
    pub num_fast_attacks: f64,
    /// Charged moves used.
    pub num_charged_attacks: f64,
}

impl From<&CombatantStats> for CombatantReport {
    fn from(c: &CombatantStats) -> Self {
        let duration = c.duration / 1000.0;
        Self {
            hp: c.hp.max(0.0),
            max_hp: c.max_hp,
            starting_energy: c.starting_energy,
            energy: c.energy,
            tdo: c.tdo,
            tdo_fast: c.tdo_fast,
            num_deaths: c.num_deaths,
            duration,
            dps: per_second(c.tdo, duration),
            num_fast_attacks: c.num_fast_attacks,
            num_charged_attacks: c.num_charged_attacks,
        }
    }
}

/// Report of a single battle request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleReport {
    /// Summary.
    pub statistics: StatisticsReport,
    /// Player → party → member.
    pub pokemon: Vec<Vec<Vec<CombatantReport>>>,
    /// Event log, when recorded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub battle_log: Vec<TimelineEvent>,
    /// Number of averaged runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_sims: Option<u32>,
    /// Leaves of a branching duel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<Leaf>>,
}

impl BattleReport {
    fn from_outcome(outcome: &BattleOutcome) -> Self {
        Self {
            statistics: StatisticsReport::from(&outcome.statistics),
            pokemon: outcome
                .pokemon
                .iter()
                .map(|player| {
                    player
                        .iter()
                        .map(|party| party.iter().map(CombatantReport::from).collect())
                        .collect()
                })
                .collect(),
            battle_log: outcome.battle_log.clone(),
            num_sims: None,
            branches: None,
        }
    }
}

/// Report of a battle matrix: one summary per cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixReport {
    /// Rows × columns.
    pub matrix: Vec<Vec<StatisticsReport>>,
}

/// Response document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    /// PvE or PvP battle.
    Battle(BattleReport),
    /// Battle matrix.
    Matrix(MatrixReport),
}

impl Report {
    /// Encodes an aggregation result.
    #[must_use]
    pub fn from_aggregate(aggregate: Aggregate) -> Self {
        let report = match aggregate {
            Aggregate::Single(outcome) => BattleReport::from_outcome(&outcome),
            Aggregate::Average { outcome, num_sims } => BattleReport {
                num_sims: Some(num_sims),
                ..BattleReport::from_outcome(&outcome)
            },
            Aggregate::Branching(b) => BattleReport {
                branches: Some(b.leaves),
                ..BattleReport::from_outcome(&b.outcome)
            },
        };
        Self::Battle(report)
    }

    /// Encodes a battle matrix.
    #[must_use]
    pub fn from_matrix(cells: &[Vec<BattleOutcome>]) -> Self {
        Self::Matrix(MatrixReport {
            matrix: cells
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|o| StatisticsReport::from(&o.statistics))
                        .collect()
                })
                .collect(),
        })
    }

    /// Serializes the report.
    ///
    /// # Errors
    ///
    /// Returns a decode-kind error if serialization fails.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

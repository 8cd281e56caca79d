//! Predefined PvE strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Strategy, StrategyInput};
use crate::action::{Action, ActionKind};
use crate::error::ConfigError;
use crate::Time;

/// Predefined PvE strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PveStrategy {
    /// Fires the charged move whenever energy allows, never dodges.
    #[default]
    AttackerNoDodge,
    /// Dodges incoming charged moves, fills gaps with attacks.
    AttackerDodgeCharged,
    /// Dodges every incoming move, fills gaps with attacks.
    AttackerDodgeAll,
    /// Boss behaviour: pre-commits the next move with random charged choices.
    Defender,
}

impl PveStrategy {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::AttackerNoDodge,
        Self::AttackerDodgeCharged,
        Self::AttackerDodgeAll,
        Self::Defender,
    ];

    /// Encoding-layer name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AttackerNoDodge => "ATTACKER_NO_DODGE",
            Self::AttackerDodgeCharged => "ATTACKER_DODGE_CHARGED",
            Self::AttackerDodgeAll => "ATTACKER_DODGE_ALL",
            Self::Defender => "DEFENDER",
        }
    }
}

impl fmt::Display for PveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PveStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownStrategy {
                family: "PvE",
                name: s.to_string(),
            })
    }
}

impl Strategy for PveStrategy {
    fn on_free(&self, input: &StrategyInput<'_>) -> Action {
        match self {
            Self::AttackerNoDodge | Self::Defender => no_dodge(input),
            Self::AttackerDodgeCharged => dodge_on_free(input, false),
            Self::AttackerDodgeAll => dodge_on_free(input, true),
        }
    }

    fn pre_commits(&self) -> bool {
        matches!(self, Self::Defender)
    }

    fn on_clear(&self, input: &StrategyInput<'_>) -> Option<Action> {
        match self {
            Self::Defender => Some(defender_on_clear(input)),
            _ => None,
        }
    }

    fn on_attack(&self, input: &StrategyInput<'_>) -> Option<Action> {
        match self {
            Self::AttackerDodgeCharged => Some(dodge_on_attack(input, false)),
            Self::AttackerDodgeAll => Some(dodge_on_attack(input, true)),
            _ => None,
        }
    }
}

// =============================================================================
// Algorithms
// =============================================================================

fn no_dodge(si: &StrategyInput<'_>) -> Action {
    let index = si.subject_state.current_charged;
    if si.subject_state.energy + si.subject.charged_move(index).energy >= 0 {
        Action::charged(index)
    } else {
        Action::fast()
    }
}

/// Fills the time before the next hit, or dodges it when nothing fits.
fn fill_or_dodge(si: &StrategyInput<'_>, time_till_damage: Time, predicted: bool) -> Action {
    let index = si.subject_state.current_charged;
    let charged = si.subject.charged_move(index);
    if time_till_damage > charged.duration && si.subject_state.energy + charged.energy >= 0 {
        Action::charged(index)
    } else if time_till_damage > si.subject.fast_move.duration {
        Action::fast()
    } else if predicted {
        Action::wait()
    } else {
        Action::dodge((time_till_damage - si.constants.dodge_window).max(0))
    }
}

fn dodge_on_free(si: &StrategyInput<'_>, include_fast: bool) -> Action {
    let enemy_fast = &si.enemy.fast_move;
    let issued = si.enemy_action.time;
    let (mut time_of_damage, cooldown_end) = match si.enemy_action.kind {
        ActionKind::Fast => (
            if include_fast {
                issued + enemy_fast.damage_window
            } else {
                -1
            },
            issued + enemy_fast.duration,
        ),
        ActionKind::Charged => {
            let mv = si.enemy.charged_move(si.enemy_action.value);
            (issued + mv.damage_window, issued + mv.duration)
        }
        _ => (-1, -1),
    };

    // Already landed or already covered by a dodge: guess the next one.
    let predicted =
        time_of_damage < si.time || time_of_damage <= si.subject_state.damage_reduction_expiry;
    if predicted {
        let window = if include_fast {
            enemy_fast.damage_window
        } else {
            si.enemy
                .charged_move(si.enemy_state.current_charged)
                .damage_window
        };
        time_of_damage = cooldown_end + si.constants.defender_min_delay + window;
    }
    fill_or_dodge(si, time_of_damage - si.time, predicted)
}

fn dodge_on_attack(si: &StrategyInput<'_>, include_fast: bool) -> Action {
    let window = match si.enemy_action.kind {
        ActionKind::Fast if include_fast => si.enemy.fast_move.damage_window,
        ActionKind::Charged => si.enemy.charged_move(si.enemy_action.value).damage_window,
        _ => return no_dodge(si),
    };
    fill_or_dodge(si, si.enemy_action.time + window - si.time, false)
}

fn defender_on_clear(si: &StrategyInput<'_>) -> Action {
    let mut projected = si.subject_state.energy;
    match si.subject_action.kind {
        ActionKind::Fast => projected += si.subject.fast_move.energy,
        ActionKind::Charged => projected += si.subject.charged_move(si.subject_action.value).energy,
        _ => {}
    }
    let projected = projected.clamp(0, si.constants.max_energy);

    si.subject
        .charged_moves
        .iter()
        .enumerate()
        .take(u32::BITS as usize)
        .find(|(i, mv)| projected + mv.energy >= 0 && (si.random_bits >> i) & 1 == 1)
        .map_or_else(Action::fast, |(i, _)| Action::charged(i))
}

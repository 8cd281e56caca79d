//! PvP strategies: move choice and shield choice.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::config::GameMaster;
use crate::damage::{self, Modifiers, Strike};
use crate::entity::{Combatant, CombatantState, Move};
use crate::error::ConfigError;
use crate::Time;

/// Read-only snapshot of a duel from one side.
#[derive(Debug, Clone, Copy)]
pub struct DuelView<'a> {
    /// Current simulated time.
    pub time: Time,
    /// Rule set, used to estimate damage.
    pub gm: &'a GameMaster,
    /// The deciding combatant.
    pub subject: &'a Combatant,
    /// Its state.
    pub subject_state: &'a CombatantState,
    /// The opponent.
    pub enemy: &'a Combatant,
    /// The opponent's state.
    pub enemy_state: &'a CombatantState,
}

impl DuelView<'_> {
    /// Damage the subject would deal with `mv`.
    #[must_use]
    pub fn outgoing(&self, mv: &Move, bonus: f64) -> i32 {
        let strike = Strike {
            attacker: self.subject,
            attacker_state: self.subject_state,
            defender: self.enemy,
            defender_state: self.enemy_state,
            mv,
        };
        damage::damage(self.gm, &strike, &pvp_modifiers(bonus))
    }

    /// Damage the enemy would deal with `mv`.
    #[must_use]
    pub fn incoming(&self, mv: &Move, bonus: f64) -> i32 {
        let strike = Strike {
            attacker: self.enemy,
            attacker_state: self.enemy_state,
            defender: self.subject,
            defender_state: self.subject_state,
            mv,
        };
        damage::damage(self.gm, &strike, &pvp_modifiers(bonus))
    }
}

pub(crate) fn pvp_modifiers(bonus: f64) -> Modifiers {
    Modifiers {
        bonus,
        ..Modifiers::default()
    }
}

/// Predefined PvP strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PvpStrategy {
    /// Fires the first affordable charged move; always shields.
    #[default]
    Basic,
    /// Baits shields, saves for the strongest move, shields only big hits.
    Advance,
}

impl PvpStrategy {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 2] = [Self::Basic, Self::Advance];

    /// Encoding-layer name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Advance => "ADVANCE",
        }
    }

    /// Chooses the next move.
    #[must_use]
    pub fn on_free(self, view: &DuelView<'_>) -> Action {
        let energy = view.subject_state.energy;
        let moves = &view.subject.charged_moves;
        let affordable = move || {
            moves
                .iter()
                .enumerate()
                .filter(move |(_, mv)| energy + mv.energy >= 0)
        };

        match self {
            Self::Basic => affordable()
                .next()
                .map_or_else(Action::fast, |(i, _)| Action::charged(i)),
            Self::Advance => {
                if affordable().next().is_none() {
                    return Action::fast();
                }
                let charged_bonus = view.gm.constants().pvp_charged_attack_bonus_multiplier;
                let fast_bonus = view.gm.constants().pvp_fast_attack_bonus_multiplier;

                if view.enemy_state.shields > 0 {
                    // Cheapest affordable move; ties go to the earlier move.
                    return affordable()
                        .min_by_key(|(i, mv)| (-mv.energy, *i))
                        .map_or_else(Action::fast, |(i, _)| Action::charged(i));
                }

                let strongest = moves
                    .iter()
                    .enumerate()
                    .max_by_key(|(i, mv)| (view.outgoing(mv, charged_bonus), usize::MAX - *i))
                    .map(|(i, _)| i);
                if let Some(i) = strongest {
                    if energy + moves[i].energy >= 0 {
                        return Action::charged(i);
                    }
                }

                let best_affordable = affordable()
                    .max_by_key(|(i, mv)| (view.outgoing(mv, charged_bonus), usize::MAX - *i));
                if let Some((i, mv)) = best_affordable {
                    let knocks_out = view.outgoing(mv, charged_bonus) >= view.enemy_state.hp;
                    let about_to_faint =
                        view.incoming(&view.enemy.fast_move, fast_bonus) >= view.subject_state.hp;
                    if knocks_out || about_to_faint {
                        return Action::charged(i);
                    }
                }
                Action::fast()
            }
        }
    }

    /// Decides whether to shield an incoming charged hit of `incoming` damage.
    /// Only consulted while the subject has shields left.
    #[must_use]
    pub fn wants_shield(self, view: &DuelView<'_>, incoming: i32) -> bool {
        match self {
            Self::Basic => true,
            Self::Advance => {
                let hp = view.subject_state.hp;
                incoming >= hp || incoming.saturating_mul(2) > hp
            }
        }
    }
}

impl fmt::Display for PvpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PvpStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownStrategy {
                family: "PvP",
                name: s.to_string(),
            })
    }
}

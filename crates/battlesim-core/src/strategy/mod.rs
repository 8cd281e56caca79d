//! Strategy engine: pure decision functions.
//!
//! A strategy never fails and never mutates state. It reads a
//! [`StrategyInput`] snapshot and returns an [`Action`].
//!
//! # Trigger points
//!
//! - `on_free`: the subject has just become able to act.
//! - `on_clear`: the subject commits its next move ahead of time (defending
//!   bosses). Strategies that do not pre-commit return `None`.
//! - `on_attack`: an enemy attack was committed while the subject was waiting.
//!   Strategies that ignore incoming attacks return `None`.
//!
//! PvE strategies implement [`Strategy`]. PvP duels use the simpler
//! [`PvpStrategy`] decisions (move choice and shield choice).

mod pve;
mod pvp;

pub use pve::PveStrategy;
pub use pvp::{DuelView, PvpStrategy};
pub(crate) use pvp::pvp_modifiers;

use crate::action::Action;
use crate::config::BattleConstants;
use crate::entity::{Combatant, CombatantState};
use crate::Time;

/// Read-only snapshot handed to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    /// Current simulated time.
    pub time: Time,
    /// The deciding combatant.
    pub subject: &'a Combatant,
    /// Its runtime state.
    pub subject_state: &'a CombatantState,
    /// The subject's own committed action (the move it is finishing).
    pub subject_action: Action,
    /// The subject's current opponent.
    pub enemy: &'a Combatant,
    /// The opponent's runtime state.
    pub enemy_state: &'a CombatantState,
    /// The opponent's most recently committed action.
    pub enemy_action: Action,
    /// Random bits for stochastic choices; bit `i` belongs to charged move `i`.
    pub random_bits: u32,
    /// Timing constants.
    pub constants: &'a BattleConstants,
}

/// Decision interface with the three trigger points.
pub trait Strategy {
    /// Called when the subject becomes free.
    fn on_free(&self, input: &StrategyInput<'_>) -> Action;

    /// Whether [`on_clear`](Self::on_clear) is used. The scheduler only draws
    /// random bits and defender delays for strategies that pre-commit.
    fn pre_commits(&self) -> bool {
        false
    }

    /// Called when the subject commits a move, to pre-commit the next one.
    fn on_clear(&self, _input: &StrategyInput<'_>) -> Option<Action> {
        None
    }

    /// Called when an enemy attack is inbound and the subject is waiting.
    fn on_attack(&self, _input: &StrategyInput<'_>) -> Option<Action> {
        None
    }
}

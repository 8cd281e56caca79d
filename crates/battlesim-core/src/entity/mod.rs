//! Combatant model: immutable move and creature definitions.
//!
//! Definitions are created once while a request is decoded and shared by
//! reference with every run. Everything that changes during a battle lives in
//! [`CombatantState`], which each run owns exclusively.
//!
//! # Architecture
//!
//! ```text
//! Move ──┐
//!        ├──► Combatant ──► Party (≤ 6) ──► Player   (PvE)
//! Move* ─┘        └───────► Duelist                  (PvP)
//! ```

mod state;

pub use state::CombatantState;

use serde::{Deserialize, Serialize};

use crate::config::TypeIndex;
use crate::error::InputError;
use crate::strategy::PveStrategy;
use crate::Time;

// =============================================================================
// Moves
// =============================================================================

/// Secondary effect of a move: stage changes rolled on hit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MoveEffect {
    /// Probability in `[0, 1]` that the effect activates.
    pub activation_chance: f64,
    /// Attack stage delta applied to the user.
    pub self_attack_delta: i32,
    /// Defense stage delta applied to the user.
    pub self_defense_delta: i32,
    /// Attack stage delta applied to the target.
    pub target_attack_delta: i32,
    /// Defense stage delta applied to the target.
    pub target_defense_delta: i32,
}

/// A fast or charged move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    /// Move type.
    pub move_type: TypeIndex,
    /// Base power.
    pub power: i32,
    /// Energy delta: positive for fast moves, negative for charged moves.
    pub energy: i32,
    /// Cast duration in milliseconds.
    pub duration: Time,
    /// Offset from the start of the cast at which damage lands.
    pub damage_window: Time,
    /// Optional stage effect.
    pub effect: Option<MoveEffect>,
}

impl Move {
    /// Creates a move without a secondary effect.
    #[must_use]
    pub const fn new(
        move_type: TypeIndex,
        power: i32,
        energy: i32,
        duration: Time,
        damage_window: Time,
    ) -> Self {
        Self {
            move_type,
            power,
            energy,
            duration,
            damage_window,
            effect: None,
        }
    }

    /// Attaches a secondary effect.
    #[must_use]
    pub const fn with_effect(mut self, effect: MoveEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Checks power and timing.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NegativePower`],
    /// [`InputError::NonPositiveDuration`] or
    /// [`InputError::DamageWindowOutOfRange`].
    pub fn validate(&self) -> Result<(), InputError> {
        if self.power < 0 {
            return Err(InputError::NegativePower(self.power));
        }
        if self.duration <= 0 {
            return Err(InputError::NonPositiveDuration(self.duration));
        }
        if self.damage_window < 0 || self.damage_window > self.duration {
            return Err(InputError::DamageWindowOutOfRange {
                damage_window: self.damage_window,
                duration: self.duration,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Combatants
// =============================================================================

/// Immutable definition of one creature.
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    /// Primary type.
    pub primary_type: TypeIndex,
    /// Optional secondary type.
    pub secondary_type: Option<TypeIndex>,
    /// Attack stat.
    pub attack: f64,
    /// Defense stat.
    pub defense: f64,
    /// Maximum health.
    pub max_hp: i32,
    /// Energy on first entry.
    pub starting_energy: i32,
    /// The fast move.
    pub fast_move: Move,
    /// One or more charged moves. Index 0 is the default charged move.
    pub charged_moves: Vec<Move>,
    /// Health never causes fainting.
    pub immortal: bool,
    /// PvE decision strategy.
    pub strategy: PveStrategy,
}

impl Combatant {
    /// Creates a combatant with one charged move, no starting energy and the
    /// no-dodge attacker strategy.
    #[must_use]
    pub fn new(
        primary_type: TypeIndex,
        attack: f64,
        defense: f64,
        max_hp: i32,
        fast_move: Move,
        charged_move: Move,
    ) -> Self {
        Self {
            primary_type,
            secondary_type: None,
            attack,
            defense,
            max_hp,
            starting_energy: 0,
            fast_move,
            charged_moves: vec![charged_move],
            immortal: false,
            strategy: PveStrategy::default(),
        }
    }

    /// Returns whether `t` is one of this combatant's types.
    #[must_use]
    pub fn has_type(&self, t: TypeIndex) -> bool {
        self.primary_type == t || self.secondary_type == Some(t)
    }

    /// Returns the charged move at `index`, falling back to the default
    /// charged move for out-of-range indices.
    #[must_use]
    pub fn charged_move(&self, index: usize) -> &Move {
        self.charged_moves
            .get(index)
            .unwrap_or(&self.charged_moves[0])
    }

    /// Checks stats and moves.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), InputError> {
        for (stat, value) in [
            ("attack", self.attack),
            ("defense", self.defense),
            ("max_hp", f64::from(self.max_hp)),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(InputError::NonPositiveStat { stat, value });
            }
        }
        if self.charged_moves.is_empty() {
            return Err(InputError::NoChargedMoves);
        }
        self.fast_move.validate()?;
        self.charged_moves.iter().try_for_each(Move::validate)
    }
}

/// A combatant entered into a PvP duel.
#[derive(Debug, Clone, PartialEq)]
pub struct Duelist {
    /// Creature definition.
    pub combatant: Combatant,
    /// PvP decision strategy.
    pub strategy: crate::strategy::PvpStrategy,
    /// Shields available at the start of the duel.
    pub shields: u32,
}

//! Per-run mutable combatant state.

use serde::Serialize;

use crate::config::GameMaster;
use crate::entity::Combatant;
use crate::Time;

/// Mutable state of one combatant, owned by exactly one run.
///
/// Health may go negative internally; [`displayed_hp`](Self::displayed_hp)
/// clamps it for reporting. Energy and stages are clamped on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantState {
    /// Current health.
    pub hp: i32,
    /// Maximum health.
    pub max_hp: i32,
    /// Current energy.
    pub energy: i32,
    /// Energy cap.
    #[serde(skip)]
    pub max_energy: i32,
    /// Attack stage.
    pub attack_stage: i32,
    /// Defense stage.
    pub defense_stage: i32,
    /// Total damage dealt.
    pub tdo: i32,
    /// Damage dealt by fast moves.
    pub tdo_fast: i32,
    /// Time spent on the field.
    pub duration: Time,
    /// Times fainted.
    pub num_deaths: u32,
    /// Fast moves used.
    pub num_fast_moves: u32,
    /// Charged moves used.
    pub num_charged_moves: u32,
    /// Start of the latest dodge, or -1.
    #[serde(skip)]
    pub dodge_start: Time,
    /// End of the latest dodge protection window, or -1.
    #[serde(skip)]
    pub damage_reduction_expiry: Time,
    /// Never faints.
    #[serde(skip)]
    pub immortal: bool,
    /// Currently on the field.
    #[serde(skip)]
    pub active: bool,
    /// When the combatant last entered the field.
    #[serde(skip)]
    pub enter_time: Time,
    /// Remaining PvP shields.
    #[serde(skip)]
    pub shields: u32,
    /// Index of the charged move used most recently.
    #[serde(skip)]
    pub current_charged: usize,
}

impl CombatantState {
    /// Creates fresh state for a combatant: full health, starting energy,
    /// neutral stages.
    #[must_use]
    pub fn new(def: &Combatant, max_energy: i32) -> Self {
        Self {
            hp: def.max_hp,
            max_hp: def.max_hp,
            energy: def.starting_energy.clamp(0, max_energy),
            max_energy,
            attack_stage: 0,
            defense_stage: 0,
            tdo: 0,
            tdo_fast: 0,
            duration: 0,
            num_deaths: 0,
            num_fast_moves: 0,
            num_charged_moves: 0,
            dodge_start: -1,
            damage_reduction_expiry: -1,
            immortal: def.immortal,
            active: false,
            enter_time: 0,
            shields: 0,
            current_charged: 0,
        }
    }

    /// Returns `true` while health is positive or the combatant is immortal.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0 || self.immortal
    }

    /// Health clamped at zero.
    #[must_use]
    pub fn displayed_hp(&self) -> i32 {
        self.hp.max(0)
    }

    /// Adds `delta` energy, clamped to `[0, max_energy]`.
    pub fn charge(&mut self, delta: i32) {
        self.energy = self.energy.saturating_add(delta).clamp(0, self.max_energy);
    }

    /// Removes health.
    pub fn hurt(&mut self, damage: i32) {
        self.hp = self.hp.saturating_sub(damage);
    }

    /// Credits damage dealt by this combatant.
    pub fn attribute_damage(&mut self, damage: i32, fast: bool) {
        self.tdo += damage;
        if fast {
            self.tdo_fast += damage;
        }
    }

    /// Restores full health and empties energy.
    pub fn heal(&mut self) {
        self.hp = self.max_hp;
        self.energy = 0;
    }

    /// Applies stage deltas, clamped to the configured bounds.
    pub fn buff(&mut self, gm: &GameMaster, attack_delta: i32, defense_delta: i32) {
        self.attack_stage = gm.clamp_stage(self.attack_stage.saturating_add(attack_delta));
        self.defense_stage = gm.clamp_stage(self.defense_stage.saturating_add(defense_delta));
    }

    /// Starts a dodge protecting `[start, start + window]`.
    pub fn dodge(&mut self, start: Time, window: Time) {
        self.dodge_start = start;
        self.damage_reduction_expiry = start.saturating_add(window);
    }

    /// Returns `true` if damage landing at `t` falls inside the dodge window.
    #[must_use]
    pub fn is_protected(&self, t: Time) -> bool {
        self.dodge_start >= 0 && self.dodge_start <= t && t <= self.damage_reduction_expiry
    }

    /// Puts the combatant on the field.
    pub fn enter(&mut self, t: Time) {
        self.active = true;
        self.enter_time = t;
    }

    /// Takes the combatant off the field, accumulating time spent.
    pub fn exit(&mut self, t: Time) {
        if self.active {
            self.duration += t - self.enter_time;
            self.active = false;
        }
    }
}

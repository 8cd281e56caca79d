//! Damage and resource calculator.
//!
//! Pure functions turning a hit into integer deltas. Callers apply the
//! results to [`CombatantState`]; nothing here mutates battle state except
//! [`apply_effect`], which updates stages through their clamped setter.

use rand::Rng;

use crate::config::{GameMaster, StatKind, WeatherIndex};
use crate::entity::{Combatant, CombatantState, Move, MoveEffect};

/// One hit: who attacks whom with which move.
#[derive(Debug, Clone, Copy)]
pub struct Strike<'a> {
    /// Attacking definition.
    pub attacker: &'a Combatant,
    /// Attacking state (stages).
    pub attacker_state: &'a CombatantState,
    /// Defending definition.
    pub defender: &'a Combatant,
    /// Defending state (stages).
    pub defender_state: &'a CombatantState,
    /// The move.
    pub mv: &'a Move,
}

/// Context multipliers outside the two combatants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifiers {
    /// Player attack multiplier.
    pub attack_multiplier: f64,
    /// Player clone multiplier, applied to the final integer damage.
    pub clone_multiplier: u32,
    /// Current weather.
    pub weather: Option<WeatherIndex>,
    /// Mode bonus (PvP fast/charged bonus; 1.0 in PvE).
    pub bonus: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            attack_multiplier: 1.0,
            clone_multiplier: 1,
            weather: None,
            bonus: 1.0,
        }
    }
}

/// Type effectiveness of `mv` against every type of `defender`.
#[must_use]
pub fn effectiveness(gm: &GameMaster, mv: &Move, defender: &Combatant) -> f64 {
    let mut multiplier = gm.effectiveness(mv.move_type, defender.primary_type);
    if let Some(secondary) = defender.secondary_type {
        multiplier *= gm.effectiveness(mv.move_type, secondary);
    }
    multiplier
}

/// Damage dealt by one hit. Always at least 1 per clone.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn damage(gm: &GameMaster, strike: &Strike<'_>, mods: &Modifiers) -> i32 {
    let constants = gm.constants();
    let attack = strike.attacker.attack
        * mods.attack_multiplier
        * gm.clamped_stage_multiplier(StatKind::Attack, strike.attacker_state.attack_stage);
    let defense = strike.defender.defense
        * gm.clamped_stage_multiplier(StatKind::Defense, strike.defender_state.defense_stage);

    let mut multiplier = effectiveness(gm, strike.mv, strike.defender) * mods.bonus;
    if strike.attacker.has_type(strike.mv.move_type) {
        multiplier *= constants.same_type_attack_bonus_multiplier;
    }
    if mods.weather.is_some() && gm.boosted_weather(strike.mv.move_type) == mods.weather {
        multiplier *= constants.weather_attack_bonus_multiplier;
    }

    let raw = (0.5 * f64::from(strike.mv.power) * attack / defense * multiplier).floor();
    let base = raw.max(0.0) as i32 + 1;
    base.saturating_mul(i32::try_from(mods.clone_multiplier).unwrap_or(i32::MAX))
}

/// Damage left after a successful dodge.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn dodged_damage(damage: i32, reduction: f64) -> i32 {
    (f64::from(damage) * (1.0 - reduction)).floor().max(0.0) as i32
}

/// Energy a defender gains from losing `damage` health.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn health_loss_energy(damage: i32, rate: f64) -> i32 {
    (f64::from(damage) * rate).ceil().max(0.0) as i32
}

/// Rolls whether an effect activates.
///
/// Certain and impossible effects do not consume randomness.
pub fn roll_effect<R: Rng + ?Sized>(rng: &mut R, effect: &MoveEffect) -> bool {
    if effect.activation_chance <= 0.0 {
        false
    } else if effect.activation_chance >= 1.0 {
        true
    } else {
        rng.gen::<f64>() < effect.activation_chance
    }
}

/// Applies an activated effect's stage deltas to both sides.
pub fn apply_effect(
    gm: &GameMaster,
    effect: &MoveEffect,
    user: &mut CombatantState,
    target: &mut CombatantState,
) {
    user.buff(gm, effect.self_attack_delta, effect.self_defense_delta);
    target.buff(gm, effect.target_attack_delta, effect.target_defense_delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (GameMaster, Combatant, Combatant) {
        let mut gm = GameMaster::new(&["fire", "grass", "normal"]).unwrap();
        gm.set_effectiveness("fire", "grass", 1.6).unwrap();
        gm.set_boosted_weather("fire", "sunny").unwrap();
        let fire = gm.type_index("fire").unwrap();
        let grass = gm.type_index("grass").unwrap();
        let attacker = Combatant::new(
            fire,
            100.0,
            100.0,
            100,
            Move::new(fire, 10, 10, 1000, 500),
            Move::new(fire, 100, -50, 3000, 2000),
        );
        let defender = Combatant::new(
            grass,
            100.0,
            100.0,
            100,
            Move::new(grass, 10, 10, 1000, 500),
            Move::new(grass, 100, -50, 3000, 2000),
        );
        (gm, attacker, defender)
    }

    mod formula_tests {
        use super::*;

        #[test]
        fn neutral_hit() {
            let (gm, attacker, _) = setup();
            let normal = gm.type_index("normal").unwrap();
            let mut target = attacker.clone();
            target.primary_type = normal;
            let mv = Move::new(normal, 10, 10, 1000, 500);
            let a = CombatantState::new(&attacker, 100);
            let d = CombatantState::new(&target, 100);
            let strike = Strike {
                attacker: &attacker,
                attacker_state: &a,
                defender: &target,
                defender_state: &d,
                mv: &mv,
            };
            // floor(0.5 * 10) + 1
            assert_eq!(damage(&gm, &strike, &Modifiers::default()), 6);
        }

        #[test]
        fn stab_weather_and_effectiveness_stack() {
            let (gm, attacker, defender) = setup();
            let a = CombatantState::new(&attacker, 100);
            let d = CombatantState::new(&defender, 100);
            let strike = Strike {
                attacker: &attacker,
                attacker_state: &a,
                defender: &defender,
                defender_state: &d,
                mv: &attacker.charged_moves[0],
            };
            let mods = Modifiers {
                weather: gm.weather_index("sunny").unwrap(),
                ..Modifiers::default()
            };
            // floor(0.5 * 100 * 1.6 * 1.2 * 1.2) + 1 = floor(115.2) + 1
            assert_eq!(damage(&gm, &strike, &mods), 116);
            // Without weather: floor(96) + 1
            assert_eq!(damage(&gm, &strike, &Modifiers::default()), 97);
        }

        #[test]
        fn clones_multiply_final_damage() {
            let (gm, attacker, defender) = setup();
            let a = CombatantState::new(&attacker, 100);
            let d = CombatantState::new(&defender, 100);
            let strike = Strike {
                attacker: &attacker,
                attacker_state: &a,
                defender: &defender,
                defender_state: &d,
                mv: &attacker.charged_moves[0],
            };
            let mods = Modifiers {
                clone_multiplier: 3,
                ..Modifiers::default()
            };
            assert_eq!(damage(&gm, &strike, &mods), 97 * 3);
        }
    }

    mod resource_tests {
        use super::*;

        #[test]
        fn dodge_removes_most_damage() {
            assert_eq!(dodged_damage(100, 0.75), 25);
            assert_eq!(dodged_damage(3, 0.75), 0);
        }

        #[test]
        fn health_loss_energy_rounds_up() {
            assert_eq!(health_loss_energy(7, 0.5), 4);
            assert_eq!(health_loss_energy(7, 0.0), 0);
        }

        #[test]
        fn certain_effects_skip_the_rng() {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let mut untouched = ChaCha8Rng::seed_from_u64(1);
            let sure = MoveEffect {
                activation_chance: 1.0,
                ..MoveEffect::default()
            };
            let never = MoveEffect::default();
            assert!(roll_effect(&mut rng, &sure));
            assert!(!roll_effect(&mut rng, &never));
            assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
        }
    }
}

//! Property tests for the bounds every run relies on.

use proptest::prelude::*;

use crate::action::{Action, ActionKind};
use crate::config::{BattleConstants, GameMaster, StatKind};
use crate::damage::{self, Modifiers, Strike};
use crate::entity::{Combatant, CombatantState, Move};
use crate::strategy::{PveStrategy, Strategy as _, StrategyInput};

fn staged_gm() -> GameMaster {
    let mut gm = GameMaster::new(&["normal"]).unwrap();
    gm.set_stage_bounds(-4, 4).unwrap();
    for (stage, m) in (-4..=4).zip([0.5, 0.5714, 0.6667, 0.8, 1.0, 1.25, 1.5, 1.75, 2.0]) {
        gm.set_stage_multiplier(StatKind::Attack, stage, m).unwrap();
        gm.set_stage_multiplier(StatKind::Defense, stage, m).unwrap();
    }
    gm
}

fn combatant(gm: &GameMaster, attack: f64, defense: f64, charged_costs: &[i32]) -> Combatant {
    let t = gm.type_index("normal").unwrap();
    Combatant {
        charged_moves: charged_costs
            .iter()
            .map(|&cost| Move::new(t, 50, -cost, 2000, 1500))
            .collect(),
        ..Combatant::new(
            t,
            attack,
            defense,
            100,
            Move::new(t, 10, 10, 1000, 500),
            Move::new(t, 50, -50, 2000, 1500),
        )
    }
}

fn action_kind() -> impl Strategy<Value = ActionKind> {
    prop_oneof![
        Just(ActionKind::None),
        Just(ActionKind::Wait),
        Just(ActionKind::Fast),
        Just(ActionKind::Charged),
        Just(ActionKind::Dodge),
    ]
}

proptest! {
    #[test]
    fn energy_stays_in_bounds(deltas in prop::collection::vec(-300i32..300, 0..50)) {
        let gm = staged_gm();
        let c = combatant(&gm, 100.0, 100.0, &[50]);
        let mut state = CombatantState::new(&c, 100);
        for d in deltas {
            state.charge(d);
            prop_assert!((0..=100).contains(&state.energy));
        }
    }

    #[test]
    fn stages_stay_in_bounds(deltas in prop::collection::vec((-10i32..10, -10i32..10), 0..30)) {
        let gm = staged_gm();
        let c = combatant(&gm, 100.0, 100.0, &[50]);
        let mut state = CombatantState::new(&c, 100);
        for (atk, def) in deltas {
            state.buff(&gm, atk, def);
            prop_assert!((-4..=4).contains(&state.attack_stage));
            prop_assert!((-4..=4).contains(&state.defense_stage));
        }
    }

    #[test]
    fn damage_is_at_least_one_per_clone(
        power in 0i32..300,
        attack in 1.0f64..400.0,
        defense in 1.0f64..400.0,
        atk_stage in -4i32..=4,
        def_stage in -4i32..=4,
        clones in 1u32..20,
    ) {
        let gm = staged_gm();
        let t = gm.type_index("normal").unwrap();
        let attacker = combatant(&gm, attack, 100.0, &[50]);
        let defender = combatant(&gm, 100.0, defense, &[50]);
        let mut a = CombatantState::new(&attacker, 100);
        let mut d = CombatantState::new(&defender, 100);
        a.attack_stage = atk_stage;
        d.defense_stage = def_stage;
        let mv = Move::new(t, power, 10, 1000, 500);
        let strike = Strike {
            attacker: &attacker,
            attacker_state: &a,
            defender: &defender,
            defender_state: &d,
            mv: &mv,
        };
        let mods = Modifiers { clone_multiplier: clones, ..Modifiers::default() };
        let amount = damage::damage(&gm, &strike, &mods);
        prop_assert!(amount >= i32::try_from(clones).unwrap());
        prop_assert_eq!(amount % i32::try_from(clones).unwrap(), 0);
    }

    #[test]
    fn defender_never_picks_an_unaffordable_move(
        energy in 0i32..=100,
        costs in prop::collection::vec(1i32..=100, 1..5),
        bits in any::<u32>(),
        kind in action_kind(),
    ) {
        let gm = staged_gm();
        let subject = combatant(&gm, 100.0, 100.0, &costs);
        let enemy = combatant(&gm, 100.0, 100.0, &[50]);
        let mut state = CombatantState::new(&subject, 100);
        state.energy = energy;
        let enemy_state = CombatantState::new(&enemy, 100);
        let constants = BattleConstants::default();
        let subject_action = Action { kind, ..Action::default() };

        let input = StrategyInput {
            time: 0,
            subject: &subject,
            subject_state: &state,
            subject_action,
            enemy: &enemy,
            enemy_state: &enemy_state,
            enemy_action: Action::default(),
            random_bits: bits,
            constants: &constants,
        };
        let next = PveStrategy::Defender.on_clear(&input).unwrap();

        let gained = match kind {
            ActionKind::Fast => subject.fast_move.energy,
            ActionKind::Charged => subject.charged_move(0).energy,
            _ => 0,
        };
        let projected = (energy + gained).clamp(0, 100);
        if next.kind == ActionKind::Charged {
            prop_assert!(projected + subject.charged_move(next.value).energy >= 0);
        } else {
            prop_assert_eq!(next.kind, ActionKind::Fast);
        }
    }

    #[test]
    fn dodge_delay_is_never_negative(
        now in 0i32..20_000,
        issued_back in 0i32..5_000,
        charged in any::<bool>(),
        energy in 0i32..=100,
    ) {
        let gm = staged_gm();
        let subject = combatant(&gm, 100.0, 100.0, &[50]);
        let enemy = combatant(&gm, 100.0, 100.0, &[100]);
        let mut state = CombatantState::new(&subject, 100);
        state.energy = energy;
        let enemy_state = CombatantState::new(&enemy, 100);
        let constants = BattleConstants::default();
        let issued = if charged { Action::charged(0) } else { Action::fast() };
        let enemy_action = issued.at(now - issued_back);

        let input = StrategyInput {
            time: now,
            subject: &subject,
            subject_state: &state,
            subject_action: Action::default(),
            enemy: &enemy,
            enemy_state: &enemy_state,
            enemy_action,
            random_bits: 0,
            constants: &constants,
        };
        for strategy in [PveStrategy::AttackerDodgeCharged, PveStrategy::AttackerDodgeAll] {
            let on_free = strategy.on_free(&input);
            prop_assert!(on_free.delay >= 0);
            if let Some(reaction) = strategy.on_attack(&input) {
                prop_assert!(reaction.delay >= 0);
            }
        }
    }
}

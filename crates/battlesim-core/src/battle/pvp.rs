//! PvP duel scheduler.
//!
//! A [`Duel`] runs until it finishes or reaches a shield decision that is
//! under branch control. At that point it returns [`DuelStep::Fork`]; the
//! caller clones the duel, resumes each copy with a different decision and
//! combines the results.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::queue::{EventQueue, Prioritized};
use super::{BattleOutcome, CombatantStats, Statistics};
use crate::action::{Action, ActionKind};
use crate::config::GameMaster;
use crate::damage::{self, Strike};
use crate::entity::{CombatantState, Duelist};
use crate::error::InputError;
use crate::strategy::{pvp_modifiers, DuelView};
use crate::timeline::{EventKind, Timeline};
use crate::Time;

/// Default PvP time limit.
pub const DEFAULT_TIME_LIMIT: Time = 240_000;

/// Run options of a duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelSettings {
    /// Simulated time limit in milliseconds.
    pub time_limit: Time,
    /// Record the timeline.
    pub enable_log: bool,
}

impl Default for DuelSettings {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            enable_log: false,
        }
    }
}

/// Who decides a side's shield usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldControl {
    /// The side's PvP strategy decides.
    Strategy,
    /// The caller decides at each fork. Once the side declines a shield it
    /// holds its remaining shields for the rest of the duel.
    Branch {
        /// The side has declined a shield in this branch.
        holding: bool,
    },
}

/// Result of advancing a duel.
#[derive(Debug, Clone, PartialEq)]
pub enum DuelStep {
    /// The duel ended.
    Finished(BattleOutcome),
    /// A charged hit is pending a shield decision by `defender`.
    Fork {
        /// Side (0 or 1) deciding whether to shield.
        defender: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Fast,
    Charged(usize),
}

#[derive(Debug, Clone, Copy)]
enum DuelEvent {
    Damage { side: usize, hit: Hit },
    /// `rank` 0 decides first when both sides are free at once.
    Free { side: usize, rank: u8 },
}

impl Prioritized for DuelEvent {
    fn priority(&self) -> u8 {
        match self {
            Self::Damage { .. } => 0,
            Self::Free { rank, .. } => 1 + rank,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingHit {
    side: usize,
    hit: Hit,
    time: Time,
}

/// One PvP duel between two duelists.
#[derive(Debug, Clone)]
pub struct Duel<'a> {
    gm: &'a GameMaster,
    duelists: &'a [Duelist; 2],
    settings: DuelSettings,
    control: [ShieldControl; 2],
    ranks: [u8; 2],
    states: [CombatantState; 2],
    rng: ChaCha8Rng,
    queue: EventQueue<DuelEvent>,
    log: Timeline,
    pending: Option<PendingHit>,
    decided_at: Option<Time>,
    shields_used: [u32; 2],
}

impl<'a> Duel<'a> {
    /// Prepares a duel. Both sides start on the field at time 0.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] for invalid combatants or a non-positive time
    /// limit.
    pub fn new(
        gm: &'a GameMaster,
        duelists: &'a [Duelist; 2],
        settings: DuelSettings,
        control: [ShieldControl; 2],
        seed: u64,
    ) -> Result<Self, InputError> {
        for d in duelists {
            d.combatant.validate()?;
        }
        if settings.time_limit <= 0 {
            return Err(InputError::NonPositiveTimeLimit(settings.time_limit));
        }

        let max_energy = gm.constants().max_energy;
        let states = std::array::from_fn(|i| {
            let d = &duelists[i];
            let mut s = CombatantState::new(&d.combatant, max_energy);
            s.shields = d.shields;
            s.enter(0);
            s
        });
        // Higher attack acts first on simultaneous turns.
        let ranks = if duelists[1].combatant.attack > duelists[0].combatant.attack {
            [1, 0]
        } else {
            [0, 1]
        };

        let mut queue = EventQueue::new();
        for side in 0..2 {
            queue.push(
                0,
                DuelEvent::Free {
                    side,
                    rank: ranks[side],
                },
            );
        }
        let mut log = Timeline::new(settings.enable_log);
        log.push(0, EventKind::Enter, 0, 0);
        log.push(0, EventKind::Enter, 1, 0);

        Ok(Self {
            gm,
            duelists,
            settings,
            control,
            ranks,
            states,
            rng: ChaCha8Rng::seed_from_u64(seed),
            queue,
            log,
            pending: None,
            decided_at: None,
            shields_used: [0, 0],
        })
    }

    /// Shields consumed so far, per side.
    #[must_use]
    pub fn shields_used(&self) -> [u32; 2] {
        self.shields_used
    }

    /// Runs to completion, or to the next shield decision under branch
    /// control.
    pub fn run_until_fork(&mut self) -> DuelStep {
        while let Some((t, event)) = self.queue.pop() {
            if t >= self.settings.time_limit {
                break;
            }
            if let Some(at) = self.decided_at {
                if t > at || !matches!(event, DuelEvent::Damage { .. }) {
                    break;
                }
            }
            match event {
                DuelEvent::Free { side, .. } => self.decide(side, t),
                DuelEvent::Damage { side, hit } => {
                    if let Some(defender) = self.shield_fork(side, hit, t) {
                        self.pending = Some(PendingHit { side, hit, time: t });
                        tracing::debug!(time = t, defender, "shield fork");
                        return DuelStep::Fork { defender };
                    }
                }
            }
        }
        DuelStep::Finished(self.outcome())
    }

    /// Applies the pending shield decision and keeps running.
    pub fn resume(&mut self, shield: bool) -> DuelStep {
        if let Some(PendingHit { side, hit, time }) = self.pending.take() {
            if !shield {
                if let ShieldControl::Branch { holding } = &mut self.control[1 - side] {
                    *holding = true;
                }
            }
            self.resolve(side, hit, time, shield);
        }
        self.run_until_fork()
    }

    /// Runs to completion. Shield forks are settled with `shield`.
    pub fn run_with(mut self, shield: bool) -> BattleOutcome {
        let mut step = self.run_until_fork();
        loop {
            match step {
                DuelStep::Finished(outcome) => return outcome,
                DuelStep::Fork { .. } => step = self.resume(shield),
            }
        }
    }

    fn view(&self, side: usize, t: Time) -> DuelView<'_> {
        let other = 1 - side;
        DuelView {
            time: t,
            gm: self.gm,
            subject: &self.duelists[side].combatant,
            subject_state: &self.states[side],
            enemy: &self.duelists[other].combatant,
            enemy_state: &self.states[other],
        }
    }

    fn decide(&mut self, side: usize, t: Time) {
        if !self.states[side].is_alive() {
            return;
        }
        let duelist = &self.duelists[side];
        let def = &duelist.combatant;
        let mut action = duelist.strategy.on_free(&self.view(side, t)).at(t);
        if action.kind == ActionKind::Charged
            && self.states[side]
                .energy
                .saturating_add(def.charged_move(action.value).energy)
                < 0
        {
            action = Action::fast().at(t);
        }

        let state = &mut self.states[side];
        let (mv, hit) = if action.kind == ActionKind::Charged {
            state.num_charged_moves += 1;
            state.current_charged = action.value;
            self.log
                .push(t, EventKind::Charged, side, action.value as i64);
            (def.charged_move(action.value), Hit::Charged(action.value))
        } else {
            state.num_fast_moves += 1;
            self.log.push(t, EventKind::Fast, side, 0);
            (&def.fast_move, Hit::Fast)
        };
        self.queue
            .push_after(t, mv.damage_window, DuelEvent::Damage { side, hit });
        self.queue.push_after(
            t,
            mv.duration,
            DuelEvent::Free {
                side,
                rank: self.ranks[side],
            },
        );
        tracing::trace!(time = t, side, ?hit, "attack");
    }

    /// Resolves the hit unless it needs a branch decision; returns the
    /// deciding side in that case.
    fn shield_fork(&mut self, side: usize, hit: Hit, t: Time) -> Option<usize> {
        let defender = 1 - side;
        let shield = match hit {
            Hit::Charged(i) if self.states[defender].shields > 0 => match self.control[defender] {
                ShieldControl::Strategy => {
                    let bonus = self.gm.constants().pvp_charged_attack_bonus_multiplier;
                    let view = self.view(defender, t);
                    let mv = self.duelists[side].combatant.charged_move(i);
                    let incoming = view.incoming(mv, bonus);
                    self.duelists[defender]
                        .strategy
                        .wants_shield(&view, incoming)
                }
                ShieldControl::Branch { holding: true } => false,
                ShieldControl::Branch { holding: false } => return Some(defender),
            },
            _ => false,
        };
        self.resolve(side, hit, t, shield);
        None
    }

    fn resolve(&mut self, side: usize, hit: Hit, t: Time, shield: bool) {
        let defender = 1 - side;
        let constants = self.gm.constants();
        let attacker = &self.duelists[side].combatant;
        let (mv, fast, bonus) = match hit {
            Hit::Fast => (
                &attacker.fast_move,
                true,
                constants.pvp_fast_attack_bonus_multiplier,
            ),
            Hit::Charged(i) => (
                attacker.charged_move(i),
                false,
                constants.pvp_charged_attack_bonus_multiplier,
            ),
        };

        let mut amount = damage::damage(
            self.gm,
            &Strike {
                attacker,
                attacker_state: &self.states[side],
                defender: &self.duelists[defender].combatant,
                defender_state: &self.states[defender],
                mv,
            },
            &pvp_modifiers(bonus),
        );
        if shield {
            amount = constants.pvp_shielded_damage;
            self.states[defender].shields -= 1;
            self.shields_used[defender] += 1;
            self.log.push(t, EventKind::Shield, defender, 0);
        }

        let [first, second] = &mut self.states;
        let (user, target) = if side == 0 {
            (first, second)
        } else {
            (second, first)
        };
        target.hurt(amount);
        user.attribute_damage(amount, fast);
        self.log.push(t, EventKind::Damage, defender, i64::from(amount));
        tracing::trace!(time = t, side, amount, shield, "hit");

        if let Some(effect) = mv.effect {
            if damage::roll_effect(&mut self.rng, &effect) {
                damage::apply_effect(self.gm, &effect, user, target);
                self.log.push(t, EventKind::Effect, side, 0);
            }
        }
        debug_assert!(
            user.energy.saturating_add(mv.energy) >= 0,
            "charged move resolved without enough energy"
        );
        user.charge(mv.energy);

        if !target.is_alive() {
            target.exit(t);
            target.num_deaths += 1;
            self.log.push(t, EventKind::Exit, defender, 0);
            if self.decided_at.is_none() {
                self.decided_at = Some(t);
            }
            tracing::debug!(time = t, side = defender, "fainted");
        }
    }

    fn outcome(&mut self) -> BattleOutcome {
        let duration = self.decided_at.unwrap_or(self.settings.time_limit);
        for state in &mut self.states {
            state.exit(duration);
        }
        let [p0, p1] = &self.states;
        let p0_won = i32::from(!p1.is_alive());
        let p1_won = i32::from(!p0.is_alive());
        let tdo = f64::from(p0.tdo);

        BattleOutcome {
            statistics: Statistics {
                duration: f64::from(duration),
                win: f64::from(p0_won - p1_won + 1) / 2.0,
                tdo,
                tdo_percent: 100.0 * tdo / f64::from(p1.max_hp),
                num_deaths: f64::from(p0.num_deaths),
            },
            pokemon: (0..2)
                .map(|side| {
                    vec![vec![CombatantStats::capture(
                        &self.duelists[side].combatant,
                        &self.states[side],
                    )]]
                })
                .collect(),
            battle_log: std::mem::take(&mut self.log).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Combatant, Move};
    use crate::strategy::PvpStrategy;

    fn duelists(shields: u32) -> [Duelist; 2] {
        let gm = GameMaster::new(&["normal"]).unwrap();
        let t = gm.type_index("normal").unwrap();
        let c = Combatant::new(
            t,
            100.0,
            100.0,
            120,
            Move::new(t, 6, 6, 500, 500),
            Move::new(t, 60, -40, 500, 500),
        );
        [
            Duelist {
                combatant: c.clone(),
                strategy: PvpStrategy::Basic,
                shields,
            },
            Duelist {
                combatant: c,
                strategy: PvpStrategy::Basic,
                shields,
            },
        ]
    }

    fn gm() -> GameMaster {
        GameMaster::new(&["normal"]).unwrap()
    }

    #[test]
    fn mirror_match_is_a_draw() {
        let gm = gm();
        let ds = duelists(0);
        let outcome = Duel::new(&gm, &ds, DuelSettings::default(), [ShieldControl::Strategy; 2], 0)
            .unwrap()
            .run_with(false);
        assert_eq!(outcome.statistics.win, 0.5);
        assert_eq!(outcome.pokemon[0][0][0].hp, 0.0);
        assert_eq!(outcome.pokemon[1][0][0].hp, 0.0);
    }

    #[test]
    fn strategy_shields_consume_shields() {
        let gm = gm();
        let ds = duelists(2);
        let mut duel =
            Duel::new(&gm, &ds, DuelSettings::default(), [ShieldControl::Strategy; 2], 0).unwrap();
        let step = duel.run_until_fork();
        assert!(matches!(step, DuelStep::Finished(_)));
        assert_eq!(duel.shields_used(), [2, 2]);
    }

    #[test]
    fn branch_control_pauses_at_charged_hits() {
        let gm = gm();
        let ds = duelists(1);
        let control = [ShieldControl::Branch { holding: false }; 2];
        let mut duel = Duel::new(&gm, &ds, DuelSettings::default(), control, 0).unwrap();
        assert!(matches!(duel.run_until_fork(), DuelStep::Fork { .. }));
        let mut declined = duel.clone();
        let step = declined.resume(false);
        // After declining, that side never forks again.
        if let DuelStep::Fork { defender } = step {
            assert!(matches!(declined.control[defender], ShieldControl::Branch { holding: false }));
        }
    }

    #[test]
    fn late_hits_past_the_limit_are_dropped() {
        let gm = gm();
        let t = gm.type_index("normal").unwrap();
        let c = Combatant::new(
            t,
            100.0,
            100.0,
            120,
            Move::new(t, 6, 6, 1_500_000_000, 1_400_000_000),
            Move::new(t, 60, -40, 1_500_000_000, 1_400_000_000),
        );
        let ds = [c.clone(), c].map(|combatant| Duelist {
            combatant,
            strategy: PvpStrategy::Basic,
            shields: 0,
        });
        let settings = DuelSettings {
            time_limit: Time::MAX,
            ..DuelSettings::default()
        };
        let outcome = Duel::new(&gm, &ds, settings, [ShieldControl::Strategy; 2], 0)
            .unwrap()
            .run_with(false);
        assert_eq!(outcome.statistics.duration, f64::from(Time::MAX));
        for side in 0..2 {
            let stats = &outcome.pokemon[side][0][0];
            assert_eq!(stats.num_fast_attacks, 2.0);
            assert!(stats.hp < 120.0);
        }
    }

    #[test]
    fn shielded_hit_deals_fixed_damage() {
        let gm = gm();
        let ds = duelists(1);
        let settings = DuelSettings {
            enable_log: true,
            ..DuelSettings::default()
        };
        let outcome = Duel::new(&gm, &ds, settings, [ShieldControl::Strategy; 2], 0)
            .unwrap()
            .run_with(false);
        let shielded: Vec<_> = outcome
            .battle_log
            .iter()
            .filter(|e| e.kind == EventKind::Shield)
            .collect();
        assert_eq!(shielded.len(), 2);
        for s in shielded {
            assert!(outcome
                .battle_log
                .iter()
                .any(|e| e.kind == EventKind::Damage
                    && e.time == s.time
                    && e.player == s.player
                    && e.value == 1));
        }
    }
}

//! PvE (raid/gym) scheduler.
//!
//! Team 0 attacks; every other team defends. Each player fields one active
//! combatant at a time, drawn from its parties in order.
//!
//! # Same-tick ordering
//!
//! Damage and background ticks resolve before decisions, which resolve before
//! entries. Once one side is defeated, only the damage still due at that same
//! instant is applied; everything later is dropped.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::queue::{EventQueue, Prioritized};
use super::{BattleOutcome, CombatantStats, Statistics};
use crate::action::{Action, ActionKind};
use crate::config::{GameMaster, WeatherIndex};
use crate::damage::{self, Modifiers, Strike};
use crate::entity::{Combatant, CombatantState};
use crate::error::InputError;
use crate::party::{PartyState, Player};
use crate::strategy::{PveStrategy, Strategy, StrategyInput};
use crate::timeline::{EventKind, Timeline};
use crate::Time;

/// Default PvE time limit.
pub const DEFAULT_TIME_LIMIT: Time = 180_000;

/// Environment and run options of a PvE battle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PveSettings {
    /// Simulated time limit in milliseconds.
    pub time_limit: Time,
    /// Active weather.
    pub weather: Option<WeatherIndex>,
    /// Damage per second dealt to defenders by unmodelled raiders.
    pub background_dps: f64,
    /// Record the timeline.
    pub enable_log: bool,
}

impl Default for PveSettings {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            weather: None,
            background_dps: 0.0,
            enable_log: false,
        }
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Fast,
    Charged(usize),
}

#[derive(Debug, Clone, Copy)]
enum PveEvent {
    Damage { player: usize, epoch: u64, hit: Hit },
    Background,
    Free { player: usize, epoch: u64 },
    Enter { player: usize },
}

impl Prioritized for PveEvent {
    fn priority(&self) -> u8 {
        match self {
            Self::Damage { .. } | Self::Background => 0,
            Self::Free { .. } => 1,
            Self::Enter { .. } => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// Between combatants: nothing on the field.
    Entering,
    /// On the field with a pending free event.
    Busy,
    /// On the field, idle until an enemy acts or enters.
    Waiting,
    /// Every party exhausted.
    Defeated,
}

#[derive(Debug, Clone)]
struct PlayerRun {
    parties: Vec<PartyState>,
    party: usize,
    status: Status,
    /// Bumped whenever the active combatant leaves, invalidating its pending
    /// damage and free events.
    epoch: u64,
    /// Latest committed action of the active combatant.
    current: Action,
    /// Pre-committed next action.
    queued: Option<Action>,
}

impl PlayerRun {
    fn head(&self) -> usize {
        self.parties[self.party].head
    }

    fn active(&self) -> &CombatantState {
        self.parties[self.party].head()
    }

    fn active_mut(&mut self) -> &mut CombatantState {
        self.parties[self.party].head_mut()
    }

    fn on_field(&self) -> bool {
        matches!(self.status, Status::Busy | Status::Waiting)
            && self.active().active
            && self.active().is_alive()
    }
}

// =============================================================================
// Battle
// =============================================================================

/// One PvE run.
///
/// # Example
///
/// ```
/// use battlesim_core::battle::{PveBattle, PveSettings};
/// use battlesim_core::config::GameMaster;
/// use battlesim_core::entity::{Combatant, Move};
/// use battlesim_core::party::{Party, Player};
/// use battlesim_core::strategy::PveStrategy;
///
/// let gm = GameMaster::new(&["normal"]).unwrap();
/// let t = gm.type_index("normal").unwrap();
/// let fighter = Combatant::new(
///     t, 100.0, 100.0, 500,
///     Move::new(t, 10, 10, 1000, 500),
///     Move::new(t, 100, -50, 3000, 2000),
/// );
/// let mut boss = fighter.clone();
/// boss.strategy = PveStrategy::Defender;
///
/// let players = vec![
///     Player::new(0, vec![Party::try_from(vec![fighter]).unwrap()]),
///     Player::new(1, vec![Party::try_from(vec![boss]).unwrap()]),
/// ];
/// let battle = PveBattle::new(&gm, &players, PveSettings::default(), 7).unwrap();
/// let outcome = battle.run();
/// assert!(outcome.statistics.tdo > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct PveBattle<'a> {
    gm: &'a GameMaster,
    players: &'a [Player],
    settings: PveSettings,
    rng: ChaCha8Rng,
    queue: EventQueue<PveEvent>,
    runs: Vec<PlayerRun>,
    log: Timeline,
    decided_at: Option<Time>,
}

/// Checks that a set of players can fight.
///
/// # Errors
///
/// Returns the first [`InputError`] found.
pub fn validate_players(players: &[Player]) -> Result<(), InputError> {
    let Some(first) = players.first() else {
        return Err(InputError::NoPlayers);
    };
    for (i, player) in players.iter().enumerate() {
        player.validate(i)?;
    }
    if players.iter().all(|p| p.team == first.team) {
        return Err(InputError::SingleTeam);
    }
    Ok(())
}

impl<'a> PveBattle<'a> {
    /// Prepares a run.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] for unusable players or a non-positive time
    /// limit.
    pub fn new(
        gm: &'a GameMaster,
        players: &'a [Player],
        settings: PveSettings,
        seed: u64,
    ) -> Result<Self, InputError> {
        validate_players(players)?;
        if settings.time_limit <= 0 {
            return Err(InputError::NonPositiveTimeLimit(settings.time_limit));
        }
        let max_energy = gm.constants().max_energy;
        let runs = players
            .iter()
            .map(|player| PlayerRun {
                parties: player
                    .parties
                    .iter()
                    .map(|party| PartyState::new(party, max_energy))
                    .collect(),
                party: 0,
                status: Status::Entering,
                epoch: 0,
                current: Action::default(),
                queued: None,
            })
            .collect();
        Ok(Self {
            gm,
            players,
            settings,
            rng: ChaCha8Rng::seed_from_u64(seed),
            queue: EventQueue::new(),
            runs,
            log: Timeline::new(settings.enable_log),
            decided_at: None,
        })
    }

    /// Runs to completion.
    #[must_use]
    pub fn run(mut self) -> BattleOutcome {
        for player in 0..self.runs.len() {
            self.queue.push(0, PveEvent::Enter { player });
        }
        let interval = self.gm.constants().background_damage_interval;
        if self.settings.background_dps > 0.0 && interval > 0 {
            self.queue.push(interval, PveEvent::Background);
        }

        while let Some((t, event)) = self.queue.pop() {
            if t >= self.settings.time_limit {
                break;
            }
            if let Some(at) = self.decided_at {
                if t > at || !matches!(event, PveEvent::Damage { .. }) {
                    break;
                }
            }
            self.handle(t, event);
            if self.decided_at.is_none() && self.is_decided() {
                tracing::debug!(time = t, "battle decided");
                self.decided_at = Some(t);
            }
        }

        let duration = self.decided_at.unwrap_or(self.settings.time_limit);
        self.finish(duration)
    }

    fn handle(&mut self, t: Time, event: PveEvent) {
        match event {
            PveEvent::Enter { player } => self.enter(player, t),
            PveEvent::Free { player, epoch } => {
                let run = &self.runs[player];
                if run.epoch == epoch && run.status == Status::Busy {
                    self.decide(player, t);
                }
            }
            PveEvent::Damage { player, epoch, hit } => {
                if self.runs[player].epoch == epoch {
                    self.resolve_hit(player, hit, t);
                }
            }
            PveEvent::Background => self.background(t),
        }
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    fn def(&self, p: usize) -> &'a Combatant {
        let players: &'a [Player] = self.players;
        let run = &self.runs[p];
        &players[p].parties[run.party].members()[run.head()]
    }

    fn strategy(&self, p: usize) -> PveStrategy {
        self.def(p).strategy
    }

    fn is_opponent(&self, p: usize, q: usize) -> bool {
        self.players[p].team != self.players[q].team
    }

    /// First opponent in request order with a combatant on the field.
    fn primary_target(&self, p: usize) -> Option<usize> {
        (0..self.runs.len()).find(|&q| self.is_opponent(p, q) && self.runs[q].on_field())
    }

    fn input(&self, p: usize, enemy: usize, t: Time, random_bits: u32) -> StrategyInput<'_> {
        StrategyInput {
            time: t,
            subject: self.def(p),
            subject_state: self.runs[p].active(),
            subject_action: self.runs[p].current,
            enemy: self.def(enemy),
            enemy_state: self.runs[enemy].active(),
            enemy_action: self.runs[enemy].current,
            random_bits,
            constants: self.gm.constants(),
        }
    }

    fn side_defeated(&self, attacking: bool) -> bool {
        let mut any = false;
        for (player, run) in self.players.iter().zip(&self.runs) {
            if player.is_attacker() == attacking {
                if run.status != Status::Defeated {
                    return false;
                }
                any = true;
            }
        }
        any
    }

    fn is_decided(&self) -> bool {
        self.side_defeated(true) || self.side_defeated(false)
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    fn enter(&mut self, p: usize, t: Time) {
        let run = &mut self.runs[p];
        run.status = Status::Busy;
        run.current = Action::default();
        run.queued = None;
        run.active_mut().enter(t);
        let epoch = run.epoch;
        self.log.push(t, EventKind::Enter, p, run.head() as i64);
        self.queue.push(t, PveEvent::Free { player: p, epoch });
        tracing::trace!(time = t, player = p, member = run.head(), "enter");

        for q in 0..self.runs.len() {
            if self.is_opponent(p, q) && self.runs[q].status == Status::Waiting {
                self.wake(q, t);
            }
        }
    }

    fn wake(&mut self, q: usize, t: Time) {
        let run = &mut self.runs[q];
        run.status = Status::Busy;
        let epoch = run.epoch;
        self.queue.push(t, PveEvent::Free { player: q, epoch });
    }

    fn decide(&mut self, p: usize, t: Time) {
        let Some(target) = self.primary_target(p) else {
            self.runs[p].status = Status::Waiting;
            return;
        };
        let action = match self.runs[p].queued.take() {
            Some(action) => action,
            None => self.strategy(p).on_free(&self.input(p, target, t, 0)),
        };
        self.register(p, target, action, t);
    }

    fn register(&mut self, p: usize, enemy: usize, action: Action, t: Time) {
        let action = action.at(t);
        let constants = *self.gm.constants();
        match action.kind {
            ActionKind::Fast | ActionKind::Charged => self.commit_attack(p, enemy, action, t),
            ActionKind::Dodge => {
                let start = t.saturating_add(action.delay.max(0));
                let run = &mut self.runs[p];
                run.active_mut().dodge(start, constants.dodge_window);
                run.current = action;
                run.status = Status::Busy;
                let epoch = run.epoch;
                self.log.push(start, EventKind::Dodge, p, 0);
                self.queue.push_after(
                    start,
                    constants.dodge_duration,
                    PveEvent::Free { player: p, epoch },
                );
                tracing::trace!(time = t, player = p, start, "dodge");
            }
            ActionKind::Switch => self.switch(p, action, t),
            ActionKind::Wait | ActionKind::None => {
                self.runs[p].status = Status::Waiting;
            }
        }
    }

    fn commit_attack(&mut self, p: usize, enemy: usize, action: Action, t: Time) {
        let def = self.def(p);
        let mut action = action;
        if action.kind == ActionKind::Charged
            && self.runs[p]
                .active()
                .energy
                .saturating_add(def.charged_move(action.value).energy)
                < 0
        {
            action = Action::fast().at(t);
        }
        let (mv, hit, kind, value) = match action.kind {
            ActionKind::Charged => (
                def.charged_move(action.value),
                Hit::Charged(action.value),
                EventKind::Charged,
                action.value as i64,
            ),
            _ => (&def.fast_move, Hit::Fast, EventKind::Fast, 0),
        };

        let run = &mut self.runs[p];
        let state = run.active_mut();
        match hit {
            Hit::Fast => state.num_fast_moves += 1,
            Hit::Charged(i) => {
                state.num_charged_moves += 1;
                state.current_charged = i;
            }
        }
        run.current = action;
        run.status = Status::Busy;
        let epoch = run.epoch;
        self.log.push(t, kind, p, value);
        self.queue.push_after(
            t,
            mv.damage_window,
            PveEvent::Damage {
                player: p,
                epoch,
                hit,
            },
        );
        tracing::trace!(time = t, player = p, ?hit, "attack");

        let mut free_in = mv.duration;
        let strategy = def.strategy;
        if strategy.pre_commits() {
            let bits = self.rng.gen::<u32>();
            let next = strategy.on_clear(&self.input(p, enemy, t, bits));
            if let Some(next) = next {
                let c = self.gm.constants();
                let lo = c.defender_min_delay;
                let hi = c.defender_max_delay.max(lo);
                free_in = free_in.saturating_add(self.rng.gen_range(lo..=hi));
                let announced = match next.kind {
                    ActionKind::Charged => next.value as i64 + 1,
                    _ => 0,
                };
                self.runs[p].queued = Some(next);
                self.log.push(t, EventKind::Announce, p, announced);
            }
        }
        self.queue
            .push_after(t, free_in, PveEvent::Free { player: p, epoch });

        self.notify_attack(p, t);
    }

    /// Lets waiting opponents react to an attack committed by `p`.
    fn notify_attack(&mut self, p: usize, t: Time) {
        for q in 0..self.runs.len() {
            if !self.is_opponent(p, q) || self.runs[q].status != Status::Waiting {
                continue;
            }
            let reaction = self.strategy(q).on_attack(&self.input(q, p, t, 0));
            match reaction {
                Some(reaction) => self.register(q, p, reaction, t),
                None => self.wake(q, t),
            }
        }
    }

    fn switch(&mut self, p: usize, action: Action, t: Time) {
        let swap = self.gm.constants().swap_duration;
        let run = &mut self.runs[p];
        let party = &run.parties[run.party];
        let member = action.value;
        let valid = member != party.head
            && member < party.members.len()
            && party.members[member].is_alive();
        if !valid {
            run.status = Status::Waiting;
            return;
        }
        let old = run.head();
        run.active_mut().exit(t);
        let party_index = run.party;
        run.parties[party_index].head = member;
        run.epoch += 1;
        run.status = Status::Entering;
        run.current = action;
        run.queued = None;
        self.log.push(t, EventKind::Exit, p, old as i64);
        self.queue.push_after(t, swap, PveEvent::Enter { player: p });
        tracing::debug!(time = t, player = p, from = old, to = member, "switch");
    }

    fn resolve_hit(&mut self, p: usize, hit: Hit, t: Time) {
        let attacker = self.def(p);
        let player = &self.players[p];
        let (mv, fast) = match hit {
            Hit::Fast => (&attacker.fast_move, true),
            Hit::Charged(i) => (attacker.charged_move(i), false),
        };
        let targets: Vec<usize> = if !fast && !player.is_attacker() {
            (0..self.runs.len())
                .filter(|&q| self.is_opponent(p, q) && self.runs[q].on_field())
                .collect()
        } else {
            self.primary_target(p).into_iter().collect()
        };
        let mods = Modifiers {
            attack_multiplier: player.attack_multiplier,
            clone_multiplier: player.clone_multiplier,
            weather: self.settings.weather,
            bonus: 1.0,
        };
        let constants = *self.gm.constants();

        let mut fainted = Vec::new();
        for &q in &targets {
            let strike = Strike {
                attacker,
                attacker_state: self.runs[p].active(),
                defender: self.def(q),
                defender_state: self.runs[q].active(),
                mv,
            };
            let mut amount = damage::damage(self.gm, &strike, &mods);
            let target = self.runs[q].active_mut();
            if target.is_protected(t) {
                amount = damage::dodged_damage(amount, constants.dodge_damage_reduction_percent);
            }
            target.hurt(amount);
            target.charge(damage::health_loss_energy(
                amount,
                constants.energy_delta_per_health_lost,
            ));
            if !target.is_alive() {
                fainted.push(q);
            }
            self.runs[p].active_mut().attribute_damage(amount, fast);
            self.log.push(t, EventKind::Damage, q, i64::from(amount));
            tracing::trace!(time = t, attacker = p, target = q, amount, "hit");
        }

        if let (Some(effect), Some(&q)) = (mv.effect, targets.first()) {
            if damage::roll_effect(&mut self.rng, &effect) {
                let (user, target) = pair_mut(&mut self.runs, p, q);
                damage::apply_effect(self.gm, &effect, user, target);
                self.log.push(t, EventKind::Effect, p, 0);
            }
        }

        let state = self.runs[p].active_mut();
        debug_assert!(
            state.energy.saturating_add(mv.energy) >= 0,
            "charged move resolved without enough energy"
        );
        state.charge(mv.energy);

        for q in fainted {
            self.faint(q, t);
        }
    }

    fn background(&mut self, t: Time) {
        let interval = self.gm.constants().background_damage_interval;
        let rate = self.gm.constants().energy_delta_per_health_lost;
        #[allow(clippy::cast_possible_truncation)]
        let amount = (self.settings.background_dps * f64::from(interval) / 1000.0).round() as i32;

        for q in 0..self.runs.len() {
            if self.players[q].is_attacker() || !self.runs[q].on_field() {
                continue;
            }
            let target = self.runs[q].active_mut();
            target.hurt(amount);
            target.charge(damage::health_loss_energy(amount, rate));
            let alive = target.is_alive();
            self.log.push(t, EventKind::BackgroundDps, q, i64::from(amount));
            if !alive {
                self.faint(q, t);
            }
        }
        self.queue.push_after(t, interval, PveEvent::Background);
    }

    fn faint(&mut self, q: usize, t: Time) {
        let players: &'a [Player] = self.players;
        let constants = *self.gm.constants();
        let run = &mut self.runs[q];
        let head = run.head();
        let state = run.active_mut();
        state.exit(t);
        state.num_deaths += 1;
        run.epoch += 1;
        run.queued = None;
        run.current = Action::default();
        self.log.push(t, EventKind::Exit, q, head as i64);

        let party = run.party;
        if let Some(next) = run.parties[party].next_alive() {
            run.parties[party].head = next;
            run.status = Status::Entering;
            self.queue
                .push_after(t, constants.swap_duration, PveEvent::Enter { player: q });
            tracing::debug!(time = t, player = q, fainted = head, next, "faint");
        } else if players[q].parties[party].revive {
            run.parties[party].revive();
            run.status = Status::Entering;
            let size = i32::try_from(run.parties[party].members.len()).unwrap_or(0);
            let delay = constants
                .max_revive_time_per_pokemon
                .saturating_mul(size)
                .saturating_add(constants.rejoin_duration);
            self.queue.push_after(t, delay, PveEvent::Enter { player: q });
            tracing::debug!(time = t, player = q, party, "party revived");
        } else if party + 1 < run.parties.len() {
            run.party += 1;
            run.status = Status::Entering;
            let delay = constants
                .rejoin_duration
                .saturating_add(players[q].parties[run.party].enter_delay);
            self.queue.push_after(t, delay, PveEvent::Enter { player: q });
            tracing::debug!(time = t, player = q, party = run.party, "next party");
        } else {
            run.status = Status::Defeated;
            tracing::debug!(time = t, player = q, "player defeated");
        }
    }

    // -------------------------------------------------------------------------
    // Outcome
    // -------------------------------------------------------------------------

    fn finish(mut self, duration: Time) -> BattleOutcome {
        for run in &mut self.runs {
            run.active_mut().exit(duration);
        }

        let mut tdo = 0.0;
        let mut deaths = 0.0;
        let mut defending_hp = 0.0;
        let mut pokemon = Vec::with_capacity(self.players.len());
        for (player, run) in self.players.iter().zip(&self.runs) {
            let mut parties = Vec::with_capacity(player.parties.len());
            for (party, state) in player.parties.iter().zip(&run.parties) {
                let members: Vec<CombatantStats> = party
                    .members()
                    .iter()
                    .zip(&state.members)
                    .map(|(def, s)| CombatantStats::capture(def, s))
                    .collect();
                for m in &members {
                    if player.is_attacker() {
                        tdo += m.tdo;
                        deaths += m.num_deaths;
                    } else {
                        defending_hp += m.max_hp;
                    }
                }
                parties.push(members);
            }
            pokemon.push(parties);
        }

        let won = self.side_defeated(false) && !self.side_defeated(true);
        BattleOutcome {
            statistics: Statistics {
                duration: f64::from(duration),
                win: if won { 1.0 } else { 0.0 },
                tdo,
                tdo_percent: if defending_hp > 0.0 {
                    100.0 * tdo / defending_hp
                } else {
                    0.0
                },
                num_deaths: deaths,
            },
            pokemon,
            battle_log: self.log.finish(),
        }
    }
}

/// Active states of two different players, both mutable.
fn pair_mut(
    runs: &mut [PlayerRun],
    a: usize,
    b: usize,
) -> (&mut CombatantState, &mut CombatantState) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = runs.split_at_mut(b);
        (lo[a].active_mut(), hi[0].active_mut())
    } else {
        let (lo, hi) = runs.split_at_mut(a);
        (hi[0].active_mut(), lo[b].active_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Move;
    use crate::party::Party;

    fn fighter(gm: &GameMaster, hp: i32) -> Combatant {
        let t = gm.type_index("normal").unwrap();
        Combatant::new(
            t,
            100.0,
            100.0,
            hp,
            Move::new(t, 10, 10, 1000, 500),
            Move::new(t, 100, -50, 3000, 2000),
        )
    }

    fn players(gm: &GameMaster) -> Vec<Player> {
        let mut boss = fighter(gm, 100_000);
        boss.strategy = PveStrategy::Defender;
        vec![
            Player::new(0, vec![Party::try_from(vec![fighter(gm, 300)]).unwrap()]),
            Player::new(1, vec![Party::try_from(vec![boss]).unwrap()]),
        ]
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn empty_request_rejected() {
            assert_eq!(validate_players(&[]), Err(InputError::NoPlayers));
        }

        #[test]
        fn single_team_rejected() {
            let gm = GameMaster::new(&["normal"]).unwrap();
            let mut ps = players(&gm);
            ps[1].team = 0;
            assert_eq!(validate_players(&ps), Err(InputError::SingleTeam));
        }

        #[test]
        fn non_positive_time_limit_rejected() {
            let gm = GameMaster::new(&["normal"]).unwrap();
            let ps = players(&gm);
            let settings = PveSettings {
                time_limit: 0,
                ..PveSettings::default()
            };
            assert!(matches!(
                PveBattle::new(&gm, &ps, settings, 0),
                Err(InputError::NonPositiveTimeLimit(0))
            ));
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn first_hit_lands_at_damage_window() {
            let gm = GameMaster::new(&["normal"]).unwrap();
            let ps = players(&gm);
            let settings = PveSettings {
                enable_log: true,
                time_limit: 5000,
                ..PveSettings::default()
            };
            let outcome = PveBattle::new(&gm, &ps, settings, 1).unwrap().run();
            let first = outcome
                .battle_log
                .iter()
                .find(|e| e.kind == EventKind::Damage && e.player == 1)
                .unwrap();
            assert_eq!(first.time, 500);
        }

        #[test]
        fn timeout_is_a_loss_at_the_limit() {
            let gm = GameMaster::new(&["normal"]).unwrap();
            let ps = players(&gm);
            let settings = PveSettings {
                time_limit: 10_000,
                ..PveSettings::default()
            };
            let outcome = PveBattle::new(&gm, &ps, settings, 1).unwrap().run();
            assert_eq!(outcome.statistics.duration, 10_000.0);
            assert_eq!(outcome.statistics.win, 0.0);
            assert_eq!(outcome.pokemon[0][0][0].duration, 10_000.0);
        }

        #[test]
        fn defeating_the_boss_wins_early() {
            let gm = GameMaster::new(&["normal"]).unwrap();
            let mut ps = players(&gm);
            ps[1] = Player::new(1, vec![Party::try_from(vec![fighter(&gm, 20)]).unwrap()]);
            let outcome = PveBattle::new(&gm, &ps, PveSettings::default(), 3)
                .unwrap()
                .run();
            assert_eq!(outcome.statistics.win, 1.0);
            assert!(outcome.statistics.duration < f64::from(DEFAULT_TIME_LIMIT));
            assert_eq!(outcome.pokemon[1][0][0].hp, 0.0);
        }

        #[test]
        fn moves_longer_than_the_remaining_time_are_dropped() {
            let gm = GameMaster::new(&["normal"]).unwrap();
            let t = gm.type_index("normal").unwrap();
            let slow = Combatant::new(
                t,
                100.0,
                100.0,
                300,
                Move::new(t, 10, 10, 1_500_000_000, 1_400_000_000),
                Move::new(t, 100, -50, 1_500_000_000, 1_400_000_000),
            );
            let mut boss = slow.clone();
            boss.max_hp = 100_000;
            boss.strategy = PveStrategy::Defender;
            let ps = vec![
                Player::new(0, vec![Party::try_from(vec![slow]).unwrap()]),
                Player::new(1, vec![Party::try_from(vec![boss]).unwrap()]),
            ];
            let settings = PveSettings {
                time_limit: Time::MAX,
                ..PveSettings::default()
            };
            let outcome = PveBattle::new(&gm, &ps, settings, 5).unwrap().run();
            assert_eq!(outcome.statistics.duration, f64::from(Time::MAX));
            assert_eq!(outcome.statistics.win, 0.0);
            // One hit each lands; the second cast would finish past the limit.
            assert_eq!(outcome.pokemon[0][0][0].num_fast_attacks, 2.0);
            assert!(outcome.statistics.tdo > 0.0);
        }

        #[test]
        fn background_damage_hits_defenders_only() {
            let gm = GameMaster::new(&["normal"]).unwrap();
            let ps = players(&gm);
            let settings = PveSettings {
                background_dps: 50.0,
                time_limit: 3500,
                enable_log: true,
                ..PveSettings::default()
            };
            let outcome = PveBattle::new(&gm, &ps, settings, 1).unwrap().run();
            let ticks: Vec<_> = outcome
                .battle_log
                .iter()
                .filter(|e| e.kind == EventKind::BackgroundDps)
                .collect();
            assert_eq!(ticks.len(), 3);
            assert!(ticks.iter().all(|e| e.player == 1 && e.value == 50));
        }
    }
}

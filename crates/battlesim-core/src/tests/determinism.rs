//! Determinism verification tests.
//!
//! A run is a pure function of its inputs and seed. Aggregated results must
//! also be independent of how many worker threads rayon uses.

use crate::aggregate::{self, Aggregation, BranchPolicy};
use crate::battle::{BattleOutcome, DuelSettings, PveBattle, PveSettings};
use crate::config::GameMaster;
use crate::party::Player;

use super::helpers::{charging_attacker, raid, raid_boss, test_gm, uneven_duel};

fn players(gm: &GameMaster) -> Vec<Player> {
    raid(
        vec![charging_attacker(gm, 300), charging_attacker(gm, 300)],
        raid_boss(gm, 4000),
    )
}

fn settings() -> PveSettings {
    PveSettings {
        time_limit: 90_000,
        enable_log: true,
        ..PveSettings::default()
    }
}

fn average_with_threads(threads: usize, gm: &GameMaster, players: &[Player]) -> BattleOutcome {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .unwrap();
    pool.install(|| {
        aggregate::simulate_pve(gm, players, settings(), Aggregation::Average, 24, 1234)
            .unwrap()
            .outcome()
            .clone()
    })
}

#[test]
fn same_seed_same_run() {
    let gm = test_gm();
    let players = players(&gm);
    let a = PveBattle::new(&gm, &players, settings(), 42).unwrap().run();
    let b = PveBattle::new(&gm, &players, settings(), 42).unwrap().run();
    assert_eq!(a, b);
}

#[test]
fn seeds_drive_defender_choices() {
    let gm = test_gm();
    let players = players(&gm);
    let logs: Vec<_> = (0..8)
        .map(|seed| {
            PveBattle::new(&gm, &players, settings(), seed)
                .unwrap()
                .run()
                .battle_log
        })
        .collect();
    assert!(logs.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn average_is_independent_of_thread_count() {
    let gm = test_gm();
    let players = players(&gm);
    let one = average_with_threads(1, &gm, &players);
    let four = average_with_threads(4, &gm, &players);
    assert_eq!(one, four);
}

#[test]
fn branching_is_reproducible() {
    let gm = test_gm();
    let duelists = uneven_duel(&gm, [2, 2]);
    let run = || {
        aggregate::branch_duel(&gm, &duelists, DuelSettings::default(), BranchPolicy::Expectation, 9)
            .unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a, b);
}

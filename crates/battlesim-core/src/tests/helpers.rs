//! Factories for game masters, combatants and players.
//!
//! The default store has two types, `normal` and `ghost`, with neutral
//! effectiveness. Combatants built here are `ghost` and attack with `normal`
//! moves, so no same-type bonus applies and damage is easy to compute by hand:
//! `floor(0.5 * power * attack / defense) + 1`.

use crate::config::GameMaster;
use crate::entity::{Combatant, Duelist, Move};
use crate::party::{Party, Player};
use crate::strategy::{PveStrategy, PvpStrategy};

// =============================================================================
// Configuration
// =============================================================================

/// Neutral two-type store without health-loss energy.
pub fn test_gm() -> GameMaster {
    let mut gm = GameMaster::new(&["normal", "ghost"]).unwrap();
    gm.constants_mut().energy_delta_per_health_lost = 0.0;
    gm
}

// =============================================================================
// Combatants
// =============================================================================

/// Attacker whose charged move is never affordable, so it only uses its
/// 10-power fast move (1000 ms, damage at 500 ms). Deals 6 per hit against
/// [`immortal_boss`].
pub fn fast_only_attacker(gm: &GameMaster, hp: i32) -> Combatant {
    let ghost = gm.type_index("ghost").unwrap();
    let normal = gm.type_index("normal").unwrap();
    Combatant::new(
        ghost,
        100.0,
        100.0,
        hp,
        Move::new(normal, 10, 0, 1000, 500),
        Move::new(normal, 100, -100, 3000, 2000),
    )
}

/// No-dodge attacker whose 50-cost charged move is affordable after five
/// fast moves. Deals 6 per fast hit and 51 per charged hit against
/// [`immortal_boss`].
pub fn no_dodge_attacker(gm: &GameMaster, hp: i32) -> Combatant {
    let ghost = gm.type_index("ghost").unwrap();
    let normal = gm.type_index("normal").unwrap();
    Combatant::new(
        ghost,
        100.0,
        100.0,
        hp,
        Move::new(normal, 10, 10, 1000, 500),
        Move::new(normal, 100, -50, 3000, 2000),
    )
}

/// Attacker that alternates fast and charged moves normally.
pub fn charging_attacker(gm: &GameMaster, hp: i32) -> Combatant {
    let ghost = gm.type_index("ghost").unwrap();
    let normal = gm.type_index("normal").unwrap();
    let mut c = Combatant::new(
        ghost,
        120.0,
        100.0,
        hp,
        Move::new(normal, 10, 10, 1000, 500),
        Move::new(normal, 80, -50, 2500, 2000),
    );
    c.strategy = PveStrategy::AttackerDodgeCharged;
    c
}

/// Defender that cannot faint and deals 1 damage per 0-power fast hit.
pub fn immortal_boss(gm: &GameMaster, hp: i32) -> Combatant {
    let ghost = gm.type_index("ghost").unwrap();
    let normal = gm.type_index("normal").unwrap();
    let mut c = Combatant::new(
        ghost,
        100.0,
        100.0,
        hp,
        Move::new(normal, 0, 0, 1000, 500),
        Move::new(normal, 0, -100, 1000, 500),
    );
    c.immortal = true;
    c.strategy = PveStrategy::Defender;
    c
}

/// Immortal defender that starts with full energy, so it opens with its
/// 100-power charged move at 0 ms (51 damage at 2000 ms).
pub fn charged_boss(gm: &GameMaster) -> Combatant {
    let ghost = gm.type_index("ghost").unwrap();
    let normal = gm.type_index("normal").unwrap();
    let mut c = Combatant::new(
        ghost,
        100.0,
        100.0,
        100_000,
        Move::new(normal, 10, 10, 1000, 500),
        Move::new(normal, 100, -100, 2500, 2000),
    );
    c.starting_energy = 100;
    c.immortal = true;
    c.strategy = PveStrategy::Defender;
    c
}

/// Mortal defender with a real charged move, for stochastic runs.
pub fn raid_boss(gm: &GameMaster, hp: i32) -> Combatant {
    let ghost = gm.type_index("ghost").unwrap();
    let normal = gm.type_index("normal").unwrap();
    let mut c = Combatant {
        charged_moves: vec![
            Move::new(normal, 60, -33, 2000, 1500),
            Move::new(normal, 100, -50, 3000, 2500),
        ],
        ..Combatant::new(
            ghost,
            150.0,
            150.0,
            hp,
            Move::new(normal, 8, 10, 1000, 500),
            Move::new(normal, 60, -33, 2000, 1500),
        )
    };
    c.strategy = PveStrategy::Defender;
    c
}

// =============================================================================
// Players
// =============================================================================

/// One-party player.
pub fn player(team: u32, members: Vec<Combatant>) -> Player {
    Player::new(team, vec![Party::try_from(members).unwrap()])
}

/// Attacker team of `attackers` against a single boss.
pub fn raid(attackers: Vec<Combatant>, boss: Combatant) -> Vec<Player> {
    vec![player(0, attackers), player(1, vec![boss])]
}

/// Two identical duelists with `shields` shields each.
pub fn mirror_duel(gm: &GameMaster, shields: u32, strategy: PvpStrategy) -> [Duelist; 2] {
    let normal = gm.type_index("normal").unwrap();
    let c = Combatant::new(
        normal,
        100.0,
        100.0,
        120,
        Move::new(normal, 6, 6, 500, 500),
        Move::new(normal, 60, -40, 500, 500),
    );
    [
        Duelist {
            combatant: c.clone(),
            strategy,
            shields,
        },
        Duelist {
            combatant: c,
            strategy,
            shields,
        },
    ]
}

/// Two different duelists, side 0 stronger in attack.
pub fn uneven_duel(gm: &GameMaster, shields: [u32; 2]) -> [Duelist; 2] {
    let normal = gm.type_index("normal").unwrap();
    let ghost = gm.type_index("ghost").unwrap();
    let strong = Combatant {
        charged_moves: vec![
            Move::new(normal, 45, -35, 500, 500),
            Move::new(normal, 90, -60, 500, 500),
        ],
        ..Combatant::new(
            ghost,
            130.0,
            90.0,
            140,
            Move::new(normal, 5, 8, 500, 500),
            Move::new(normal, 45, -35, 500, 500),
        )
    };
    let sturdy = Combatant::new(
        normal,
        100.0,
        120.0,
        170,
        Move::new(normal, 4, 9, 1000, 1000),
        Move::new(normal, 70, -45, 500, 500),
    );
    [
        Duelist {
            combatant: strong,
            strategy: PvpStrategy::Advance,
            shields: shields[0],
        },
        Duelist {
            combatant: sturdy,
            strategy: PvpStrategy::Basic,
            shields: shields[1],
        },
    ]
}

use battlesim_core::aggregate::{self, Aggregation, BranchPolicy};
use battlesim_core::battle::{DuelSettings, PveBattle, PveSettings};
use battlesim_core::config::GameMaster;
use battlesim_core::entity::{Combatant, Duelist, Move};
use battlesim_core::party::{Party, Player};
use battlesim_core::strategy::{PveStrategy, PvpStrategy};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn gm() -> GameMaster {
    GameMaster::standard()
}

fn raid(gm: &GameMaster) -> Vec<Player> {
    let fire = gm.type_index("fire").unwrap();
    let grass = gm.type_index("grass").unwrap();
    let mut attacker = Combatant::new(
        fire,
        220.0,
        160.0,
        150,
        Move::new(fire, 10, 8, 1000, 600),
        Move::new(fire, 90, -50, 3000, 2500),
    );
    attacker.strategy = PveStrategy::AttackerDodgeCharged;
    let mut boss = Combatant {
        charged_moves: vec![
            Move::new(grass, 60, -33, 2000, 1500),
            Move::new(grass, 130, -100, 3500, 3000),
        ],
        ..Combatant::new(
            grass,
            180.0,
            190.0,
            15_000,
            Move::new(grass, 8, 10, 1000, 500),
            Move::new(grass, 60, -33, 2000, 1500),
        )
    };
    boss.strategy = PveStrategy::Defender;

    // Six attackers, one party each with six members.
    let party = Party::try_from(vec![attacker; 6]).unwrap();
    let mut players: Vec<Player> = (0..6).map(|_| Player::new(0, vec![party.clone()])).collect();
    players.push(Player::new(1, vec![Party::try_from(vec![boss]).unwrap()]));
    players
}

fn duel(gm: &GameMaster) -> [Duelist; 2] {
    let water = gm.type_index("water").unwrap();
    let fire = gm.type_index("fire").unwrap();
    let a = Combatant::new(
        water,
        120.0,
        115.0,
        140,
        Move::new(water, 3, 3, 500, 500),
        Move::new(water, 70, -40, 500, 500),
    );
    let b = Combatant::new(
        fire,
        125.0,
        105.0,
        135,
        Move::new(fire, 5, 4, 1000, 1000),
        Move::new(fire, 80, -45, 500, 500),
    );
    [
        Duelist {
            combatant: a,
            strategy: PvpStrategy::Advance,
            shields: 2,
        },
        Duelist {
            combatant: b,
            strategy: PvpStrategy::Basic,
            shields: 2,
        },
    ]
}

fn bench_raid_run(c: &mut Criterion) {
    let gm = gm();
    let players = raid(&gm);

    c.bench_function("raid_run", |b| {
        b.iter(|| {
            PveBattle::new(&gm, &players, PveSettings::default(), black_box(7))
                .unwrap()
                .run()
        })
    });
}

fn bench_raid_average(c: &mut Criterion) {
    let gm = gm();
    let players = raid(&gm);

    c.bench_function("raid_average_64", |b| {
        b.iter(|| {
            aggregate::simulate_pve(
                &gm,
                &players,
                PveSettings::default(),
                Aggregation::Average,
                black_box(64),
                7,
            )
            .unwrap()
        })
    });
}

fn bench_branching_duel(c: &mut Criterion) {
    let gm = gm();
    let duelists = duel(&gm);

    c.bench_function("branching_duel_2v2_shields", |b| {
        b.iter(|| {
            aggregate::branch_duel(
                &gm,
                black_box(&duelists),
                DuelSettings::default(),
                BranchPolicy::Expectation,
                0,
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_raid_run, bench_raid_average, bench_branching_duel);
criterion_main!(benches);

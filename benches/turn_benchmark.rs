//! Benchmarks for turn resolution.
//!
//! Covers the hot paths of a server tick: reachable-set previews, move
//! bagging and a full turn over a generated galaxy.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use voidreach::geometry::{Dimension, GridLocation};
use voidreach::pathfinding::reachable_set;
use voidreach::pipeline::{bag_moves, plan_moves};
use voidreach::{
    Action, ContentTables, EngineConfig, GalaxyConfig, GameState, MoveShip, Player, Point, Turn,
    TurnEngine, generate_galaxy,
};

/// A generated galaxy plus one move per ship, three cells to the right.
fn galaxy_with_moves(players: usize) -> (GameState, Vec<Action>) {
    let config = GalaxyConfig {
        seed: 42,
        players,
        systems: players * 2,
        ..GalaxyConfig::default()
    };
    let state = generate_galaxy(&config, ContentTables::builtin()).unwrap();
    let actions = state
        .props()
        .filter(|prop| prop.as_ship().is_some())
        .filter_map(|prop| {
            let owner = prop.owner?;
            let destination = prop.location.origin.translate(3, 0);
            Action::new(owner, MoveShip { ship: prop.id, destination }, &state).ok()
        })
        .collect();
    (state, actions)
}

fn bench_reachable_set(c: &mut Criterion) {
    let mut state = GameState::new(vec![Player::new(1, "Ada")], ContentTables::builtin());
    let solar = state.add_solar_system("Sol", Dimension::new(64, 64).unwrap());
    for i in 0..16 {
        state.spawn_planet(solar, None, "barren", Point::new(2 + 4 * i, 30)).unwrap();
    }
    let grid = state.solar_system(solar).unwrap();

    c.bench_function("reachable_set_speed_12", |b| {
        b.iter(|| {
            let start = black_box(GridLocation::unit(32, 32));
            black_box(reachable_set(grid, start, black_box(12), None))
        });
    });
}

fn bench_bagging(c: &mut Criterion) {
    let (state, actions) = galaxy_with_moves(8);

    c.bench_function("plan_and_bag_8p", |b| {
        b.iter(|| {
            let bags = bag_moves(plan_moves(black_box(&state), black_box(&actions)));
            black_box(bags)
        });
    });
}

fn bench_full_turn(c: &mut Criterion) {
    let (state, actions) = galaxy_with_moves(4);
    let turn = Turn::from_actions(actions).unwrap();

    c.bench_function("resolve_turn_4p", |b| {
        b.iter(|| {
            let mut engine = TurnEngine::new(state.clone(), EngineConfig::default());
            let resolved = engine.resolve_turn(black_box(turn.clone())).unwrap();
            black_box(resolved)
        });
    });
}

criterion_group!(benches, bench_reachable_set, bench_bagging, bench_full_turn);
criterion_main!(benches);

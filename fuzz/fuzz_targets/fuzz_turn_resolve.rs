#![no_main]

//! Full turn resolution fuzzer.
//!
//! Builds a small galaxy from the fuzzer's seed, then resolves several
//! turns of fuzzer-chosen moves, shots and captures. This exercises
//! combat, bagging, playback and income together and checks the state
//! invariants after every turn.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voidreach::state::check_invariants;
use voidreach::{
    Action, ActionKind, BombPlanet, ContentTables, EngineConfig, GalaxyConfig, GameState,
    MoveShip, Prop, PropId, ShootShip, Turn, TurnEngine, generate_galaxy,
};

/// A fuzzer-generated intent. Prop references index into the current
/// prop list so most of them resolve.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzIntent {
    /// Move a ship by an offset.
    Move { ship: u8, dx: i8, dy: i8 },
    /// Fire at another ship.
    Shoot { ship: u8, target: u8 },
    /// Bomb a planet.
    Bomb { ship: u8, planet: u8 },
}

/// Structured input for turn fuzzing.
#[derive(Arbitrary, Debug)]
struct TurnInput {
    /// Galaxy and engine seed.
    seed: u64,
    /// Number of players, reduced into 2..=4.
    players: u8,
    /// Intents per turn.
    turns: Vec<Vec<FuzzIntent>>,
}

fn pick(props: &[&Prop], index: u8) -> Option<PropId> {
    if props.is_empty() {
        return None;
    }
    Some(props[usize::from(index) % props.len()].id)
}

fn to_action(state: &GameState, intent: &FuzzIntent) -> Option<Action> {
    let ships: Vec<&Prop> = state.props().filter(|p| p.as_ship().is_some()).collect();
    let planets: Vec<&Prop> = state.props().filter(|p| p.as_planet().is_some()).collect();
    let owner = |id: PropId| state.prop(id).and_then(|p| p.owner);

    let (player, kind): (u8, ActionKind) = match *intent {
        FuzzIntent::Move { ship, dx, dy } => {
            let ship = pick(&ships, ship)?;
            let origin = state.prop(ship)?.location.origin;
            let destination = origin.translate(i32::from(dx % 8), i32::from(dy % 8));
            (owner(ship)?, MoveShip { ship, destination }.into())
        }
        FuzzIntent::Shoot { ship, target } => {
            let ship = pick(&ships, ship)?;
            let target = pick(&ships, target)?;
            (owner(ship)?, ShootShip { ship, target, damage: 0 }.into())
        }
        FuzzIntent::Bomb { ship, planet } => {
            let ship = pick(&ships, ship)?;
            let planet = pick(&planets, planet)?;
            (owner(ship)?, BombPlanet { ship, planet, damage: 0 }.into())
        }
    };
    Action::new(player, kind, state).ok()
}

fuzz_target!(|input: TurnInput| {
    let config = GalaxyConfig {
        seed: input.seed,
        players: usize::from(input.players % 3) + 2,
        systems: 4,
        system_size: 16,
        neutral_planets: 2,
        ..GalaxyConfig::default()
    };
    let Ok(state) = generate_galaxy(&config, ContentTables::builtin()) else {
        return;
    };
    let engine_config = EngineConfig {
        seed: input.seed,
        ..EngineConfig::default()
    };
    let mut engine = TurnEngine::new(state, engine_config);

    for intents in input.turns.iter().take(8) {
        let mut turn = Turn::new();
        for intent in intents.iter().take(32) {
            if let Some(action) = to_action(engine.state(), intent) {
                // A second move for the same ship is rejected; skip it.
                let _ = turn.push(action);
            }
        }

        let resolved = engine.resolve_turn(turn).expect("resolution should not fail");
        let violations = check_invariants(engine.state());
        assert!(violations.is_empty(), "invariants violated: {violations:?}");
        assert!(resolved.actions().iter().all(|a| engine.state().get_player(a.player()).is_some()));
        for player in engine.state().players() {
            assert!(player.resources.is_non_negative(), "negative stockpile for {}", player.id);
        }
    }
});

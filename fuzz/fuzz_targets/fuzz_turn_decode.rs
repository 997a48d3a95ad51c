#![no_main]

//! Turn document decoder fuzzer.
//!
//! Feeds arbitrary bytes to the turn decoder against a generated galaxy.
//! Decoding must never panic, and whatever it accepts must survive an
//! encode/decode cycle unchanged.

use libfuzzer_sys::fuzz_target;
use voidreach::{ContentTables, EngineConfig, GalaxyConfig, TurnEngine, generate_galaxy};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(state) = generate_galaxy(&GalaxyConfig::default(), ContentTables::builtin()) else {
        return;
    };
    let engine = TurnEngine::new(state, EngineConfig::default());

    if let Ok(turn) = engine.decode_turn_json(json) {
        let encoded = turn.encode().expect("decoded turn should encode");
        let again = engine.decode_turn(&encoded).expect("encoded turn should decode");
        assert_eq!(turn, again, "decode/encode cycle changed the turn");
    }
});

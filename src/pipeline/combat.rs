//! Combat phase: every shot and bombardment against pre-move positions.

use tracing::debug;

use crate::action::{Action, Outcome};
use crate::error::EngineError;
use crate::state::GameState;

/// Execute every combat action in submission order, recording applied
/// ones in `outcomes`. Returns how many took effect.
pub(crate) fn resolve(
    state: &mut GameState,
    actions: &[Action],
    outcomes: &mut [Option<Action>],
) -> Result<usize, EngineError> {
    let mut fired = 0;
    for (action, outcome) in actions.iter().zip(outcomes.iter_mut()) {
        if !action.kind().is_combat() {
            continue;
        }
        if let Outcome::Applied(record) = action.execute(state)? {
            debug!(player = record.player(), "{}", record.describe(state));
            *outcome = Some(record);
            fired += 1;
        }
    }
    Ok(fired)
}

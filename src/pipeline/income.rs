//! Income phase: one stockpile change per player and resource.

use crate::action::{Action, ChangeResource};
use crate::state::{GameState, ResourceAmount};

/// Per-turn income of every player, summed over the planets they own now.
///
/// Players appear in state order and resources in content-table order. With
/// `emit_zero` set, resources with no income still get an action so every
/// turn record has the same shape.
#[must_use]
pub fn income_actions(state: &GameState, emit_zero: bool) -> Vec<Action> {
    let content = state.content();
    let mut actions = Vec::new();
    for player in state.players() {
        let total = state
            .planets_owned_by(player.id)
            .filter_map(|prop| prop.as_planet())
            .fold(ResourceAmount::new(), |total, planet| total.plus(&planet.income(content)));
        for resource in &content.resources {
            let amount = total.get(resource);
            if amount == 0 && !emit_zero {
                continue;
            }
            let change = ChangeResource {
                resource: resource.clone(),
                amount,
            };
            actions.push(Action::from_parts(player.id, change.into()));
        }
    }
    actions
}

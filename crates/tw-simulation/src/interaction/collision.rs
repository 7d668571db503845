use tw_core::entity::{Entity, EntityKind};
use tw_core::state::StateId;

use super::InteractionDef;
use crate::config::RulesConfig;
use crate::context::SimContext;

/// Push per unit of overlap between two characters.
const PUSH: f64 = 0.5;

/// Push per unit of overlap against a static obstacle.
const OBSTACLE_PUSH: f64 = 1.0;

const CHARACTERS: [EntityKind; 3] = [EntityKind::Human, EntityKind::Predator, EntityKind::Prey];

fn overlap(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> f64 {
    s.radius + t.radius - ctx.world.map.distance(s.position, t.position)
}

fn characters_overlap(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    s.is_alive() && t.is_alive() && overlap(s, t, ctx) > 0.0
}

/// Each side of a character pair pushes itself, so the pair separates evenly.
fn separate(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let amount = overlap(s, t, ctx);
    let away = ctx.world.map.direction(t.position, s.position);
    s.push_force(away * amount * PUSH);
}

fn is_obstacle(t: &Entity) -> bool {
    match t.kind() {
        EntityKind::Building => t.building().is_some_and(|b| b.is_constructed()),
        EntityKind::Tree => matches!(
            t.state_id(),
            Some(StateId::Full | StateId::Spreading | StateId::Growing)
        ),
        _ => false,
    }
}

fn blocked(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    s.is_alive() && is_obstacle(t) && overlap(s, t, ctx) > 0.0
}

/// Only the character moves; the obstacle stays put.
fn bounce(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let amount = overlap(s, t, ctx);
    let away = ctx.world.map.direction(t.position, s.position);
    s.push_force(away * amount * OBSTACLE_PUSH);
}

pub(super) fn defs(_rules: &RulesConfig) -> Vec<InteractionDef> {
    let character_reach = CHARACTERS
        .iter()
        .map(|k| k.default_radius())
        .fold(0.0, f64::max)
        * 2.0;
    let mut defs = Vec::new();
    for source in CHARACTERS {
        for target in CHARACTERS {
            defs.push(InteractionDef::new(
                "separate",
                source,
                target,
                character_reach,
                characters_overlap,
                separate,
            ));
        }
        for obstacle in [EntityKind::Building, EntityKind::Tree] {
            defs.push(InteractionDef::new(
                "bounce",
                source,
                obstacle,
                character_reach / 2.0 + obstacle.default_radius(),
                blocked,
                bounce,
            ));
        }
    }
    defs
}

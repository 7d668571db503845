//! The prey tree: flee, eat, mate, otherwise wander.

use rand::Rng;
use tw_core::blackboard::BlackboardValue;
use tw_core::component::{Action, Target};
use tw_core::entity::{Entity, EntityKind};
use tw_core::vector::Vec2;

use super::{BehaviorContext, BehaviorTree, Node, Status};

const THREAT: &str = "threat";
const FOOD: &str = "food";
const GRASS: &str = "grass";
const MATE: &str = "mate";
const WANDER: &str = "wander";

/// Build the prey tree.
pub fn tree() -> BehaviorTree {
    BehaviorTree::new(Node::Selector(vec![
        Node::Sequence(vec![
            Node::Condition("is_threatened", is_threatened),
            Node::Action("flee", flee),
        ]),
        Node::Sequence(vec![
            Node::Condition("is_hungry", is_hungry),
            Node::Selector(vec![
                Node::Sequence(vec![
                    Node::Action("find_berries", find_berries),
                    Node::Action("eat_target", eat_target),
                ]),
                Node::Sequence(vec![
                    Node::Action("find_grass", find_grass),
                    Node::Action("graze", graze),
                ]),
            ]),
        ]),
        Node::Sequence(vec![
            Node::Condition("wants_mate", wants_mate),
            Node::Action("find_mate", find_mate),
            Node::Action("court", court),
        ]),
        Node::Action("wander", wander),
    ]))
}

fn is_threatened(ctx: &mut BehaviorContext<'_>) -> bool {
    let map = ctx.world.map;
    let pos = ctx.entity.position;
    let fleeing = ctx.entity.animal().and_then(|a| a.fleeing_from);
    // Keep running from the current threat with a little hysteresis.
    let radius = if fleeing.is_some() {
        ctx.rules.danger_radius * 1.5
    } else {
        ctx.rules.danger_radius
    };
    let threat = ctx
        .world
        .entities
        .nearest(&map, pos, radius, |e| {
            e.kind() == EntityKind::Predator && e.is_alive()
        })
        .map(|(id, _)| id);
    match threat {
        Some(id) => {
            ctx.blackboard.set_transient(THREAT, BlackboardValue::Entity(id));
            true
        }
        None => {
            if let Some(a) = ctx.entity.animal_mut() {
                a.fleeing_from = None;
            }
            false
        }
    }
}

fn flee(ctx: &mut BehaviorContext<'_>) -> Status {
    let Some(threat) = ctx.blackboard.entity(THREAT) else {
        return Status::Failure;
    };
    if let Some(a) = ctx.entity.animal_mut() {
        a.fleeing_from = Some(threat);
        a.character.set_intent(Action::Fleeing, None);
    }
    ctx.blackboard.remove(GRASS);
    ctx.blackboard.remove(WANDER);
    Status::Running
}

fn is_hungry(ctx: &mut BehaviorContext<'_>) -> bool {
    ctx.entity.character().is_some_and(|c| {
        c.hunger >= ctx.rules.hunger_eat_threshold
            || (c.active_action == Action::Eating && c.hunger > 0.0)
    })
}

fn has_berries(e: &Entity) -> bool {
    e.kind() == EntityKind::BerryBush && e.is_alive() && e.plant().is_some_and(|p| !p.food.is_empty())
}

fn find_berries(ctx: &mut BehaviorContext<'_>) -> Status {
    if let Some(id) = ctx.blackboard.entity(FOOD)
        && ctx.world.entities.get(id).is_some_and(has_berries)
    {
        return Status::Success;
    }
    let map = ctx.world.map;
    match ctx
        .world
        .entities
        .nearest(&map, ctx.entity.position, ctx.rules.sight_radius, has_berries)
    {
        Some((id, _)) => {
            ctx.blackboard.set(FOOD, BlackboardValue::Entity(id));
            Status::Success
        }
        None => {
            ctx.blackboard.remove(FOOD);
            Status::Failure
        }
    }
}

fn eat_target(ctx: &mut BehaviorContext<'_>) -> Status {
    let Some(id) = ctx.blackboard.entity(FOOD) else {
        return Status::Failure;
    };
    if let Some(c) = ctx.entity.character_mut() {
        c.set_intent(Action::Eating, Some(Target::Entity(id)));
    }
    Status::Running
}

fn is_fertile(ctx: &BehaviorContext<'_>, p: Vec2) -> bool {
    *ctx.world.soil.at(p) >= ctx.rules.fertile_threshold && ctx.world.biome.at(p).is_grazable()
}

fn find_grass(ctx: &mut BehaviorContext<'_>) -> Status {
    if let Some(p) = ctx.blackboard.position(GRASS)
        && is_fertile(ctx, p)
    {
        return Status::Success;
    }
    let world = ctx.world;
    let threshold = ctx.rules.fertile_threshold;
    let rings = (ctx.rules.sight_radius / world.soil.cell_width()).ceil() as usize;
    let found = world
        .soil
        .find_nearest_cell(&world.map, ctx.entity.position, rings, |col, row| {
            *world.soil.get(col, row) >= threshold && world.biome.get(col, row).is_grazable()
        });
    match found {
        Some(p) => {
            ctx.blackboard.set(GRASS, BlackboardValue::Position(p));
            Status::Success
        }
        None => {
            ctx.blackboard.remove(GRASS);
            Status::Failure
        }
    }
}

fn graze(ctx: &mut BehaviorContext<'_>) -> Status {
    let Some(p) = ctx.blackboard.position(GRASS) else {
        return Status::Failure;
    };
    if let Some(c) = ctx.entity.character_mut() {
        c.set_intent(Action::Eating, Some(Target::Position(p)));
    }
    Status::Running
}

fn wants_mate(ctx: &mut BehaviorContext<'_>) -> bool {
    ctx.entity.character().is_some_and(|c| {
        ctx.rules.is_adult(c.age)
            && !c.is_pregnant
            && c.procreation_cooldown <= 0.0
            && c.hunger < ctx.rules.hunger_eat_threshold
    })
}

fn find_mate(ctx: &mut BehaviorContext<'_>) -> Status {
    let Some(me) = ctx.entity.character() else {
        return Status::Failure;
    };
    let gender = me.gender.opposite();
    let my_id = ctx.entity.id();
    let rules = ctx.rules;
    let map = ctx.world.map;
    let mate = ctx
        .world
        .entities
        .nearest(&map, ctx.entity.position, rules.sight_radius, |e| {
            e.kind() == EntityKind::Prey
                && e.id() != my_id
                && e.character().is_some_and(|c| {
                    c.hitpoints > 0.0
                        && c.gender == gender
                        && rules.is_adult(c.age)
                        && !c.is_pregnant
                        && c.procreation_cooldown <= 0.0
                })
        });
    match mate {
        Some((id, _)) => {
            ctx.blackboard.set_transient(MATE, BlackboardValue::Entity(id));
            Status::Success
        }
        None => Status::Failure,
    }
}

fn court(ctx: &mut BehaviorContext<'_>) -> Status {
    let Some(mate) = ctx.blackboard.entity(MATE) else {
        return Status::Failure;
    };
    if let Some(c) = ctx.entity.character_mut() {
        c.set_intent(Action::Procreating, Some(Target::Entity(mate)));
    }
    Status::Running
}

fn wander(ctx: &mut BehaviorContext<'_>) -> Status {
    let map = ctx.world.map;
    let pos = ctx.entity.position;
    let goal = match ctx.blackboard.position(WANDER) {
        Some(p) if map.distance(pos, p) > ctx.rules.arrive_range => p,
        _ => {
            let angle = ctx.rng.random_range(0.0..std::f64::consts::TAU);
            let reach = ctx.rng.random_range(0.5..1.0) * ctx.rules.wander_radius;
            let p = map.wrap(pos + Vec2::from_angle(angle) * reach);
            ctx.blackboard.set(WANDER, BlackboardValue::Position(p));
            p
        }
    };
    if let Some(c) = ctx.entity.character_mut() {
        c.set_intent(Action::Moving, Some(Target::Position(goal)));
    }
    Status::Running
}

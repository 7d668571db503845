use tw_core::component::{Action, Target};
use tw_core::entity::Entity;
use tw_core::state::{StateData, StateId, StatePayload};
use tw_core::vector::Vec2;
use tw_core::world::World;

use super::{StateContext, StateHandler, state_for};

/// Waypoints closer than this count as passed.
const WAYPOINT_RADIUS: f64 = 12.0;

/// A route is replanned once its goal drifts this far from the target.
const REPLAN_DISTANCE: f64 = 60.0;

/// Where a character's target currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetFix {
    /// No target set.
    Unset,
    /// The targeted entity is gone or dead.
    Gone,
    /// The target is at this position.
    At(Vec2),
}

/// Resolve the target of a character against the world.
pub fn locate_target(entity: &Entity, world: &World) -> TargetFix {
    match entity.character().and_then(|c| c.target) {
        None => TargetFix::Unset,
        Some(Target::Position(p)) => TargetFix::At(world.map.wrap(p)),
        Some(Target::Entity(id)) => match world.entities.get(id) {
            Some(t) if t.is_alive() => TargetFix::At(t.position),
            _ => TargetFix::Gone,
        },
    }
}

/// Drop the current intent and go idle.
pub fn clear_intent(entity: &mut Entity) {
    if let Some(c) = entity.character_mut() {
        c.set_intent(Action::Idle, None);
        c.attack_target = None;
    }
}

/// The state a character's intent calls for right now.
///
/// Vanished targets and arrival at a plain move target clear the intent.
pub fn settle(entity: &mut Entity, ctx: &StateContext<'_>) -> StateId {
    let Some(action) = entity.character().map(|c| c.active_action) else {
        return StateId::Idle;
    };
    match action {
        Action::Idle => return StateId::Idle,
        Action::Fleeing => return StateId::Fleeing,
        _ => {}
    }
    match locate_target(entity, ctx.world) {
        TargetFix::Unset if action == Action::Eating => StateId::Eating,
        TargetFix::Unset | TargetFix::Gone => {
            clear_intent(entity);
            StateId::Idle
        }
        TargetFix::At(p) => {
            let d = ctx.world.map.distance(entity.position, p);
            if d > ctx.rules.reach(action) {
                StateId::Moving
            } else if action == Action::Moving {
                clear_intent(entity);
                StateId::Idle
            } else {
                state_for(action)
            }
        }
    }
}

fn plan_route(from: Vec2, to: Vec2, ctx: &StateContext<'_>) -> StatePayload {
    let nav = &ctx.world.navigation;
    let waypoints = if nav.blocked_count() == 0 {
        vec![to]
    } else {
        nav.find_path(&ctx.world.map, from, to)
            .unwrap_or_else(|| vec![to])
    };
    StatePayload::Route {
        destination: to,
        waypoints,
        next: 0,
    }
}

/// Standing still, waiting for an intent.
#[derive(Debug)]
pub struct IdleState;

impl StateHandler for IdleState {
    fn on_enter(&self, entity: &mut Entity, _ctx: &mut StateContext<'_>) -> StatePayload {
        entity.acceleration = 0.0;
        StatePayload::None
    }

    fn update(&self, entity: &mut Entity, _data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        settle(entity, ctx)
    }
}

/// Walking toward the target along a planned route.
#[derive(Debug)]
pub struct MovingState;

impl StateHandler for MovingState {
    fn on_enter(&self, entity: &mut Entity, ctx: &mut StateContext<'_>) -> StatePayload {
        match locate_target(entity, ctx.world) {
            TargetFix::At(dest) => plan_route(entity.position, dest, ctx),
            _ => StatePayload::None,
        }
    }

    fn update(&self, entity: &mut Entity, data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        let next = settle(entity, ctx);
        if next != StateId::Moving {
            return next;
        }
        let TargetFix::At(dest) = locate_target(entity, ctx.world) else {
            return StateId::Idle;
        };
        let map = ctx.world.map;
        let replan = match &data.payload {
            StatePayload::Route { destination, .. } => {
                map.distance(*destination, dest) > REPLAN_DISTANCE
            }
            _ => true,
        };
        if replan {
            data.payload = plan_route(entity.position, dest, ctx);
        }

        let mut aim = dest;
        if let StatePayload::Route {
            waypoints, next, ..
        } = &mut data.payload
        {
            while *next + 1 < waypoints.len()
                && map.distance(entity.position, waypoints[*next]) <= WAYPOINT_RADIUS
            {
                *next += 1;
            }
            if *next + 1 < waypoints.len() {
                aim = waypoints[*next];
            }
        }
        entity.direction = map.direction(entity.position, aim);
        entity.acceleration = ctx.rules.acceleration(entity.kind());
        StateId::Moving
    }

    fn on_exit(&self, entity: &mut Entity, _ctx: &mut StateContext<'_>) {
        entity.acceleration = 0.0;
    }
}

/// Standing at the target while an interaction does the work.
#[derive(Debug)]
pub struct ActionState(pub StateId);

impl StateHandler for ActionState {
    fn on_enter(&self, entity: &mut Entity, _ctx: &mut StateContext<'_>) -> StatePayload {
        entity.acceleration = 0.0;
        StatePayload::None
    }

    fn update(&self, entity: &mut Entity, _data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        let next = settle(entity, ctx);
        if next == self.0
            && let TargetFix::At(p) = locate_target(entity, ctx.world)
        {
            entity.direction = ctx.world.map.direction(entity.position, p);
        }
        next
    }
}

/// Eating from the inventory, grazing a patch of soil, or feeding on a
/// targeted plant or corpse.
#[derive(Debug)]
pub struct EatingState;

impl StateHandler for EatingState {
    fn on_enter(&self, entity: &mut Entity, _ctx: &mut StateContext<'_>) -> StatePayload {
        entity.acceleration = 0.0;
        StatePayload::None
    }

    fn update(&self, entity: &mut Entity, _data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        let next = settle(entity, ctx);
        if next != StateId::Eating {
            return next;
        }
        let rules = ctx.rules;
        let fertile = |p: Vec2| *ctx.world.soil.at(p) >= rules.fertile_threshold;
        let Some(c) = entity.character_mut() else {
            return StateId::Idle;
        };
        if c.hunger <= 0.0 {
            clear_intent(entity);
            return StateId::Idle;
        }
        match c.target {
            None => {
                if c.feed_cooldown > 0.0 {
                    return StateId::Eating;
                }
                match c.inventory.take_food() {
                    Some(item) => {
                        c.hunger = (c.hunger - rules.nutrition(item.kind)).max(0.0);
                        c.feed_cooldown = rules.feed_cooldown;
                        StateId::Eating
                    }
                    None => {
                        clear_intent(entity);
                        StateId::Idle
                    }
                }
            }
            Some(Target::Position(p)) => {
                if fertile(p) {
                    c.hunger = (c.hunger - rules.graze_nutrition * ctx.hours).max(0.0);
                    StateId::Eating
                } else {
                    clear_intent(entity);
                    StateId::Idle
                }
            }
            Some(Target::Entity(_)) => StateId::Eating,
        }
    }
}

/// Running away from `fleeing_from`.
#[derive(Debug)]
pub struct FleeingState;

impl StateHandler for FleeingState {
    fn update(&self, entity: &mut Entity, _data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        let next = settle(entity, ctx);
        if next != StateId::Fleeing {
            return next;
        }
        let map = ctx.world.map;
        let threat = entity
            .animal()
            .and_then(|a| a.fleeing_from)
            .and_then(|id| ctx.world.entities.get(id))
            .filter(|t| t.is_alive())
            .map(|t| t.position);
        match threat {
            Some(tp) if map.distance(entity.position, tp) < ctx.rules.danger_radius * 1.5 => {
                entity.direction = map.direction(tp, entity.position);
                entity.acceleration =
                    ctx.rules.acceleration(entity.kind()) * ctx.rules.flee_multiplier;
                StateId::Fleeing
            }
            _ => {
                clear_intent(entity);
                if let Some(a) = entity.animal_mut() {
                    a.fleeing_from = None;
                }
                StateId::Idle
            }
        }
    }

    fn on_exit(&self, entity: &mut Entity, _ctx: &mut StateContext<'_>) {
        entity.acceleration = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tw_core::component::{FoodItem, FoodKind, Gender};
    use tw_core::entity::EntityId;
    use tw_core::vector::MapSize;

    use crate::config::RulesConfig;
    use crate::factory;

    fn world() -> World {
        World::new(MapSize::new(1000.0, 1000.0).unwrap(), 20.0).unwrap()
    }

    fn detached_human(w: &mut World, pos: Vec2) -> Entity {
        let id = factory::spawn_human(w, pos, Gender::Male, 20.0, None);
        w.entities.take(id).unwrap()
    }

    #[test]
    fn settle_moves_toward_distant_targets() {
        let mut w = world();
        let bush = factory::spawn_bush(&mut w, Vec2::new(500.0, 100.0), true, 2, &RulesConfig::default());
        let mut e = detached_human(&mut w, Vec2::new(100.0, 100.0));
        e.character_mut()
            .unwrap()
            .set_intent(Action::Gathering, Some(Target::Entity(bush)));
        let rules = RulesConfig::default();
        let ctx = StateContext::new(&w, &rules, 0.03, 0.003);
        assert_eq!(settle(&mut e, &ctx), StateId::Moving);
        e.position = Vec2::new(470.0, 100.0);
        assert_eq!(settle(&mut e, &ctx), StateId::Gathering);
    }

    #[test]
    fn vanished_target_clears_intent() {
        let mut w = world();
        let mut e = detached_human(&mut w, Vec2::new(100.0, 100.0));
        e.character_mut()
            .unwrap()
            .set_intent(Action::Attacking, Some(Target::Entity(EntityId(999))));
        let rules = RulesConfig::default();
        let ctx = StateContext::new(&w, &rules, 0.03, 0.003);
        assert_eq!(settle(&mut e, &ctx), StateId::Idle);
        assert_eq!(e.character().unwrap().active_action, Action::Idle);
        assert!(e.character().unwrap().target.is_none());
    }

    #[test]
    fn arriving_at_a_move_target_goes_idle() {
        let mut w = world();
        let mut e = detached_human(&mut w, Vec2::new(100.0, 100.0));
        e.character_mut()
            .unwrap()
            .set_intent(Action::Moving, Some(Target::Position(Vec2::new(105.0, 100.0))));
        let rules = RulesConfig::default();
        let ctx = StateContext::new(&w, &rules, 0.03, 0.003);
        assert_eq!(settle(&mut e, &ctx), StateId::Idle);
    }

    #[test]
    fn moving_steers_and_accelerates() {
        let mut w = world();
        let mut e = detached_human(&mut w, Vec2::new(100.0, 100.0));
        e.character_mut()
            .unwrap()
            .set_intent(Action::Moving, Some(Target::Position(Vec2::new(100.0, 400.0))));
        let rules = RulesConfig::default();
        let mut ctx = StateContext::new(&w, &rules, 0.03, 0.003);
        let mut data = StateData::new(0.0);
        data.payload = MovingState.on_enter(&mut e, &mut ctx);
        assert_eq!(MovingState.update(&mut e, &mut data, &mut ctx), StateId::Moving);
        assert!((e.direction.y - 1.0).abs() < 1e-9);
        assert_eq!(e.acceleration, rules.human_acceleration);
        assert!(matches!(data.payload, StatePayload::Route { .. }));
    }

    #[test]
    fn eating_consumes_inventory_then_stops() {
        let mut w = world();
        let mut e = detached_human(&mut w, Vec2::new(100.0, 100.0));
        {
            let c = e.character_mut().unwrap();
            c.hunger = 50.0;
            c.inventory.add_food(FoodItem::new(FoodKind::Berry, 0.0));
            c.set_intent(Action::Eating, None);
        }
        let rules = RulesConfig::default();
        let mut ctx = StateContext::new(&w, &rules, 0.03, 0.003);
        let mut data = StateData::new(0.0);
        assert_eq!(EatingState.update(&mut e, &mut data, &mut ctx), StateId::Eating);
        let c = e.character().unwrap();
        assert!((c.hunger - (50.0 - rules.berry_nutrition)).abs() < 1e-9);
        assert_eq!(c.feed_cooldown, rules.feed_cooldown);

        e.character_mut().unwrap().feed_cooldown = 0.0;
        assert_eq!(EatingState.update(&mut e, &mut data, &mut ctx), StateId::Idle);
        assert_eq!(e.character().unwrap().active_action, Action::Idle);
    }
}

//! Task AI.
//!
//! Humans and predators run a fixed list of needs in priority order; the
//! first need that applies writes the entity's intent and the rest are
//! skipped. Anything left over falls through to wandering, so an agent always
//! has something to do. Prey decide through the behavior tree in
//! [`crate::behavior::prey`].
//!
//! Decisions only write intent fields. Moving, acting and the effects on
//! other entities belong to the state machines and interaction rules that
//! run after this system.

/// Human needs.
pub mod human;
/// Predator needs.
pub mod predator;

use rand::Rng;
use rand::rngs::StdRng;
use tw_core::component::{Action, Target};
use tw_core::entity::{Entity, EntityId, EntityKind};
use tw_core::scheduled::ScheduledEventKind;
use tw_core::vector::Vec2;
use tw_core::world::World;

use crate::behavior::{BehaviorTree, prey};
use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// What a decision may look at or request.
pub struct AiContext<'a> {
    /// The world, minus the deciding entity.
    pub world: &'a World,
    /// Gameplay constants.
    pub rules: &'a RulesConfig,
    /// Current world time in hours.
    pub now: f64,
    /// Simulation RNG.
    pub rng: &'a mut StdRng,
    requests: Vec<(f64, ScheduledEventKind)>,
}

impl<'a> AiContext<'a> {
    /// A context for one decision.
    pub fn new(world: &'a World, rules: &'a RulesConfig, rng: &'a mut StdRng) -> Self {
        Self {
            world,
            rules,
            now: world.time,
            rng,
            requests: Vec::new(),
        }
    }

    /// Ask for `kind` to be scheduled `delay` hours from now.
    pub fn schedule(&mut self, delay: f64, kind: ScheduledEventKind) {
        self.requests.push((self.now + delay.max(0.0), kind));
    }

    /// Requests made so far, in order.
    pub fn requests(&self) -> &[(f64, ScheduledEventKind)] {
        &self.requests
    }

    /// The nearest entity within `radius` of `pos` passing `filter`.
    pub fn nearest<F>(&self, pos: Vec2, radius: f64, filter: F) -> Option<(EntityId, f64)>
    where
        F: Fn(&Entity) -> bool,
    {
        self.world.entities.nearest(&self.world.map, pos, radius, filter)
    }

    fn take_requests(&mut self) -> Vec<(f64, ScheduledEventKind)> {
        std::mem::take(&mut self.requests)
    }
}

/// A need: returns `true` once it has written an intent.
pub type Need = fn(&mut Entity, &mut AiContext<'_>) -> bool;

/// Run `needs` in order and stop at the first that applies.
///
/// Returns the name of the need that decided, or `None` when the caller
/// should fall back to wandering.
pub fn first_need(
    needs: &[(&'static str, Need)],
    me: &mut Entity,
    ctx: &mut AiContext<'_>,
) -> Option<&'static str> {
    needs
        .iter()
        .find(|(_, need)| need(me, ctx))
        .map(|(name, _)| *name)
}

/// Go after `target`, throwing when a human has a clear shot from afar.
pub fn engage(me: &mut Entity, target: EntityId, distance: f64, rules: &RulesConfig) {
    let can_throw = me.human().is_some_and(|h| h.throw_cooldown <= 0.0);
    let action = if can_throw && distance > rules.melee_range * 2.0 && distance <= rules.throw_range {
        Action::Throwing
    } else {
        Action::Attacking
    };
    if let Some(c) = me.character_mut() {
        c.set_intent(action, Some(Target::Entity(target)));
        c.attack_target = Some(target);
    }
}

/// Point `me` at an entity for `action`.
pub fn pursue(me: &mut Entity, action: Action, target: EntityId) {
    if let Some(c) = me.character_mut() {
        c.set_intent(action, Some(Target::Entity(target)));
    }
}

/// Keep walking toward the current wander goal, or pick a new one around
/// `center` (the entity's own position when `None`).
pub fn wander(me: &mut Entity, ctx: &mut AiContext<'_>, center: Option<Vec2>) {
    let map = ctx.world.map;
    let pos = me.position;
    let Some(c) = me.character_mut() else { return };
    if c.active_action == Action::Moving
        && let Some(Target::Position(goal)) = c.target
        && map.distance(pos, goal) > ctx.rules.arrive_range
    {
        return;
    }
    let angle = ctx.rng.random_range(0.0..std::f64::consts::TAU);
    let reach = ctx.rng.random_range(0.3..1.0) * ctx.rules.wander_radius;
    let goal = map.wrap(center.unwrap_or(pos) + Vec2::from_angle(angle) * reach);
    c.set_intent(Action::Moving, Some(Target::Position(goal)));
    c.attack_target = None;
}

/// The attacker that last hurt `me`, if it is still alive within `radius`.
pub fn avenger_target(me: &Entity, ctx: &AiContext<'_>, radius: f64) -> Option<(EntityId, f64)> {
    let attacker = me.character()?.last_attacker?;
    let e = ctx.world.entities.get(attacker)?;
    if !e.is_alive() || !e.kind().is_character() {
        return None;
    }
    let d = ctx.world.map.distance(me.position, e.position);
    (d <= radius).then_some((attacker, d))
}

/// Drives task AI for humans and predators and behavior trees for prey.
#[derive(Debug)]
pub struct AiSystem {
    prey: BehaviorTree,
}

impl Default for AiSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl AiSystem {
    /// A system with the standard prey tree.
    pub fn new() -> Self {
        Self { prey: prey::tree() }
    }

    fn decide(&self, id: EntityId, ctx: &mut SimContext<'_>) {
        let Some(mut entity) = ctx.world.entities.take(id) else {
            return;
        };
        let skip = !entity.kind().is_character()
            || !entity.is_alive()
            || entity.human().is_some_and(|h| h.is_player);
        if skip {
            ctx.world.entities.restore(entity);
            return;
        }
        let config = ctx.config;
        let hours = ctx.dt_hours();
        let requests = match entity.kind() {
            EntityKind::Prey => {
                self.prey
                    .run(&mut entity, &*ctx.world, &config.rules, hours, &mut *ctx.rng);
                Vec::new()
            }
            kind => {
                let mut actx = AiContext::new(&*ctx.world, &config.rules, &mut *ctx.rng);
                let decided = if kind == EntityKind::Human {
                    human::decide(&mut entity, &mut actx)
                } else {
                    predator::decide(&mut entity, &mut actx)
                };
                tracing::trace!(entity = %id, need = ?decided, "decided");
                actx.take_requests()
            }
        };
        ctx.world.entities.restore(entity);
        for (time, kind) in requests {
            tracing::debug!(entity = %id, event = kind.label(), time, "scheduled by ai");
            ctx.world.scheduled.push(time, kind);
        }
    }
}

impl System for AiSystem {
    fn name(&self) -> &str {
        "ai"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        for id in ctx.world.entities.ids() {
            self.decide(id, ctx);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::interaction::testing::Harness;
    use rand::SeedableRng;
    use tw_core::component::Gender;

    #[test]
    fn engage_prefers_throwing_at_range() {
        let rules = RulesConfig::default();
        let mut h = Harness::new();
        let id = factory::spawn_human(&mut h.world, Vec2::ZERO, Gender::Male, 25.0, None);
        let mut me = h.world.entities.take(id).unwrap();

        engage(&mut me, EntityId(7), rules.throw_range - 1.0, &rules);
        assert_eq!(me.character().unwrap().active_action, Action::Throwing);
        engage(&mut me, EntityId(7), rules.melee_range, &rules);
        assert_eq!(me.character().unwrap().active_action, Action::Attacking);

        me.human_mut().unwrap().throw_cooldown = 1.0;
        engage(&mut me, EntityId(7), rules.throw_range - 1.0, &rules);
        let c = me.character().unwrap();
        assert_eq!(c.active_action, Action::Attacking);
        assert_eq!(c.attack_target, Some(EntityId(7)));
    }

    #[test]
    fn wandering_keeps_its_goal_until_reached() {
        let mut h = Harness::new();
        let id = factory::spawn_predator(&mut h.world, Vec2::new(500.0, 500.0), Gender::Male, 5.0);
        let mut me = h.world.entities.take(id).unwrap();
        let rules = RulesConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = AiContext::new(&h.world, &rules, &mut rng);

        wander(&mut me, &mut ctx, None);
        let first = me.character().unwrap().target;
        wander(&mut me, &mut ctx, None);
        assert_eq!(me.character().unwrap().target, first);
        let Some(Target::Position(goal)) = first else {
            panic!("expected a position target");
        };
        assert!(h.world.map.distance(me.position, goal) <= rules.wander_radius + 1e-9);
    }

    #[test]
    fn players_are_left_alone() {
        let mut h = Harness::new();
        let id = factory::spawn_human(&mut h.world, Vec2::ZERO, Gender::Male, 25.0, None);
        h.world.entities.get_mut(id).unwrap().human_mut().unwrap().is_player = true;
        let mut system = AiSystem::new();
        system.tick(&mut h.ctx()).unwrap();
        let c = h.world.entities.get(id).unwrap().character().unwrap();
        assert_eq!(c.active_action, Action::Idle);
    }
}

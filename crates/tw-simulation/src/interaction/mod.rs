//! Pairwise interaction dispatch.
//!
//! An [`InteractionRegistry`] holds an ordered list of [`InteractionDef`]s and
//! an index from `(source kind, target kind)` to the definitions that apply.
//! Once per sub-step the [`InteractionSystem`] buckets every entity, walks
//! sources in id order, and for each neighbor within reach looks the pair up
//! in the index. A definition whose distance bound holds and whose checker
//! accepts the pair has its `perform` run exactly once for that ordered pair.
//!
//! Checkers see the whole world read-only. Performers get both entities
//! detached from the store plus the mutable context, so they may spawn
//! entities, schedule events and emit notifications. Rules never rely on the
//! order other rules ran in; they re-check liveness and cooldowns themselves.

/// Taking apart, claiming and completing buildings.
pub mod building;
/// Separation forces.
pub mod collision;
/// Melee, ranged and siege.
pub mod combat;
/// Nutrition for animals, parents and elders.
pub mod feeding;
/// Berries, wood, chopping and looting.
pub mod gathering;
/// Mating and tribe founding.
pub mod procreation;
/// Deposits, withdrawals and theft.
pub mod storage;

use std::collections::HashMap;

use tw_core::component::{Action, Target};
use tw_core::entity::{Entity, EntityId, EntityKind};
use tw_core::spatial::SpatialIndex;

use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// Pure predicate deciding whether a pair interacts this sub-step.
pub type Checker = fn(&Entity, &Entity, &SimContext<'_>) -> bool;

/// Effect of an accepted pair.
pub type Performer = fn(&mut Entity, &mut Entity, &mut SimContext<'_>);

/// One interaction rule.
#[derive(Clone)]
pub struct InteractionDef {
    /// Stable rule name, used in logs.
    pub id: &'static str,
    /// Kind of the acting entity.
    pub source: EntityKind,
    /// Kind of the entity acted upon.
    pub target: EntityKind,
    /// Largest wrapped center distance at which the rule applies.
    pub max_distance: f64,
    /// Must not mutate anything.
    pub checker: Checker,
    /// Runs once per accepted pair.
    pub perform: Performer,
}

impl std::fmt::Debug for InteractionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionDef")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("max_distance", &self.max_distance)
            .finish()
    }
}

impl InteractionDef {
    /// A rule between two kinds.
    pub fn new(
        id: &'static str,
        source: EntityKind,
        target: EntityKind,
        max_distance: f64,
        checker: Checker,
        perform: Performer,
    ) -> Self {
        Self {
            id,
            source,
            target,
            max_distance,
            checker,
            perform,
        }
    }
}

/// Ordered rule list plus the kind-pair index.
#[derive(Debug, Default)]
pub struct InteractionRegistry {
    defs: Vec<InteractionDef>,
    by_pair: HashMap<(EntityKind, EntityKind), Vec<usize>>,
    reach: HashMap<EntityKind, f64>,
}

impl InteractionRegistry {
    /// No rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every rule family, in evaluation order.
    pub fn standard(rules: &RulesConfig) -> Self {
        let mut registry = Self::new();
        for def in collision::defs(rules)
            .into_iter()
            .chain(gathering::defs(rules))
            .chain(feeding::defs(rules))
            .chain(combat::defs(rules))
            .chain(procreation::defs(rules))
            .chain(storage::defs(rules))
            .chain(building::defs(rules))
        {
            registry.register(def);
        }
        registry
    }

    /// Append a rule.
    pub fn register(&mut self, def: InteractionDef) {
        let index = self.defs.len();
        self.by_pair
            .entry((def.source, def.target))
            .or_default()
            .push(index);
        let reach = self.reach.entry(def.source).or_insert(0.0);
        *reach = reach.max(def.max_distance);
        self.defs.push(def);
    }

    /// All rules in evaluation order.
    pub fn defs(&self) -> &[InteractionDef] {
        &self.defs
    }

    /// Look a rule up by name.
    pub fn get(&self, id: &str) -> Option<&InteractionDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    /// Rules for one ordered kind pair, in evaluation order.
    pub fn for_pair(&self, source: EntityKind, target: EntityKind) -> impl Iterator<Item = &InteractionDef> {
        self.by_pair
            .get(&(source, target))
            .into_iter()
            .flatten()
            .map(|&i| &self.defs[i])
    }

    /// Largest distance any rule with this source kind reaches.
    pub fn reach(&self, source: EntityKind) -> Option<f64> {
        self.reach.get(&source).copied()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Bucket size for the neighbor index.
const INDEX_CELL: f64 = 80.0;

/// Runs the registry over every nearby pair.
#[derive(Debug)]
pub struct InteractionSystem {
    registry: InteractionRegistry,
    performed: u64,
}

impl InteractionSystem {
    /// A system running `registry`.
    pub fn new(registry: InteractionRegistry) -> Self {
        Self {
            registry,
            performed: 0,
        }
    }

    /// A system running every standard rule family.
    pub fn standard(rules: &RulesConfig) -> Self {
        Self::new(InteractionRegistry::standard(rules))
    }

    /// The installed rules.
    pub fn registry(&self) -> &InteractionRegistry {
        &self.registry
    }

    /// Total performs since creation.
    pub fn performed(&self) -> u64 {
        self.performed
    }

    fn dispatch_pair(&mut self, source: EntityId, target: EntityId, ctx: &mut SimContext<'_>) {
        let map = ctx.world.map;
        let (Some(s), Some(t)) = (ctx.world.entities.get(source), ctx.world.entities.get(target))
        else {
            return;
        };
        let (skind, tkind) = (s.kind(), t.kind());
        let candidates: Vec<usize> = self
            .registry
            .by_pair
            .get(&(skind, tkind))
            .cloned()
            .unwrap_or_default();

        for i in candidates {
            let def = &self.registry.defs[i];
            let accepted = match (ctx.world.entities.get(source), ctx.world.entities.get(target)) {
                (Some(s), Some(t)) => {
                    map.distance(s.position, t.position) <= def.max_distance
                        && (def.checker)(s, t, ctx)
                }
                _ => return,
            };
            if !accepted {
                continue;
            }
            let (Some(mut s), Some(mut t)) =
                (ctx.world.entities.take(source), ctx.world.entities.take(target))
            else {
                return;
            };
            (def.perform)(&mut s, &mut t, ctx);
            ctx.world.entities.restore(s);
            ctx.world.entities.restore(t);
            self.performed += 1;
            tracing::debug!(rule = def.id, %source, %target, "interaction performed");
        }
    }
}

impl System for InteractionSystem {
    fn name(&self) -> &str {
        "interaction"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let mut index = SpatialIndex::new(ctx.world.map, INDEX_CELL)?;
        index.rebuild(ctx.world.entities.iter().map(|e| (e.id(), e.position)));

        for source in ctx.world.entities.ids() {
            let Some(entity) = ctx.world.entities.get(source) else {
                continue;
            };
            let Some(reach) = self.registry.reach(entity.kind()) else {
                continue;
            };
            for (target, _) in index.query(entity.position, reach) {
                if target != source {
                    self.dispatch_pair(source, target, ctx);
                }
            }
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

// ---------------------------------------------------------------------------
// Helpers shared by the rule families
// ---------------------------------------------------------------------------

/// Whether `e` intends `action` on `target`.
pub(crate) fn intends(e: &Entity, action: Action, target: EntityId) -> bool {
    e.character().is_some_and(|c| {
        c.active_action == action && c.target == Some(Target::Entity(target))
    })
}

/// Whether `e` is fighting `target` with `action`.
pub(crate) fn fighting(e: &Entity, action: Action, target: EntityId) -> bool {
    e.character().is_some_and(|c| {
        c.active_action == action
            && (c.attack_target == Some(target) || c.target == Some(Target::Entity(target)))
    })
}

/// Whether `e` is a character with hitpoints left.
pub(crate) fn living(e: &Entity) -> bool {
    e.character().is_some_and(|c| c.hitpoints > 0.0)
}

/// Drop `e`'s intent.
pub(crate) fn finish(e: &mut Entity) {
    if let Some(c) = e.character_mut() {
        c.set_intent(Action::Idle, None);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tw_core::vector::MapSize;
    use tw_core::world::World;

    use crate::clock::SimClock;
    use crate::config::SimConfig;
    use crate::context::SimContext;
    use crate::event::EventLog;

    /// Everything a [`SimContext`] borrows, owned in one place.
    pub struct Harness {
        pub world: World,
        pub clock: SimClock,
        pub events: EventLog,
        pub rng: StdRng,
        pub config: SimConfig,
    }

    impl Harness {
        pub fn new() -> Self {
            let config = SimConfig::default();
            let mut clock = SimClock::new(
                config.hours_per_second,
                config.max_step_seconds,
                config.max_real_delta_seconds,
            );
            clock.advance(config.max_step_seconds);
            Self {
                world: World::new(MapSize::new(1000.0, 1000.0).unwrap(), 20.0).unwrap(),
                clock,
                events: EventLog::new(0),
                rng: StdRng::seed_from_u64(5),
                config,
            }
        }

        pub fn ctx(&mut self) -> SimContext<'_> {
            SimContext {
                world: &mut self.world,
                clock: &self.clock,
                events: &mut self.events,
                rng: &mut self.rng,
                config: &self.config,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Harness;
    use super::*;
    use tw_core::component::Gender;
    use tw_core::vector::Vec2;

    use crate::factory;

    fn always(_: &Entity, _: &Entity, _: &SimContext<'_>) -> bool {
        true
    }

    fn tag(s: &mut Entity, _: &mut Entity, _: &mut SimContext<'_>) {
        s.radius += 1.0;
    }

    #[test]
    fn pairs_are_indexed_by_kind() {
        let registry = InteractionRegistry::standard(&RulesConfig::default());
        assert!(!registry.is_empty());
        assert!(registry.get("gather_berries").is_some());
        assert!(registry
            .for_pair(EntityKind::Human, EntityKind::BerryBush)
            .any(|d| d.id == "gather_berries"));
        assert_eq!(registry.for_pair(EntityKind::Tree, EntityKind::Human).count(), 0);
        assert!(registry.reach(EntityKind::Human).unwrap() >= RulesConfig::default().throw_range);
        assert!(registry.reach(EntityKind::Corpse).is_none());
    }

    #[test]
    fn perform_runs_once_per_ordered_pair_in_range() {
        let mut h = Harness::new();
        let a = factory::spawn_human(&mut h.world, Vec2::new(10.0, 10.0), Gender::Male, 20.0, None);
        let b = factory::spawn_human(&mut h.world, Vec2::new(990.0, 10.0), Gender::Male, 20.0, None);
        let far = factory::spawn_human(&mut h.world, Vec2::new(500.0, 500.0), Gender::Male, 20.0, None);

        let mut registry = InteractionRegistry::new();
        registry.register(InteractionDef::new(
            "tag",
            EntityKind::Human,
            EntityKind::Human,
            30.0,
            always,
            tag,
        ));
        let mut system = InteractionSystem::new(registry);
        system.tick(&mut h.ctx()).unwrap();

        let radius = |id| h.world.entities.get(id).unwrap().radius;
        let base = EntityKind::Human.default_radius();
        assert_eq!(radius(a), base + 1.0);
        assert_eq!(radius(b), base + 1.0);
        assert_eq!(radius(far), base);
        assert_eq!(system.performed(), 2);
        assert_eq!(h.world.entities.len(), 3);
    }

    #[test]
    fn rejected_pairs_are_left_alone() {
        let mut h = Harness::new();
        let a = factory::spawn_human(&mut h.world, Vec2::new(10.0, 10.0), Gender::Male, 20.0, None);
        factory::spawn_human(&mut h.world, Vec2::new(20.0, 10.0), Gender::Male, 20.0, None);
        let mut registry = InteractionRegistry::new();
        registry.register(InteractionDef::new(
            "never",
            EntityKind::Human,
            EntityKind::Human,
            30.0,
            |_, _, _| false,
            tag,
        ));
        let mut system = InteractionSystem::new(registry);
        system.tick(&mut h.ctx()).unwrap();
        assert_eq!(system.performed(), 0);
        assert_eq!(
            h.world.entities.get(a).unwrap().radius,
            EntityKind::Human.default_radius()
        );
    }
}

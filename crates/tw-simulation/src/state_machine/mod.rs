//! State machine framework.
//!
//! Each kind owns a [`StateTable`] mapping state ids to handlers. Every
//! sub-step the current handler's `update` picks the next state; on a change
//! the old handler's `on_exit` runs, then the new handler's `on_enter`, and the
//! framework stamps `entered_at` and `previous_state` on the fresh data.
//!
//! Handlers see the world read-only. The entity being stepped is detached from
//! the store while its handler runs, and anything a handler wants to happen
//! outside its own entity is requested through [`StateContext::schedule`].

/// Shared character handlers (idle, moving, action states, eating, fleeing).
pub mod character;
/// Human state table.
pub mod human;
/// Predator and prey state tables.
pub mod animal;
/// Plant state table.
pub mod plant;

use std::collections::{BTreeMap, HashMap};

use tw_core::component::Action;
use tw_core::entity::{Entity, EntityId, EntityKind};
use tw_core::scheduled::ScheduledEventKind;
use tw_core::state::{StateData, StateId, StatePayload, StateSlot};
use tw_core::world::World;

use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::system::System;

/// Read-only view handed to state handlers.
pub struct StateContext<'a> {
    /// The world, minus the entity being stepped.
    pub world: &'a World,
    /// Gameplay constants.
    pub rules: &'a RulesConfig,
    /// Sub-step length in real seconds.
    pub dt: f64,
    /// Sub-step length in world hours.
    pub hours: f64,
    /// Current world time in hours.
    pub now: f64,
    requests: Vec<(f64, ScheduledEventKind)>,
}

impl<'a> StateContext<'a> {
    /// A context for one sub-step.
    pub fn new(world: &'a World, rules: &'a RulesConfig, dt: f64, hours: f64) -> Self {
        Self {
            world,
            rules,
            dt,
            hours,
            now: world.time,
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

    fn take_requests(&mut self) -> Vec<(f64, ScheduledEventKind)> {
        std::mem::take(&mut self.requests)
    }
}

/// Behavior of one state.
///
/// Only `update` is required. `update` may rewrite the payload in `data`
/// and returns the id of the state to be in after this sub-step.
pub trait StateHandler: std::fmt::Debug {
    /// Runs when the state is entered. Returns the initial payload.
    fn on_enter(&self, _entity: &mut Entity, _ctx: &mut StateContext<'_>) -> StatePayload {
        StatePayload::None
    }

    /// Runs every sub-step while the state is current.
    fn update(&self, entity: &mut Entity, data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId;

    /// Runs when the state is left.
    fn on_exit(&self, _entity: &mut Entity, _ctx: &mut StateContext<'_>) {}
}

/// Handlers for one kind, keyed by state id.
#[derive(Debug)]
pub struct StateTable {
    kind: EntityKind,
    handlers: BTreeMap<StateId, Box<dyn StateHandler>>,
}

impl StateTable {
    /// An empty table for `kind`.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            handlers: BTreeMap::new(),
        }
    }

    /// Register `handler` for `state`, replacing any previous one.
    pub fn register(&mut self, state: StateId, handler: impl StateHandler + 'static) {
        self.handlers.insert(state, Box::new(handler));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, state: StateId, handler: impl StateHandler + 'static) -> Self {
        self.register(state, handler);
        self
    }

    /// The kind this table serves.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Handler for `state`, if registered.
    pub fn get(&self, state: StateId) -> Option<&dyn StateHandler> {
        self.handlers.get(&state).map(|h| h.as_ref())
    }

    /// Whether `state` has a handler.
    pub fn contains(&self, state: StateId) -> bool {
        self.handlers.contains_key(&state)
    }

    /// Registered states in id order.
    pub fn states(&self) -> Vec<StateId> {
        self.handlers.keys().copied().collect()
    }

    fn handler(&self, state: StateId) -> SimResult<&dyn StateHandler> {
        self.get(state).ok_or(SimError::UnregisteredState {
            kind: self.kind,
            state,
        })
    }

    /// Advance `entity` one step. Returns `(from, to)` when a transition happened.
    ///
    /// Entities without a slot are left alone. A missing handler leaves the
    /// slot untouched and reports [`SimError::UnregisteredState`].
    pub fn step(
        &self,
        entity: &mut Entity,
        ctx: &mut StateContext<'_>,
    ) -> SimResult<Option<(StateId, StateId)>> {
        let Some(mut slot) = entity.state.take() else {
            return Ok(None);
        };
        let current = match self.handler(slot.id) {
            Ok(h) => h,
            Err(e) => {
                entity.state = Some(slot);
                return Err(e);
            }
        };

        let next = current.update(entity, &mut slot.data, ctx);
        if next == slot.id {
            entity.state = Some(slot);
            return Ok(None);
        }
        let incoming = match self.handler(next) {
            Ok(h) => h,
            Err(e) => {
                entity.state = Some(slot);
                return Err(e);
            }
        };

        current.on_exit(entity, ctx);
        let payload = incoming.on_enter(entity, ctx);
        entity.state = Some(StateSlot {
            id: next,
            data: StateData {
                entered_at: ctx.now,
                previous_state: Some(slot.id),
                payload,
            },
        });
        Ok(Some((slot.id, next)))
    }
}

/// The state a character should be in to carry out `action`.
pub fn state_for(action: Action) -> StateId {
    match action {
        Action::Idle => StateId::Idle,
        Action::Moving => StateId::Moving,
        Action::Eating => StateId::Eating,
        Action::Gathering => StateId::Gathering,
        Action::Depositing => StateId::Depositing,
        Action::Retrieving => StateId::Retrieving,
        Action::Procreating => StateId::Procreating,
        Action::Attacking => StateId::Attacking,
        Action::Throwing => StateId::Throwing,
        Action::Planting => StateId::Planting,
        Action::Chopping => StateId::Chopping,
        Action::Dismantling => StateId::Dismantling,
        Action::Fleeing => StateId::Fleeing,
    }
}

/// Every kind's state table.
#[derive(Debug)]
pub struct StateMachines {
    tables: HashMap<EntityKind, StateTable>,
}

impl Default for StateMachines {
    fn default() -> Self {
        Self::standard()
    }
}

impl StateMachines {
    /// No tables at all.
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Tables for humans, predators, prey, trees and bushes.
    pub fn standard() -> Self {
        let mut machines = Self::empty();
        machines.insert(human::table());
        machines.insert(animal::predator_table());
        machines.insert(animal::prey_table());
        machines.insert(plant::table(EntityKind::Tree));
        machines.insert(plant::table(EntityKind::BerryBush));
        machines
    }

    /// Install or replace the table for its kind.
    pub fn insert(&mut self, table: StateTable) {
        self.tables.insert(table.kind(), table);
    }

    /// Table for `kind`.
    pub fn table(&self, kind: EntityKind) -> Option<&StateTable> {
        self.tables.get(&kind)
    }

    /// Whether a character of `kind` can take up `action`.
    pub fn supports(&self, kind: EntityKind, action: Action) -> bool {
        self.table(kind)
            .is_some_and(|t| t.contains(state_for(action)))
    }
}

/// Runs every entity's state machine once per sub-step.
#[derive(Debug, Default)]
pub struct StateMachineSystem {
    machines: StateMachines,
}

impl StateMachineSystem {
    /// A system running the standard tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// A system running custom tables.
    pub fn with_machines(machines: StateMachines) -> Self {
        Self { machines }
    }

    /// The installed tables.
    pub fn machines(&self) -> &StateMachines {
        &self.machines
    }

    fn step_one(&self, id: EntityId, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let Some(mut entity) = ctx.world.entities.take(id) else {
            return Ok(());
        };
        if entity.state.is_none() {
            ctx.world.entities.restore(entity);
            return Ok(());
        }
        let kind = entity.kind();
        let Some(table) = self.machines.table(kind) else {
            let state = entity.state_id().unwrap_or(StateId::Idle);
            ctx.world.entities.restore(entity);
            return Err(SimError::UnregisteredState { kind, state });
        };

        let mut sctx = StateContext::new(&*ctx.world, ctx.rules(), ctx.dt(), ctx.dt_hours());
        let result = table.step(&mut entity, &mut sctx);
        let requests = sctx.take_requests();
        ctx.world.entities.restore(entity);

        if let Some((from, to)) = result? {
            tracing::debug!(entity = %id, %kind, %from, %to, "state transition");
        }
        for (time, kind) in requests {
            tracing::trace!(entity = %id, event = kind.label(), time, "scheduled by state");
            ctx.world.scheduled.push(time, kind);
        }
        Ok(())
    }
}

impl System for StateMachineSystem {
    fn name(&self) -> &str {
        "state_machine"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        for id in ctx.world.entities.ids() {
            self.step_one(id, ctx)?;
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
    use tw_core::component::{Gender, Target};
    use tw_core::vector::{MapSize, Vec2};

    use crate::config::SimConfig;
    use crate::factory;

    #[derive(Debug)]
    struct Countdown;

    impl StateHandler for Countdown {
        fn update(&self, _e: &mut Entity, data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
            if data.elapsed(ctx.now) >= 1.0 {
                StateId::Moving
            } else {
                StateId::Idle
            }
        }
    }

    #[derive(Debug)]
    struct Arrived;

    impl StateHandler for Arrived {
        fn on_enter(&self, _e: &mut Entity, _ctx: &mut StateContext<'_>) -> StatePayload {
            StatePayload::Timer { next_at: 5.0 }
        }

        fn update(&self, _e: &mut Entity, _d: &mut StateData, _ctx: &mut StateContext<'_>) -> StateId {
            StateId::Moving
        }
    }

    fn world() -> World {
        World::new(MapSize::new(200.0, 200.0).unwrap(), 20.0).unwrap()
    }

    fn step_at(
        table: &StateTable,
        entity: &mut Entity,
        world: &mut World,
        time: f64,
    ) -> SimResult<Option<(StateId, StateId)>> {
        world.time = time;
        let rules = RulesConfig::default();
        let mut ctx = StateContext::new(world, &rules, 0.1, 0.01);
        table.step(entity, &mut ctx)
    }

    #[test]
    fn transition_stamps_entry_time() {
        let mut w = world();
        let id = factory::spawn_human(&mut w, Vec2::ZERO, Gender::Male, 20.0, None);
        let table = StateTable::new(EntityKind::Human)
            .with(StateId::Idle, Countdown)
            .with(StateId::Moving, Arrived);
        let mut e = w.entities.take(id).unwrap();

        assert_eq!(step_at(&table, &mut e, &mut w, 0.5).unwrap(), None);

        let change = step_at(&table, &mut e, &mut w, 2.0).unwrap();
        assert_eq!(change, Some((StateId::Idle, StateId::Moving)));
        let slot = e.state.as_ref().unwrap();
        assert_eq!(slot.data.entered_at, 2.0);
        assert_eq!(slot.data.previous_state, Some(StateId::Idle));
        assert_eq!(slot.data.payload, StatePayload::Timer { next_at: 5.0 });

        step_at(&table, &mut e, &mut w, 3.0).unwrap();
        assert_eq!(e.state.as_ref().unwrap().data.entered_at, 2.0);
    }

    type Outcome = (Option<(StateId, StateId)>, Entity, Vec<(f64, ScheduledEventKind)>);

    fn step_copy(table: &StateTable, entity: &Entity, world: &World) -> Outcome {
        let rules = RulesConfig::default();
        let mut copy = entity.clone();
        let mut ctx = StateContext::new(world, &rules, 0.1, 0.01);
        let change = table.step(&mut copy, &mut ctx).unwrap();
        (change, copy, ctx.take_requests())
    }

    fn steps_alike(table: &StateTable, entity: &mut Entity, world: &World) -> Option<(StateId, StateId)> {
        let first = step_copy(table, entity, world);
        let second = step_copy(table, entity, world);
        assert_eq!(first, second);
        *entity = first.1;
        first.0
    }

    #[test]
    fn identical_inputs_step_identically() {
        let table = human::table();
        let mut w = world();
        let map = w.map;
        w.navigation.block_circle(&map, Vec2::new(100.0, 100.0), 25.0);

        let id = factory::spawn_human(&mut w, Vec2::new(100.0, 40.0), Gender::Female, 20.0, None);
        let mut walker = w.entities.take(id).unwrap();
        walker
            .character_mut()
            .unwrap()
            .set_intent(Action::Moving, Some(Target::Position(Vec2::new(100.0, 160.0))));
        assert_eq!(
            steps_alike(&table, &mut walker, &w),
            Some((StateId::Idle, StateId::Moving))
        );
        assert!(matches!(
            walker.state.as_ref().unwrap().data.payload,
            StatePayload::Route { .. }
        ));
        assert_eq!(steps_alike(&table, &mut walker, &w), None);

        let spot = Vec2::new(60.0, 60.0);
        let id = factory::spawn_human(&mut w, spot, Gender::Male, 20.0, None);
        let mut planter = w.entities.take(id).unwrap();
        planter
            .character_mut()
            .unwrap()
            .set_intent(Action::Planting, Some(Target::Position(spot)));
        assert_eq!(
            steps_alike(&table, &mut planter, &w),
            Some((StateId::Idle, StateId::Planting))
        );
        let planting_hours = RulesConfig::default().planting_hours;
        assert_eq!(
            planter.state.as_ref().unwrap().data.payload,
            StatePayload::Timer { next_at: w.time + planting_hours }
        );
        assert_eq!(steps_alike(&table, &mut planter, &w), None);

        w.time += planting_hours;
        let rules = RulesConfig::default();
        let mut ctx = StateContext::new(&w, &rules, 0.1, 0.01);
        let mut again = planter.clone();
        table.step(&mut again, &mut ctx).unwrap();
        let expected = ctx.take_requests();
        assert_eq!(expected.len(), 1);
        let (change, done, requests) = step_copy(&table, &planter, &w);
        assert_eq!(change, Some((StateId::Planting, StateId::Idle)));
        assert_eq!(done, again);
        assert_eq!(requests, expected);
    }

    #[test]
    fn missing_handler_is_reported() {
        let mut w = world();
        let id = factory::spawn_human(&mut w, Vec2::ZERO, Gender::Male, 20.0, None);
        let table = StateTable::new(EntityKind::Human).with(StateId::Idle, Countdown);
        let mut e = w.entities.take(id).unwrap();
        let err = step_at(&table, &mut e, &mut w, 5.0).unwrap_err();
        assert!(matches!(
            err,
            SimError::UnregisteredState {
                kind: EntityKind::Human,
                state: StateId::Moving
            }
        ));
        assert_eq!(e.state_id(), Some(StateId::Idle));
    }

    #[test]
    fn standard_tables_cover_their_graphs() {
        let machines = StateMachines::standard();
        let human = machines.table(EntityKind::Human).unwrap();
        for action in [
            Action::Idle,
            Action::Moving,
            Action::Eating,
            Action::Gathering,
            Action::Depositing,
            Action::Retrieving,
            Action::Procreating,
            Action::Attacking,
            Action::Throwing,
            Action::Planting,
            Action::Chopping,
            Action::Dismantling,
        ] {
            assert!(human.contains(state_for(action)), "human lacks {action}");
        }
        assert!(!machines.supports(EntityKind::Human, Action::Fleeing));
        assert!(machines.supports(EntityKind::Prey, Action::Fleeing));
        assert!(!machines.supports(EntityKind::Prey, Action::Attacking));
        assert!(machines.supports(EntityKind::Predator, Action::Attacking));
        for kind in [EntityKind::Tree, EntityKind::BerryBush] {
            let plant = machines.table(kind).unwrap();
            assert_eq!(
                plant.states(),
                vec![
                    StateId::Growing,
                    StateId::Full,
                    StateId::Spreading,
                    StateId::Fallen,
                    StateId::Stump,
                    StateId::Dying
                ]
            );
        }
    }

    #[test]
    fn system_steps_every_slotted_entity() {
        let config = SimConfig::default();
        let mut w = world();
        let human = factory::spawn_human(&mut w, Vec2::ZERO, Gender::Male, 20.0, None);
        let bush = factory::spawn_bush(&mut w, Vec2::new(50.0, 50.0), true, 0, &config.rules);
        factory::spawn_corpse(&mut w, Vec2::ZERO, EntityKind::Prey, Default::default(), 1);

        let mut clock = crate::clock::SimClock::new(0.1, 0.1, 0.25);
        clock.advance(0.1);
        let mut events = crate::event::EventLog::new(0);
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(1);
        let mut ctx = SimContext {
            world: &mut w,
            clock: &clock,
            events: &mut events,
            rng: &mut rng,
            config: &config,
        };
        let mut system = StateMachineSystem::new();
        system.tick(&mut ctx).unwrap();

        assert_eq!(w.entities.len(), 3);
        assert_eq!(w.entities.get(human).unwrap().state_id(), Some(StateId::Idle));
        assert_eq!(w.entities.get(bush).unwrap().state_id(), Some(StateId::Full));
    }
}

use rand::SeedableRng;
use rand::rngs::StdRng;
use tw_core::component::{Action, Target};
use tw_core::effects::VisualEffect;
use tw_core::entity::{EntityId, EntityKind};
use tw_core::tribe::{Stance, StrategicObjective, TribeId};
use tw_core::world::World;

use crate::ai::AiSystem;
use crate::bookkeeping::BookkeepingSystem;
use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, SimEvent, SimEventKind};
use crate::interaction::InteractionSystem;
use crate::lifecycle::LifecycleSystem;
use crate::physics::PhysicsSystem;
use crate::scheduled::ScheduledEventSystem;
use crate::spawn;
use crate::state_machine::{StateMachineSystem, StateMachines};
use crate::system::{System, Vacant};

/// The top-level simulation orchestrator.
///
/// Owns the world, clock, RNG, configuration, notification log and
/// registered systems. Real time handed to [`advance`](Self::advance) is
/// clamped and cut into fixed sub-steps; every sub-step runs each system
/// once, in registration order.
pub struct Simulation {
    world: World,
    clock: SimClock,
    rng: StdRng,
    events: EventLog,
    config: SimConfig,
    systems: Vec<Box<dyn System>>,
    initialized: bool,
    paused: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.clock.tick())
            .field("time", &self.world.time)
            .field("entities", &self.world.entities.len())
            .field("systems", &self.systems.len())
            .field("events", &self.events.len())
            .field("paused", &self.paused)
            .finish()
    }
}

impl Simulation {
    /// Create a simulation with no systems registered.
    pub fn new(world: World, config: SimConfig) -> Self {
        let clock = SimClock::new(
            config.hours_per_second,
            config.max_step_seconds,
            config.max_real_delta_seconds,
        );
        let rng = StdRng::seed_from_u64(config.seed);
        let events = EventLog::new(config.max_events);
        Self {
            world,
            clock,
            rng,
            events,
            config,
            systems: Vec::new(),
            initialized: false,
            paused: false,
        }
    }

    /// Create a simulation over `world` running the full pipeline: physics,
    /// lifecycle, AI, state machines, interactions, scheduled events and
    /// bookkeeping.
    pub fn standard(world: World, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let interactions = InteractionSystem::standard(&config.rules);
        let mut sim = Self::new(world, config);
        sim.add_system(PhysicsSystem::new());
        sim.add_system(LifecycleSystem::new());
        sim.add_system(AiSystem::new());
        sim.add_system(StateMachineSystem::new());
        sim.add_system(interactions);
        sim.add_system(ScheduledEventSystem::new());
        sim.add_system(BookkeepingSystem::new());
        Ok(sim)
    }

    /// Build a flat world from `config`, seed its population and wrap it in
    /// the full pipeline.
    pub fn from_config(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let world = World::new(config.map, config.cell_size)?;
        let mut sim = Self::standard(world, config)?;
        spawn::populate(
            &mut sim.world,
            &mut sim.rng,
            &sim.config.population,
            &sim.config.rules,
        );
        Ok(sim)
    }

    /// Register a system. Systems are ticked in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Initialize all registered systems.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.run_systems(|system, ctx| system.init(ctx))?;
        self.initialized = true;
        Ok(())
    }

    /// Run one sub-step of `seconds` real time, regardless of pause.
    pub fn step(&mut self, seconds: f64) -> SimResult<()> {
        if !self.initialized {
            self.init()?;
        }

        let tick = self.clock.advance(seconds);
        self.world.time += seconds * self.config.hours_per_second;
        tracing::trace!(tick, time = self.world.time, "sub-step");

        self.run_systems(|system, ctx| system.tick(ctx))
    }

    /// Hand each system, in order, a fresh context over the simulation's
    /// state. A system is moved out of its slot while it runs so it can
    /// borrow the rest of `self` mutably.
    fn run_systems<F>(&mut self, mut f: F) -> SimResult<()>
    where
        F: FnMut(&mut Box<dyn System>, &mut SimContext<'_>) -> SimResult<()>,
    {
        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(Vacant));
            let mut ctx = SimContext {
                world: &mut self.world,
                clock: &self.clock,
                events: &mut self.events,
                rng: &mut self.rng,
                config: &self.config,
            };
            let result = f(&mut system, &mut ctx);
            self.systems[i] = system;
            result?;
        }
        Ok(())
    }

    /// Consume `real_delta` seconds of real time in bounded sub-steps.
    ///
    /// Returns the number of sub-steps run. Paused simulations, zero and
    /// non-finite deltas run none.
    pub fn advance(&mut self, real_delta: f64) -> SimResult<usize> {
        if self.paused {
            return Ok(0);
        }
        let steps = self.clock.split(real_delta);
        for seconds in &steps {
            self.step(*seconds)?;
        }
        Ok(steps.len())
    }

    /// Run full-length sub-steps until `hours` of world time have passed.
    ///
    /// Returns the number of sub-steps run.
    pub fn run_hours(&mut self, hours: f64) -> SimResult<u64> {
        if self.paused || !hours.is_finite() || hours <= 0.0 {
            return Ok(0);
        }
        let step = self.config.max_step_seconds;
        let steps = (hours / (step * self.config.hours_per_second)).ceil() as u64;
        for _ in 0..steps {
            self.step(step)?;
        }
        Ok(steps)
    }

    /// Stop [`advance`](Self::advance) from moving time.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Let time move again.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the simulation is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set a character's intent. Honored from the next sub-step on.
    ///
    /// Attacks and throws aimed at an entity also set the attack target.
    pub fn set_action(&mut self, id: EntityId, action: Action, target: Option<Target>) -> SimResult<()> {
        let kind = self.kind_of(id)?;
        let supported = match self.get_system::<StateMachineSystem>() {
            Some(system) => system.machines().supports(kind, action),
            None => StateMachines::standard().supports(kind, action),
        };
        if !supported || !kind.is_character() {
            return Err(SimError::WrongKind {
                entity: id,
                kind,
                action: action.as_str(),
            });
        }
        let entity = self.world.entity_mut(id)?;
        if let Some(c) = entity.character_mut() {
            c.set_intent(action, target);
            if matches!(action, Action::Attacking | Action::Throwing)
                && let Some(Target::Entity(victim)) = target
            {
                c.attack_target = Some(victim);
            }
        }
        tracing::debug!(entity = %id, %action, "intent set by command");
        Ok(())
    }

    /// Put `id` under player control. Any previous player goes back to the AI.
    pub fn set_player(&mut self, id: EntityId) -> SimResult<()> {
        let kind = self.kind_of(id)?;
        if kind != EntityKind::Human {
            return Err(SimError::WrongKind {
                entity: id,
                kind,
                action: "be player-controlled",
            });
        }
        for e in self.world.entities.iter_mut() {
            if let Some(h) = e.human_mut() {
                h.is_player = false;
            }
        }
        if let Some(h) = self.world.entity_mut(id)?.human_mut() {
            h.is_player = true;
        }
        Ok(())
    }

    /// Hand every human back to the AI.
    pub fn release_player(&mut self) {
        for e in self.world.entities.iter_mut() {
            if let Some(h) = e.human_mut() {
                h.is_player = false;
            }
        }
    }

    /// The player-controlled human, if any.
    pub fn player(&self) -> Option<EntityId> {
        self.world
            .entities
            .iter_kind(EntityKind::Human)
            .find(|e| e.human().is_some_and(|h| h.is_player))
            .map(|e| e.id())
    }

    /// Flip the stance between two tribes.
    pub fn toggle_stance(&mut self, a: TribeId, b: TribeId) -> SimResult<Stance> {
        for tribe in [a, b] {
            if !self.world.tribes.contains(tribe) {
                return Err(SimError::TribeNotFound(tribe));
            }
        }
        let stance = self.world.tribes.toggle(a, b);
        tracing::info!(%a, %b, %stance, "stance changed");
        self.notify(
            SimEventKind::StanceChanged { a, b, stance },
            format!("{a} and {b} are now {stance}"),
        );
        Ok(stance)
    }

    /// Point a tribe at a new objective.
    pub fn set_objective(&mut self, tribe: TribeId, objective: StrategicObjective) -> SimResult<()> {
        let info = self
            .world
            .tribes
            .get_mut(tribe)
            .ok_or(SimError::TribeNotFound(tribe))?;
        info.objective = objective;
        tracing::info!(%tribe, %objective, "objective changed");
        self.notify(
            SimEventKind::ObjectiveChanged { tribe, objective },
            format!("{tribe} turns to {objective}"),
        );
        Ok(())
    }

    fn kind_of(&self, id: EntityId) -> SimResult<EntityKind> {
        self.world
            .entities
            .get(id)
            .map(|e| e.kind())
            .ok_or(SimError::EntityNotFound(id))
    }

    fn notify(&mut self, kind: SimEventKind, description: String) {
        self.events.push(SimEvent::new(
            self.clock.tick(),
            self.world.time,
            kind,
            description,
        ));
    }

    /// The world being simulated.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setting up scenarios between steps.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The tick counter and time conversion.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The configuration this run was built from.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Notifications raised so far, oldest first.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take every notification raised so far.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Take every live visual effect.
    pub fn drain_effects(&mut self) -> Vec<VisualEffect> {
        self.world.effects.drain()
    }

    /// World time in hours.
    pub fn time(&self) -> f64 {
        self.world.time
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }

    /// Names of the registered systems, in run order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Extract the world, consuming the simulation.
    pub fn into_world(self) -> World {
        self.world
    }

    /// Number of sub-steps run so far.
    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }
}

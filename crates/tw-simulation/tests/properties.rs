//! Property-based tests for the clock, integration and needs.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use tw_core::component::Gender;
use tw_core::entity::{EntityId, EntityKind};
use tw_core::scheduled::{ScheduledEventKind, ScheduledQueue};
use tw_core::vector::{MapSize, Vec2};
use tw_core::world::World;
use tw_simulation::config::PopulationConfig;
use tw_simulation::lifecycle::LifecycleSystem;
use tw_simulation::physics::{self, PhysicsSystem};
use tw_simulation::{SimClock, SimConfig, Simulation, factory};

fn world(w: f64, h: f64) -> World {
    World::new(MapSize::new(w, h).unwrap(), 20.0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Sub-steps never exceed the maximum and add up to the clamped delta.
    #[test]
    fn prop_split_covers_clamped_delta(
        delta in 0.0..2.0f64,
        max_step in 0.001..0.1f64,
        clamp in 0.05..1.0f64,
    ) {
        let clock = SimClock::new(0.1, max_step, clamp);
        let steps = clock.split(delta);
        let total: f64 = steps.iter().sum();
        prop_assert!(steps.iter().all(|s| *s > 0.0 && *s <= max_step + 1e-12));
        prop_assert!((total - delta.min(clamp)).abs() < 1e-9);
    }

    /// Integration keeps every entity on the torus.
    #[test]
    fn prop_integration_stays_on_map(
        x in 0.0..400.0f64, y in 0.0..300.0f64,
        vx in -5000.0..5000.0f64, vy in -5000.0..5000.0f64,
        angle in 0.0..std::f64::consts::TAU,
        thrust in 0.0..500.0f64,
        dt in 0.0..0.2f64,
    ) {
        let mut w = world(400.0, 300.0);
        let id = factory::spawn_prey(&mut w, Vec2::new(x, y), Gender::Female, 5.0);
        let map = w.map;
        let entity = w.entities.get_mut(id).unwrap();
        entity.velocity = Vec2::new(vx, vy);
        entity.direction = Vec2::from_angle(angle);
        entity.acceleration = thrust;

        for _ in 0..20 {
            physics::integrate(entity, &map, dt, 0.0);
            prop_assert!(map.contains(entity.position));
            prop_assert!(entity.velocity.is_finite());
            prop_assert!(entity.forces.is_empty());
        }
    }

    /// Cooldowns count down to zero and never below it.
    #[test]
    fn prop_cooldowns_never_negative(
        attack in 0.0..5.0f64,
        procreation in 0.0..50.0f64,
        steps in 1usize..60,
    ) {
        let mut w = world(500.0, 500.0);
        let id = factory::spawn_human(&mut w, Vec2::new(50.0, 50.0), Gender::Male, 25.0, None);
        {
            let c = w.entities.get_mut(id).unwrap().character_mut().unwrap();
            c.attack_cooldown = attack;
            c.procreation_cooldown = procreation;
        }
        let mut sim = Simulation::new(w, SimConfig::default());
        sim.add_system(PhysicsSystem::new());
        sim.add_system(LifecycleSystem::new());
        for _ in 0..steps {
            sim.step(1.0 / 30.0).unwrap();
            let c = sim.world().entities.get(id).unwrap().character().unwrap();
            prop_assert!(c.attack_cooldown >= 0.0);
            prop_assert!(c.procreation_cooldown >= 0.0);
            prop_assert!(c.attack_cooldown <= attack);
        }
    }

    /// Due events leave the queue in order; the rest stay pending.
    #[test]
    fn prop_take_due_partitions_the_queue(
        times in proptest::collection::vec(0.0..100.0f64, 0..30),
        now in 0.0..100.0f64,
    ) {
        let mut queue = ScheduledQueue::new();
        for t in &times {
            queue.push(*t, ScheduledEventKind::SpreadPlant {
                parent: EntityId(1),
                kind: EntityKind::Tree,
            });
        }
        let due = queue.take_due(now);
        prop_assert!(due.iter().all(|e| e.scheduled_time <= now));
        prop_assert!(queue.pending().iter().all(|e| e.scheduled_time > now));
        prop_assert_eq!(due.len() + queue.len(), times.len());
        prop_assert!(due.windows(2).all(|p| p[0].id < p[1].id));
        prop_assert!(queue.take_due(now).is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Equal seeds give equal worlds after a short run.
    #[test]
    fn prop_seeded_runs_are_deterministic(seed in any::<u64>()) {
        let config = SimConfig::default()
            .with_seed(seed)
            .with_map(MapSize::new(600.0, 600.0).unwrap())
            .with_population(PopulationConfig {
                humans: 4,
                predators: 1,
                prey: 3,
                trees: 4,
                bushes: 4,
            });
        let run = || {
            let mut sim = Simulation::from_config(config.clone()).unwrap();
            for _ in 0..30 {
                sim.advance(0.05).unwrap();
            }
            sim.world()
                .entities
                .iter()
                .map(|e| (e.id(), e.position, e.velocity))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(run(), run());
    }
}

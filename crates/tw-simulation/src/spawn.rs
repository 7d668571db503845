//! Initial population.
//!
//! Humans are split between two founding tribes settled on opposite
//! quarters of the map, each around a finished storage spot. Animals and
//! plants are scattered uniformly; plants avoid cells blocked by buildings.

use rand::Rng;
use tw_core::component::{BuildingType, Gender};
use tw_core::tribe::TribeId;
use tw_core::vector::Vec2;
use tw_core::world::World;

use crate::config::{PopulationConfig, RulesConfig};
use crate::factory;

/// Radius around a tribe's home its founders are scattered in.
const SETTLEMENT_RADIUS: f64 = 80.0;

/// Berries a seeded bush may start with.
const MAX_SEED_BERRIES: usize = 4;

fn random_position(world: &World, rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(0.0..world.map.width),
        rng.random_range(0.0..world.map.height),
    )
}

fn open_position(world: &World, rng: &mut impl Rng) -> Vec2 {
    let mut pos = random_position(world, rng);
    for _ in 0..8 {
        if !world.navigation.is_blocked(pos) {
            break;
        }
        pos = random_position(world, rng);
    }
    pos
}

fn homes(world: &World, count: usize) -> Vec<Vec2> {
    let (w, h) = (world.map.width, world.map.height);
    [Vec2::new(w * 0.25, h * 0.25), Vec2::new(w * 0.75, h * 0.75)]
        .into_iter()
        .take(count)
        .collect()
}

fn settle(
    world: &mut World,
    rng: &mut impl Rng,
    home: Vec2,
    founders: usize,
    rules: &RulesConfig,
) -> TribeId {
    let leader = factory::spawn_human(world, home, Gender::Male, rules.adult_age * 2.0, None);
    let tribe = world.tribes.found(leader, world.time);
    if let Some(h) = world.entities.get_mut(leader).and_then(|e| e.human_mut()) {
        h.tribe = Some(tribe);
    }
    factory::spawn_building(world, home, BuildingType::StorageSpot, Some(tribe), true);
    for i in 1..founders {
        let angle = rng.random_range(0.0..std::f64::consts::TAU);
        let reach = rng.random_range(0.3..1.0) * SETTLEMENT_RADIUS;
        let gender = if i % 2 == 1 {
            Gender::Female
        } else {
            Gender::Male
        };
        let age = rng.random_range(rules.adult_age..rules.elder_age);
        let position = home + Vec2::from_angle(angle) * reach;
        factory::spawn_human(world, position, gender, age, Some(tribe));
    }
    tribe
}

/// Fill `world` with the configured population. Returns the founded tribes.
pub fn populate(
    world: &mut World,
    rng: &mut impl Rng,
    population: &PopulationConfig,
    rules: &RulesConfig,
) -> Vec<TribeId> {
    let tribe_count = population.humans.min(2);
    let mut tribes = Vec::with_capacity(tribe_count);
    for (i, home) in homes(world, tribe_count).into_iter().enumerate() {
        let extra = usize::from(i < population.humans % tribe_count);
        let founders = population.humans / tribe_count + extra;
        tribes.push(settle(world, rng, home, founders, rules));
    }
    world.refresh_obstacles();

    for _ in 0..population.predators {
        let pos = random_position(world, rng);
        let gender = factory::random_gender(rng);
        let age = rng.random_range(rules.adult_age..factory::ANIMAL_MAX_AGE * 0.8);
        factory::spawn_predator(world, pos, gender, age);
    }
    for _ in 0..population.prey {
        let pos = random_position(world, rng);
        let gender = factory::random_gender(rng);
        let age = rng.random_range(rules.adult_age..factory::ANIMAL_MAX_AGE * 0.8);
        factory::spawn_prey(world, pos, gender, age);
    }
    for _ in 0..population.trees {
        let pos = open_position(world, rng);
        factory::spawn_tree(world, pos, true, rules);
    }
    for _ in 0..population.bushes {
        let pos = open_position(world, rng);
        let berries = rng.random_range(0..=MAX_SEED_BERRIES);
        factory::spawn_bush(world, pos, true, berries, rules);
    }

    tracing::info!(
        humans = population.humans,
        predators = population.predators,
        prey = population.prey,
        trees = population.trees,
        bushes = population.bushes,
        tribes = tribes.len(),
        "world populated"
    );
    tribes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tw_core::entity::EntityKind;
    use tw_core::vector::MapSize;

    fn seeded(seed: u64, population: &PopulationConfig) -> (World, Vec<TribeId>) {
        let mut world = World::new(MapSize::new(1200.0, 900.0).unwrap(), 20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let tribes = populate(&mut world, &mut rng, population, &RulesConfig::default());
        (world, tribes)
    }

    #[test]
    fn counts_match_the_config() {
        let population = PopulationConfig::default();
        let (world, tribes) = seeded(1, &population);
        let counts = world.entities.counts_by_kind();
        assert_eq!(counts[&EntityKind::Human], population.humans);
        assert_eq!(counts[&EntityKind::Predator], population.predators);
        assert_eq!(counts[&EntityKind::Prey], population.prey);
        assert_eq!(counts[&EntityKind::Tree], population.trees);
        assert_eq!(counts[&EntityKind::BerryBush], population.bushes);
        assert_eq!(counts[&EntityKind::Building], 2);
        assert_eq!(tribes.len(), 2);
        assert!(world.entities.iter().all(|e| world.map.contains(e.position)));
    }

    #[test]
    fn every_tribe_is_led_by_a_member() {
        let population = PopulationConfig {
            humans: 7,
            ..PopulationConfig::default()
        };
        let (world, tribes) = seeded(2, &population);
        let sizes: Vec<usize> = tribes.iter().map(|t| world.tribe_members(*t).len()).collect();
        assert_eq!(sizes, vec![4, 3]);
        for tribe in tribes {
            let leader = world.tribes.get(tribe).unwrap().leader;
            assert!(world.tribe_members(tribe).contains(&leader));
        }
    }

    #[test]
    fn a_lone_human_still_founds_a_tribe() {
        let population = PopulationConfig {
            humans: 1,
            ..PopulationConfig::default()
        };
        assert_eq!(seeded(3, &population).1.len(), 1);
        let nobody = PopulationConfig {
            humans: 0,
            ..PopulationConfig::default()
        };
        assert!(seeded(3, &nobody).1.is_empty());
    }

    #[test]
    fn same_seed_same_world() {
        let population = PopulationConfig::default();
        let positions = |seed| {
            let (world, _) = seeded(seed, &population);
            world.entities.iter().map(|e| e.position).collect::<Vec<_>>()
        };
        assert_eq!(positions(9), positions(9));
        assert_ne!(positions(9), positions(10));
    }
}

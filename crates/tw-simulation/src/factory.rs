//! Factory functions. Every entity enters the world through one of these,
//! which assign the next id, fill kind defaults, and attach the initial
//! state-machine slot or behavior blackboard.

use rand::Rng;
use tw_core::blackboard::Blackboard;
use tw_core::component::{
    AnimalData, ArrowData, BuildingData, BuildingType, CharacterData, CorpseData, EntityData,
    FoodItem, FoodKind, Gender, HumanData, Inventory, PlantData,
};
use tw_core::entity::{EntityId, EntityKind};
use tw_core::state::{StateId, StateSlot};
use tw_core::tribe::TribeId;
use tw_core::vector::Vec2;
use tw_core::world::World;

use crate::config::RulesConfig;

/// Lifespan of predators and prey, in years.
pub const ANIMAL_MAX_AGE: f64 = 30.0;

/// Radius multiplier for characters that are not yet adults.
const CHILD_SCALE: f64 = 0.7;

/// A coin-flip gender for newborns and seeded populations.
pub fn random_gender(rng: &mut impl Rng) -> Gender {
    if rng.random_bool(0.5) {
        Gender::Female
    } else {
        Gender::Male
    }
}

/// Spawn a human, optionally as a member of `tribe`.
pub fn spawn_human(
    world: &mut World,
    position: Vec2,
    gender: Gender,
    age: f64,
    tribe: Option<TribeId>,
) -> EntityId {
    let now = world.time;
    let mut human = HumanData::new(CharacterData::new(gender, age));
    human.tribe = tribe;
    let entity = world
        .entities
        .create(EntityData::Human(human), world.map.wrap(position));
    entity.state = Some(StateSlot::new(StateId::Idle, now));
    entity.id()
}

/// Spawn a predator.
pub fn spawn_predator(world: &mut World, position: Vec2, gender: Gender, age: f64) -> EntityId {
    let now = world.time;
    let mut character = CharacterData::new(gender, age);
    character.max_age = ANIMAL_MAX_AGE;
    let entity = world.entities.create(
        EntityData::Predator(AnimalData::new(character)),
        world.map.wrap(position),
    );
    entity.state = Some(StateSlot::new(StateId::Idle, now));
    entity.id()
}

/// Spawn a prey animal. Prey decide through a behavior tree, so they also
/// get a blackboard.
pub fn spawn_prey(world: &mut World, position: Vec2, gender: Gender, age: f64) -> EntityId {
    let now = world.time;
    let mut character = CharacterData::new(gender, age);
    character.max_age = ANIMAL_MAX_AGE;
    let entity = world.entities.create(
        EntityData::Prey(AnimalData::new(character)),
        world.map.wrap(position),
    );
    entity.state = Some(StateSlot::new(StateId::Idle, now));
    entity.behavior = Some(Blackboard::new());
    entity.id()
}

/// Spawn a newborn of `kind` next to its mother.
pub fn spawn_child(
    world: &mut World,
    kind: EntityKind,
    position: Vec2,
    gender: Gender,
    mother: EntityId,
    father: Option<EntityId>,
    tribe: Option<TribeId>,
) -> Option<EntityId> {
    let id = match kind {
        EntityKind::Human => spawn_human(world, position, gender, 0.0, tribe),
        EntityKind::Predator => spawn_predator(world, position, gender, 0.0),
        EntityKind::Prey => spawn_prey(world, position, gender, 0.0),
        _ => return None,
    };
    if let Some(entity) = world.entities.get_mut(id) {
        entity.radius = kind.default_radius() * CHILD_SCALE;
        if let Some(c) = entity.character_mut() {
            c.mother = Some(mother);
            c.father = father;
        }
    }
    Some(id)
}

/// Spawn a tree, either as a sapling or fully grown.
pub fn spawn_tree(world: &mut World, position: Vec2, mature: bool, rules: &RulesConfig) -> EntityId {
    let mut plant = if mature {
        PlantData::mature(rules.tree_max_age)
    } else {
        PlantData::sapling(rules.tree_max_age)
    };
    plant.max_food = 0;
    plant.spread_timer = rules.tree_spread_hours;
    spawn_plant(world, EntityData::Tree(plant), position, mature)
}

/// Spawn a berry bush, either as a sapling or fully grown with `berries`.
pub fn spawn_bush(
    world: &mut World,
    position: Vec2,
    mature: bool,
    berries: usize,
    rules: &RulesConfig,
) -> EntityId {
    let now = world.time;
    let mut plant = if mature {
        PlantData::mature(rules.bush_max_age)
    } else {
        PlantData::sapling(rules.bush_max_age)
    };
    if mature {
        let count = berries.min(plant.max_food);
        plant.food = vec![FoodItem::new(FoodKind::Berry, now); count];
    }
    plant.regrow_timer = rules.berry_regrow_hours;
    plant.spread_timer = rules.bush_spread_hours;
    spawn_plant(world, EntityData::BerryBush(plant), position, mature)
}

fn spawn_plant(world: &mut World, data: EntityData, position: Vec2, mature: bool) -> EntityId {
    let now = world.time;
    let kind = data.kind();
    let entity = world.entities.create(data, world.map.wrap(position));
    if !mature {
        entity.radius = kind.default_radius() * 0.5;
    }
    let state = if mature { StateId::Full } else { StateId::Growing };
    entity.state = Some(StateSlot::new(state, now));
    entity.id()
}

/// Spawn a building, as a blueprint or already constructed.
pub fn spawn_building(
    world: &mut World,
    position: Vec2,
    building_type: BuildingType,
    tribe: Option<TribeId>,
    constructed: bool,
) -> EntityId {
    let data = if constructed {
        BuildingData::constructed(building_type, tribe)
    } else {
        BuildingData::blueprint(building_type, tribe)
    };
    world
        .entities
        .create(EntityData::Building(data), world.map.wrap(position))
        .id()
}

/// Spawn an arrow in flight.
///
/// The arrow keeps `velocity` against damping by accelerating along it, and
/// climbs with `vz` until gravity brings it down.
pub fn spawn_arrow(world: &mut World, position: Vec2, owner: EntityId, velocity: Vec2, vz: f64) -> EntityId {
    let entity = world.entities.create(
        EntityData::Arrow(ArrowData::new(owner, vz)),
        world.map.wrap(position),
    );
    entity.velocity = velocity;
    entity.direction = velocity.normalize_or(Vec2::UNIT_X);
    entity.acceleration = velocity.length() * crate::physics::DAMPING;
    entity.id()
}

/// Spawn the remains of a dead character.
pub fn spawn_corpse(
    world: &mut World,
    position: Vec2,
    original_kind: EntityKind,
    inventory: Inventory,
    meat: u32,
) -> EntityId {
    let now = world.time;
    world
        .entities
        .create(
            EntityData::Corpse(CorpseData::new(original_kind, inventory, meat, now)),
            world.map.wrap(position),
        )
        .id()
}

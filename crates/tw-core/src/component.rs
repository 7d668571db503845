//! Kind-specific payloads carried by [`Entity`](crate::entity::Entity).
//!
//! The simulation treats these as opaque except where a rule reads them.

use crate::entity::{EntityId, EntityKind};
use crate::tribe::TribeId;
use crate::vector::Vec2;

/// The payload for each entity kind. The variant *is* the kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityData {
    /// A tribe member.
    Human(HumanData),
    /// A carnivore.
    Predator(AnimalData),
    /// A grazer.
    Prey(AnimalData),
    /// A tree.
    Tree(PlantData),
    /// A berry bush.
    BerryBush(PlantData),
    /// A tribe structure.
    Building(BuildingData),
    /// A projectile.
    Arrow(ArrowData),
    /// Remains of a character.
    Corpse(CorpseData),
}

impl EntityData {
    /// The kind tag corresponding to this payload.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Human(_) => EntityKind::Human,
            Self::Predator(_) => EntityKind::Predator,
            Self::Prey(_) => EntityKind::Prey,
            Self::Tree(_) => EntityKind::Tree,
            Self::BerryBush(_) => EntityKind::BerryBush,
            Self::Building(_) => EntityKind::Building,
            Self::Arrow(_) => EntityKind::Arrow,
            Self::Corpse(_) => EntityKind::Corpse,
        }
    }
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// Biological sex, relevant to procreation and damage modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// Male.
    Male,
    /// Female; can become pregnant.
    Female,
}

impl Gender {
    /// The other gender.
    pub fn opposite(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }
}

/// Declarative intent set by AI or player commands and executed by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// Do nothing.
    #[default]
    Idle,
    /// Walk to a position.
    Moving,
    /// Eat from the carried inventory (or graze, for prey).
    Eating,
    /// Collect from a bush, tree or corpse.
    Gathering,
    /// Carry goods into a storage building or construction site.
    Depositing,
    /// Take goods out of a storage building.
    Retrieving,
    /// Seek a mate.
    Procreating,
    /// Melee the attack target.
    Attacking,
    /// Throw projectiles at the attack target.
    Throwing,
    /// Plant a bush at the target position.
    Planting,
    /// Fell the target tree.
    Chopping,
    /// Take apart the target building.
    Dismantling,
    /// Run away from a threat.
    Fleeing,
}

impl Action {
    /// Lowercase name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Eating => "eating",
            Self::Gathering => "gathering",
            Self::Depositing => "depositing",
            Self::Retrieving => "retrieving",
            Self::Procreating => "procreating",
            Self::Attacking => "attacking",
            Self::Throwing => "throwing",
            Self::Planting => "planting",
            Self::Chopping => "chopping",
            Self::Dismantling => "dismantling",
            Self::Fleeing => "fleeing",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Another entity.
    Entity(EntityId),
    /// A point on the map.
    Position(Vec2),
}

impl Target {
    /// The targeted entity, if the target is one.
    pub fn entity(self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(id),
            Self::Position(_) => None,
        }
    }
}

/// Kinds of food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodKind {
    /// From berry bushes.
    Berry,
    /// From corpses.
    Meat,
}

/// A single unit of food.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodItem {
    /// Where it came from.
    pub kind: FoodKind,
    /// World time (hours) when it was produced.
    pub created_at: f64,
}

impl FoodItem {
    /// Create a food item.
    pub fn new(kind: FoodKind, created_at: f64) -> Self {
        Self { kind, created_at }
    }
}

/// The one inventory shape used by characters, corpses, and storage buildings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    /// Food items, oldest first.
    pub food: Vec<FoodItem>,
    /// Wood units.
    pub wood: u32,
}

impl Inventory {
    /// Number of food items.
    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    /// Append a food item.
    pub fn add_food(&mut self, item: FoodItem) {
        self.food.push(item);
    }

    /// Remove the oldest food item.
    pub fn take_food(&mut self) -> Option<FoodItem> {
        if self.food.is_empty() {
            None
        } else {
            Some(self.food.remove(0))
        }
    }

    /// Remove up to `amount` wood, returning how much was taken.
    pub fn take_wood(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.wood);
        self.wood -= taken;
        taken
    }

    /// Total number of carried units (food items plus wood).
    pub fn total(&self) -> usize {
        self.food.len() + self.wood as usize
    }

    /// Returns `true` if nothing is carried.
    pub fn is_empty(&self) -> bool {
        self.food.is_empty() && self.wood == 0
    }

    /// Move everything out, leaving this inventory empty.
    pub fn take_all(&mut self) -> Inventory {
        std::mem::take(self)
    }

    /// Move everything from `other` into this inventory.
    pub fn merge(&mut self, other: Inventory) {
        self.food.extend(other.food);
        self.wood += other.wood;
    }
}

/// State shared by humans, predators, and prey.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterData {
    /// Current hitpoints; the entity dies at or below zero.
    pub hitpoints: f64,
    /// Maximum hitpoints.
    pub max_hitpoints: f64,
    /// Hunger in `0..=100`; starvation damage at 100.
    pub hunger: f64,
    /// Age in years.
    pub age: f64,
    /// Age at which the character dies of old age.
    pub max_age: f64,
    /// Biological sex.
    pub gender: Gender,
    /// Whether a pregnancy is in progress.
    pub is_pregnant: bool,
    /// Hours left until birth.
    pub gestation_time: f64,
    /// Hours until procreation is possible again.
    pub procreation_cooldown: f64,
    /// Hours until the next melee strike.
    pub attack_cooldown: f64,
    /// Hours until the next gather.
    pub gather_cooldown: f64,
    /// Hours until food can be shared again.
    pub feed_cooldown: f64,
    /// Current declarative intent.
    pub active_action: Action,
    /// Target of the current intent.
    pub target: Option<Target>,
    /// Entity this character is fighting.
    pub attack_target: Option<EntityId>,
    /// Most recent attacker, cleared once it is gone.
    pub last_attacker: Option<EntityId>,
    /// Carried goods.
    pub inventory: Inventory,
    /// Mother, if born in the simulation.
    pub mother: Option<EntityId>,
    /// Father, if born in the simulation.
    pub father: Option<EntityId>,
    /// Father of the current pregnancy.
    pub conceived_with: Option<EntityId>,
}

impl CharacterData {
    /// A healthy, fed character of the given gender and age.
    pub fn new(gender: Gender, age: f64) -> Self {
        Self {
            hitpoints: 100.0,
            max_hitpoints: 100.0,
            hunger: 0.0,
            age,
            max_age: 60.0,
            gender,
            is_pregnant: false,
            gestation_time: 0.0,
            procreation_cooldown: 0.0,
            attack_cooldown: 0.0,
            gather_cooldown: 0.0,
            feed_cooldown: 0.0,
            active_action: Action::Idle,
            target: None,
            attack_target: None,
            last_attacker: None,
            inventory: Inventory::default(),
            mother: None,
            father: None,
            conceived_with: None,
        }
    }

    /// Count every cooldown down by `hours`, clamping at zero.
    pub fn tick_cooldowns(&mut self, hours: f64) {
        for cd in [
            &mut self.procreation_cooldown,
            &mut self.attack_cooldown,
            &mut self.gather_cooldown,
            &mut self.feed_cooldown,
        ] {
            *cd = (*cd - hours).max(0.0);
        }
    }

    /// The targeted entity, if the current target is one.
    pub fn target_entity(&self) -> Option<EntityId> {
        self.target.and_then(Target::entity)
    }

    /// Replace the intent and its target in one write.
    pub fn set_intent(&mut self, action: Action, target: Option<Target>) {
        self.active_action = action;
        self.target = target;
    }

    /// Returns `true` if either id is a parent of this character.
    pub fn is_child_of(&self, id: EntityId) -> bool {
        self.mother == Some(id) || self.father == Some(id)
    }
}

/// Human-only state.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanData {
    /// Shared character state.
    pub character: CharacterData,
    /// Tribe membership.
    pub tribe: Option<TribeId>,
    /// Player-controlled humans are ignored by task AI.
    pub is_player: bool,
    /// Body temperature in degrees; hunger grows faster when cold.
    pub temperature: f64,
    /// Hours until the next throw.
    pub throw_cooldown: f64,
    /// Hours until the next chop, build or dismantle contribution.
    pub work_cooldown: f64,
}

impl HumanData {
    /// A tribeless, AI-controlled human.
    pub fn new(character: CharacterData) -> Self {
        Self {
            character,
            tribe: None,
            is_player: false,
            temperature: 37.0,
            throw_cooldown: 0.0,
            work_cooldown: 0.0,
        }
    }

    /// Count every cooldown down by `hours`, clamping at zero.
    pub fn tick_cooldowns(&mut self, hours: f64) {
        self.character.tick_cooldowns(hours);
        self.throw_cooldown = (self.throw_cooldown - hours).max(0.0);
        self.work_cooldown = (self.work_cooldown - hours).max(0.0);
    }
}

/// Predator- and prey-only state.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimalData {
    /// Shared character state.
    pub character: CharacterData,
    /// Threat currently being fled from.
    pub fleeing_from: Option<EntityId>,
}

impl AnimalData {
    /// Wrap character state as an animal.
    pub fn new(character: CharacterData) -> Self {
        Self {
            character,
            fleeing_from: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Plants
// ---------------------------------------------------------------------------

/// State shared by trees and berry bushes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantData {
    /// Age in hours.
    pub age: f64,
    /// Age in hours at which the plant starts dying.
    pub max_age: f64,
    /// Growth progress in `0..=1`; the plant is mature at 1.
    pub growth: f64,
    /// Berries on a bush.
    pub food: Vec<FoodItem>,
    /// Berries a full bush can hold.
    pub max_food: usize,
    /// Wood left on a fallen tree.
    pub wood: u32,
    /// Felling progress on a standing tree, `0..=1`.
    pub chop_progress: f64,
    /// Hours until the next berry or seed.
    pub regrow_timer: f64,
    /// Hours until the plant next tries to spread.
    pub spread_timer: f64,
    /// Set when the plant is finished and should be removed.
    pub is_dead: bool,
}

impl PlantData {
    /// A freshly sprouted plant.
    pub fn sapling(max_age: f64) -> Self {
        Self {
            age: 0.0,
            max_age,
            growth: 0.0,
            food: Vec::new(),
            max_food: 5,
            wood: 0,
            chop_progress: 0.0,
            regrow_timer: 0.0,
            spread_timer: 0.0,
            is_dead: false,
        }
    }

    /// A plant that starts fully grown.
    pub fn mature(max_age: f64) -> Self {
        Self {
            growth: 1.0,
            ..Self::sapling(max_age)
        }
    }

    /// Returns `true` once growth is complete.
    pub fn is_mature(&self) -> bool {
        self.growth >= 1.0
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// Kinds of tribe structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildingType {
    /// Holds tribe food and wood.
    StorageSpot,
    /// Shelter; extends territory further than other buildings.
    Dwelling,
    /// Warms nearby humans.
    Bonfire,
}

impl BuildingType {
    /// Wood needed to finish construction.
    pub fn wood_cost(self) -> u32 {
        match self {
            Self::StorageSpot => 4,
            Self::Dwelling => 8,
            Self::Bonfire => 2,
        }
    }

    /// Hitpoints once built.
    pub fn max_hitpoints(self) -> f64 {
        match self {
            Self::StorageSpot => 200.0,
            Self::Dwelling => 300.0,
            Self::Bonfire => 80.0,
        }
    }

    /// Radius of territory claimed once built.
    pub fn territory_radius(self) -> f64 {
        match self {
            Self::StorageSpot => 250.0,
            Self::Dwelling => 300.0,
            Self::Bonfire => 150.0,
        }
    }
}

impl std::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageSpot => write!(f, "storage spot"),
            Self::Dwelling => write!(f, "dwelling"),
            Self::Bonfire => write!(f, "bonfire"),
        }
    }
}

/// Building state.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingData {
    /// What kind of structure this is.
    pub building_type: BuildingType,
    /// Owning tribe, if any.
    pub tribe: Option<TribeId>,
    /// Construction progress in `0..=1`.
    pub construction_progress: f64,
    /// Wood delivered so far.
    pub wood_delivered: u32,
    /// Current hitpoints.
    pub hitpoints: f64,
    /// Maximum hitpoints.
    pub max_hitpoints: f64,
    /// Stored goods (storage spots only).
    pub storage: Inventory,
    /// Dismantling progress in `0..=1`.
    pub dismantle_progress: f64,
    /// Total siege damage taken.
    pub siege_damage: f64,
}

impl BuildingData {
    /// An unbuilt construction site.
    pub fn blueprint(building_type: BuildingType, tribe: Option<TribeId>) -> Self {
        let max_hitpoints = building_type.max_hitpoints();
        Self {
            building_type,
            tribe,
            construction_progress: 0.0,
            wood_delivered: 0,
            hitpoints: max_hitpoints,
            max_hitpoints,
            storage: Inventory::default(),
            dismantle_progress: 0.0,
            siege_damage: 0.0,
        }
    }

    /// A finished building.
    pub fn constructed(building_type: BuildingType, tribe: Option<TribeId>) -> Self {
        Self {
            construction_progress: 1.0,
            wood_delivered: building_type.wood_cost(),
            ..Self::blueprint(building_type, tribe)
        }
    }

    /// Returns `true` once construction is complete.
    pub fn is_constructed(&self) -> bool {
        self.construction_progress >= 1.0
    }
}

// ---------------------------------------------------------------------------
// Projectiles and remains
// ---------------------------------------------------------------------------

/// Projectile state. Height is simulated separately from the ground plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowData {
    /// Who threw it.
    pub owner: EntityId,
    /// Height above ground.
    pub z: f64,
    /// Vertical velocity; the arrow embeds once this reaches zero.
    pub vz: f64,
    /// Whether the arrow is stuck in the ground.
    pub is_embedded: bool,
    /// World time (hours) when it embedded.
    pub embedded_at: Option<f64>,
}

impl ArrowData {
    /// An arrow in flight.
    pub fn new(owner: EntityId, vz: f64) -> Self {
        Self {
            owner,
            z: 0.0,
            vz,
            is_embedded: false,
            embedded_at: None,
        }
    }
}

/// Remains of a dead character.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpseData {
    /// What the character was.
    pub original_kind: EntityKind,
    /// Everything the character carried.
    pub inventory: Inventory,
    /// Edible meat units left on the body.
    pub meat: u32,
    /// World time (hours) of death.
    pub died_at: f64,
}

impl CorpseData {
    /// Remains of a character of `original_kind`.
    pub fn new(original_kind: EntityKind, inventory: Inventory, meat: u32, died_at: f64) -> Self {
        Self {
            original_kind,
            inventory,
            meat,
            died_at,
        }
    }

    /// Returns `true` when nothing is left to take.
    pub fn is_exhausted(&self) -> bool {
        self.inventory.is_empty() && self.meat == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldowns_clamp_at_zero() {
        let mut c = CharacterData::new(Gender::Male, 20.0);
        c.attack_cooldown = 0.5;
        c.procreation_cooldown = 3.0;
        c.tick_cooldowns(1.0);
        assert_eq!(c.attack_cooldown, 0.0);
        assert!((c.procreation_cooldown - 2.0).abs() < 1e-12);
    }

    #[test]
    fn inventory_take_and_merge() {
        let mut a = Inventory::default();
        a.add_food(FoodItem::new(FoodKind::Berry, 1.0));
        a.add_food(FoodItem::new(FoodKind::Meat, 2.0));
        a.wood = 3;
        assert_eq!(a.take_food().map(|f| f.kind), Some(FoodKind::Berry));
        assert_eq!(a.take_wood(5), 3);
        let mut b = Inventory::default();
        b.merge(a.take_all());
        assert!(a.is_empty());
        assert_eq!(b.food_count(), 1);
    }

    #[test]
    fn blueprint_is_not_constructed() {
        let b = BuildingData::blueprint(BuildingType::StorageSpot, None);
        assert!(!b.is_constructed());
        assert!(BuildingData::constructed(BuildingType::Bonfire, None).is_constructed());
    }

    #[test]
    fn payload_kind_mapping() {
        let data = EntityData::Corpse(CorpseData::new(
            EntityKind::Prey,
            Inventory::default(),
            2,
            0.0,
        ));
        assert_eq!(data.kind(), EntityKind::Corpse);
    }
}

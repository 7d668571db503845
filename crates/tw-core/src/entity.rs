use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blackboard::Blackboard;
use crate::component::{
    AnimalData, ArrowData, BuildingData, CharacterData, CorpseData, EntityData, HumanData,
    Inventory, PlantData,
};
use crate::state::StateSlot;
use crate::vector::Vec2;

/// Upper bound on simultaneously active debuffs per entity.
pub const MAX_DEBUFFS: usize = 4;

/// Unique identifier for every entity. Assigned monotonically and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The immutable category of an entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A tribe member.
    Human,
    /// A carnivore hunting prey and humans.
    Predator,
    /// A grazing animal.
    Prey,
    /// A tree yielding wood once chopped.
    Tree,
    /// A bush bearing berries.
    BerryBush,
    /// A tribe structure.
    Building,
    /// A thrown projectile.
    Arrow,
    /// Remains of a dead character.
    Corpse,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 8] = [
        Self::Human,
        Self::Predator,
        Self::Prey,
        Self::Tree,
        Self::BerryBush,
        Self::Building,
        Self::Arrow,
        Self::Corpse,
    ];

    /// Collision radius used when a factory does not override it.
    pub fn default_radius(self) -> f64 {
        match self {
            Self::Human => 15.0,
            Self::Predator => 18.0,
            Self::Prey => 12.0,
            Self::Tree => 25.0,
            Self::BerryBush => 15.0,
            Self::Building => 40.0,
            Self::Arrow => 3.0,
            Self::Corpse => 12.0,
        }
    }

    /// Humans, predators and prey.
    pub fn is_character(self) -> bool {
        matches!(self, Self::Human | Self::Predator | Self::Prey)
    }

    /// Trees and berry bushes.
    pub fn is_plant(self) -> bool {
        matches!(self, Self::Tree | Self::BerryBush)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Predator => write!(f, "predator"),
            Self::Prey => write!(f, "prey"),
            Self::Tree => write!(f, "tree"),
            Self::BerryBush => write!(f, "berry bush"),
            Self::Building => write!(f, "building"),
            Self::Arrow => write!(f, "arrow"),
            Self::Corpse => write!(f, "corpse"),
        }
    }
}

/// Kinds of timed debuff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebuffKind {
    /// Halves velocity while active.
    Slow,
}

/// A timed debuff applied by combat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debuff {
    /// What the debuff does.
    pub kind: DebuffKind,
    /// World time (hours) when it was applied.
    pub start_time: f64,
    /// How long it lasts, in hours.
    pub duration: f64,
}

impl Debuff {
    /// Returns `true` once `now - start_time >= duration`.
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.start_time >= self.duration
    }
}

/// The universal entity record.
///
/// The physics fields are shared by every kind; kind-specific data lives in a
/// private [`EntityData`] variant that cannot be swapped after creation, so an
/// entity's kind is fixed for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    /// Position in world units, canonical after integration.
    pub position: Vec2,
    /// Collision radius.
    pub radius: f64,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Facing direction; normalized by the integrator before use.
    pub direction: Vec2,
    /// Scalar thrust applied along `direction` each tick.
    pub acceleration: f64,
    /// Pending forces, summed into velocity and cleared every integration.
    pub forces: Vec<Vec2>,
    /// Active timed debuffs, at most [`MAX_DEBUFFS`].
    pub debuffs: Vec<Debuff>,
    /// State-machine slot, if this entity runs one.
    pub state: Option<StateSlot>,
    /// Behavior-tree blackboard, if this entity is driven by a tree.
    pub behavior: Option<Blackboard>,
    data: EntityData,
}

impl Entity {
    pub(crate) fn new(id: EntityId, data: EntityData, position: Vec2) -> Self {
        let radius = data.kind().default_radius();
        Self {
            id,
            position,
            radius,
            velocity: Vec2::ZERO,
            direction: Vec2::UNIT_X,
            acceleration: 0.0,
            forces: Vec::new(),
            debuffs: Vec::new(),
            state: None,
            behavior: None,
            data,
        }
    }

    /// The entity's identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The entity's kind, derived from its payload.
    pub fn kind(&self) -> EntityKind {
        self.data.kind()
    }

    /// Read-only access to the kind payload.
    pub fn data(&self) -> &EntityData {
        &self.data
    }

    /// Queue a force for the next integration.
    pub fn push_force(&mut self, force: Vec2) {
        if force.is_finite() {
            self.forces.push(force);
        }
    }

    /// Add a debuff, evicting the oldest when the list is full.
    pub fn add_debuff(&mut self, debuff: Debuff) {
        if self.debuffs.len() >= MAX_DEBUFFS {
            self.debuffs.remove(0);
        }
        self.debuffs.push(debuff);
    }

    /// Current state id, if the entity runs a state machine.
    pub fn state_id(&self) -> Option<crate::state::StateId> {
        self.state.as_ref().map(|s| s.id)
    }

    /// Whether the entity still counts as alive for targeting purposes.
    pub fn is_alive(&self) -> bool {
        match &self.data {
            EntityData::Human(h) => h.character.hitpoints > 0.0,
            EntityData::Predator(a) | EntityData::Prey(a) => a.character.hitpoints > 0.0,
            EntityData::Tree(p) | EntityData::BerryBush(p) => !p.is_dead,
            EntityData::Building(b) => b.hitpoints > 0.0,
            EntityData::Arrow(_) | EntityData::Corpse(_) => true,
        }
    }

    /// Shared character data for humans, predators and prey.
    pub fn character(&self) -> Option<&CharacterData> {
        match &self.data {
            EntityData::Human(h) => Some(&h.character),
            EntityData::Predator(a) | EntityData::Prey(a) => Some(&a.character),
            _ => None,
        }
    }

    /// Mutable shared character data for humans, predators and prey.
    pub fn character_mut(&mut self) -> Option<&mut CharacterData> {
        match &mut self.data {
            EntityData::Human(h) => Some(&mut h.character),
            EntityData::Predator(a) | EntityData::Prey(a) => Some(&mut a.character),
            _ => None,
        }
    }

    /// Human payload.
    pub fn human(&self) -> Option<&HumanData> {
        match &self.data {
            EntityData::Human(h) => Some(h),
            _ => None,
        }
    }

    /// Mutable human payload.
    pub fn human_mut(&mut self) -> Option<&mut HumanData> {
        match &mut self.data {
            EntityData::Human(h) => Some(h),
            _ => None,
        }
    }

    /// Predator or prey payload.
    pub fn animal(&self) -> Option<&AnimalData> {
        match &self.data {
            EntityData::Predator(a) | EntityData::Prey(a) => Some(a),
            _ => None,
        }
    }

    /// Mutable predator or prey payload.
    pub fn animal_mut(&mut self) -> Option<&mut AnimalData> {
        match &mut self.data {
            EntityData::Predator(a) | EntityData::Prey(a) => Some(a),
            _ => None,
        }
    }

    /// Tree or berry bush payload.
    pub fn plant(&self) -> Option<&PlantData> {
        match &self.data {
            EntityData::Tree(p) | EntityData::BerryBush(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable tree or berry bush payload.
    pub fn plant_mut(&mut self) -> Option<&mut PlantData> {
        match &mut self.data {
            EntityData::Tree(p) | EntityData::BerryBush(p) => Some(p),
            _ => None,
        }
    }

    /// Building payload.
    pub fn building(&self) -> Option<&BuildingData> {
        match &self.data {
            EntityData::Building(b) => Some(b),
            _ => None,
        }
    }

    /// Mutable building payload.
    pub fn building_mut(&mut self) -> Option<&mut BuildingData> {
        match &mut self.data {
            EntityData::Building(b) => Some(b),
            _ => None,
        }
    }

    /// Arrow payload.
    pub fn arrow(&self) -> Option<&ArrowData> {
        match &self.data {
            EntityData::Arrow(a) => Some(a),
            _ => None,
        }
    }

    /// Mutable arrow payload.
    pub fn arrow_mut(&mut self) -> Option<&mut ArrowData> {
        match &mut self.data {
            EntityData::Arrow(a) => Some(a),
            _ => None,
        }
    }

    /// Corpse payload.
    pub fn corpse(&self) -> Option<&CorpseData> {
        match &self.data {
            EntityData::Corpse(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable corpse payload.
    pub fn corpse_mut(&mut self) -> Option<&mut CorpseData> {
        match &mut self.data {
            EntityData::Corpse(c) => Some(c),
            _ => None,
        }
    }

    /// The carried or stored inventory, for kinds that have one.
    ///
    /// Characters carry one, corpses keep the one they died with, and
    /// buildings store one. All three use the same [`Inventory`] shape.
    pub fn inventory(&self) -> Option<&Inventory> {
        match &self.data {
            EntityData::Human(h) => Some(&h.character.inventory),
            EntityData::Predator(a) | EntityData::Prey(a) => Some(&a.character.inventory),
            EntityData::Corpse(c) => Some(&c.inventory),
            EntityData::Building(b) => Some(&b.storage),
            _ => None,
        }
    }

    /// Mutable inventory, for kinds that have one.
    pub fn inventory_mut(&mut self) -> Option<&mut Inventory> {
        match &mut self.data {
            EntityData::Human(h) => Some(&mut h.character.inventory),
            EntityData::Predator(a) | EntityData::Prey(a) => Some(&mut a.character.inventory),
            EntityData::Corpse(c) => Some(&mut c.inventory),
            EntityData::Building(b) => Some(&mut b.storage),
            _ => None,
        }
    }

    /// Tribe of a human or building, if any.
    pub fn tribe(&self) -> Option<crate::tribe::TribeId> {
        match &self.data {
            EntityData::Human(h) => h.tribe,
            EntityData::Building(b) => b.tribe,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{FoodItem, FoodKind, Gender};

    fn human() -> Entity {
        Entity::new(
            EntityId(7),
            EntityData::Human(HumanData::new(CharacterData::new(Gender::Female, 20.0))),
            Vec2::new(1.0, 2.0),
        )
    }

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId(42).to_string(), "#42");
    }

    #[test]
    fn kind_follows_payload() {
        let e = human();
        assert_eq!(e.kind(), EntityKind::Human);
        assert!(e.character().is_some());
        assert!(e.plant().is_none());
        assert!((e.radius - EntityKind::Human.default_radius()).abs() < f64::EPSILON);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntityKind::BerryBush).unwrap();
        assert_eq!(json, "\"berry_bush\"");
    }

    #[test]
    fn debuffs_are_bounded() {
        let mut e = human();
        for i in 0..(MAX_DEBUFFS + 3) {
            e.add_debuff(Debuff {
                kind: DebuffKind::Slow,
                start_time: i as f64,
                duration: 1.0,
            });
        }
        assert_eq!(e.debuffs.len(), MAX_DEBUFFS);
        assert!((e.debuffs[0].start_time - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_forces_are_dropped() {
        let mut e = human();
        e.push_force(Vec2::new(f64::NAN, 0.0));
        e.push_force(Vec2::new(1.0, 0.0));
        assert_eq!(e.forces.len(), 1);
    }

    #[test]
    fn inventory_shared_shape() {
        let mut e = human();
        e.inventory_mut()
            .unwrap()
            .add_food(FoodItem::new(FoodKind::Berry, 0.0));
        assert_eq!(e.inventory().unwrap().food_count(), 1);
    }
}

use std::collections::BTreeMap;

use crate::component::EntityData;
use crate::entity::{Entity, EntityId, EntityKind};
use crate::vector::{MapSize, Vec2};

/// Owns every entity record and hands out identifiers.
///
/// Iteration is always in ascending id order, which keeps every system that
/// walks the store deterministic for a given seed.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
}

impl EntityStore {
    /// An empty store. The first id handed out is `#1`.
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create an entity with the next id and physics defaults.
    ///
    /// Returns the freshly inserted record so factories can fill in
    /// non-default fields.
    pub fn create(&mut self, data: EntityData, position: Vec2) -> &mut Entity {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.entities
            .entry(id)
            .or_insert_with(|| Entity::new(id, data, position))
    }

    /// Remove an entity. Returns `false` if it was already gone.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    /// Remove an entity and hand back its record.
    pub fn take(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Put back a record previously removed with [`take`](Self::take).
    ///
    /// Ids this store never handed out are rejected, so identifiers stay
    /// monotonic and unique.
    pub fn restore(&mut self, entity: Entity) -> bool {
        let id = entity.id();
        if id.0 == 0 || id.0 >= self.next_id || self.entities.contains_key(&id) {
            return false;
        }
        self.entities.insert(id, entity);
        true
    }

    /// Get a reference to an entity.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns `true` if the entity exists.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The id the next [`create`](Self::create) will assign.
    pub fn next_id(&self) -> EntityId {
        EntityId(self.next_id.max(1))
    }

    /// Snapshot of all ids in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Snapshot of the ids of one kind in ascending order.
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.iter_kind(kind).map(Entity::id).collect()
    }

    /// Iterate over all entities.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterate mutably over all entities.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Iterate over the entities of one kind.
    pub fn iter_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(move |e| e.kind() == kind)
    }

    /// Count entities per kind.
    pub fn counts_by_kind(&self) -> BTreeMap<EntityKind, usize> {
        let mut counts = BTreeMap::new();
        for e in self.entities.values() {
            *counts.entry(e.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Nearest entity within `radius` of `pos` accepted by `filter`.
    ///
    /// Ties resolve to the lower id.
    pub fn nearest<F>(&self, map: &MapSize, pos: Vec2, radius: f64, filter: F) -> Option<(EntityId, f64)>
    where
        F: Fn(&Entity) -> bool,
    {
        let radius_sq = radius * radius;
        let mut best: Option<(EntityId, f64)> = None;
        for e in self.entities.values() {
            let d2 = map.distance_squared(pos, e.position);
            if d2 > radius_sq || !filter(e) {
                continue;
            }
            if best.is_none_or(|(_, b)| d2 < b) {
                best = Some((e.id(), d2));
            }
        }
        best.map(|(id, d2)| (id, d2.sqrt()))
    }

    /// All entities within `radius` of `pos` accepted by `filter`, by ascending id.
    pub fn within<F>(&self, map: &MapSize, pos: Vec2, radius: f64, filter: F) -> Vec<EntityId>
    where
        F: Fn(&Entity) -> bool,
    {
        let radius_sq = radius * radius;
        self.entities
            .values()
            .filter(|e| map.distance_squared(pos, e.position) <= radius_sq && filter(e))
            .map(Entity::id)
            .collect()
    }
}

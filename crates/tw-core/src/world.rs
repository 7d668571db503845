use crate::effects::EffectQueue;
use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::{WorldError, WorldResult};
use crate::grid::{Biome, BiomeGrid, HeightGrid, SoilGrid};
use crate::navigation::NavGrid;
use crate::scheduled::ScheduledQueue;
use crate::store::EntityStore;
use crate::tribe::{TribeId, Tribes};
use crate::vector::{MapSize, Vec2};

/// The central world model. Owns every entity and every auxiliary structure.
///
/// Nothing here is global: a simulation owns its world and threads it
/// through each system explicitly, so several worlds can coexist.
#[derive(Debug, Clone)]
pub struct World {
    /// Simulation time in hours. Only ever increases.
    pub time: f64,
    /// Toroidal map dimensions.
    pub map: MapSize,
    /// All entities.
    pub entities: EntityStore,
    /// Terrain height per cell. Written by external generators.
    pub terrain: HeightGrid,
    /// Biome per cell. Written by external generators.
    pub biome: BiomeGrid,
    /// Soil fertility per cell, in `[0, 1]`.
    pub soil: SoilGrid,
    /// Obstacles for path planning.
    pub navigation: NavGrid,
    /// Deferred effects.
    pub scheduled: ScheduledQueue,
    /// Tribes and diplomacy.
    pub tribes: Tribes,
    /// Visual-effect outbox.
    pub effects: EffectQueue,
}

impl World {
    /// A flat grassland world with fully fertile soil and no entities.
    pub fn new(map: MapSize, cell_size: f64) -> WorldResult<Self> {
        let map = MapSize::new(map.width, map.height)?;
        Ok(Self {
            time: 0.0,
            map,
            entities: EntityStore::new(),
            terrain: HeightGrid::new(&map, cell_size, 0.0)?,
            biome: BiomeGrid::new(&map, cell_size, Biome::Grassland)?,
            soil: SoilGrid::new(&map, cell_size, 1.0)?,
            navigation: NavGrid::new(&map, cell_size)?,
            scheduled: ScheduledQueue::new(),
            tribes: Tribes::new(),
            effects: EffectQueue::default(),
        })
    }

    /// Get an entity or fail with [`WorldError::EntityNotFound`].
    pub fn entity(&self, id: EntityId) -> WorldResult<&Entity> {
        self.entities.get(id).ok_or(WorldError::EntityNotFound(id))
    }

    /// Mutable variant of [`entity`](Self::entity).
    pub fn entity_mut(&mut self, id: EntityId) -> WorldResult<&mut Entity> {
        self.entities
            .get_mut(id)
            .ok_or(WorldError::EntityNotFound(id))
    }

    /// Wrapped distance between two entities, if both exist.
    pub fn distance_between(&self, a: EntityId, b: EntityId) -> Option<f64> {
        let a = self.entities.get(a)?;
        let b = self.entities.get(b)?;
        Some(self.map.distance(a.position, b.position))
    }

    /// Wrapped distance between two points.
    pub fn distance(&self, a: Vec2, b: Vec2) -> f64 {
        self.map.distance(a, b)
    }

    /// Living humans belonging to `tribe`, by ascending id.
    pub fn tribe_members(&self, tribe: TribeId) -> Vec<EntityId> {
        self.entities
            .iter_kind(EntityKind::Human)
            .filter(|e| e.tribe() == Some(tribe) && e.is_alive())
            .map(Entity::id)
            .collect()
    }

    /// Whether the humans or buildings behind two ids are hostile.
    pub fn are_hostile(&self, a: EntityId, b: EntityId) -> bool {
        let ta = self.entities.get(a).and_then(Entity::tribe);
        let tb = self.entities.get(b).and_then(Entity::tribe);
        self.tribes.is_hostile(ta, tb)
    }

    /// Rebuild the obstacle grid from constructed buildings.
    pub fn refresh_obstacles(&mut self) {
        self.navigation.clear();
        let map = self.map;
        let obstacles: Vec<(Vec2, f64)> = self
            .entities
            .iter_kind(EntityKind::Building)
            .filter(|e| e.building().is_some_and(|b| b.is_constructed()))
            .map(|e| (e.position, e.radius))
            .collect();
        for (center, radius) in obstacles {
            self.navigation.block_circle(&map, center, radius);
        }
    }
}

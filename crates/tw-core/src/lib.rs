//! Core types for Tribeworld: entities, torus geometry, grids, and the world model.
//!
//! This crate owns the data the simulation engine mutates. It knows nothing
//! about rules, state handlers, or AI; those live in `tw-simulation`, which
//! threads a [`World`] through every system explicitly.

/// Behavior-tree blackboard persisted on entities.
pub mod blackboard;
/// Kind-specific payloads (characters, plants, buildings, arrows, corpses).
pub mod component;
/// Visual-effect outbox drained by presentation layers.
pub mod effects;
/// Entity identifiers, kinds, and the universal entity record.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Dense auxiliary grids: terrain height, biome, soil fertility.
pub mod grid;
/// Obstacle grid and A* pathfinding on the torus.
pub mod navigation;
/// Deferred effects resolved once their trigger time is reached.
pub mod scheduled;
/// Uniform bucket index for proximity queries on the torus.
pub mod spatial;
/// State-machine slot types stored on entities.
pub mod state;
/// Identifier allocation and ownership of entity records.
pub mod store;
/// Tribes, diplomacy stances, and strategic objectives.
pub mod tribe;
/// Torus-aware vector math.
pub mod vector;
/// The aggregate root owning every piece of simulation state.
pub mod world;

/// Re-export core entity types.
pub use entity::{Entity, EntityId, EntityKind};
/// Re-export error types.
pub use error::{WorldError, WorldResult};
/// Re-export vector types.
pub use vector::{MapSize, Vec2};
/// Re-export the world model.
pub use world::World;

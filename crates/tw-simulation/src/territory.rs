//! Tribe territory, claimed by constructed buildings.

use tw_core::entity::{EntityId, EntityKind};
use tw_core::tribe::TribeId;
use tw_core::vector::Vec2;
use tw_core::world::World;

/// The tribe whose territory covers `pos`.
///
/// Where claims overlap the nearest building wins; equal distances go to the
/// lower building id.
pub fn owner_at(world: &World, pos: Vec2) -> Option<TribeId> {
    let mut best: Option<(f64, TribeId)> = None;
    for e in world.entities.iter_kind(EntityKind::Building) {
        let Some(b) = e.building() else { continue };
        let Some(tribe) = b.tribe else { continue };
        if !b.is_constructed() || !world.tribes.contains(tribe) {
            continue;
        }
        let d = world.map.distance(pos, e.position);
        if d > b.building_type.territory_radius() {
            continue;
        }
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, tribe));
        }
    }
    best.map(|(_, tribe)| tribe)
}

/// Whether `pos` lies in `tribe`'s territory.
pub fn in_territory(world: &World, tribe: TribeId, pos: Vec2) -> bool {
    owner_at(world, pos) == Some(tribe)
}

/// Buildings not owned by `tribe` standing inside its territory, by id.
pub fn intruding_buildings(world: &World, tribe: TribeId) -> Vec<EntityId> {
    world
        .entities
        .iter_kind(EntityKind::Building)
        .filter(|e| e.tribe() != Some(tribe) && in_territory(world, tribe, e.position))
        .map(|e| e.id())
        .collect()
}

/// The constructed building of `tribe` closest to `pos`, if any.
pub fn nearest_home(world: &World, tribe: TribeId, pos: Vec2) -> Option<(EntityId, Vec2)> {
    world
        .entities
        .iter_kind(EntityKind::Building)
        .filter(|e| {
            e.tribe() == Some(tribe) && e.building().is_some_and(|b| b.is_constructed())
        })
        .min_by(|a, b| {
            world
                .map
                .distance_squared(pos, a.position)
                .total_cmp(&world.map.distance_squared(pos, b.position))
        })
        .map(|e| (e.id(), e.position))
}

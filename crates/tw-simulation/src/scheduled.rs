//! Resolution of due scheduled events.
//!
//! Every sub-step the queue is split into due and pending events. Due events
//! run once, in queue order, and are dropped; pending events stay exactly as
//! they were. An event whose subjects have vanished in the meantime does
//! nothing.

use rand::Rng;
use tw_core::component::BuildingType;
use tw_core::effects::EffectKind;
use tw_core::entity::{Debuff, DebuffKind, EntityId, EntityKind};
use tw_core::scheduled::{ScheduledEvent, ScheduledEventKind};
use tw_core::tribe::TribeId;
use tw_core::vector::Vec2;
use tw_core::world::World;

use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::factory;
use crate::interaction::combat::{apply_hit, is_vulnerable};
use crate::system::System;

/// Spots tried when a plant spreads before giving up.
const SPREAD_ATTEMPTS: usize = 4;

/// Runs due scheduled events.
#[derive(Debug, Default)]
pub struct ScheduledEventSystem {
    resolved: u64,
}

impl ScheduledEventSystem {
    /// A fresh system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events resolved since creation.
    pub fn resolved(&self) -> u64 {
        self.resolved
    }
}

impl System for ScheduledEventSystem {
    fn name(&self) -> &str {
        "scheduled"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let due = ctx.world.scheduled.take_due(ctx.world.time);
        for event in due {
            tracing::trace!(event = %event.id, kind = event.kind.label(), "resolving");
            resolve(event, ctx);
            self.resolved += 1;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn resolve(event: ScheduledEvent, ctx: &mut SimContext<'_>) {
    match event.kind {
        ScheduledEventKind::ArrowImpact {
            attacker,
            target,
            arrow,
            damage,
            impact_point,
        } => arrow_impact(ctx, attacker, target, arrow, damage, impact_point),
        ScheduledEventKind::SpreadPlant { parent, kind } => spread_plant(ctx, parent, kind),
        ScheduledEventKind::PlantBush { planter, position } => plant_bush(ctx, planter, position),
        ScheduledEventKind::PlaceBuilding {
            tribe,
            builder,
            building_type,
            position,
        } => place_building(ctx, tribe, builder, building_type, position),
    }
}

/// The arrow hits when its victim is still alive and still standing where
/// it was aimed at, give or take the victim's size.
fn arrow_impact(
    ctx: &mut SimContext<'_>,
    attacker: EntityId,
    target: EntityId,
    arrow: EntityId,
    damage: f64,
    impact_point: Vec2,
) {
    let config = ctx.config;
    let rules = &config.rules;
    let now = ctx.world.time;
    let map = ctx.world.map;
    let Some(victim) = ctx.world.entities.get_mut(target) else {
        return;
    };
    let in_place = map.distance(victim.position, impact_point)
        <= victim.radius + rules.arrow_hit_tolerance;
    if !victim.is_alive() || !in_place {
        tracing::debug!(%attacker, %target, %arrow, "arrow missed");
        return;
    }
    let multiplier = if is_vulnerable(victim) {
        rules.vulnerable_multiplier
    } else {
        1.0
    };
    apply_hit(victim, attacker, damage * multiplier);
    victim.add_debuff(Debuff {
        kind: DebuffKind::Slow,
        start_time: now,
        duration: rules.arrow_slow_hours,
    });
    let position = victim.position;
    ctx.world.effects.push(EffectKind::Hit, position, now);
    tracing::debug!(%attacker, %target, %arrow, damage = damage * multiplier, "arrow hit");
}

fn plant_count(world: &World) -> usize {
    world.entities.iter().filter(|e| e.kind().is_plant()).count()
}

/// Fertile grazable ground with no plant closer than the spacing.
fn open_ground(world: &World, pos: Vec2, spacing: f64, fertile_threshold: f64) -> bool {
    *world.soil.at(pos) >= fertile_threshold
        && world.biome.at(pos).is_grazable()
        && !world.navigation.is_blocked(pos)
        && world
            .entities
            .nearest(&world.map, pos, spacing, |e| e.kind().is_plant())
            .is_none()
}

fn spread_plant(ctx: &mut SimContext<'_>, parent: EntityId, kind: EntityKind) {
    let config = ctx.config;
    let rules = &config.rules;
    let Some(origin) = ctx
        .world
        .entities
        .get(parent)
        .filter(|e| e.is_alive())
        .map(|e| e.position)
    else {
        return;
    };
    if plant_count(ctx.world) >= rules.max_plants {
        return;
    }
    for _ in 0..SPREAD_ATTEMPTS {
        let angle = ctx.rng.random_range(0.0..std::f64::consts::TAU);
        let far = rules.spread_radius.max(rules.plant_spacing + 1.0);
        let reach = ctx.rng.random_range(rules.plant_spacing..far);
        let spot = ctx.world.map.wrap(origin + Vec2::from_angle(angle) * reach);
        if !open_ground(ctx.world, spot, rules.plant_spacing, rules.fertile_threshold) {
            continue;
        }
        let seedling = match kind {
            EntityKind::Tree => factory::spawn_tree(ctx.world, spot, false, rules),
            _ => factory::spawn_bush(ctx.world, spot, false, 0, rules),
        };
        tracing::debug!(%parent, %seedling, %kind, "plant spread");
        return;
    }
}

fn plant_bush(ctx: &mut SimContext<'_>, planter: EntityId, position: Vec2) {
    let config = ctx.config;
    let rules = &config.rules;
    let spacing = rules.plant_spacing * 0.5;
    let crowded = ctx
        .world
        .entities
        .nearest(&ctx.world.map, position, spacing, |e| e.kind().is_plant())
        .is_some();
    if crowded || plant_count(ctx.world) >= rules.max_plants {
        return;
    }
    let bush = factory::spawn_bush(ctx.world, position, false, 0, rules);
    ctx.world.soil.deplete(position, rules.planting_depletion);
    tracing::debug!(%planter, %bush, "bush planted");
}

fn place_building(
    ctx: &mut SimContext<'_>,
    tribe: TribeId,
    builder: EntityId,
    building_type: BuildingType,
    position: Vec2,
) {
    let spacing = ctx.rules().building_spacing;
    if !ctx.world.tribes.contains(tribe) {
        return;
    }
    let position = ctx.world.map.wrap(position);
    let crowded = ctx
        .world
        .entities
        .nearest(&ctx.world.map, position, spacing, |e| e.kind() == EntityKind::Building)
        .is_some();
    if crowded || ctx.world.navigation.is_blocked(position) {
        tracing::debug!(%tribe, %building_type, "placement rejected");
        return;
    }
    let building = factory::spawn_building(ctx.world, position, building_type, Some(tribe), false);
    tracing::info!(%tribe, %builder, %building, %building_type, "blueprint placed");
    ctx.emit(
        SimEventKind::BuildingPlaced {
            building,
            tribe,
            building_type,
        },
        format!("{tribe} laid out a {building_type}"),
    );
}

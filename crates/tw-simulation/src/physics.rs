use tw_core::entity::{DebuffKind, Entity};
use tw_core::vector::{EPSILON, MapSize, Vec2};

use crate::context::SimContext;
use crate::error::SimResult;
use crate::system::System;

/// Fraction of velocity removed each integration.
pub const DAMPING: f64 = 0.1;

/// Integrate one entity over `dt` seconds at world time `now`.
///
/// Order matters: damping and thrust are queued as forces, expired debuffs
/// are dropped, each remaining slow halves the velocity, then forces are
/// summed in and the position is moved and wrapped. Pending forces are
/// always cleared.
pub fn integrate(entity: &mut Entity, map: &MapSize, dt: f64, now: f64) {
    entity.push_force(entity.velocity * -DAMPING);
    let thrust = entity.direction.normalize_or(Vec2::UNIT_X) * entity.acceleration;
    entity.push_force(thrust);

    entity.debuffs.retain(|d| !d.is_expired(now));
    let slows = entity
        .debuffs
        .iter()
        .filter(|d| matches!(d.kind, DebuffKind::Slow))
        .count();
    entity.velocity *= 0.5_f64.powi(slows as i32);

    let total = entity
        .forces
        .iter()
        .fold(Vec2::ZERO, |acc, f| acc + *f);
    entity.velocity += total;
    if !entity.velocity.is_finite() || entity.velocity.length() < EPSILON {
        entity.velocity = Vec2::ZERO;
    }

    entity.position = map.wrap(entity.position + entity.velocity * dt);
    entity.forces.clear();
}

/// Advance an arrow's height. Returns `true` if it embedded this call.
pub fn fly_arrow(entity: &mut Entity, gravity: f64, dt: f64, now: f64) -> bool {
    let Some(arrow) = entity.arrow_mut() else {
        return false;
    };
    if arrow.is_embedded {
        return false;
    }
    arrow.z += arrow.vz * dt;
    arrow.vz -= gravity * dt;
    if arrow.vz > 0.0 {
        return false;
    }
    arrow.is_embedded = true;
    arrow.embedded_at = Some(now);
    arrow.z = 0.0;
    entity.velocity = Vec2::ZERO;
    entity.acceleration = 0.0;
    true
}

/// Integrates every entity and flies arrows.
#[derive(Debug, Default)]
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self
    }
}

impl System for PhysicsSystem {
    fn name(&self) -> &str {
        "physics"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let dt = ctx.dt();
        let now = ctx.now();
        let gravity = ctx.rules().arrow_gravity;
        let map = ctx.world.map;
        let mut embedded = Vec::new();

        for entity in ctx.world.entities.iter_mut() {
            if entity.arrow().is_some_and(|a| a.is_embedded) {
                entity.forces.clear();
                continue;
            }
            integrate(entity, &map, dt, now);
            if fly_arrow(entity, gravity, dt, now) {
                embedded.push(entity.position);
            }
        }

        for position in embedded {
            ctx.world
                .effects
                .push(tw_core::effects::EffectKind::Embed, position, now);
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

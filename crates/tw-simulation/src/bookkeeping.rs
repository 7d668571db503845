//! End-of-step cleanup.
//!
//! Dead characters are swapped for corpses in the same sub-step they die, so
//! nothing downstream ever sees a character with no hitpoints. Tribes that
//! lost their leader get a new one or disappear. Spent arrows, rotten
//! corpses, dead plants and ruined buildings leave the world.

use tw_core::effects::EffectKind;
use tw_core::entity::{Entity, EntityId, EntityKind};
use tw_core::tribe::TribeId;

use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::{DeathCause, SimEventKind};
use crate::factory;
use crate::system::System;

/// Why a character with no hitpoints left died.
pub fn death_cause(entity: &Entity, rules: &RulesConfig) -> DeathCause {
    let Some(c) = entity.character() else {
        return DeathCause::Wounds;
    };
    if c.age >= c.max_age {
        DeathCause::OldAge
    } else if c.hunger >= 100.0 {
        DeathCause::Starvation
    } else if entity
        .human()
        .is_some_and(|h| h.temperature < rules.hypothermia_threshold)
    {
        DeathCause::Cold
    } else if let Some(by) = c.last_attacker {
        DeathCause::Killed(by)
    } else {
        DeathCause::Wounds
    }
}

/// Removes the dead and the spent, and keeps tribes led.
#[derive(Debug, Default)]
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        sweep_remains(ctx);
        bury_dead(ctx);
        settle_tribes(ctx);
        clear_ruins(ctx);
        let now = ctx.now();
        ctx.world.effects.expire(now);
        ctx.world.refresh_obstacles();
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Embedded arrows past their time, picked-over or rotten corpses, and
/// plants that finished dying.
fn sweep_remains(ctx: &mut SimContext<'_>) {
    let rules = ctx.rules();
    let (embed_hours, decay_hours) = (rules.arrow_embed_hours, rules.corpse_decay_hours);
    let now = ctx.now();
    let spent: Vec<EntityId> = ctx
        .world
        .entities
        .iter()
        .filter(|e| {
            if let Some(a) = e.arrow() {
                a.embedded_at.is_some_and(|t| now - t >= embed_hours)
            } else if let Some(c) = e.corpse() {
                c.is_exhausted() || now - c.died_at >= decay_hours
            } else {
                e.kind().is_plant() && !e.is_alive()
            }
        })
        .map(Entity::id)
        .collect();
    for id in spent {
        tracing::trace!(entity = %id, "removed");
        ctx.world.entities.remove(id);
    }
}

fn bury_dead(ctx: &mut SimContext<'_>) {
    let config = ctx.config;
    let rules = &config.rules;
    let dead: Vec<EntityId> = ctx
        .world
        .entities
        .iter()
        .filter(|e| e.kind().is_character() && !e.is_alive())
        .map(Entity::id)
        .collect();
    for id in dead {
        let Some(mut body) = ctx.world.entities.take(id) else {
            continue;
        };
        let kind = body.kind();
        let cause = death_cause(&body, rules);
        let inventory = body
            .character_mut()
            .map(|c| c.inventory.take_all())
            .unwrap_or_default();
        let position = body.position;
        let meat = rules.meat_for(kind);
        let corpse = factory::spawn_corpse(ctx.world, position, kind, inventory, meat);
        let now = ctx.now();
        ctx.world.effects.push(EffectKind::Death, position, now);
        tracing::info!(entity = %id, %kind, %cause, "died");
        ctx.emit(
            SimEventKind::Died {
                entity: id,
                kind,
                corpse,
                cause,
            },
            format!("{kind} {id} died of {cause}"),
        );
    }
}

/// The oldest member, adults first.
fn heir(ctx: &SimContext<'_>, members: &[EntityId]) -> Option<EntityId> {
    let rules = ctx.rules();
    members
        .iter()
        .filter_map(|id| {
            let age = ctx.world.entities.get(*id)?.character()?.age;
            Some((rules.is_adult(age), age, *id))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
        .map(|(_, _, id)| id)
}

fn settle_tribes(ctx: &mut SimContext<'_>) {
    let tribes: Vec<(TribeId, EntityId)> = ctx
        .world
        .tribes
        .iter()
        .map(|t| (t.id, t.leader))
        .collect();
    for (tribe, leader) in tribes {
        let members = ctx.world.tribe_members(tribe);
        if members.contains(&leader) {
            continue;
        }
        let Some(next) = heir(ctx, &members) else {
            ctx.world.tribes.dissolve(tribe);
            tracing::info!(%tribe, "tribe dissolved");
            ctx.emit(
                SimEventKind::TribeDissolved { tribe },
                format!("{tribe} has no members left"),
            );
            continue;
        };
        if let Some(info) = ctx.world.tribes.get_mut(tribe) {
            info.leader = next;
        }
        tracing::info!(%tribe, leader = %next, "leader succeeded");
        ctx.emit(
            SimEventKind::LeaderSucceeded { tribe, leader: next },
            format!("{next} now leads {tribe}"),
        );
    }
}

/// Sieged-down buildings are destroyed; dismantled ones were already
/// announced when the last piece came off.
fn clear_ruins(ctx: &mut SimContext<'_>) {
    let ruins: Vec<(EntityId, bool)> = ctx
        .world
        .entities
        .iter_kind(EntityKind::Building)
        .filter_map(|e| {
            let b = e.building()?;
            let destroyed = b.hitpoints <= 0.0;
            (destroyed || b.dismantle_progress >= 1.0).then_some((e.id(), destroyed))
        })
        .collect();
    for (building, destroyed) in ruins {
        let Some(e) = ctx.world.entities.take(building) else {
            continue;
        };
        let Some(building_type) = e.building().map(|b| b.building_type) else {
            continue;
        };
        if destroyed {
            tracing::info!(%building, %building_type, "building destroyed");
            ctx.emit(
                SimEventKind::BuildingDestroyed {
                    building,
                    building_type,
                },
                format!("{building_type} {building} was destroyed"),
            );
        }
    }
}

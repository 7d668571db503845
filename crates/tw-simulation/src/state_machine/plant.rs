//! Plant life cycle: growing, full, spreading, and for trees fallen and
//! stump, ending in dying. Plant aging itself is done by the lifecycle
//! system; these handlers only react to it.

use tw_core::component::{FoodItem, FoodKind};
use tw_core::entity::{Entity, EntityKind};
use tw_core::scheduled::ScheduledEventKind;
use tw_core::state::{StateData, StateId, StatePayload};

use super::{StateContext, StateHandler, StateTable};
use crate::config::RulesConfig;

/// Plants below full growth are drawn at this fraction of their radius.
const SAPLING_SCALE: f64 = 0.5;

/// Soil never slows growth below this factor.
const MIN_SOIL_FACTOR: f64 = 0.1;

/// The plant state graph for trees or berry bushes.
pub fn table(kind: EntityKind) -> StateTable {
    StateTable::new(kind)
        .with(StateId::Growing, GrowingState)
        .with(StateId::Full, FullState)
        .with(StateId::Spreading, SpreadingState)
        .with(StateId::Fallen, FallenState)
        .with(StateId::Stump, StumpState)
        .with(StateId::Dying, DyingState)
}

fn growth_hours(kind: EntityKind, rules: &RulesConfig) -> f64 {
    match kind {
        EntityKind::Tree => rules.tree_growth_hours,
        _ => rules.bush_growth_hours,
    }
}

fn spread_hours(kind: EntityKind, rules: &RulesConfig) -> f64 {
    match kind {
        EntityKind::Tree => rules.tree_spread_hours,
        _ => rules.bush_spread_hours,
    }
}

fn is_old(entity: &Entity) -> bool {
    entity.plant().is_some_and(|p| p.age >= p.max_age)
}

/// Saplings grow with soil fertility.
#[derive(Debug)]
pub struct GrowingState;

impl StateHandler for GrowingState {
    fn update(&self, entity: &mut Entity, _data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        if is_old(entity) {
            return StateId::Dying;
        }
        let kind = entity.kind();
        let soil = (*ctx.world.soil.at(entity.position)).max(MIN_SOIL_FACTOR);
        let rate = ctx.hours / growth_hours(kind, ctx.rules).max(f64::EPSILON);
        let Some(plant) = entity.plant_mut() else {
            return StateId::Growing;
        };
        plant.growth = (plant.growth + rate * soil).min(1.0);
        let growth = plant.growth;
        let scale = SAPLING_SCALE + (1.0 - SAPLING_SCALE) * growth;
        entity.radius = kind.default_radius() * scale;
        if growth >= 1.0 {
            StateId::Full
        } else {
            StateId::Growing
        }
    }
}

/// Mature plants regrow berries and count down to spreading.
#[derive(Debug)]
pub struct FullState;

impl StateHandler for FullState {
    fn update(&self, entity: &mut Entity, _data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        if is_old(entity) {
            return StateId::Dying;
        }
        let kind = entity.kind();
        let now = ctx.now;
        let hours = ctx.hours;
        let regrow = ctx.rules.berry_regrow_hours;
        let Some(plant) = entity.plant_mut() else {
            return StateId::Full;
        };
        if kind == EntityKind::Tree && plant.chop_progress >= 1.0 {
            return StateId::Fallen;
        }
        if kind == EntityKind::BerryBush && plant.food.len() < plant.max_food {
            plant.regrow_timer -= hours;
            if plant.regrow_timer <= 0.0 {
                plant.food.push(FoodItem::new(FoodKind::Berry, now));
                plant.regrow_timer = regrow;
            }
        }
        plant.spread_timer -= hours;
        if plant.spread_timer <= 0.0 {
            StateId::Spreading
        } else {
            StateId::Full
        }
    }
}

/// Drops a seed and goes straight back to full.
#[derive(Debug)]
pub struct SpreadingState;

impl StateHandler for SpreadingState {
    fn on_enter(&self, entity: &mut Entity, ctx: &mut StateContext<'_>) -> StatePayload {
        let kind = entity.kind();
        ctx.schedule(
            0.0,
            ScheduledEventKind::SpreadPlant {
                parent: entity.id(),
                kind,
            },
        );
        if let Some(plant) = entity.plant_mut() {
            plant.spread_timer = spread_hours(kind, ctx.rules);
        }
        StatePayload::None
    }

    fn update(&self, _entity: &mut Entity, _data: &mut StateData, _ctx: &mut StateContext<'_>) -> StateId {
        StateId::Full
    }
}

/// A felled tree, worked for wood until nothing is left.
#[derive(Debug)]
pub struct FallenState;

impl StateHandler for FallenState {
    fn on_enter(&self, entity: &mut Entity, ctx: &mut StateContext<'_>) -> StatePayload {
        if let Some(plant) = entity.plant_mut() {
            plant.wood = ctx.rules.tree_wood;
        }
        StatePayload::None
    }

    fn update(&self, entity: &mut Entity, _data: &mut StateData, _ctx: &mut StateContext<'_>) -> StateId {
        match entity.plant() {
            Some(p) if p.wood == 0 => StateId::Stump,
            _ => StateId::Fallen,
        }
    }
}

/// What remains after all wood is taken.
#[derive(Debug)]
pub struct StumpState;

impl StateHandler for StumpState {
    fn on_enter(&self, entity: &mut Entity, _ctx: &mut StateContext<'_>) -> StatePayload {
        entity.radius = entity.kind().default_radius() * SAPLING_SCALE;
        StatePayload::None
    }

    fn update(&self, _entity: &mut Entity, data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        if data.elapsed(ctx.now) >= ctx.rules.stump_hours {
            StateId::Dying
        } else {
            StateId::Stump
        }
    }
}

/// Withering; flagged dead once the timer runs out.
#[derive(Debug)]
pub struct DyingState;

impl StateHandler for DyingState {
    fn on_enter(&self, entity: &mut Entity, ctx: &mut StateContext<'_>) -> StatePayload {
        if let Some(plant) = entity.plant_mut() {
            plant.food.clear();
        }
        StatePayload::Timer {
            next_at: ctx.now + ctx.rules.dying_hours,
        }
    }

    fn update(&self, entity: &mut Entity, data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        let due = match data.payload {
            StatePayload::Timer { next_at } => ctx.now >= next_at,
            _ => true,
        };
        if due && let Some(plant) = entity.plant_mut() {
            plant.is_dead = true;
        }
        StateId::Dying
    }
}

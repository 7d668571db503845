//! Needs and aging: hunger, starvation, regeneration, cooldowns, gestation
//! and birth, body temperature, plant aging and soil.

use tw_core::component::{BuildingType, Target};
use tw_core::effects::EffectKind;
use tw_core::entity::{Entity, EntityId, EntityKind};
use tw_core::state::StateId;
use tw_core::tribe::TribeId;
use tw_core::vector::{MapSize, Vec2};

use crate::clock;
use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::factory;
use crate::system::System;

/// Normal body temperature.
pub const BODY_TEMPERATURE: f64 = 37.0;

/// Degrees of body temperature lost per degree the air is below comfort.
const COLD_SENSITIVITY: f64 = 0.35;

/// Air temperature at world time `hours`: coldest at midnight, warmest at noon.
pub fn ambient_temperature(rules: &RulesConfig, hours: f64) -> f64 {
    let phase = clock::hour_of_day(hours) / 24.0 * std::f64::consts::TAU;
    let warmth = 0.5 * (1.0 - phase.cos());
    rules.night_temperature + (rules.day_temperature - rules.night_temperature) * warmth
}

/// Body temperature a human drifts toward in air of `ambient` degrees.
pub fn body_target(rules: &RulesConfig, ambient: f64) -> f64 {
    BODY_TEMPERATURE - (rules.comfort_temperature - ambient).max(0.0) * COLD_SENSITIVITY
}

struct Birth {
    mother: EntityId,
    father: Option<EntityId>,
    kind: EntityKind,
    position: Vec2,
    tribe: Option<TribeId>,
}

/// Advance one character's needs by `hours`. Returns a birth when a
/// pregnancy came to term.
fn live(
    entity: &mut Entity,
    rules: &RulesConfig,
    map: &MapSize,
    hours: f64,
    ambient: f64,
    bonfires: &[Vec2],
) -> Option<Birth> {
    let kind = entity.kind();
    let position = entity.position;

    let mut cold = false;
    if let Some(h) = entity.human_mut() {
        let warmed = bonfires
            .iter()
            .any(|b| map.distance(position, *b) <= rules.bonfire_radius);
        let air = if warmed {
            ambient + rules.bonfire_warmth
        } else {
            ambient
        };
        let target = body_target(rules, air);
        let blend = (rules.body_relax_rate * hours).min(1.0);
        h.temperature += (target - h.temperature) * blend;
        cold = h.temperature < rules.cold_threshold;
        if h.temperature < rules.hypothermia_threshold {
            h.character.hitpoints -= rules.hypothermia_damage * hours;
        }
        h.tick_cooldowns(hours);
    } else if let Some(c) = entity.character_mut() {
        c.tick_cooldowns(hours);
    }

    let tribe = entity.tribe();
    let c = entity.character_mut()?;
    let rate = match kind {
        EntityKind::Human => rules.human_hunger_rate,
        _ => rules.animal_hunger_rate,
    };
    let multiplier = if cold { rules.cold_hunger_multiplier } else { 1.0 };
    c.hunger = (c.hunger + rate * multiplier * hours).min(100.0);
    if c.hunger >= 100.0 {
        c.hitpoints -= rules.starvation_damage * hours;
    } else if c.hunger < rules.regen_hunger && c.hitpoints > 0.0 {
        c.hitpoints = (c.hitpoints + rules.regen_rate * hours).min(c.max_hitpoints);
    }

    c.age += hours / rules.hours_per_year;
    if c.age >= c.max_age {
        c.hitpoints = 0.0;
    }

    if !c.is_pregnant || c.hitpoints <= 0.0 {
        return None;
    }
    c.gestation_time -= hours;
    if c.gestation_time > 0.0 {
        return None;
    }
    c.is_pregnant = false;
    c.gestation_time = 0.0;
    let father = c.conceived_with.take();
    Some(Birth {
        mother: entity.id(),
        father,
        kind,
        position,
        tribe,
    })
}

/// Runs needs, aging, gestation and temperature for every character, ages
/// plants and lets the soil recover.
#[derive(Debug, Default)]
pub struct LifecycleSystem;

impl LifecycleSystem {
    /// Create the system.
    pub fn new() -> Self {
        Self
    }
}

impl System for LifecycleSystem {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let config = ctx.config;
        let rules = &config.rules;
        let hours = ctx.dt_hours();
        let map = ctx.world.map;
        let ambient = ambient_temperature(rules, ctx.now());
        let bonfires: Vec<Vec2> = ctx
            .world
            .entities
            .iter_kind(EntityKind::Building)
            .filter(|e| {
                e.building().is_some_and(|b| {
                    b.building_type == BuildingType::Bonfire && b.is_constructed()
                })
            })
            .map(|e| e.position)
            .collect();

        let mut births = Vec::new();
        let mut grazing = Vec::new();
        for entity in ctx.world.entities.iter_mut() {
            if entity.kind().is_plant() {
                if let Some(p) = entity.plant_mut() {
                    p.age += hours;
                }
                continue;
            }
            if !entity.is_alive() {
                continue;
            }
            if entity.kind() == EntityKind::Prey
                && entity.state_id() == Some(StateId::Eating)
                && let Some(Target::Position(p)) = entity.character().and_then(|c| c.target)
            {
                grazing.push(p);
            }
            if let Some(birth) = live(entity, rules, &map, hours, ambient, &bonfires) {
                births.push(birth);
            }
        }

        for p in grazing {
            ctx.world.soil.deplete(p, rules.grazing_depletion * hours);
        }
        ctx.world.soil.recover(rules.soil_recovery * hours);

        for birth in births {
            let gender = factory::random_gender(&mut *ctx.rng);
            let tribe = birth.tribe.filter(|t| ctx.world.tribes.contains(*t));
            let Some(child) = factory::spawn_child(
                ctx.world,
                birth.kind,
                birth.position,
                gender,
                birth.mother,
                birth.father,
                tribe,
            ) else {
                continue;
            };
            ctx.world
                .effects
                .push(EffectKind::Birth, birth.position, ctx.world.time);
            tracing::info!(%child, mother = %birth.mother, kind = %birth.kind, "birth");
            ctx.emit(
                SimEventKind::Born {
                    child,
                    mother: birth.mother,
                    kind: birth.kind,
                },
                format!("A {} was born to {}", birth.kind, birth.mother),
            );
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tw_core::component::Gender;
    use tw_core::world::World;

    use crate::clock::SimClock;
    use crate::config::SimConfig;
    use crate::event::EventLog;

    fn tick(w: &mut World, config: &SimConfig, seconds: f64) -> EventLog {
        let mut clock = SimClock::new(config.hours_per_second, seconds, seconds);
        clock.advance(seconds);
        w.time += seconds * config.hours_per_second;
        let mut events = EventLog::new(100);
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = SimContext {
            world: w,
            clock: &clock,
            events: &mut events,
            rng: &mut rng,
            config,
        };
        LifecycleSystem::new().tick(&mut ctx).unwrap();
        events
    }

    fn world() -> World {
        World::new(MapSize::new(1000.0, 1000.0).unwrap(), 20.0).unwrap()
    }

    #[test]
    fn noon_is_warmer_than_midnight() {
        let rules = RulesConfig::default();
        assert!((ambient_temperature(&rules, 0.0) - rules.night_temperature).abs() < 1e-9);
        assert!((ambient_temperature(&rules, 12.0) - rules.day_temperature).abs() < 1e-9);
        assert_eq!(body_target(&rules, rules.day_temperature), BODY_TEMPERATURE);
    }

    #[test]
    fn hunger_grows_and_starvation_hurts() {
        let config = SimConfig::default();
        let mut w = world();
        w.time = 12.0;
        let id = factory::spawn_human(&mut w, Vec2::new(10.0, 10.0), Gender::Male, 20.0, None);
        tick(&mut w, &config, 10.0);
        let c = w.entities.get(id).unwrap().character().unwrap();
        assert!((c.hunger - config.rules.human_hunger_rate).abs() < 1e-9);

        w.entities.get_mut(id).unwrap().character_mut().unwrap().hunger = 100.0;
        tick(&mut w, &config, 10.0);
        let c = w.entities.get(id).unwrap().character().unwrap();
        assert!(c.hitpoints < 100.0);
    }

    #[test]
    fn cooldowns_count_down_to_zero() {
        let config = SimConfig::default();
        let mut w = world();
        let id = factory::spawn_predator(&mut w, Vec2::ZERO, Gender::Female, 5.0);
        w.entities.get_mut(id).unwrap().character_mut().unwrap().attack_cooldown = 0.05;
        tick(&mut w, &config, 1.0);
        assert_eq!(
            w.entities.get(id).unwrap().character().unwrap().attack_cooldown,
            0.0
        );
    }

    #[test]
    fn old_age_is_fatal() {
        let config = SimConfig::default();
        let mut w = world();
        let id = factory::spawn_prey(&mut w, Vec2::ZERO, Gender::Female, factory::ANIMAL_MAX_AGE - 1e-6);
        tick(&mut w, &config, 1.0);
        assert!(!w.entities.get(id).unwrap().is_alive());
    }

    #[test]
    fn pregnancy_ends_in_birth() {
        let config = SimConfig::default();
        let mut w = world();
        let tribe = w.tribes.found(EntityId(1), 0.0);
        let mother = factory::spawn_human(&mut w, Vec2::new(50.0, 50.0), Gender::Female, 20.0, Some(tribe));
        {
            let c = w.entities.get_mut(mother).unwrap().character_mut().unwrap();
            c.is_pregnant = true;
            c.gestation_time = 0.05;
            c.conceived_with = Some(EntityId(77));
        }
        let events = tick(&mut w, &config, 1.0);

        assert_eq!(events.len(), 1);
        let SimEventKind::Born { child, .. } = events.events()[0].kind else {
            panic!("expected a birth");
        };
        let baby = w.entities.get(child).unwrap();
        assert_eq!(baby.tribe(), Some(tribe));
        let c = baby.character().unwrap();
        assert_eq!(c.mother, Some(mother));
        assert_eq!(c.father, Some(EntityId(77)));
        assert!(!w.entities.get(mother).unwrap().character().unwrap().is_pregnant);
        assert_eq!(w.effects.len(), 1);
    }

    #[test]
    fn bonfires_keep_humans_warm_at_night() {
        let config = SimConfig::default();
        let mut w = world();
        let cold = factory::spawn_human(&mut w, Vec2::new(800.0, 800.0), Gender::Male, 20.0, None);
        let warm = factory::spawn_human(&mut w, Vec2::new(110.0, 100.0), Gender::Male, 20.0, None);
        factory::spawn_building(&mut w, Vec2::new(100.0, 100.0), BuildingType::Bonfire, None, true);
        for _ in 0..40 {
            w.time = 0.0;
            tick(&mut w, &config, 1.0);
        }
        let t = |id| w.entities.get(id).unwrap().human().unwrap().temperature;
        assert!(t(cold) < config.rules.hypothermia_threshold);
        assert!(t(warm) > t(cold));
    }
}

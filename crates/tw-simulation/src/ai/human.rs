//! Human task AI.
//!
//! Needs, highest priority first: defend, keep planting, eat, fetch food,
//! supply construction, deposit, raid, procreate, stock food, plant,
//! dismantle intruders. Tribe leaders also order new buildings on the side.

use rand::Rng;
use tw_core::component::{Action, BuildingType, Target};
use tw_core::entity::{Entity, EntityId, EntityKind};
use tw_core::scheduled::ScheduledEventKind;
use tw_core::state::StateId;
use tw_core::tribe::{StrategicObjective, TribeId};
use tw_core::vector::Vec2;

use super::{AiContext, Need, avenger_target, engage, first_need, pursue, wander};
use crate::territory;

const NEEDS: [(&str, Need); 11] = [
    ("defend", defend),
    ("keep_planting", keep_planting),
    ("eat", eat),
    ("fetch_food", fetch_food),
    ("supply_construction", supply_construction),
    ("deposit", deposit),
    ("raid", raid),
    ("procreate", procreate),
    ("stock_food", stock_food),
    ("plant", plant),
    ("dismantle", dismantle),
];

/// Decide the next intent for a human. Returns the need that decided, or
/// `None` when the human wanders.
pub fn decide(me: &mut Entity, ctx: &mut AiContext<'_>) -> Option<&'static str> {
    if let Some(tribe) = me.tribe()
        && ctx.world.tribes.get(tribe).is_some_and(|t| t.leader == me.id())
    {
        plan_construction(me, tribe, ctx);
    }
    let decided = first_need(&NEEDS, me, ctx);
    if decided.is_none() {
        let home = me
            .tribe()
            .and_then(|t| territory::nearest_home(ctx.world, t, me.position))
            .map(|(_, p)| p);
        wander(me, ctx, home);
    }
    decided
}

fn is_adult(me: &Entity, ctx: &AiContext<'_>) -> bool {
    me.character().is_some_and(|c| ctx.rules.is_adult(c.age))
}

fn objective(me: &Entity, ctx: &AiContext<'_>) -> StrategicObjective {
    me.tribe()
        .and_then(|t| ctx.world.tribes.get(t))
        .map(|t| t.objective)
        .unwrap_or_default()
}

fn hostile_human(me: &Entity, e: &Entity, ctx: &AiContext<'_>) -> bool {
    e.kind() == EntityKind::Human
        && e.is_alive()
        && ctx.world.tribes.is_hostile(me.tribe(), e.tribe())
}

/// The constructed storage spot of `tribe` nearest to `pos`.
fn own_storage(ctx: &AiContext<'_>, tribe: TribeId, pos: Vec2, with_food: bool) -> Option<(EntityId, f64)> {
    ctx.nearest(pos, f64::INFINITY, |e| {
        e.tribe() == Some(tribe)
            && e.building().is_some_and(|b| {
                b.building_type == BuildingType::StorageSpot
                    && b.is_constructed()
                    && (!with_food || b.storage.food_count() > 0)
            })
    })
}

fn has_berries(e: &Entity) -> bool {
    e.kind() == EntityKind::BerryBush && e.is_alive() && e.plant().is_some_and(|p| !p.food.is_empty())
}

/// Predators, whoever hurt us, and hostile humans where the objective says
/// to fight them. Children run home instead of fighting.
fn defend(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let rules = ctx.rules;
    let pos = me.position;
    let threat = avenger_target(me, ctx, rules.defend_radius)
        .or_else(|| {
            ctx.nearest(pos, rules.danger_radius, |e| {
                e.kind() == EntityKind::Predator && e.is_alive()
            })
        })
        .or_else(|| {
            let tribe = me.tribe()?;
            let radius = match objective(me, ctx) {
                StrategicObjective::Defend => rules.defend_radius,
                StrategicObjective::Raid if is_adult(me, ctx) => rules.sight_radius,
                _ => return None,
            };
            ctx.nearest(pos, radius, |e| {
                hostile_human(me, e, ctx)
                    && (objective(me, ctx) == StrategicObjective::Raid
                        || territory::in_territory(ctx.world, tribe, e.position))
            })
        });
    let Some((threat, distance)) = threat else {
        return false;
    };
    if is_adult(me, ctx) {
        engage(me, threat, distance, rules);
        return true;
    }
    let Some(t) = ctx.world.entities.get(threat) else {
        return false;
    };
    let away = ctx.world.map.direction(t.position, pos);
    let goal = ctx.world.map.wrap(pos + away * rules.wander_radius * 0.5);
    if let Some(c) = me.character_mut() {
        c.set_intent(Action::Moving, Some(Target::Position(goal)));
        c.attack_target = None;
    }
    true
}

fn keep_planting(me: &mut Entity, _ctx: &mut AiContext<'_>) -> bool {
    me.character()
        .is_some_and(|c| c.active_action == Action::Planting)
}

fn eat(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let threshold = ctx.rules.hunger_eat_threshold;
    let Some(c) = me.character_mut() else {
        return false;
    };
    let hungry = c.hunger >= threshold || (c.active_action == Action::Eating && c.hunger > 0.0);
    if !hungry || c.inventory.food_count() == 0 {
        return false;
    }
    if c.active_action != Action::Eating {
        c.set_intent(Action::Eating, None);
    }
    true
}

/// Hungry with empty hands: storage, then berries, then carcasses, then the hunt.
fn fetch_food(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let rules = ctx.rules;
    let pos = me.position;
    if !me.character().is_some_and(|c| c.hunger >= rules.hunger_eat_threshold) {
        return false;
    }
    if let Some(tribe) = me.tribe()
        && let Some((storage, _)) = own_storage(ctx, tribe, pos, true)
    {
        pursue(me, Action::Retrieving, storage);
        return true;
    }
    if let Some((bush, _)) = ctx.nearest(pos, rules.sight_radius, has_berries) {
        pursue(me, Action::Gathering, bush);
        return true;
    }
    if let Some((corpse, _)) = ctx.nearest(pos, rules.sight_radius, |e| {
        e.corpse().is_some_and(|c| !c.is_exhausted())
    }) {
        pursue(me, Action::Gathering, corpse);
        return true;
    }
    if is_adult(me, ctx)
        && let Some((prey, d)) = ctx.nearest(pos, rules.sight_radius, |e| {
            e.kind() == EntityKind::Prey && e.is_alive()
        })
    {
        engage(me, prey, d, rules);
        return true;
    }
    false
}

fn own_blueprint(me: &Entity, ctx: &AiContext<'_>) -> Option<(EntityId, f64)> {
    let tribe = me.tribe()?;
    ctx.nearest(me.position, f64::INFINITY, |e| {
        e.tribe() == Some(tribe) && e.building().is_some_and(|b| !b.is_constructed())
    })
}

/// Carry wood to the tribe's open construction site, fetching it first.
fn supply_construction(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    if !is_adult(me, ctx) {
        return false;
    }
    let Some((site, _)) = own_blueprint(me, ctx) else {
        return false;
    };
    let rules = ctx.rules;
    let pos = me.position;
    let wood = me.inventory().map_or(0, |i| i.wood);
    let room = me
        .inventory()
        .is_some_and(|i| i.total() < rules.carry_capacity);
    let remaining = ctx
        .world
        .entities
        .get(site)
        .and_then(|e| e.building())
        .map_or(0, |b| b.building_type.wood_cost().saturating_sub(b.wood_delivered));
    let fallen = ctx.nearest(pos, rules.sight_radius, |e| {
        e.kind() == EntityKind::Tree
            && e.state_id() == Some(StateId::Fallen)
            && e.plant().is_some_and(|p| p.wood > 0)
    });
    if wood > 0 && (wood >= remaining || !room || fallen.is_none()) {
        pursue(me, Action::Depositing, site);
        return true;
    }
    if !room {
        return false;
    }
    if let Some((tree, _)) = fallen {
        pursue(me, Action::Gathering, tree);
        return true;
    }
    if let Some((tree, _)) = ctx.nearest(pos, rules.sight_radius, |e| {
        e.kind() == EntityKind::Tree
            && matches!(e.state_id(), Some(StateId::Full | StateId::Spreading))
            && e.plant().is_some_and(|p| p.chop_progress < 1.0)
    }) {
        pursue(me, Action::Chopping, tree);
        return true;
    }
    false
}

/// Unload at the tribe storage once the pack is heavy enough.
fn deposit(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let Some(tribe) = me.tribe() else {
        return false;
    };
    let Some(carried) = me.inventory().map(|i| i.total()) else {
        return false;
    };
    let continuing = me
        .character()
        .is_some_and(|c| c.active_action == Action::Depositing);
    if carried == 0 || (carried < ctx.rules.deposit_threshold && !continuing) {
        return false;
    }
    let Some((storage, _)) = own_storage(ctx, tribe, me.position, false) else {
        return false;
    };
    pursue(me, Action::Depositing, storage);
    true
}

/// Raiders rob the nearest hostile storage.
fn raid(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    if objective(me, ctx) != StrategicObjective::Raid || !is_adult(me, ctx) {
        return false;
    }
    if me
        .inventory()
        .is_some_and(|i| i.total() >= ctx.rules.carry_capacity)
    {
        return false;
    }
    let target = ctx.nearest(me.position, f64::INFINITY, |e| {
        e.building().is_some_and(|b| {
            b.building_type == BuildingType::StorageSpot
                && b.is_constructed()
                && b.storage.food_count() > 0
        }) && ctx.world.tribes.is_hostile(me.tribe(), e.tribe())
    });
    let Some((storage, _)) = target else {
        return false;
    };
    pursue(me, Action::Retrieving, storage);
    true
}

fn fertile(e: &Entity, ctx: &AiContext<'_>) -> bool {
    e.is_alive()
        && e.character().is_some_and(|c| {
            ctx.rules.is_adult(c.age)
                && !c.is_pregnant
                && c.procreation_cooldown <= 0.0
                && c.hunger < ctx.rules.hunger_eat_threshold
        })
}

fn related(a: &Entity, b: &Entity) -> bool {
    let (Some(ca), Some(cb)) = (a.character(), b.character()) else {
        return false;
    };
    ca.is_child_of(b.id()) || cb.is_child_of(a.id()) || (ca.mother.is_some() && ca.mother == cb.mother)
}

/// Answer a suitor first; otherwise court the nearest eligible partner.
fn procreate(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    if !fertile(me, ctx) {
        return false;
    }
    let Some(gender) = me.character().map(|c| c.gender.opposite()) else {
        return false;
    };
    let my_id = me.id();
    let eligible = |e: &Entity| {
        e.kind() == EntityKind::Human
            && e.character().is_some_and(|c| c.gender == gender)
            && fertile(e, ctx)
            && !related(me, e)
            && !ctx.world.tribes.is_hostile(me.tribe(), e.tribe())
    };
    let radius = ctx.rules.sight_radius;
    let suitor = ctx.nearest(me.position, radius, |e| {
        eligible(e)
            && e.character().is_some_and(|c| {
                c.active_action == Action::Procreating && c.target == Some(Target::Entity(my_id))
            })
    });
    let Some((partner, _)) = suitor.or_else(|| ctx.nearest(me.position, radius, eligible)) else {
        return false;
    };
    pursue(me, Action::Procreating, partner);
    true
}

/// Fill the pack with berries for the tribe storage.
fn stock_food(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let Some(tribe) = me.tribe() else {
        return false;
    };
    let full = me
        .inventory()
        .is_none_or(|i| i.total() >= ctx.rules.carry_capacity);
    if full || own_storage(ctx, tribe, me.position, false).is_none() {
        return false;
    }
    let Some((bush, _)) = ctx.nearest(me.position, ctx.rules.sight_radius, has_berries) else {
        return false;
    };
    pursue(me, Action::Gathering, bush);
    true
}

/// Plant a bush on fertile home ground with none nearby.
fn plant(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let Some(tribe) = me.tribe() else {
        return false;
    };
    if !is_adult(me, ctx)
        || matches!(
            objective(me, ctx),
            StrategicObjective::Defend | StrategicObjective::Raid
        )
    {
        return false;
    }
    let pos = me.position;
    let rules = ctx.rules;
    if *ctx.world.soil.at(pos) < rules.fertile_threshold
        || !ctx.world.biome.at(pos).is_grazable()
        || !territory::in_territory(ctx.world, tribe, pos)
    {
        return false;
    }
    let crowded = ctx
        .nearest(pos, rules.plant_spacing.max(rules.sight_radius * 0.5), |e| {
            e.kind() == EntityKind::BerryBush
        })
        .is_some();
    if crowded {
        return false;
    }
    if let Some(c) = me.character_mut() {
        c.set_intent(Action::Planting, Some(Target::Position(pos)));
    }
    true
}

/// Tear down hostile buildings inside our territory.
fn dismantle(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let Some(tribe) = me.tribe() else {
        return false;
    };
    if !is_adult(me, ctx) {
        return false;
    }
    let map = ctx.world.map;
    let target = territory::intruding_buildings(ctx.world, tribe)
        .into_iter()
        .filter_map(|id| ctx.world.entities.get(id))
        .filter(|e| e.tribe().is_none() || ctx.world.tribes.is_hostile(Some(tribe), e.tribe()))
        .min_by(|a, b| {
            map.distance_squared(me.position, a.position)
                .total_cmp(&map.distance_squared(me.position, b.position))
        })
        .map(|e| e.id());
    let Some(target) = target else {
        return false;
    };
    pursue(me, Action::Dismantling, target);
    true
}

/// Leaders keep one placement or blueprint in flight at a time: a storage
/// spot first, then a bonfire, then dwellings as the tribe grows.
fn plan_construction(me: &Entity, tribe: TribeId, ctx: &mut AiContext<'_>) {
    let placing = ctx.world.scheduled.pending().iter().any(|e| {
        matches!(e.kind, ScheduledEventKind::PlaceBuilding { tribe: t, .. } if t == tribe)
    });
    if placing || own_blueprint(me, ctx).is_some() {
        return;
    }
    let (mut storage, mut bonfires, mut dwellings) = (0, 0, 0);
    for e in ctx.world.entities.iter_kind(EntityKind::Building) {
        if e.tribe() != Some(tribe) {
            continue;
        }
        match e.building().map(|b| b.building_type) {
            Some(BuildingType::StorageSpot) => storage += 1,
            Some(BuildingType::Bonfire) => bonfires += 1,
            Some(BuildingType::Dwelling) => dwellings += 1,
            None => {}
        }
    }
    let members = ctx.world.tribe_members(tribe).len() + 1;
    let expanding = objective(me, ctx) == StrategicObjective::Expand;
    let wanted_dwellings = members / 4 + usize::from(expanding);
    let building_type = if storage == 0 {
        BuildingType::StorageSpot
    } else if bonfires == 0 {
        BuildingType::Bonfire
    } else if dwellings < wanted_dwellings {
        BuildingType::Dwelling
    } else {
        return;
    };

    let rules = ctx.rules;
    let position = match territory::nearest_home(ctx.world, tribe, me.position) {
        None => me.position,
        Some((_, home)) => {
            let angle = ctx.rng.random_range(0.0..std::f64::consts::TAU);
            let spread = if expanding { 2.0 } else { 1.0 };
            let reach = rules.building_spacing * spread * ctx.rng.random_range(1.0..1.5);
            ctx.world.map.wrap(home + Vec2::from_angle(angle) * reach)
        }
    };
    tracing::debug!(leader = %me.id(), %tribe, %building_type, "ordering construction");
    ctx.schedule(
        rules.placement_delay_hours,
        ScheduledEventKind::PlaceBuilding {
            tribe,
            builder: me.id(),
            building_type,
            position,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::factory;
    use crate::interaction::testing::Harness;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tw_core::component::{FoodItem, FoodKind, Gender};

    fn decide_for(h: &mut Harness, id: EntityId) -> (Entity, Vec<(f64, ScheduledEventKind)>) {
        let mut me = h.world.entities.take(id).unwrap();
        let rules = RulesConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut ctx = AiContext::new(&h.world, &rules, &mut rng);
        decide(&mut me, &mut ctx);
        let requests = ctx.requests().to_vec();
        (me, requests)
    }

    fn intent(e: &Entity) -> (Action, Option<Target>) {
        let c = e.character().unwrap();
        (c.active_action, c.target)
    }

    #[test]
    fn adults_fight_predators_and_children_run() {
        let mut h = Harness::new();
        let wolf = factory::spawn_predator(&mut h.world, Vec2::new(540.0, 500.0), Gender::Male, 5.0);
        let man = factory::spawn_human(&mut h.world, Vec2::new(500.0, 500.0), Gender::Male, 25.0, None);
        let boy = factory::spawn_human(&mut h.world, Vec2::new(490.0, 500.0), Gender::Male, 8.0, None);

        let (me, _) = decide_for(&mut h, man);
        assert_eq!(intent(&me), (Action::Attacking, Some(Target::Entity(wolf))));
        h.world.entities.restore(me);

        let (me, _) = decide_for(&mut h, boy);
        let (action, target) = intent(&me);
        assert_eq!(action, Action::Moving);
        let Some(Target::Position(goal)) = target else {
            panic!("expected to run somewhere");
        };
        assert!(goal.x < 490.0, "runs away from the wolf");
    }

    #[test]
    fn hungry_humans_eat_then_forage() {
        let mut h = Harness::new();
        let rules = h.config.rules.clone();
        let bush = factory::spawn_bush(&mut h.world, Vec2::new(200.0, 100.0), true, 3, &rules);
        let id = factory::spawn_human(&mut h.world, Vec2::new(100.0, 100.0), Gender::Female, 25.0, None);
        {
            let me = h.world.entities.get_mut(id).unwrap();
            me.character_mut().unwrap().hunger = 60.0;
            me.inventory_mut().unwrap().add_food(FoodItem::new(FoodKind::Berry, 0.0));
        }
        let (me, _) = decide_for(&mut h, id);
        assert_eq!(intent(&me), (Action::Eating, None));
        h.world.entities.restore(me);

        h.world.entities.get_mut(id).unwrap().inventory_mut().unwrap().take_food();
        let (me, _) = decide_for(&mut h, id);
        assert_eq!(intent(&me), (Action::Gathering, Some(Target::Entity(bush))));
    }

    #[test]
    fn leaders_order_a_storage_spot_first() {
        let mut h = Harness::new();
        let id = factory::spawn_human(&mut h.world, Vec2::new(300.0, 300.0), Gender::Male, 30.0, None);
        let tribe = h.world.tribes.found(id, 0.0);
        h.world.entities.get_mut(id).unwrap().human_mut().unwrap().tribe = Some(tribe);

        let (_, requests) = decide_for(&mut h, id);
        assert_eq!(requests.len(), 1);
        let (time, ScheduledEventKind::PlaceBuilding { building_type, position, .. }) = &requests[0] else {
            panic!("expected a placement");
        };
        assert_eq!(*building_type, BuildingType::StorageSpot);
        assert_eq!(*position, Vec2::new(300.0, 300.0));
        assert!((*time - RulesConfig::default().placement_delay_hours).abs() < 1e-12);
    }

    #[test]
    fn full_packs_go_to_storage() {
        let mut h = Harness::new();
        let tribe = h.world.tribes.found(EntityId(99), 0.0);
        let storage = factory::spawn_building(&mut h.world, Vec2::new(400.0, 100.0), BuildingType::StorageSpot, Some(tribe), true);
        let id = factory::spawn_human(&mut h.world, Vec2::new(100.0, 100.0), Gender::Female, 25.0, Some(tribe));
        let threshold = h.config.rules.deposit_threshold;
        {
            let inv = h.world.entities.get_mut(id).unwrap().inventory_mut().unwrap();
            for _ in 0..threshold {
                inv.add_food(FoodItem::new(FoodKind::Berry, 0.0));
            }
        }
        let (me, _) = decide_for(&mut h, id);
        assert_eq!(intent(&me), (Action::Depositing, Some(Target::Entity(storage))));
    }

    #[test]
    fn nothing_to_do_means_wandering_near_home() {
        let mut h = Harness::new();
        let id = factory::spawn_human(&mut h.world, Vec2::new(100.0, 100.0), Gender::Male, 8.0, None);
        let (me, _) = decide_for(&mut h, id);
        assert_eq!(intent(&me).0, Action::Moving);
    }
}

use tw_core::component::Action;
use tw_core::effects::EffectKind;
use tw_core::entity::{Entity, EntityKind};

use super::{InteractionDef, finish, intends, living};
use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::event::SimEventKind;

fn ready_to_work(s: &Entity) -> bool {
    living(s) && s.human().is_some_and(|h| h.work_cooldown <= 0.0)
}

fn rest(s: &mut Entity, ctx: &SimContext<'_>) {
    if let Some(h) = s.human_mut() {
        h.work_cooldown = ctx.rules().work_cooldown;
    }
}

fn site_needs_wood(s: &Entity, t: &Entity, _ctx: &SimContext<'_>) -> bool {
    ready_to_work(s)
        && intends(s, Action::Depositing, t.id())
        && s.tribe().is_some()
        && s.tribe() == t.tribe()
        && s.inventory().is_some_and(|i| i.wood > 0)
        && t.building().is_some_and(|b| !b.is_constructed())
}

/// One log per hit. The carrier keeps going until the site is done or the
/// wood runs out.
fn deliver_wood(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    if s.inventory_mut().map_or(0, |i| i.take_wood(1)) == 0 {
        return;
    }
    rest(s, ctx);
    let Some(b) = t.building_mut() else { return };
    b.wood_delivered += 1;
    let cost = b.building_type.wood_cost().max(1);
    b.construction_progress = (f64::from(b.wood_delivered) / f64::from(cost)).min(1.0);
    let (done, building_type, tribe) = (b.is_constructed(), b.building_type, b.tribe);
    let out_of_wood = s.inventory().is_none_or(|i| i.wood == 0);
    if done || out_of_wood {
        finish(s);
    }
    if done {
        let building = t.id();
        ctx.world.effects.push(EffectKind::Build, t.position, ctx.world.time);
        tracing::info!(%building, %building_type, "construction finished");
        ctx.emit(
            SimEventKind::BuildingCompleted {
                building,
                tribe,
                building_type,
            },
            format!("{building_type} {building} was completed"),
        );
    }
}

fn abandoned(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    living(s)
        && s.tribe().is_some()
        && t.building().is_some_and(|b| b.is_constructed() && b.hitpoints > 0.0)
        && t.tribe().is_none_or(|tribe| !ctx.world.tribes.contains(tribe))
}

/// Buildings without a living tribe go to the first tribe member to reach them.
fn take_over(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let Some(tribe) = s.tribe() else { return };
    let Some(b) = t.building_mut() else { return };
    b.tribe = Some(tribe);
    let building = t.id();
    tracing::info!(%building, %tribe, "building taken over");
    ctx.emit(
        SimEventKind::BuildingTakenOver { building, tribe },
        format!("{tribe} took over {building}"),
    );
}

fn can_dismantle(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    ready_to_work(s)
        && intends(s, Action::Dismantling, t.id())
        && t.building().is_some_and(|b| b.dismantle_progress < 1.0)
        && (t.tribe().is_none() || ctx.world.tribes.is_hostile(s.tribe(), t.tribe()))
}

/// Tearing a building down returns half the wood that went into it.
fn dismantle(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let per_hit = ctx.rules().dismantle_per_hit;
    rest(s, ctx);
    let Some(b) = t.building_mut() else { return };
    b.dismantle_progress = (b.dismantle_progress + per_hit).min(1.0);
    if b.dismantle_progress < 1.0 {
        ctx.world.effects.push(EffectKind::Chop, t.position, ctx.world.time);
        return;
    }
    let refund = b.wood_delivered / 2;
    b.wood_delivered = 0;
    if let Some(inv) = s.inventory_mut() {
        inv.wood += refund;
    }
    finish(s);
    let (building, by) = (t.id(), s.id());
    tracing::info!(%building, %by, refund, "building dismantled");
    ctx.emit(
        SimEventKind::BuildingDismantled { building, by },
        format!("{by} dismantled {building}"),
    );
}

pub(super) fn defs(rules: &RulesConfig) -> Vec<InteractionDef> {
    let reach = rules.building_reach;
    vec![
        InteractionDef::new(
            "deliver_wood",
            EntityKind::Human,
            EntityKind::Building,
            reach,
            site_needs_wood,
            deliver_wood,
        ),
        InteractionDef::new(
            "take_over",
            EntityKind::Human,
            EntityKind::Building,
            reach,
            abandoned,
            take_over,
        ),
        InteractionDef::new(
            "dismantle",
            EntityKind::Human,
            EntityKind::Building,
            reach,
            can_dismantle,
            dismantle,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::interaction::testing::Harness;
    use tw_core::component::{BuildingType, Gender, Target};
    use tw_core::entity::EntityId;
    use tw_core::tribe::TribeId;
    use tw_core::vector::Vec2;

    fn worker(h: &mut Harness, tribe: Option<TribeId>, action: Action, site: EntityId, wood: u32) -> Entity {
        let id = factory::spawn_human(&mut h.world, Vec2::new(100.0, 100.0), Gender::Male, 25.0, tribe);
        let mut e = h.world.entities.take(id).unwrap();
        e.inventory_mut().unwrap().wood = wood;
        e.character_mut()
            .unwrap()
            .set_intent(action, Some(Target::Entity(site)));
        e
    }

    #[test]
    fn wood_deliveries_complete_a_blueprint() {
        let mut h = Harness::new();
        let tribe = h.world.tribes.found(EntityId(99), 0.0);
        let site = factory::spawn_building(&mut h.world, Vec2::new(150.0, 100.0), BuildingType::Bonfire, Some(tribe), false);
        let mut s = worker(&mut h, Some(tribe), Action::Depositing, site, 5);
        let mut t = h.world.entities.take(site).unwrap();
        let mut ctx = h.ctx();

        let cost = BuildingType::Bonfire.wood_cost();
        for _ in 0..cost {
            assert!(site_needs_wood(&s, &t, &ctx));
            deliver_wood(&mut s, &mut t, &mut ctx);
            s.human_mut().unwrap().work_cooldown = 0.0;
        }
        assert!(t.building().unwrap().is_constructed());
        assert_eq!(s.inventory().unwrap().wood, 5 - cost);
        assert_eq!(s.character().unwrap().active_action, Action::Idle);
        assert!(matches!(
            ctx.events.events()[0].kind,
            SimEventKind::BuildingCompleted { tribe: Some(_), .. }
        ));
    }

    #[test]
    fn orphaned_buildings_change_hands() {
        let mut h = Harness::new();
        let old = h.world.tribes.found(EntityId(98), 0.0);
        let new = h.world.tribes.found(EntityId(99), 0.0);
        let hut = factory::spawn_building(&mut h.world, Vec2::new(150.0, 100.0), BuildingType::Dwelling, Some(old), true);
        let mut s = worker(&mut h, Some(new), Action::Idle, hut, 0);
        let mut t = h.world.entities.take(hut).unwrap();

        assert!(!abandoned(&s, &t, &h.ctx()));
        h.world.tribes.dissolve(old);
        let mut ctx = h.ctx();
        assert!(abandoned(&s, &t, &ctx));
        take_over(&mut s, &mut t, &mut ctx);
        assert_eq!(t.tribe(), Some(new));
        assert!(!abandoned(&s, &t, &ctx));
    }

    #[test]
    fn dismantling_refunds_half_the_wood() {
        let mut h = Harness::new();
        let enemy = h.world.tribes.found(EntityId(98), 0.0);
        let mine = h.world.tribes.found(EntityId(99), 0.0);
        let hut = factory::spawn_building(&mut h.world, Vec2::new(150.0, 100.0), BuildingType::Dwelling, Some(enemy), true);
        let mut s = worker(&mut h, Some(mine), Action::Dismantling, hut, 0);
        let mut t = h.world.entities.take(hut).unwrap();
        let mut ctx = h.ctx();

        let hits = (1.0 / ctx.rules().dismantle_per_hit).ceil() as usize;
        for _ in 0..hits + 2 {
            if !can_dismantle(&s, &t, &ctx) {
                break;
            }
            dismantle(&mut s, &mut t, &mut ctx);
            s.human_mut().unwrap().work_cooldown = 0.0;
        }
        assert!(t.building().unwrap().dismantle_progress >= 1.0);
        assert_eq!(s.inventory().unwrap().wood, BuildingType::Dwelling.wood_cost() / 2);
        assert_eq!(ctx.events.len(), 1);
    }
}

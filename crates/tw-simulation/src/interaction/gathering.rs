use tw_core::component::{Action, FoodItem, FoodKind};
use tw_core::effects::EffectKind;
use tw_core::entity::{Entity, EntityKind};
use tw_core::state::StateId;

use super::{InteractionDef, finish, intends, living};
use crate::config::RulesConfig;
use crate::context::SimContext;

fn can_carry(e: &Entity, ctx: &SimContext<'_>) -> bool {
    e.character().is_some_and(|c| {
        c.gather_cooldown <= 0.0 && c.inventory.total() < ctx.rules().carry_capacity
    })
}

fn start_cooldown(e: &mut Entity, ctx: &SimContext<'_>) {
    if let Some(c) = e.character_mut() {
        c.gather_cooldown = ctx.rules().gather_cooldown;
    }
}

fn bush_ready(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    living(s)
        && intends(s, Action::Gathering, t.id())
        && can_carry(s, ctx)
        && t.is_alive()
        && t.plant().is_some_and(|p| !p.food.is_empty())
}

fn pick_berry(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let Some(berry) = t.plant_mut().and_then(|p| {
        if p.food.is_empty() {
            None
        } else {
            Some(p.food.remove(0))
        }
    }) else {
        return;
    };
    if let Some(inv) = s.inventory_mut() {
        inv.add_food(berry);
    }
    start_cooldown(s, ctx);
}

fn fallen_tree_ready(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    living(s)
        && intends(s, Action::Gathering, t.id())
        && can_carry(s, ctx)
        && t.state_id() == Some(StateId::Fallen)
        && t.plant().is_some_and(|p| p.wood > 0)
}

fn collect_wood(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let Some(plant) = t.plant_mut() else { return };
    if plant.wood == 0 {
        return;
    }
    plant.wood -= 1;
    if let Some(inv) = s.inventory_mut() {
        inv.wood += 1;
    }
    start_cooldown(s, ctx);
}

fn standing_tree(s: &Entity, t: &Entity, _ctx: &SimContext<'_>) -> bool {
    living(s)
        && intends(s, Action::Chopping, t.id())
        && s.human().is_some_and(|h| h.work_cooldown <= 0.0)
        && matches!(t.state_id(), Some(StateId::Full | StateId::Spreading))
        && t.plant().is_some_and(|p| p.chop_progress < 1.0)
}

/// Felling finishes by switching the chopper over to collecting the wood.
fn chop(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let rules = ctx.rules();
    let (per_hit, cooldown) = (rules.chop_per_hit, rules.work_cooldown);
    let Some(plant) = t.plant_mut() else { return };
    plant.chop_progress = (plant.chop_progress + per_hit).min(1.0);
    let felled = plant.chop_progress >= 1.0;
    if let Some(h) = s.human_mut() {
        h.work_cooldown = cooldown;
        if felled {
            h.character.active_action = Action::Gathering;
        }
    }
    ctx.world.effects.push(EffectKind::Chop, t.position, ctx.world.time);
}

fn corpse_ready(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    living(s)
        && intends(s, Action::Gathering, t.id())
        && can_carry(s, ctx)
        && t.corpse().is_some_and(|c| !c.is_exhausted())
}

/// Carried goods come first, then meat.
fn loot(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let now = ctx.world.time;
    let Some(corpse) = t.corpse_mut() else { return };
    let item = if let Some(food) = corpse.inventory.take_food() {
        Some((Some(food), 0))
    } else if corpse.inventory.take_wood(1) == 1 {
        Some((None, 1))
    } else if corpse.meat > 0 {
        corpse.meat -= 1;
        Some((Some(FoodItem::new(FoodKind::Meat, now)), 0))
    } else {
        None
    };
    let exhausted = corpse.is_exhausted();
    let Some((food, wood)) = item else { return };
    if let Some(inv) = s.inventory_mut() {
        if let Some(food) = food {
            inv.add_food(food);
        }
        inv.wood += wood;
    }
    start_cooldown(s, ctx);
    if exhausted {
        finish(s);
    }
}

pub(super) fn defs(rules: &RulesConfig) -> Vec<InteractionDef> {
    let reach = rules.interact_range;
    vec![
        InteractionDef::new(
            "gather_berries",
            EntityKind::Human,
            EntityKind::BerryBush,
            reach,
            bush_ready,
            pick_berry,
        ),
        InteractionDef::new(
            "gather_wood",
            EntityKind::Human,
            EntityKind::Tree,
            reach,
            fallen_tree_ready,
            collect_wood,
        ),
        InteractionDef::new(
            "chop_tree",
            EntityKind::Human,
            EntityKind::Tree,
            reach,
            standing_tree,
            chop,
        ),
        InteractionDef::new(
            "loot_corpse",
            EntityKind::Human,
            EntityKind::Corpse,
            reach,
            corpse_ready,
            loot,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::interaction::testing::Harness;
    use tw_core::component::{Gender, Inventory, Target};
    use tw_core::vector::Vec2;

    fn gatherer(h: &mut Harness, action: Action, target: tw_core::entity::EntityId) -> Entity {
        let id = factory::spawn_human(&mut h.world, Vec2::new(100.0, 100.0), Gender::Female, 20.0, None);
        let mut e = h.world.entities.take(id).unwrap();
        e.character_mut()
            .unwrap()
            .set_intent(action, Some(Target::Entity(target)));
        e
    }

    #[test]
    fn berries_move_one_at_a_time() {
        let mut h = Harness::new();
        let rules = h.config.rules.clone();
        let bush = factory::spawn_bush(&mut h.world, Vec2::new(120.0, 100.0), true, 3, &rules);
        let mut s = gatherer(&mut h, Action::Gathering, bush);
        let mut t = h.world.entities.take(bush).unwrap();
        let mut ctx = h.ctx();

        assert!(bush_ready(&s, &t, &ctx));
        pick_berry(&mut s, &mut t, &mut ctx);
        assert_eq!(s.inventory().unwrap().food_count(), 1);
        assert_eq!(t.plant().unwrap().food.len(), 2);
        assert!(!bush_ready(&s, &t, &ctx), "cooldown should block a second pick");
    }

    #[test]
    fn chopping_fells_then_gathers() {
        let mut h = Harness::new();
        let rules = h.config.rules.clone();
        let tree = factory::spawn_tree(&mut h.world, Vec2::new(120.0, 100.0), true, &rules);
        let mut s = gatherer(&mut h, Action::Chopping, tree);
        let mut t = h.world.entities.take(tree).unwrap();
        let mut ctx = h.ctx();
        let hits = (1.0 / rules.chop_per_hit).ceil() as usize;
        for _ in 0..hits {
            assert!(standing_tree(&s, &t, &ctx));
            chop(&mut s, &mut t, &mut ctx);
            s.human_mut().unwrap().work_cooldown = 0.0;
        }
        assert!(t.plant().unwrap().chop_progress >= 1.0);
        assert_eq!(s.character().unwrap().active_action, Action::Gathering);
        assert!(!standing_tree(&s, &t, &ctx));
    }

    #[test]
    fn corpses_give_up_goods_then_meat() {
        let mut h = Harness::new();
        let mut inv = Inventory::default();
        inv.wood = 1;
        let corpse = factory::spawn_corpse(&mut h.world, Vec2::new(110.0, 100.0), EntityKind::Prey, inv, 1);
        let mut s = gatherer(&mut h, Action::Gathering, corpse);
        let mut t = h.world.entities.take(corpse).unwrap();
        let mut ctx = h.ctx();

        loot(&mut s, &mut t, &mut ctx);
        assert_eq!(s.inventory().unwrap().wood, 1);
        s.character_mut().unwrap().gather_cooldown = 0.0;
        loot(&mut s, &mut t, &mut ctx);
        assert_eq!(s.inventory().unwrap().food[0].kind, FoodKind::Meat);
        assert!(t.corpse().unwrap().is_exhausted());
        assert_eq!(s.character().unwrap().active_action, Action::Idle);
    }
}

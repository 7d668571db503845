use tw_core::component::Action;
use tw_core::entity::{Entity, EntityKind};

use super::{InteractionDef, intends, living};
use crate::config::RulesConfig;
use crate::context::SimContext;

fn hungry_eater(s: &Entity, t: &Entity) -> bool {
    living(s)
        && intends(s, Action::Eating, t.id())
        && s.character()
            .is_some_and(|c| c.feed_cooldown <= 0.0 && c.hunger > 0.0)
}

fn eat(e: &mut Entity, nutrition: f64, ctx: &SimContext<'_>) {
    if let Some(c) = e.character_mut() {
        c.hunger = (c.hunger - nutrition).max(0.0);
        c.feed_cooldown = ctx.rules().feed_cooldown;
    }
}

fn bush_has_berries(s: &Entity, t: &Entity, _ctx: &SimContext<'_>) -> bool {
    hungry_eater(s, t) && t.is_alive() && t.plant().is_some_and(|p| !p.food.is_empty())
}

fn browse(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let Some(plant) = t.plant_mut() else { return };
    if plant.food.is_empty() {
        return;
    }
    plant.food.remove(0);
    eat(s, ctx.rules().berry_nutrition, ctx);
}

fn carcass_has_meat(s: &Entity, t: &Entity, _ctx: &SimContext<'_>) -> bool {
    hungry_eater(s, t) && t.corpse().is_some_and(|c| c.meat > 0)
}

fn devour(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let Some(corpse) = t.corpse_mut() else { return };
    if corpse.meat == 0 {
        return;
    }
    corpse.meat -= 1;
    eat(s, ctx.rules().meat_nutrition, ctx);
}

/// A fed adult carrying food, off cooldown.
fn can_share(s: &Entity, ctx: &SimContext<'_>) -> bool {
    living(s)
        && s.character().is_some_and(|c| {
            ctx.rules().is_adult(c.age)
                && c.feed_cooldown <= 0.0
                && c.hunger < ctx.rules().hunger_eat_threshold
                && c.inventory.food_count() > 0
        })
}

fn needs_food(t: &Entity, ctx: &SimContext<'_>) -> bool {
    living(t)
        && t.character().is_some_and(|c| {
            c.hunger >= ctx.rules().hunger_eat_threshold && c.inventory.food_count() == 0
        })
}

fn hungry_child(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    can_share(s, ctx)
        && needs_food(t, ctx)
        && t.character()
            .is_some_and(|c| c.is_child_of(s.id()) && !ctx.rules().is_adult(c.age))
}

fn hungry_elder(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    let elder = ctx.rules().elder_age;
    can_share(s, ctx)
        && needs_food(t, ctx)
        && s.tribe().is_some()
        && s.tribe() == t.tribe()
        && s.character().is_some_and(|c| c.age < elder)
        && t.character().is_some_and(|c| c.age >= elder)
}

/// Hand one food item over and let the receiver eat it.
fn share(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let Some(item) = s.inventory_mut().and_then(|i| i.take_food()) else {
        return;
    };
    if let Some(c) = s.character_mut() {
        c.feed_cooldown = ctx.rules().feed_cooldown;
    }
    let nutrition = ctx.rules().nutrition(item.kind);
    if let Some(c) = t.character_mut() {
        c.hunger = (c.hunger - nutrition).max(0.0);
    }
    tracing::debug!(giver = %s.id(), receiver = %t.id(), food = ?item.kind, "food shared");
}

pub(super) fn defs(rules: &RulesConfig) -> Vec<InteractionDef> {
    let reach = rules.interact_range;
    vec![
        InteractionDef::new(
            "browse_berries",
            EntityKind::Prey,
            EntityKind::BerryBush,
            reach,
            bush_has_berries,
            browse,
        ),
        InteractionDef::new(
            "eat_carrion",
            EntityKind::Predator,
            EntityKind::Corpse,
            reach,
            carcass_has_meat,
            devour,
        ),
        InteractionDef::new(
            "feed_child",
            EntityKind::Human,
            EntityKind::Human,
            reach,
            hungry_child,
            share,
        ),
        InteractionDef::new(
            "feed_elder",
            EntityKind::Human,
            EntityKind::Human,
            reach,
            hungry_elder,
            share,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::interaction::testing::Harness;
    use tw_core::component::{FoodItem, FoodKind, Gender, Target};
    use tw_core::vector::Vec2;

    #[test]
    fn predators_eat_carrion() {
        let mut h = Harness::new();
        let wolf = factory::spawn_predator(&mut h.world, Vec2::new(100.0, 100.0), Gender::Male, 5.0);
        let corpse = factory::spawn_corpse(&mut h.world, Vec2::new(110.0, 100.0), EntityKind::Prey, Default::default(), 2);
        let mut s = h.world.entities.take(wolf).unwrap();
        let mut t = h.world.entities.take(corpse).unwrap();
        {
            let c = s.character_mut().unwrap();
            c.hunger = 80.0;
            c.set_intent(Action::Eating, Some(Target::Entity(corpse)));
        }
        let mut ctx = h.ctx();
        assert!(carcass_has_meat(&s, &t, &ctx));
        devour(&mut s, &mut t, &mut ctx);
        assert_eq!(t.corpse().unwrap().meat, 1);
        assert!((s.character().unwrap().hunger - (80.0 - ctx.rules().meat_nutrition)).abs() < 1e-9);
        assert!(!carcass_has_meat(&s, &t, &ctx));
    }

    #[test]
    fn parents_feed_hungry_children() {
        let mut h = Harness::new();
        let mother = factory::spawn_human(&mut h.world, Vec2::new(100.0, 100.0), Gender::Female, 25.0, None);
        let child = factory::spawn_child(
            &mut h.world,
            EntityKind::Human,
            Vec2::new(110.0, 100.0),
            Gender::Male,
            mother,
            None,
            None,
        )
        .unwrap();
        let mut s = h.world.entities.take(mother).unwrap();
        let mut t = h.world.entities.take(child).unwrap();
        s.inventory_mut().unwrap().add_food(FoodItem::new(FoodKind::Berry, 0.0));
        t.character_mut().unwrap().hunger = 60.0;
        let mut ctx = h.ctx();

        assert!(hungry_child(&s, &t, &ctx));
        assert!(!hungry_elder(&s, &t, &ctx));
        share(&mut s, &mut t, &mut ctx);
        assert_eq!(s.inventory().unwrap().food_count(), 0);
        assert!((t.character().unwrap().hunger - (60.0 - ctx.rules().berry_nutrition)).abs() < 1e-9);
        assert!(!hungry_child(&s, &t, &ctx));
    }
}

//! Predator task AI: fight back, feed, mate, roam.

use tw_core::component::Action;
use tw_core::entity::{Entity, EntityKind};

use super::{AiContext, Need, avenger_target, engage, first_need, pursue, wander};

const NEEDS: [(&str, Need); 3] = [("retaliate", retaliate), ("feed", feed), ("mate", mate)];

/// Decide the next intent for a predator. Returns the need that decided, or
/// `None` when it roams.
pub fn decide(me: &mut Entity, ctx: &mut AiContext<'_>) -> Option<&'static str> {
    let decided = first_need(&NEEDS, me, ctx);
    if decided.is_none() {
        wander(me, ctx, None);
    }
    decided
}

fn retaliate(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let Some((attacker, d)) = avenger_target(me, ctx, ctx.rules.defend_radius) else {
        return false;
    };
    engage(me, attacker, d, ctx.rules);
    true
}

/// Carrion first, then live prey. Starving predators also hunt humans.
fn feed(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    let rules = ctx.rules;
    let Some(c) = me.character() else {
        return false;
    };
    let hunger = c.hunger;
    let eating = c.active_action == Action::Eating && hunger > 0.0;
    if hunger < rules.hunger_eat_threshold && !eating {
        return false;
    }
    let pos = me.position;
    if let Some((corpse, _)) = ctx.nearest(pos, rules.sight_radius, |e| {
        e.corpse().is_some_and(|c| c.meat > 0)
    }) {
        pursue(me, Action::Eating, corpse);
        return true;
    }
    let starving = hunger >= rules.hunger_critical;
    let quarry = ctx.nearest(pos, rules.sight_radius, |e| {
        e.is_alive()
            && (e.kind() == EntityKind::Prey || (starving && e.kind() == EntityKind::Human))
    });
    let Some((quarry, d)) = quarry else {
        return false;
    };
    engage(me, quarry, d, rules);
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

fn mate(me: &mut Entity, ctx: &mut AiContext<'_>) -> bool {
    if !fertile(me, ctx) {
        return false;
    }
    let Some(c) = me.character() else {
        return false;
    };
    let (gender, mother) = (c.gender.opposite(), c.mother);
    let my_id = me.id();
    let partner = ctx.nearest(me.position, ctx.rules.sight_radius, |e| {
        e.kind() == EntityKind::Predator
            && fertile(e, ctx)
            && e.character().is_some_and(|c| {
                c.gender == gender
                    && !c.is_child_of(my_id)
                    && (mother.is_none() || c.mother != mother)
            })
    });
    let Some((partner, _)) = partner else {
        return false;
    };
    pursue(me, Action::Procreating, partner);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::factory;
    use crate::interaction::testing::Harness;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tw_core::component::{Gender, Inventory, Target};
    use tw_core::entity::EntityId;
    use tw_core::vector::Vec2;

    fn decide_for(h: &mut Harness, id: EntityId) -> Entity {
        let mut me = h.world.entities.take(id).unwrap();
        let rules = RulesConfig::default();
        let mut rng = StdRng::seed_from_u64(13);
        let mut ctx = AiContext::new(&h.world, &rules, &mut rng);
        decide(&mut me, &mut ctx);
        me
    }

    fn hungry_wolf(h: &mut Harness, hunger: f64) -> EntityId {
        let id = factory::spawn_predator(&mut h.world, Vec2::new(500.0, 500.0), Gender::Male, 5.0);
        h.world.entities.get_mut(id).unwrap().character_mut().unwrap().hunger = hunger;
        id
    }

    #[test]
    fn carrion_beats_the_hunt() {
        let mut h = Harness::new();
        let wolf = hungry_wolf(&mut h, 60.0);
        let deer = factory::spawn_prey(&mut h.world, Vec2::new(520.0, 500.0), Gender::Male, 5.0);
        let corpse = factory::spawn_corpse(&mut h.world, Vec2::new(600.0, 500.0), EntityKind::Prey, Inventory::default(), 2);

        let me = decide_for(&mut h, wolf);
        assert_eq!(me.character().unwrap().active_action, Action::Eating);
        assert_eq!(me.character().unwrap().target, Some(Target::Entity(corpse)));
        h.world.entities.restore(me);

        h.world.entities.remove(corpse);
        let me = decide_for(&mut h, wolf);
        let c = me.character().unwrap();
        assert_eq!(c.active_action, Action::Attacking);
        assert_eq!(c.attack_target, Some(deer));
    }

    #[test]
    fn only_starving_predators_hunt_humans() {
        let mut h = Harness::new();
        let wolf = hungry_wolf(&mut h, 60.0);
        let man = factory::spawn_human(&mut h.world, Vec2::new(560.0, 500.0), Gender::Male, 25.0, None);

        let me = decide_for(&mut h, wolf);
        assert_eq!(me.character().unwrap().active_action, Action::Moving);
        h.world.entities.restore(me);

        h.world.entities.get_mut(wolf).unwrap().character_mut().unwrap().hunger = 90.0;
        let me = decide_for(&mut h, wolf);
        assert_eq!(me.character().unwrap().attack_target, Some(man));
    }

    #[test]
    fn wounded_predators_strike_back() {
        let mut h = Harness::new();
        let wolf = hungry_wolf(&mut h, 0.0);
        let man = factory::spawn_human(&mut h.world, Vec2::new(560.0, 500.0), Gender::Male, 25.0, None);
        h.world.entities.get_mut(wolf).unwrap().character_mut().unwrap().last_attacker = Some(man);

        let me = decide_for(&mut h, wolf);
        let c = me.character().unwrap();
        assert_eq!(c.active_action, Action::Attacking);
        assert_eq!(c.target, Some(Target::Entity(man)));
    }
}

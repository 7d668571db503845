use tw_core::component::{Action, CharacterData, Gender, Target};
use tw_core::entity::{Entity, EntityId, EntityKind};

use super::{InteractionDef, living};
use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::event::SimEventKind;

/// Willing to mate with `partner`: either courting nobody in particular or
/// courting exactly them.
fn courting(e: &Entity, partner: EntityId) -> bool {
    e.character().is_some_and(|c| {
        c.active_action == Action::Procreating
            && c.target.is_none_or(|t| t == Target::Entity(partner))
    })
}

fn fertile(c: &CharacterData, rules: &RulesConfig) -> bool {
    rules.is_adult(c.age)
        && c.hunger < rules.hunger_critical
        && c.procreation_cooldown <= 0.0
        && !c.is_pregnant
}

fn related(a: &Entity, b: &Entity) -> bool {
    let (Some(ca), Some(cb)) = (a.character(), b.character()) else {
        return false;
    };
    ca.is_child_of(b.id())
        || cb.is_child_of(a.id())
        || (ca.mother.is_some() && ca.mother == cb.mother)
}

fn compatible(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    if !(living(s) && living(t) && courting(s, t.id()) && courting(t, s.id())) {
        return false;
    }
    let rules = ctx.rules();
    let (Some(cs), Some(ct)) = (s.character(), t.character()) else {
        return false;
    };
    cs.gender != ct.gender
        && fertile(cs, rules)
        && fertile(ct, rules)
        && !related(s, t)
        && !ctx.world.tribes.is_hostile(s.tribe(), t.tribe())
}

/// Tribeless humans who pair up found a tribe; a tribeless partner joins
/// the other's.
fn settle_tribe(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    if s.kind() != EntityKind::Human {
        return;
    }
    match (s.tribe(), t.tribe()) {
        (None, None) => {
            let s_age = s.character().map_or(0.0, |c| c.age);
            let t_age = t.character().map_or(0.0, |c| c.age);
            let leader = if t_age > s_age { t.id() } else { s.id() };
            let tribe = ctx.world.tribes.found(leader, ctx.world.time);
            for e in [&mut *s, &mut *t] {
                if let Some(h) = e.human_mut() {
                    h.tribe = Some(tribe);
                }
            }
            tracing::info!(%tribe, %leader, "tribe founded");
            ctx.emit(
                SimEventKind::TribeFounded { tribe, leader },
                format!("{leader} founded {tribe}"),
            );
        }
        (Some(tribe), None) => {
            if let Some(h) = t.human_mut() {
                h.tribe = Some(tribe);
            }
        }
        (None, Some(tribe)) => {
            if let Some(h) = s.human_mut() {
                h.tribe = Some(tribe);
            }
        }
        (Some(_), Some(_)) => {}
    }
}

fn conceive(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let rules = ctx.rules();
    let (gestation, cooldown) = (rules.gestation_hours, rules.procreation_cooldown);
    let s_female = s.character().is_some_and(|c| c.gender == Gender::Female);
    let (mother, father) = if s_female {
        (s.id(), t.id())
    } else {
        (t.id(), s.id())
    };
    for e in [&mut *s, &mut *t] {
        let id = e.id();
        if let Some(c) = e.character_mut() {
            if id == mother {
                c.is_pregnant = true;
                c.gestation_time = gestation;
                c.conceived_with = Some(father);
            }
            c.procreation_cooldown = cooldown;
            c.set_intent(Action::Idle, None);
        }
    }
    settle_tribe(s, t, ctx);
    tracing::debug!(%mother, %father, kind = %s.kind(), "conceived");
    ctx.emit(
        SimEventKind::Conceived { mother, father },
        format!("{mother} conceived with {father}"),
    );
}

pub(super) fn defs(rules: &RulesConfig) -> Vec<InteractionDef> {
    [EntityKind::Human, EntityKind::Predator, EntityKind::Prey]
        .into_iter()
        .map(|kind| {
            InteractionDef::new(
                "procreate",
                kind,
                kind,
                rules.interact_range,
                compatible,
                conceive,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::interaction::testing::Harness;
    use tw_core::vector::Vec2;

    fn couple(h: &mut Harness, kind: EntityKind) -> (Entity, Entity) {
        let spawn = |h: &mut Harness, gender, x| match kind {
            EntityKind::Prey => factory::spawn_prey(&mut h.world, Vec2::new(x, 100.0), gender, 5.0),
            _ => factory::spawn_human(&mut h.world, Vec2::new(x, 100.0), gender, 20.0 + x / 100.0, None),
        };
        let a = spawn(h, Gender::Female, 100.0);
        let b = spawn(h, Gender::Male, 120.0);
        let mut s = h.world.entities.take(a).unwrap();
        let mut t = h.world.entities.take(b).unwrap();
        s.character_mut().unwrap().set_intent(Action::Procreating, Some(Target::Entity(b)));
        t.character_mut().unwrap().set_intent(Action::Procreating, None);
        (s, t)
    }

    #[test]
    fn mating_makes_the_female_pregnant() {
        let mut h = Harness::new();
        let (mut s, mut t) = couple(&mut h, EntityKind::Prey);
        let mut ctx = h.ctx();
        assert!(compatible(&s, &t, &ctx));
        conceive(&mut s, &mut t, &mut ctx);

        let mother = s.character().unwrap();
        assert!(mother.is_pregnant);
        assert_eq!(mother.conceived_with, Some(t.id()));
        assert_eq!(mother.gestation_time, ctx.rules().gestation_hours);
        assert!(!t.character().unwrap().is_pregnant);
        assert_eq!(t.character().unwrap().active_action, Action::Idle);
        assert!(!compatible(&s, &t, &ctx));
        assert_eq!(ctx.events.len(), 1);
    }

    #[test]
    fn tribeless_humans_found_a_tribe() {
        let mut h = Harness::new();
        let (mut s, mut t) = couple(&mut h, EntityKind::Human);
        let mut ctx = h.ctx();
        conceive(&mut s, &mut t, &mut ctx);
        let tribe = s.tribe().expect("tribe founded");
        assert_eq!(t.tribe(), Some(tribe));
        assert_eq!(ctx.world.tribes.get(tribe).unwrap().leader, t.id(), "the older partner leads");
        assert!(matches!(
            ctx.events.events()[0].kind,
            SimEventKind::TribeFounded { .. }
        ));
    }

    #[test]
    fn relatives_and_children_do_not_mate() {
        let mut h = Harness::new();
        let (s, mut t) = couple(&mut h, EntityKind::Human);
        t.character_mut().unwrap().mother = Some(s.id());
        let ctx = h.ctx();
        assert!(!compatible(&s, &t, &ctx));

        let mut young = t.clone();
        young.character_mut().unwrap().mother = None;
        young.character_mut().unwrap().age = 10.0;
        assert!(!compatible(&s, &young, &ctx));
    }
}

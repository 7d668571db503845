use rand::Rng;
use tw_core::component::{Action, Gender};
use tw_core::effects::EffectKind;
use tw_core::entity::{Entity, EntityId, EntityKind};
use tw_core::scheduled::ScheduledEventKind;

use super::{InteractionDef, fighting, living};
use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::factory;

const VICTIMS: [EntityKind; 3] = [EntityKind::Human, EntityKind::Predator, EntityKind::Prey];

/// Whether `victim` has its hands full and cannot defend itself.
pub fn is_vulnerable(victim: &Entity) -> bool {
    victim.character().is_some_and(|c| {
        matches!(
            c.active_action,
            Action::Eating
                | Action::Gathering
                | Action::Procreating
                | Action::Planting
                | Action::Chopping
                | Action::Depositing
                | Action::Retrieving
        )
    })
}

/// Scale applied to damage dealt by `attacker`, given the victim's state.
///
/// Only human attackers are weakened by gender or age.
pub fn damage_multiplier(attacker: &Entity, victim_vulnerable: bool, rules: &RulesConfig) -> f64 {
    let mut m = 1.0;
    if victim_vulnerable {
        m *= rules.vulnerable_multiplier;
    }
    if attacker.kind() == EntityKind::Human
        && let Some(c) = attacker.character()
    {
        if c.gender == Gender::Female {
            m *= rules.female_damage_multiplier;
        }
        if !rules.is_adult(c.age) {
            m *= rules.child_damage_multiplier;
        } else if c.age >= rules.elder_age {
            m *= rules.elder_damage_multiplier;
        }
    }
    m
}

/// Take `damage` hitpoints off `victim` and remember who did it.
pub fn apply_hit(victim: &mut Entity, attacker: EntityId, damage: f64) {
    if let Some(c) = victim.character_mut() {
        c.hitpoints -= damage;
        c.last_attacker = Some(attacker);
    }
}

fn base_damage(kind: EntityKind, rules: &RulesConfig) -> f64 {
    match kind {
        EntityKind::Predator => rules.predator_damage,
        _ => rules.human_damage,
    }
}

fn in_melee(s: &Entity, t: &Entity, _ctx: &SimContext<'_>) -> bool {
    living(s)
        && living(t)
        && fighting(s, Action::Attacking, t.id())
        && s.character().is_some_and(|c| c.attack_cooldown <= 0.0)
}

/// An instant blow. A victim fighting back may parry it.
fn strike(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let rules = &ctx.config.rules;
    if let Some(c) = s.character_mut() {
        c.attack_cooldown = rules.attack_cooldown;
    }
    let now = ctx.world.time;
    if fighting(t, Action::Attacking, s.id()) && ctx.rng.random::<f64>() < rules.parry_chance {
        ctx.world.effects.push(EffectKind::Parry, t.position, now);
        return;
    }
    let damage = base_damage(s.kind(), rules) * damage_multiplier(s, is_vulnerable(t), rules);
    apply_hit(t, s.id(), damage);
    ctx.world.effects.push(EffectKind::Hit, t.position, now);
}

fn in_throwing_range(s: &Entity, t: &Entity, _ctx: &SimContext<'_>) -> bool {
    living(s)
        && living(t)
        && fighting(s, Action::Throwing, t.id())
        && s.human().is_some_and(|h| h.throw_cooldown <= 0.0)
}

/// Loose an arrow at where the victim stands now. The arrow flies on its
/// own; whether it hits is decided when it lands, and so is the victim's
/// vulnerability.
///
/// The arrow is first integrated on the next sub-step, so it reaches the
/// ground up to one full sub-step after `flight_seconds`. The impact waits
/// that long too and never resolves before the arrow has embedded.
fn throw(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let rules = &ctx.config.rules;
    let map = ctx.world.map;
    if let Some(h) = s.human_mut() {
        h.throw_cooldown = rules.throw_cooldown;
    }
    let distance = map.distance(s.position, t.position);
    let flight_seconds = distance / rules.arrow_speed.max(f64::EPSILON);
    let velocity = map.direction(s.position, t.position) * rules.arrow_speed;
    let vz = rules.arrow_gravity * flight_seconds;
    let arrow = factory::spawn_arrow(ctx.world, s.position, s.id(), velocity, vz);
    let delay = (flight_seconds + ctx.config.max_step_seconds) * ctx.clock.hours_per_second();
    let damage = rules.arrow_damage * damage_multiplier(s, false, rules);
    let at = ctx.world.time + delay;
    ctx.world.scheduled.push(
        at,
        ScheduledEventKind::ArrowImpact {
            attacker: s.id(),
            target: t.id(),
            arrow,
            damage,
            impact_point: t.position,
        },
    );
}

/// Buildings of the attacker's own tribe and of its allies are off limits.
/// Tribeless attackers and tribeless buildings have no allies.
fn besieging(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    let enemy = match (s.tribe(), t.tribe()) {
        (Some(_), Some(_)) => ctx.world.tribes.is_hostile(s.tribe(), t.tribe()),
        _ => true,
    };
    living(s)
        && fighting(s, Action::Attacking, t.id())
        && s.character().is_some_and(|c| c.attack_cooldown <= 0.0)
        && t.building().is_some_and(|b| b.hitpoints > 0.0)
        && enemy
}

fn siege(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let rules = &ctx.config.rules;
    if let Some(c) = s.character_mut() {
        c.attack_cooldown = rules.attack_cooldown;
    }
    if let Some(b) = t.building_mut() {
        b.hitpoints -= rules.siege_damage;
        b.siege_damage += rules.siege_damage;
    }
    ctx.world.effects.push(EffectKind::Hit, t.position, ctx.world.time);
}

pub(super) fn defs(rules: &RulesConfig) -> Vec<InteractionDef> {
    let mut defs = Vec::new();
    for attacker in [EntityKind::Human, EntityKind::Predator] {
        for victim in VICTIMS {
            if attacker == EntityKind::Predator && victim == EntityKind::Predator {
                continue;
            }
            defs.push(InteractionDef::new(
                "melee",
                attacker,
                victim,
                rules.melee_range,
                in_melee,
                strike,
            ));
        }
    }
    for victim in VICTIMS {
        defs.push(InteractionDef::new(
            "throw",
            EntityKind::Human,
            victim,
            rules.throw_range,
            in_throwing_range,
            throw,
        ));
    }
    defs.push(InteractionDef::new(
        "siege",
        EntityKind::Human,
        EntityKind::Building,
        rules.building_reach,
        besieging,
        siege,
    ));
    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::testing::Harness;
    use tw_core::component::{BuildingType, Target};
    use tw_core::tribe::Stance;
    use tw_core::vector::Vec2;

    fn attacker(h: &mut Harness, action: Action, target: EntityId, gender: Gender, age: f64) -> Entity {
        let id = factory::spawn_human(&mut h.world, Vec2::new(100.0, 100.0), gender, age, None);
        let mut e = h.world.entities.take(id).unwrap();
        let c = e.character_mut().unwrap();
        c.set_intent(action, Some(Target::Entity(target)));
        c.attack_target = Some(target);
        e
    }

    #[test]
    fn modifiers_stack() {
        let rules = RulesConfig::default();
        let mut h = Harness::new();
        let girl = attacker(&mut h, Action::Attacking, EntityId(1), Gender::Female, 10.0);
        let expected = rules.vulnerable_multiplier
            * rules.female_damage_multiplier
            * rules.child_damage_multiplier;
        assert!((damage_multiplier(&girl, true, &rules) - expected).abs() < 1e-12);

        let wolf = factory::spawn_predator(&mut h.world, Vec2::ZERO, Gender::Female, 2.0);
        let wolf = h.world.entities.get(wolf).unwrap();
        assert_eq!(damage_multiplier(wolf, false, &rules), 1.0);
    }

    #[test]
    fn melee_hits_and_sets_cooldown() {
        let mut h = Harness::new();
        let deer = factory::spawn_prey(&mut h.world, Vec2::new(120.0, 100.0), Gender::Male, 5.0);
        let mut s = attacker(&mut h, Action::Attacking, deer, Gender::Male, 30.0);
        let mut t = h.world.entities.take(deer).unwrap();
        let mut ctx = h.ctx();
        assert!(in_melee(&s, &t, &ctx));
        strike(&mut s, &mut t, &mut ctx);
        let victim = t.character().unwrap();
        assert_eq!(victim.hitpoints, 100.0 - ctx.rules().human_damage);
        assert_eq!(victim.last_attacker, Some(s.id()));
        assert!(!in_melee(&s, &t, &ctx));
        assert_eq!(ctx.world.effects.len(), 1);
    }

    #[test]
    fn throwing_schedules_an_impact() {
        let mut h = Harness::new();
        let deer = factory::spawn_prey(&mut h.world, Vec2::new(300.0, 100.0), Gender::Male, 5.0);
        let mut s = attacker(&mut h, Action::Throwing, deer, Gender::Male, 30.0);
        let mut t = h.world.entities.take(deer).unwrap();
        let mut ctx = h.ctx();
        assert!(in_throwing_range(&s, &t, &ctx));
        throw(&mut s, &mut t, &mut ctx);

        let pending = ctx.world.scheduled.pending();
        assert_eq!(pending.len(), 1);
        let ScheduledEventKind::ArrowImpact { arrow, impact_point, .. } = pending[0].kind else {
            panic!("expected an arrow impact");
        };
        assert_eq!(impact_point, Vec2::new(300.0, 100.0));
        let rules = ctx.rules();
        let flight = 200.0 / rules.arrow_speed;
        let landing = flight + ctx.config.max_step_seconds;
        assert!((pending[0].scheduled_time - landing * ctx.clock.hours_per_second()).abs() < 1e-9);
        let arrow = ctx.world.entities.get(arrow).unwrap();
        assert!((arrow.velocity.x - rules.arrow_speed).abs() < 1e-9);
        assert!((arrow.arrow().unwrap().vz - rules.arrow_gravity * flight).abs() < 1e-9);
        assert!(!in_throwing_range(&s, &t, &ctx));
    }

    #[test]
    fn own_buildings_are_not_besieged() {
        let mut h = Harness::new();
        let tribe = h.world.tribes.found(EntityId(50), 0.0);
        let hut = factory::spawn_building(&mut h.world, Vec2::new(150.0, 100.0), BuildingType::Dwelling, Some(tribe), true);
        let mut s = attacker(&mut h, Action::Attacking, hut, Gender::Male, 30.0);
        let mut t = h.world.entities.take(hut).unwrap();
        let mut ctx = h.ctx();
        assert!(besieging(&s, &t, &ctx));
        siege(&mut s, &mut t, &mut ctx);
        assert_eq!(t.building().unwrap().siege_damage, ctx.rules().siege_damage);

        s.human_mut().unwrap().tribe = Some(tribe);
        s.character_mut().unwrap().attack_cooldown = 0.0;
        assert!(!besieging(&s, &t, &ctx));
    }

    #[test]
    fn allied_buildings_are_spared_until_war() {
        let mut h = Harness::new();
        let ours = h.world.tribes.found(EntityId(50), 0.0);
        let theirs = h.world.tribes.found(EntityId(51), 0.0);
        h.world.tribes.set_stance(ours, theirs, Stance::Friendly);
        let hut = factory::spawn_building(&mut h.world, Vec2::new(150.0, 100.0), BuildingType::Dwelling, Some(theirs), true);
        let mut s = attacker(&mut h, Action::Attacking, hut, Gender::Male, 30.0);
        s.human_mut().unwrap().tribe = Some(ours);
        let t = h.world.entities.take(hut).unwrap();
        assert!(!besieging(&s, &t, &h.ctx()));

        h.world.tribes.set_stance(ours, theirs, Stance::Hostile);
        assert!(besieging(&s, &t, &h.ctx()));

        s.human_mut().unwrap().tribe = None;
        h.world.tribes.set_stance(ours, theirs, Stance::Friendly);
        assert!(besieging(&s, &t, &h.ctx()));
    }
}

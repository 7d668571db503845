use tw_core::entity::EntityKind;
use tw_core::state::StateId;

use super::StateTable;
use super::character::{ActionState, EatingState, FleeingState, IdleState, MovingState};

/// Predators hunt, mate and eat carrion.
pub fn predator_table() -> StateTable {
    StateTable::new(EntityKind::Predator)
        .with(StateId::Idle, IdleState)
        .with(StateId::Moving, MovingState)
        .with(StateId::Attacking, ActionState(StateId::Attacking))
        .with(StateId::Procreating, ActionState(StateId::Procreating))
        .with(StateId::Eating, EatingState)
}

/// Prey graze, mate and run.
pub fn prey_table() -> StateTable {
    StateTable::new(EntityKind::Prey)
        .with(StateId::Idle, IdleState)
        .with(StateId::Moving, MovingState)
        .with(StateId::Fleeing, FleeingState)
        .with(StateId::Procreating, ActionState(StateId::Procreating))
        .with(StateId::Eating, EatingState)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tw_core::component::{Action, Gender};
    use tw_core::vector::{MapSize, Vec2};
    use tw_core::world::World;

    use crate::config::RulesConfig;
    use crate::factory;
    use crate::state_machine::StateContext;

    #[test]
    fn prey_flee_until_the_threat_is_far() {
        let mut w = World::new(MapSize::new(2000.0, 2000.0).unwrap(), 20.0).unwrap();
        let wolf = factory::spawn_predator(&mut w, Vec2::new(100.0, 100.0), Gender::Male, 5.0);
        let deer = factory::spawn_prey(&mut w, Vec2::new(150.0, 100.0), Gender::Female, 5.0);
        let mut e = w.entities.take(deer).unwrap();
        e.animal_mut().unwrap().fleeing_from = Some(wolf);
        e.character_mut().unwrap().set_intent(Action::Fleeing, None);
        let rules = RulesConfig::default();
        let table = prey_table();

        let mut ctx = StateContext::new(&w, &rules, 0.03, 0.003);
        table.step(&mut e, &mut ctx).unwrap();
        assert_eq!(e.state_id(), Some(StateId::Fleeing));
        table.step(&mut e, &mut ctx).unwrap();
        assert!(e.direction.x > 0.99);
        assert_eq!(e.acceleration, rules.prey_acceleration * rules.flee_multiplier);

        e.position = Vec2::new(900.0, 100.0);
        table.step(&mut e, &mut ctx).unwrap();
        assert_eq!(e.state_id(), Some(StateId::Idle));
        assert!(e.animal().unwrap().fleeing_from.is_none());
        assert_eq!(e.acceleration, 0.0);
    }
}

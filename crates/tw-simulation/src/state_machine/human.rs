use tw_core::component::Target;
use tw_core::entity::{Entity, EntityKind};
use tw_core::scheduled::ScheduledEventKind;
use tw_core::state::{StateData, StateId, StatePayload};

use super::character::{
    ActionState, EatingState, IdleState, MovingState, clear_intent, settle,
};
use super::{StateContext, StateHandler, StateTable};

/// The human state graph.
pub fn table() -> StateTable {
    StateTable::new(EntityKind::Human)
        .with(StateId::Idle, IdleState)
        .with(StateId::Moving, MovingState)
        .with(StateId::Eating, EatingState)
        .with(StateId::Gathering, ActionState(StateId::Gathering))
        .with(StateId::Depositing, ActionState(StateId::Depositing))
        .with(StateId::Retrieving, ActionState(StateId::Retrieving))
        .with(StateId::Procreating, ActionState(StateId::Procreating))
        .with(StateId::Attacking, ActionState(StateId::Attacking))
        .with(StateId::Throwing, ActionState(StateId::Throwing))
        .with(StateId::Chopping, ActionState(StateId::Chopping))
        .with(StateId::Dismantling, ActionState(StateId::Dismantling))
        .with(StateId::Planting, PlantingState)
}

/// Kneeling at the target spot until the seedling is in the ground.
#[derive(Debug)]
pub struct PlantingState;

impl StateHandler for PlantingState {
    fn on_enter(&self, entity: &mut Entity, ctx: &mut StateContext<'_>) -> StatePayload {
        entity.acceleration = 0.0;
        StatePayload::Timer {
            next_at: ctx.now + ctx.rules.planting_hours,
        }
    }

    fn update(&self, entity: &mut Entity, data: &mut StateData, ctx: &mut StateContext<'_>) -> StateId {
        let next = settle(entity, ctx);
        if next != StateId::Planting {
            return next;
        }
        let due = match data.payload {
            StatePayload::Timer { next_at } => ctx.now >= next_at,
            _ => true,
        };
        if !due {
            return StateId::Planting;
        }
        let spot = entity.character().and_then(|c| match c.target {
            Some(Target::Position(p)) => Some(p),
            _ => None,
        });
        if let Some(position) = spot {
            ctx.schedule(
                0.0,
                ScheduledEventKind::PlantBush {
                    planter: entity.id(),
                    position,
                },
            );
        }
        clear_intent(entity);
        StateId::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tw_core::component::Gender;
    use tw_core::vector::{MapSize, Vec2};
    use tw_core::world::World;

    use crate::config::RulesConfig;
    use crate::factory;

    #[test]
    fn planting_schedules_a_bush_when_done() {
        let mut w = World::new(MapSize::new(500.0, 500.0).unwrap(), 20.0).unwrap();
        let id = factory::spawn_human(&mut w, Vec2::new(100.0, 100.0), Gender::Female, 20.0, None);
        let mut e = w.entities.take(id).unwrap();
        let spot = Vec2::new(110.0, 100.0);
        e.character_mut()
            .unwrap()
            .set_intent(Action::Planting, Some(Target::Position(spot)));
        let rules = RulesConfig::default();
        let table = table();

        let mut ctx = StateContext::new(&w, &rules, 0.03, 0.003);
        assert_eq!(table.step(&mut e, &mut ctx).unwrap(), Some((StateId::Idle, StateId::Planting)));
        assert!(ctx.requests().is_empty());

        ctx.now += rules.planting_hours;
        assert_eq!(table.step(&mut e, &mut ctx).unwrap(), Some((StateId::Planting, StateId::Idle)));
        assert_eq!(
            ctx.requests(),
            &[(
                ctx.now,
                ScheduledEventKind::PlantBush {
                    planter: id,
                    position: spot
                }
            )]
        );
        assert_eq!(e.character().unwrap().active_action, Action::Idle);
    }
}

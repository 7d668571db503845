use tw_core::component::{Action, BuildingType};
use tw_core::entity::{Entity, EntityKind};

use super::{InteractionDef, finish, intends, living};
use crate::config::RulesConfig;
use crate::context::SimContext;
use crate::event::SimEventKind;

fn is_storage(t: &Entity) -> bool {
    t.building()
        .is_some_and(|b| b.building_type == BuildingType::StorageSpot && b.is_constructed())
}

fn own_storage(s: &Entity, t: &Entity) -> bool {
    is_storage(t) && s.tribe().is_some() && s.tribe() == t.tribe()
}

fn can_deposit(s: &Entity, t: &Entity, _ctx: &SimContext<'_>) -> bool {
    living(s)
        && intends(s, Action::Depositing, t.id())
        && own_storage(s, t)
        && s.inventory().is_some_and(|i| !i.is_empty())
}

fn deposit(s: &mut Entity, t: &mut Entity, _ctx: &mut SimContext<'_>) {
    let Some(goods) = s.inventory_mut().map(|i| i.take_all()) else {
        return;
    };
    if let Some(b) = t.building_mut() {
        b.storage.merge(goods);
    }
    finish(s);
}

fn room_left(s: &Entity, ctx: &SimContext<'_>) -> usize {
    let carried = s.inventory().map_or(0, |i| i.total());
    ctx.rules().carry_capacity.saturating_sub(carried)
}

fn storage_has_food(t: &Entity) -> bool {
    t.building().is_some_and(|b| b.storage.food_count() > 0)
}

fn can_retrieve(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    living(s)
        && intends(s, Action::Retrieving, t.id())
        && own_storage(s, t)
        && storage_has_food(t)
        && room_left(s, ctx) > 0
}

/// Move up to `limit` food items from the storage into the carrier's pack.
fn move_food(s: &mut Entity, t: &mut Entity, limit: usize) -> usize {
    let (Some(inv), Some(b)) = (s.inventory_mut(), t.building_mut()) else {
        return 0;
    };
    let mut moved = 0;
    while moved < limit {
        let Some(item) = b.storage.take_food() else { break };
        inv.add_food(item);
        moved += 1;
    }
    moved
}

fn retrieve(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let limit = ctx.rules().retrieve_amount.min(room_left(s, ctx));
    move_food(s, t, limit);
    finish(s);
}

/// A hostile storage with nobody of its tribe close enough to defend it.
fn unguarded(s: &Entity, t: &Entity, ctx: &SimContext<'_>) -> bool {
    if !(living(s)
        && intends(s, Action::Retrieving, t.id())
        && is_storage(t)
        && storage_has_food(t)
        && room_left(s, ctx) > 0
        && ctx.world.tribes.is_hostile(s.tribe(), t.tribe()))
    {
        return false;
    }
    let owner = t.tribe();
    ctx.world
        .entities
        .within(&ctx.world.map, t.position, ctx.rules().defend_radius, |e| {
            e.kind() == EntityKind::Human && e.tribe() == owner && living(e)
        })
        .is_empty()
}

fn steal(s: &mut Entity, t: &mut Entity, ctx: &mut SimContext<'_>) {
    let limit = ctx.rules().retrieve_amount.min(room_left(s, ctx));
    let taken = move_food(s, t, limit);
    finish(s);
    if taken == 0 {
        return;
    }
    let (thief, storage) = (s.id(), t.id());
    tracing::info!(%thief, %storage, taken, "storage robbed");
    ctx.emit(
        SimEventKind::Theft { thief, storage },
        format!("{thief} stole {taken} food from {storage}"),
    );
}

pub(super) fn defs(rules: &RulesConfig) -> Vec<InteractionDef> {
    let reach = rules.building_reach;
    vec![
        InteractionDef::new(
            "deposit",
            EntityKind::Human,
            EntityKind::Building,
            reach,
            can_deposit,
            deposit,
        ),
        InteractionDef::new(
            "retrieve",
            EntityKind::Human,
            EntityKind::Building,
            reach,
            can_retrieve,
            retrieve,
        ),
        InteractionDef::new(
            "steal",
            EntityKind::Human,
            EntityKind::Building,
            reach,
            unguarded,
            steal,
        ),
    ]
}

use std::fmt;

use crate::component::BuildingType;
use crate::entity::{EntityId, EntityKind};
use crate::tribe::TribeId;
use crate::vector::Vec2;

/// Identifier of a scheduled event, unique within one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event-{}", self.0)
    }
}

/// What happens when a scheduled event comes due.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledEventKind {
    /// A thrown arrow lands.
    ArrowImpact {
        /// The thrower.
        attacker: EntityId,
        /// The intended victim.
        target: EntityId,
        /// The arrow entity in flight.
        arrow: EntityId,
        /// Base damage before modifiers.
        damage: f64,
        /// Where the victim stood when the arrow was loosed.
        impact_point: Vec2,
    },
    /// A mature plant drops a seedling near itself.
    SpreadPlant {
        /// The parent plant.
        parent: EntityId,
        /// Kind of the seedling.
        kind: EntityKind,
    },
    /// A human finishes planting a bush.
    PlantBush {
        /// The planter.
        planter: EntityId,
        /// Where the bush goes.
        position: Vec2,
    },
    /// A tribe lays down a building blueprint.
    PlaceBuilding {
        /// Owning tribe.
        tribe: TribeId,
        /// The human who ordered it.
        builder: EntityId,
        /// What gets built.
        building_type: BuildingType,
        /// Where.
        position: Vec2,
    },
}

impl ScheduledEventKind {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ArrowImpact { .. } => "arrow_impact",
            Self::SpreadPlant { .. } => "spread_plant",
            Self::PlantBush { .. } => "plant_bush",
            Self::PlaceBuilding { .. } => "place_building",
        }
    }
}

/// A deferred effect.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    /// Unique id.
    pub id: EventId,
    /// World time (hours) at or after which the event fires.
    pub scheduled_time: f64,
    /// The effect.
    pub kind: ScheduledEventKind,
}

/// Time-ordered queue of deferred effects.
///
/// Events keep insertion order; due events are handed out in that order and
/// never seen again.
#[derive(Debug, Clone)]
pub struct ScheduledQueue {
    events: Vec<ScheduledEvent>,
    next_id: u64,
}

impl Default for ScheduledQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduledQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Schedule `kind` to fire at `time`.
    pub fn push(&mut self, time: f64, kind: ScheduledEventKind) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.events.push(ScheduledEvent {
            id,
            scheduled_time: time,
            kind,
        });
        id
    }

    /// Remove and return every event with `scheduled_time <= now`, in queue order.
    pub fn take_due(&mut self, now: f64) -> Vec<ScheduledEvent> {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.events)
            .into_iter()
            .partition(|e| e.scheduled_time <= now);
        self.events = pending;
        due
    }

    /// Events still waiting.
    pub fn pending(&self) -> &[ScheduledEvent] {
        &self.events
    }

    /// Number of waiting events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The id the next scheduled event will get.
    pub fn next_id(&self) -> EventId {
        EventId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(parent: u64) -> ScheduledEventKind {
        ScheduledEventKind::SpreadPlant {
            parent: EntityId(parent),
            kind: EntityKind::Tree,
        }
    }

    #[test]
    fn due_events_leave_in_order() {
        let mut q = ScheduledQueue::new();
        q.push(2.0, spread(1));
        q.push(1.0, spread(2));
        q.push(5.0, spread(3));
        let due = q.take_due(2.0);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].kind, spread(1));
        assert_eq!(due[1].kind, spread(2));
        assert_eq!(q.len(), 1);
        assert!(q.take_due(2.0).is_empty());
    }

    #[test]
    fn pending_kept_verbatim() {
        let mut q = ScheduledQueue::new();
        let a = q.push(10.0, spread(1));
        let b = q.push(11.0, spread(2));
        q.take_due(0.0);
        let ids: Vec<_> = q.pending().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(q.next_id(), EventId(3));
    }
}

use tw_core::component::BuildingType;
use tw_core::entity::{EntityId, EntityKind};
use tw_core::tribe::{Stance, StrategicObjective, TribeId};

/// What kind of notification was raised.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEventKind {
    // Lifecycle
    /// A character was born.
    Born {
        /// The newborn.
        child: EntityId,
        /// Its mother.
        mother: EntityId,
        /// Its kind.
        kind: EntityKind,
    },
    /// A character died and left a corpse.
    Died {
        /// The dead character.
        entity: EntityId,
        /// Its kind.
        kind: EntityKind,
        /// The corpse that replaced it.
        corpse: EntityId,
        /// The cause of death.
        cause: DeathCause,
    },
    /// A female conceived.
    Conceived {
        /// The mother.
        mother: EntityId,
        /// The father.
        father: EntityId,
    },

    // Tribes
    /// A tribe was founded.
    TribeFounded {
        /// The new tribe.
        tribe: TribeId,
        /// Its leader.
        leader: EntityId,
    },
    /// A tribe lost its last member.
    TribeDissolved {
        /// The former tribe.
        tribe: TribeId,
    },
    /// A new leader took over after the old one died.
    LeaderSucceeded {
        /// The tribe.
        tribe: TribeId,
        /// The new leader.
        leader: EntityId,
    },
    /// The stance between two tribes changed.
    StanceChanged {
        /// One tribe.
        a: TribeId,
        /// The other tribe.
        b: TribeId,
        /// The new stance.
        stance: Stance,
    },
    /// A tribe switched objective.
    ObjectiveChanged {
        /// The tribe.
        tribe: TribeId,
        /// The new objective.
        objective: StrategicObjective,
    },

    // Buildings
    /// A blueprint was laid down.
    BuildingPlaced {
        /// The blueprint.
        building: EntityId,
        /// Owner.
        tribe: TribeId,
        /// What is being built.
        building_type: BuildingType,
    },
    /// A blueprint received its last piece of wood.
    BuildingCompleted {
        /// The building.
        building: EntityId,
        /// Owner.
        tribe: Option<TribeId>,
        /// What was built.
        building_type: BuildingType,
    },
    /// A building was destroyed by siege.
    BuildingDestroyed {
        /// The former building.
        building: EntityId,
        /// What it was.
        building_type: BuildingType,
    },
    /// A building was taken apart.
    BuildingDismantled {
        /// The former building.
        building: EntityId,
        /// Who took it apart.
        by: EntityId,
    },
    /// An abandoned building was claimed.
    BuildingTakenOver {
        /// The building.
        building: EntityId,
        /// The new owner.
        tribe: TribeId,
    },
    /// Food or wood was stolen from a storage.
    Theft {
        /// The thief.
        thief: EntityId,
        /// The storage robbed.
        storage: EntityId,
    },
}

/// Why a character died.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Reached maximum age.
    OldAge,
    /// Hunger at maximum.
    Starvation,
    /// Froze.
    Cold,
    /// Killed by another entity.
    Killed(EntityId),
    /// Wounds of unknown origin.
    Wounds,
}

impl std::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OldAge => write!(f, "old age"),
            Self::Starvation => write!(f, "starvation"),
            Self::Cold => write!(f, "cold"),
            Self::Killed(by) => write!(f, "killed by {by}"),
            Self::Wounds => write!(f, "wounds"),
        }
    }
}

impl SimEventKind {
    /// Check whether a given entity is involved in this event.
    pub fn involves(&self, id: EntityId) -> bool {
        match self {
            Self::Born { child, mother, .. } => *child == id || *mother == id,
            Self::Died {
                entity,
                corpse,
                cause,
                ..
            } => *entity == id || *corpse == id || *cause == DeathCause::Killed(id),
            Self::Conceived { mother, father } => *mother == id || *father == id,
            Self::TribeFounded { leader, .. } | Self::LeaderSucceeded { leader, .. } => {
                *leader == id
            }
            Self::BuildingPlaced { building, .. }
            | Self::BuildingCompleted { building, .. }
            | Self::BuildingDestroyed { building, .. }
            | Self::BuildingTakenOver { building, .. } => *building == id,
            Self::BuildingDismantled { building, by } => *building == id || *by == id,
            Self::Theft { thief, storage } => *thief == id || *storage == id,
            Self::TribeDissolved { .. }
            | Self::StanceChanged { .. }
            | Self::ObjectiveChanged { .. } => false,
        }
    }

    /// Check whether a given tribe is involved in this event.
    pub fn involves_tribe(&self, id: TribeId) -> bool {
        match self {
            Self::TribeFounded { tribe, .. }
            | Self::TribeDissolved { tribe }
            | Self::LeaderSucceeded { tribe, .. }
            | Self::ObjectiveChanged { tribe, .. }
            | Self::BuildingPlaced { tribe, .. }
            | Self::BuildingTakenOver { tribe, .. } => *tribe == id,
            Self::BuildingCompleted { tribe, .. } => *tribe == Some(id),
            Self::StanceChanged { a, b, .. } => *a == id || *b == id,
            _ => false,
        }
    }
}

/// A record of something notable that happened during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    /// The sub-step when this event occurred.
    pub tick: u64,
    /// World time in hours.
    pub time: f64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new notification.
    pub fn new(tick: u64, time: f64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            time,
            kind,
            description: description.into(),
        }
    }
}

/// Notification outbox accumulated during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given entity.
    pub fn events_for_entity(&self, id: EntityId) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Return all events involving the given tribe.
    pub fn events_for_tribe(&self, id: TribeId) -> Vec<&SimEvent> {
        self.events
            .iter()
            .filter(|e| e.kind.involves_tribe(id))
            .collect()
    }

    /// Take every recorded event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

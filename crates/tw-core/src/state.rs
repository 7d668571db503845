//! State-machine slot stored on entities.
//!
//! The slot is a tagged variant: a [`StateId`] plus a [`StateData`] whose
//! [`StatePayload`] carries whatever that state needs. Handlers narrow on the
//! payload variant they own.

use std::fmt;

use crate::vector::Vec2;

/// Identifier of a state in some kind's state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateId {
    /// Standing still.
    Idle,
    /// Walking to a position.
    Moving,
    /// Eating.
    Eating,
    /// Collecting from a resource.
    Gathering,
    /// Delivering goods to a building.
    Depositing,
    /// Taking goods from a building.
    Retrieving,
    /// Approaching a mate.
    Procreating,
    /// Closing in on and striking a target.
    Attacking,
    /// Throwing at a target from range.
    Throwing,
    /// Walking to a spot and planting.
    Planting,
    /// Felling a tree.
    Chopping,
    /// Taking a building apart.
    Dismantling,
    /// Running from a threat.
    Fleeing,
    /// Plant is growing.
    Growing,
    /// Plant is mature.
    Full,
    /// Plant is seeding offspring.
    Spreading,
    /// Tree has been felled.
    Fallen,
    /// Felled tree has been stripped.
    Stump,
    /// Plant is dying and will be removed.
    Dying,
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Eating => "eating",
            Self::Gathering => "gathering",
            Self::Depositing => "depositing",
            Self::Retrieving => "retrieving",
            Self::Procreating => "procreating",
            Self::Attacking => "attacking",
            Self::Throwing => "throwing",
            Self::Planting => "planting",
            Self::Chopping => "chopping",
            Self::Dismantling => "dismantling",
            Self::Fleeing => "fleeing",
            Self::Growing => "growing",
            Self::Full => "full",
            Self::Spreading => "spreading",
            Self::Fallen => "fallen",
            Self::Stump => "stump",
            Self::Dying => "dying",
        };
        write!(f, "{s}")
    }
}

/// Per-state payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StatePayload {
    /// The state keeps nothing beyond the common fields.
    #[default]
    None,
    /// A route being followed.
    Route {
        /// Final destination.
        destination: Vec2,
        /// Intermediate waypoints, ending at the destination.
        waypoints: Vec<Vec2>,
        /// Index of the next waypoint.
        next: usize,
    },
    /// A repeating timer.
    Timer {
        /// World time (hours) of the next firing.
        next_at: f64,
    },
}

/// Data attached to the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateData {
    /// World time (hours) the state was entered.
    pub entered_at: f64,
    /// The state this one was entered from.
    pub previous_state: Option<StateId>,
    /// State-specific fields.
    pub payload: StatePayload,
}

impl StateData {
    /// Fresh data entered at `now` with no payload.
    pub fn new(now: f64) -> Self {
        Self {
            entered_at: now,
            previous_state: None,
            payload: StatePayload::None,
        }
    }

    /// Replace the payload.
    pub fn with_payload(mut self, payload: StatePayload) -> Self {
        self.payload = payload;
        self
    }

    /// Hours spent in this state as of `now`.
    pub fn elapsed(&self, now: f64) -> f64 {
        (now - self.entered_at).max(0.0)
    }
}

/// The `(state id, state data)` pair an entity carries.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSlot {
    /// Current state.
    pub id: StateId,
    /// Data for the current state.
    pub data: StateData,
}

impl StateSlot {
    /// A slot starting in `id` at time `now`.
    pub fn new(id: StateId, now: f64) -> Self {
        Self {
            id,
            data: StateData::new(now),
        }
    }
}

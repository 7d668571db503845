use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Tribe identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TribeId(pub u64);

impl fmt::Display for TribeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tribe-{}", self.0)
    }
}

/// How two tribes regard each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Members attack each other and steal from each other's storage.
    Hostile,
    /// Members leave each other alone.
    Friendly,
}

impl Stance {
    /// The other stance.
    pub fn toggled(self) -> Self {
        match self {
            Self::Hostile => Self::Friendly,
            Self::Friendly => Self::Hostile,
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hostile => write!(f, "hostile"),
            Self::Friendly => write!(f, "friendly"),
        }
    }
}

/// The tribe-wide goal the leader steers members toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategicObjective {
    /// Stock food and wood.
    #[default]
    Gather,
    /// Build and plant at the edge of the territory.
    Expand,
    /// Stay near home and fight intruders.
    Defend,
    /// Hunt hostile humans and loot their storage.
    Raid,
}

impl fmt::Display for StrategicObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gather => write!(f, "gather"),
            Self::Expand => write!(f, "expand"),
            Self::Defend => write!(f, "defend"),
            Self::Raid => write!(f, "raid"),
        }
    }
}

/// Per-tribe bookkeeping. Membership lives on the humans themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct TribeInfo {
    /// Identifier.
    pub id: TribeId,
    /// Current leader.
    pub leader: EntityId,
    /// World time the tribe was founded.
    pub founded_at: f64,
    /// Current objective.
    pub objective: StrategicObjective,
}

/// Registry of tribes and the stances between them.
#[derive(Debug, Clone)]
pub struct Tribes {
    tribes: BTreeMap<TribeId, TribeInfo>,
    stances: BTreeMap<(TribeId, TribeId), Stance>,
    next_id: u64,
}

impl Default for Tribes {
    fn default() -> Self {
        Self::new()
    }
}

fn pair_key(a: TribeId, b: TribeId) -> (TribeId, TribeId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Tribes {
    /// No tribes.
    pub fn new() -> Self {
        Self {
            tribes: BTreeMap::new(),
            stances: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Found a tribe led by `leader`.
    pub fn found(&mut self, leader: EntityId, now: f64) -> TribeId {
        let id = TribeId(self.next_id);
        self.next_id += 1;
        self.tribes.insert(
            id,
            TribeInfo {
                id,
                leader,
                founded_at: now,
                objective: StrategicObjective::default(),
            },
        );
        id
    }

    /// Look up a tribe.
    pub fn get(&self, id: TribeId) -> Option<&TribeInfo> {
        self.tribes.get(&id)
    }

    /// Look up a tribe mutably.
    pub fn get_mut(&mut self, id: TribeId) -> Option<&mut TribeInfo> {
        self.tribes.get_mut(&id)
    }

    /// Remove a tribe and every stance involving it.
    pub fn dissolve(&mut self, id: TribeId) -> Option<TribeInfo> {
        self.stances.retain(|(a, b), _| *a != id && *b != id);
        self.tribes.remove(&id)
    }

    /// Returns `true` if `id` is a living tribe.
    pub fn contains(&self, id: TribeId) -> bool {
        self.tribes.contains_key(&id)
    }

    /// All tribes by ascending id.
    pub fn iter(&self) -> impl Iterator<Item = &TribeInfo> {
        self.tribes.values()
    }

    /// Number of tribes.
    pub fn len(&self) -> usize {
        self.tribes.len()
    }

    /// Returns `true` if no tribe exists.
    pub fn is_empty(&self) -> bool {
        self.tribes.is_empty()
    }

    /// Whether `entity` leads any tribe.
    pub fn is_leader(&self, entity: EntityId) -> bool {
        self.tribes.values().any(|t| t.leader == entity)
    }

    /// Stance between two tribes. A tribe is always friendly with itself;
    /// distinct tribes are hostile until told otherwise.
    pub fn stance(&self, a: TribeId, b: TribeId) -> Stance {
        if a == b {
            return Stance::Friendly;
        }
        self.stances
            .get(&pair_key(a, b))
            .copied()
            .unwrap_or(Stance::Hostile)
    }

    /// Set the stance between two distinct tribes. Symmetric.
    pub fn set_stance(&mut self, a: TribeId, b: TribeId, stance: Stance) {
        if a != b {
            self.stances.insert(pair_key(a, b), stance);
        }
    }

    /// Flip the stance between two tribes and return the new one.
    pub fn toggle(&mut self, a: TribeId, b: TribeId) -> Stance {
        let next = self.stance(a, b).toggled();
        self.set_stance(a, b, next);
        self.stance(a, b)
    }

    /// Hostility between optional memberships. Tribeless humans are never hostile.
    pub fn is_hostile(&self, a: Option<TribeId>, b: Option<TribeId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.stance(a, b) == Stance::Hostile,
            _ => false,
        }
    }
}

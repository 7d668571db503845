//! Key-value memory for behavior trees.
//!
//! Durable entries survive between ticks and are persisted on the entity.
//! Transient entries exist only for the tick that wrote them and are stripped
//! before the blackboard is stored back.

use std::collections::BTreeMap;

use crate::entity::EntityId;
use crate::vector::Vec2;

/// A value stored on a blackboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlackboardValue {
    /// A map position.
    Position(Vec2),
    /// Another entity.
    Entity(EntityId),
    /// A number.
    Number(f64),
    /// A flag.
    Flag(bool),
}

/// Behavior-tree memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    durable: BTreeMap<String, BlackboardValue>,
    transient: BTreeMap<String, BlackboardValue>,
}

impl Blackboard {
    /// An empty blackboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a key up, transient entries shadowing durable ones.
    pub fn get(&self, key: &str) -> Option<BlackboardValue> {
        self.transient
            .get(key)
            .or_else(|| self.durable.get(key))
            .copied()
    }

    /// Position stored under `key`.
    pub fn position(&self, key: &str) -> Option<Vec2> {
        match self.get(key)? {
            BlackboardValue::Position(p) => Some(p),
            _ => None,
        }
    }

    /// Entity stored under `key`.
    pub fn entity(&self, key: &str) -> Option<EntityId> {
        match self.get(key)? {
            BlackboardValue::Entity(id) => Some(id),
            _ => None,
        }
    }

    /// Store a value that persists across ticks.
    pub fn set(&mut self, key: impl Into<String>, value: BlackboardValue) {
        self.durable.insert(key.into(), value);
    }

    /// Store a value for the current tick only.
    pub fn set_transient(&mut self, key: impl Into<String>, value: BlackboardValue) {
        self.transient.insert(key.into(), value);
    }

    /// Remove a key from both layers.
    pub fn remove(&mut self, key: &str) {
        self.durable.remove(key);
        self.transient.remove(key);
    }

    /// Drop every transient entry.
    pub fn strip_transient(&mut self) {
        self.transient.clear();
    }

    /// Number of durable entries.
    pub fn durable_len(&self) -> usize {
        self.durable.len()
    }
}

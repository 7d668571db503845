//! Tick-driven multi-agent simulation for Tribeworld.
//!
//! Drives a [`tw_core::World`] through a fixed pipeline of systems per
//! sub-step: physics, lifecycle, AI, state machines, interactions, scheduled
//! events and bookkeeping. All randomness comes from one seeded RNG owned by
//! the [`Simulation`], so equal seeds and equal inputs give equal runs.

/// Task AI for humans and predators.
pub mod ai;
/// Behavior trees and the prey tree.
pub mod behavior;
/// Corpses, succession and removal of spent entities.
pub mod bookkeeping;
/// Simulation clock and fixed-step splitting.
pub mod clock;
/// Configuration types for simulation runs.
pub mod config;
/// Mutable context passed to systems each sub-step.
pub mod context;
/// Error types for the simulation crate.
pub mod error;
/// Notification types and the event log.
pub mod event;
/// Entity constructors.
pub mod factory;
/// Pairwise interaction rules.
pub mod interaction;
/// Needs, aging, gestation and temperature.
pub mod lifecycle;
/// Integration on the torus.
pub mod physics;
/// Resolution of scheduled events.
pub mod scheduled;
/// Top-level simulation orchestrator.
pub mod simulation;
/// Initial population.
pub mod spawn;
/// Per-kind state machines.
pub mod state_machine;
/// The trait that all simulation systems implement.
pub mod system;
/// Territory queries.
pub mod territory;

/// Re-export of [`clock::SimClock`].
pub use clock::SimClock;
/// Re-exports of [`config::SimConfig`], [`config::PopulationConfig`] and [`config::RulesConfig`].
pub use config::{PopulationConfig, RulesConfig, SimConfig};
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of [`event::EventLog`], [`event::SimEvent`], [`event::SimEventKind`] and [`event::DeathCause`].
pub use event::{DeathCause, EventLog, SimEvent, SimEventKind};
/// Re-export of [`simulation::Simulation`].
pub use simulation::Simulation;
/// Re-export of [`system::System`].
pub use system::System;

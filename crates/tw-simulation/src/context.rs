use rand::rngs::StdRng;
use tw_core::world::World;

use crate::clock::{self, SimClock};
use crate::config::{RulesConfig, SimConfig};
use crate::event::{EventLog, SimEvent, SimEventKind};

/// Mutable context passed to each system during a sub-step.
pub struct SimContext<'a> {
    /// The world being simulated.
    pub world: &'a mut World,
    /// The clock, already advanced to the current sub-step.
    pub clock: &'a SimClock,
    /// Notification outbox.
    pub events: &'a mut EventLog,
    /// The run's only source of randomness.
    pub rng: &'a mut StdRng,
    /// Run configuration.
    pub config: &'a SimConfig,
}

impl SimContext<'_> {
    /// Emit a notification at the current tick.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events.push(SimEvent::new(
            self.clock.tick(),
            self.world.time,
            kind,
            description,
        ));
    }

    /// Current tick.
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// World time in hours.
    pub fn now(&self) -> f64 {
        self.world.time
    }

    /// Sub-step length in real seconds.
    pub fn dt(&self) -> f64 {
        self.clock.step_seconds()
    }

    /// Sub-step length in world hours.
    pub fn dt_hours(&self) -> f64 {
        self.clock.step_hours()
    }

    /// Gameplay constants.
    pub fn rules(&self) -> &RulesConfig {
        &self.config.rules
    }

    /// Hour of the day (0.0..24.0).
    pub fn hour_of_day(&self) -> f64 {
        clock::hour_of_day(self.world.time)
    }
}

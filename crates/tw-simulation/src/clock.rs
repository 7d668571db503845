/// Tracks simulation time: a monotonic sub-step counter, elapsed real
/// seconds, and the length of the sub-step currently being run.
///
/// Real time is converted to world hours at a fixed rate. A real delta is
/// clamped and then split into sub-steps no longer than the maximum step, so
/// physics stays stable however irregular the caller's frame times are.
#[derive(Debug, Clone)]
pub struct SimClock {
    tick: u64,
    elapsed_seconds: f64,
    step_seconds: f64,
    hours_per_second: f64,
    max_step_seconds: f64,
    max_real_delta_seconds: f64,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub fn new(hours_per_second: f64, max_step_seconds: f64, max_real_delta_seconds: f64) -> Self {
        Self {
            tick: 0,
            elapsed_seconds: 0.0,
            step_seconds: 0.0,
            hours_per_second,
            max_step_seconds,
            max_real_delta_seconds,
        }
    }

    /// Split a real delta into sub-steps.
    ///
    /// Non-finite or non-positive deltas yield nothing. Deltas above the
    /// clamp are cut down to it.
    pub fn split(&self, real_delta: f64) -> Vec<f64> {
        if !real_delta.is_finite() || real_delta <= 0.0 {
            return Vec::new();
        }
        let mut remaining = real_delta.min(self.max_real_delta_seconds);
        if remaining < real_delta {
            tracing::warn!(
                requested = real_delta,
                clamped = remaining,
                "real delta clamped"
            );
        }
        let mut steps = Vec::new();
        while remaining > 1e-12 {
            let step = remaining.min(self.max_step_seconds);
            steps.push(step);
            remaining -= step;
        }
        steps
    }

    /// Begin a sub-step of `seconds`. Returns the new tick number.
    pub fn advance(&mut self, seconds: f64) -> u64 {
        self.tick += 1;
        self.step_seconds = seconds;
        self.elapsed_seconds += seconds;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Length of the current sub-step in real seconds.
    pub fn step_seconds(&self) -> f64 {
        self.step_seconds
    }

    /// Length of the current sub-step in world hours.
    pub fn step_hours(&self) -> f64 {
        self.step_seconds * self.hours_per_second
    }

    /// Total elapsed real seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Total elapsed world hours since simulation start.
    pub fn elapsed_hours(&self) -> f64 {
        self.elapsed_seconds * self.hours_per_second
    }

    /// World hours per real second.
    pub fn hours_per_second(&self) -> f64 {
        self.hours_per_second
    }

    /// Largest real delta accepted by [`split`](Self::split).
    pub fn max_real_delta_seconds(&self) -> f64 {
        self.max_real_delta_seconds
    }
}

/// Hour of the day (0.0..24.0) for a world time in hours.
pub fn hour_of_day(world_hours: f64) -> f64 {
    world_hours.rem_euclid(24.0)
}

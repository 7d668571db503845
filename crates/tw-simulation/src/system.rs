use crate::context::SimContext;
use crate::error::SimResult;

/// One stage of the per-sub-step pipeline.
///
/// A [`Simulation`](crate::Simulation) runs its systems in registration
/// order, handing each the same [`SimContext`]. Later stages see everything
/// earlier stages wrote during the sub-step.
pub trait System: std::fmt::Debug {
    /// Stable name, used in logs and by [`Simulation::system_names`](crate::Simulation::system_names).
    fn name(&self) -> &str;

    /// Advance this stage by one sub-step.
    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()>;

    /// Runs once, before the first sub-step.
    fn init(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }

    /// Downcast support for [`Simulation::get_system`](crate::Simulation::get_system).
    fn as_any(&self) -> &dyn std::any::Any;

    /// Downcast support for [`Simulation::get_system_mut`](crate::Simulation::get_system_mut).
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// Holds a system's slot while the real system is out running.
#[derive(Debug)]
pub(crate) struct Vacant;

impl System for Vacant {
    fn name(&self) -> &str {
        "vacant"
    }

    fn tick(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

use tw_core::entity::{EntityId, EntityKind};
use tw_core::error::WorldError;
use tw_core::state::StateId;
use tw_core::tribe::TribeId;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Structural misuse of the engine. In-world failures never surface here;
/// they self-correct (targets vanish, agents go idle).
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A command referred to an entity that does not exist.
    #[error("entity not found in simulation: {0}")]
    EntityNotFound(EntityId),

    /// A command referred to a tribe that does not exist.
    #[error("tribe not found: {0}")]
    TribeNotFound(TribeId),

    /// An entity sits in a state its kind has no handler for.
    #[error("no {state} handler registered for {kind}")]
    UnregisteredState {
        /// Kind of the offending entity.
        kind: EntityKind,
        /// The unhandled state.
        state: StateId,
    },

    /// A command was applied to an entity of the wrong kind.
    #[error("{entity} is a {kind}, which cannot {action}")]
    WrongKind {
        /// The entity.
        entity: EntityId,
        /// Its kind.
        kind: EntityKind,
        /// What was attempted.
        action: &'static str,
    },

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A world-model error.
    #[error(transparent)]
    World(#[from] WorldError),
}

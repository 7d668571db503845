use crate::entity::EntityId;

/// Alias for `Result<T, WorldError>`.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors that can occur when building or manipulating a world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The requested entity ID does not exist in the store.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Map dimensions must be finite and strictly positive.
    #[error("invalid map size {width}x{height}")]
    InvalidMapSize {
        /// The rejected width.
        width: f64,
        /// The rejected height.
        height: f64,
    },

    /// Grid cell size must be finite and strictly positive.
    #[error("invalid grid cell size: {0}")]
    InvalidGrid(f64),
}

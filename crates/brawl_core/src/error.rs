//! Error types for the ability simulation.
//!
//! Nothing in this taxonomy is session-fatal: a failure degrades one cast
//! or one entity. Missing referents transition entities to their teardown,
//! duplicate events are absorbed by the inbox, and invariant violations are
//! logged and ignored rather than surfaced.

use brawl_net::AbilityId;
use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Cast referenced an ability id the catalog does not know.
    #[error("Unknown ability: {0:?}")]
    UnknownAbility(AbilityId),

    /// A definition offered for registration failed validation.
    #[error("Invalid ability definition {ability:?}: {message}")]
    InvalidDefinition {
        /// The rejected definition's id.
        ability: AbilityId,
        /// What was wrong with it.
        message: String,
    },

    /// Embedded ability table failed to parse.
    #[error("Failed to parse ability table '{path}': {message}")]
    DataParseError {
        /// Path to the data file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A replication frame could not be decoded or applied.
    #[error(transparent)]
    Net(#[from] brawl_net::NetError),
}

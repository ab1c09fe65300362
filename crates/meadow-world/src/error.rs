//! Error types for the `meadow-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use meadow_types::ObjectId;

/// Errors that can occur during world-object operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An object was not found in the registry.
    #[error("world object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The object is a landmark and cannot be collected.
    #[error("world object {0} is not collectible")]
    NotCollectible(ObjectId),

    /// The collectible has already been picked up.
    #[error("world object {0} was already collected")]
    AlreadyCollected(ObjectId),

    /// Placement bounds must be a positive, finite half-extent.
    #[error("invalid placement bounds: {0}")]
    InvalidBounds(f64),
}

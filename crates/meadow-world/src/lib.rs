//! World objects for the Meadow simulation.
//!
//! This crate owns everything in the world that is not an agent: static
//! landmarks and collectible coins.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world-object operations.
//! - [`registry`] -- [`WorldRegistry`], the single store of world objects
//!   with one-shot collection and regeneration on reset.
//! - [`spawn`] -- Landmark loading and seeded coin placement.

pub mod error;
pub mod registry;
pub mod spawn;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use registry::WorldRegistry;
pub use spawn::{CoinLayout, LandmarkSpec};

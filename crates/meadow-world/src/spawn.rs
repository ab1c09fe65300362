//! Landmark loading and collectible placement.
//!
//! Landmarks come from the world configuration and never move. Coins are
//! scattered uniformly over the square `[-bounds, bounds]` on both planar
//! axes, drawn from whatever RNG the caller supplies, so a seeded RNG
//! yields a reproducible layout.

use meadow_types::{ObjectId, ObjectKind, Position, WorldObject};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Height at which world objects rest.
pub const OBJECT_HEIGHT: f64 = 0.0;

/// A named landmark as it appears in the world configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSpec {
    /// Display name.
    pub name: String,
    /// Position on the x axis.
    pub x: f64,
    /// Position on the z axis.
    pub z: f64,
}

/// Where and how many coins to scatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinLayout {
    /// Number of coins per generation.
    pub count: u32,
    /// Half-extent of the placement square.
    pub bounds: f64,
}

impl CoinLayout {
    /// Create a layout, rejecting non-positive or non-finite bounds.
    pub fn new(count: u32, bounds: f64) -> Result<Self, WorldError> {
        if !bounds.is_finite() || bounds <= 0.0 {
            return Err(WorldError::InvalidBounds(bounds));
        }
        Ok(Self { count, bounds })
    }
}

/// Build landmark objects from their configuration entries.
pub fn landmarks(specs: &[LandmarkSpec]) -> Vec<WorldObject> {
    specs
        .iter()
        .map(|spec| WorldObject {
            id: ObjectId::new(),
            name: spec.name.clone(),
            position: Position::new(spec.x, OBJECT_HEIGHT, spec.z),
            kind: ObjectKind::Landmark,
            collected: false,
        })
        .collect()
}

/// Scatter a fresh set of coins. Every coin gets a new identifier.
pub fn scatter_coins(layout: CoinLayout, rng: &mut impl Rng) -> Vec<WorldObject> {
    let b = layout.bounds;
    (1..=layout.count)
        .map(|n| WorldObject {
            id: ObjectId::new(),
            name: format!("Coin {n}"),
            position: Position::new(
                rng.random_range(-b..=b),
                OBJECT_HEIGHT,
                rng.random_range(-b..=b),
            ),
            kind: ObjectKind::Collectible,
            collected: false,
        })
        .collect()
}

//! The World Object Registry.
//!
//! Holds every landmark and collectible in registration order. Landmarks
//! are fixed for the lifetime of the registry; collectibles are replaced
//! wholesale by [`WorldRegistry::regenerate`]. A collectible flips from
//! uncollected to collected exactly once and is excluded from every
//! perceivable view afterwards.

use meadow_types::{ObjectId, ObjectKind, WorldObject};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::error::WorldError;
use crate::spawn::{self, CoinLayout, LandmarkSpec};

/// Storage for landmarks and collectibles.
#[derive(Debug, Clone)]
pub struct WorldRegistry {
    /// Landmarks first, then coins, each in creation order.
    objects: Vec<WorldObject>,
    /// Coin placement parameters reused on every regeneration.
    layout: CoinLayout,
    /// Seeded RNG; successive regenerations continue the same stream.
    rng: StdRng,
}

impl WorldRegistry {
    /// Build a registry with the given landmarks and a first set of coins.
    pub fn new(landmarks: &[LandmarkSpec], layout: CoinLayout, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut objects = spawn::landmarks(landmarks);
        objects.extend(spawn::scatter_coins(layout, &mut rng));
        info!(
            landmarks = landmarks.len(),
            coins = layout.count,
            seed,
            "world objects generated"
        );
        Self {
            objects,
            layout,
            rng,
        }
    }

    /// Build a registry from explicit objects. The RNG used for later
    /// regenerations is seeded with `seed`.
    pub fn from_objects(objects: Vec<WorldObject>, layout: CoinLayout, seed: u64) -> Self {
        Self {
            objects,
            layout,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Look up an object by id.
    pub fn get(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Every object, in registration order, collected ones included.
    pub fn all(&self) -> &[WorldObject] {
        &self.objects
    }

    /// Objects agents can currently perceive, in registration order.
    pub fn perceivable(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.iter().filter(|o| o.is_perceivable())
    }

    /// Coins still lying in the world, in registration order.
    pub fn available_coins(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.iter().filter(|o| o.is_available_coin())
    }

    /// Number of coins still lying in the world.
    pub fn coins_remaining(&self) -> u32 {
        let n = self.available_coins().count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Whether the world has coins and every one of them was collected.
    pub fn all_collected(&self) -> bool {
        let mut coins = self
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Collectible)
            .peekable();
        coins.peek().is_some() && coins.all(|c| c.collected)
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Mark a collectible as collected.
    ///
    /// # Errors
    ///
    /// Unknown ids, landmarks, and already-collected coins are rejected
    /// and leave the registry unchanged.
    pub fn collect(&mut self, id: ObjectId) -> Result<&WorldObject, WorldError> {
        let Some(object) = self.objects.iter_mut().find(|o| o.id == id) else {
            warn!(object_id = %id, "collect on unknown world object");
            return Err(WorldError::ObjectNotFound(id));
        };
        if object.kind != ObjectKind::Collectible {
            warn!(object_id = %id, "attempt to collect a landmark");
            return Err(WorldError::NotCollectible(id));
        }
        if object.collected {
            debug!(object_id = %id, "coin already collected");
            return Err(WorldError::AlreadyCollected(id));
        }
        object.collected = true;
        Ok(object)
    }

    /// Replace every collectible with a freshly scattered set. Landmarks
    /// are kept. Returns the full object list after regeneration.
    pub fn regenerate(&mut self) -> &[WorldObject] {
        self.objects.retain(|o| o.kind == ObjectKind::Landmark);
        let coins = spawn::scatter_coins(self.layout, &mut self.rng);
        self.objects.extend(coins);
        info!(coins = self.layout.count, "collectibles regenerated");
        &self.objects
    }
}

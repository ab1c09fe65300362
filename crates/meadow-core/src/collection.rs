//! Proximity coin collection.
//!
//! Runs once per observation cycle. Agents are visited in roster order and
//! each picks up at most one coin: the nearest uncollected one within the
//! collection radius. A coin taken by an earlier agent in the pass is no
//! longer available to later ones, so a coin is never collected twice.

use meadow_agents::AgentRegistry;
use meadow_types::{AgentId, ObjectId};
use meadow_world::WorldRegistry;
use tracing::info;

/// One coin picked up by one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// The collector.
    pub agent_id: AgentId,
    /// The coin.
    pub object_id: ObjectId,
}

/// Perform one collection pass.
pub fn collect_coins(
    agents: &mut AgentRegistry,
    world: &mut WorldRegistry,
    radius: f64,
) -> Vec<Collection> {
    let mut collected = Vec::new();

    for id in agents.ids().to_vec() {
        let Some(position) = agents.get(&id).map(|a| a.position) else {
            continue;
        };
        // `min_by` keeps the first of equal candidates, so distance ties go
        // to the coin listed first in the world registry.
        let nearest = world
            .available_coins()
            .map(|coin| (coin.id, position.planar_distance(&coin.position)))
            .filter(|(_, distance)| *distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((object_id, distance)) = nearest else {
            continue;
        };

        if world.collect(object_id).is_err() {
            continue;
        }
        if let Ok(agent) = agents.require_mut(&id) {
            agent.coins_collected = agent.coins_collected.saturating_add(1);
            info!(
                agent_id = %id,
                object_id = %object_id,
                distance,
                coins_collected = agent.coins_collected,
                coins_remaining = world.coins_remaining(),
                "coin collected"
            );
        }
        collected.push(Collection {
            agent_id: id,
            object_id,
        });
    }

    collected
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use meadow_types::{AgentColor, AgentProfile, ObjectKind, Position, WorldObject};
    use meadow_world::CoinLayout;

    use super::*;

    fn profile(id: &str, x: f64, z: f64) -> AgentProfile {
        AgentProfile {
            id: AgentId::new(id),
            name: id.to_uppercase(),
            personality: String::new(),
            color: AgentColor::Blue,
            initial_position: Position::new(x, 0.6, z),
        }
    }

    fn coin(x: f64, z: f64) -> WorldObject {
        WorldObject {
            id: ObjectId::new(),
            name: String::from("Coin"),
            position: Position::new(x, 0.0, z),
            kind: ObjectKind::Collectible,
            collected: false,
        }
    }

    fn world(coins: Vec<WorldObject>) -> WorldRegistry {
        WorldRegistry::from_objects(coins, CoinLayout::new(3, 4.0).unwrap(), 9)
    }

    #[test]
    fn collects_once_within_radius() {
        let mut agents = AgentRegistry::new(vec![profile("a", 1.0, 1.0)]).unwrap();
        let c = coin(1.3, 1.0);
        let mut world = world(vec![c.clone()]);

        let first = collect_coins(&mut agents, &mut world, 0.5);
        assert_eq!(first.len(), 1);
        assert_eq!(first.first().map(|c| c.object_id), Some(c.id));
        assert_eq!(agents.get(&AgentId::new("a")).unwrap().coins_collected, 1);
        assert!(world.get(c.id).unwrap().collected);

        let second = collect_coins(&mut agents, &mut world, 0.5);
        assert!(second.is_empty());
        assert_eq!(agents.get(&AgentId::new("a")).unwrap().coins_collected, 1);
    }

    #[test]
    fn out_of_radius_is_ignored() {
        let mut agents = AgentRegistry::new(vec![profile("a", 0.0, 0.0)]).unwrap();
        let mut world = world(vec![coin(0.6, 0.0)]);
        assert!(collect_coins(&mut agents, &mut world, 0.5).is_empty());
        assert_eq!(world.coins_remaining(), 1);
    }

    #[test]
    fn contested_coin_goes_to_first_in_roster() {
        let mut agents =
            AgentRegistry::new(vec![profile("a", 0.0, 0.0), profile("b", 0.4, 0.0)]).unwrap();
        let mut world = world(vec![coin(0.2, 0.0)]);

        let collected = collect_coins(&mut agents, &mut world, 0.5);
        assert_eq!(collected.len(), 1);
        assert_eq!(
            collected.first().map(|c| c.agent_id.clone()),
            Some(AgentId::new("a"))
        );
        assert_eq!(agents.get(&AgentId::new("b")).unwrap().coins_collected, 0);
    }

    #[test]
    fn one_coin_per_agent_per_pass() {
        let mut agents = AgentRegistry::new(vec![profile("a", 0.0, 0.0)]).unwrap();
        let near = coin(0.1, 0.0);
        let mut world = world(vec![coin(0.3, 0.0), near.clone()]);

        let collected = collect_coins(&mut agents, &mut world, 0.5);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected.first().map(|c| c.object_id), Some(near.id));
        assert_eq!(world.coins_remaining(), 1);
    }
}

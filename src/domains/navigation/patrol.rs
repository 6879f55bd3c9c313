use super::augment::neighbouring_nodes;
use super::geometry::{GridPoint, WalkableSurface};
use super::network::{NodalNetwork, NodeId};
use super::path::Path;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Picks random adjacent junctions for idle agents, avoiding U-turns.
pub struct PatrolPlanner<R: Rng = StdRng> {
    rng: R,
    departed_from: HashMap<String, NodeId>,
}

impl PatrolPlanner<StdRng> {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PatrolPlanner<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            departed_from: HashMap::new(),
        }
    }

    /// A one-node path to a junction next to `position`, or `None` when nothing is reachable.
    pub fn next_destination(
        &mut self,
        agent: &str,
        position: GridPoint,
        network: &NodalNetwork,
        surface: &WalkableSurface,
    ) -> Option<Path> {
        let mut options = neighbouring_nodes(network, surface, position);
        if options.len() > 1 {
            if let Some(previous) = self.departed_from.get(agent) {
                options.retain(|id| id != previous);
            }
        }
        if options.is_empty() {
            return None;
        }

        let choice = options[self.rng.gen_range(0..options.len())];
        if let Some(current) = network.node_at(position) {
            self.departed_from.insert(agent.to_string(), current);
        }
        Some(Path::new(vec![network[choice].clone()], 0))
    }

    pub fn last_departure(&self, agent: &str) -> Option<NodeId> {
        self.departed_from.get(agent).copied()
    }
}

use super::network::{NodalNetwork, NodeId};
use super::path::Path;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

/// Restrictions applied to a single search without touching the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchConstraints {
    pub ignored_node: Option<NodeId>,
    /// Undirected: both `a -> b` and `b -> a` are unusable.
    pub excluded_edge: Option<(NodeId, NodeId)>,
}

impl SearchConstraints {
    pub fn avoiding(node: NodeId) -> Self {
        Self {
            ignored_node: Some(node),
            excluded_edge: None,
        }
    }

    pub fn excluding_edge(a: NodeId, b: NodeId) -> Self {
        Self {
            ignored_node: None,
            excluded_edge: Some((a, b)),
        }
    }

    pub fn permits(&self, from: NodeId, to: NodeId) -> bool {
        if self.ignored_node == Some(to) {
            return false;
        }
        match self.excluded_edge {
            Some((a, b)) => !((from == a && to == b) || (from == b && to == a)),
            None => true,
        }
    }
}

pub fn shortest_path(network: &NodalNetwork, origin: NodeId, destination: NodeId) -> Path {
    shortest_path_with(network, origin, destination, SearchConstraints::default())
}

/// A* over the junction graph.
///
/// The straight-line distance to `destination` is the heuristic; it never
/// overestimates because every edge weight counts grid steps. The distance
/// table lives only for this call, so concurrent queries on a shared network
/// are safe.
pub fn shortest_path_with(
    network: &NodalNetwork,
    origin: NodeId,
    destination: NodeId,
    constraints: SearchConstraints,
) -> Path {
    let (Some(start), Some(goal)) = (network.get(origin), network.get(destination)) else {
        debug!(%origin, %destination, "search endpoints are not in the network");
        return Path::no_route();
    };
    if origin == destination {
        return Path::new(vec![start.clone()], 0);
    }

    let heuristic: Vec<f64> = network.nodes().iter().map(|n| n.distance_to(goal)).collect();
    let mut best: Vec<Option<u32>> = vec![None; network.len()];
    let mut previous: Vec<Option<NodeId>> = vec![None; network.len()];
    let mut best_to_destination: Option<u32> = None;

    let mut frontier = BinaryHeap::new();
    best[origin.index()] = Some(0);
    frontier.push(Reverse((OrderedFloat(heuristic[origin.index()]), 0u32, origin)));

    while let Some(Reverse((estimate, weight, current))) = frontier.pop() {
        if best[current.index()].is_some_and(|known| weight > known) {
            continue;
        }
        if best_to_destination.is_some_and(|w| estimate.0 >= w as f64) {
            break;
        }
        if current == destination {
            continue;
        }

        for edge in &network[current].edges {
            if !constraints.permits(current, edge.target) {
                continue;
            }
            let candidate = weight + edge.weight;
            if best[edge.target.index()].is_some_and(|known| candidate >= known) {
                continue;
            }
            let candidate_estimate = candidate as f64 + heuristic[edge.target.index()];
            if best_to_destination.is_some_and(|w| candidate_estimate >= w as f64) {
                continue;
            }

            best[edge.target.index()] = Some(candidate);
            previous[edge.target.index()] = Some(current);
            if edge.target == destination {
                best_to_destination = Some(candidate);
            }
            frontier.push(Reverse((OrderedFloat(candidate_estimate), candidate, edge.target)));
        }
    }

    let Some(total) = best[destination.index()] else {
        debug!(from = %start.position, to = %goal.position, "no route found");
        return Path::no_route();
    };

    let mut route = vec![goal.clone()];
    let mut cursor = destination;
    while let Some(prev) = previous[cursor.index()] {
        route.push(network[prev].clone());
        cursor = prev;
    }
    route.reverse();
    Path::new(route, total)
}

use super::builder::discover_edges_from;
use super::geometry::{GridPoint, WalkableSurface, WorldPosition};
use super::network::{NodalNetwork, NodeId, NodeLabeler, DESTINATION_LABEL, UNIT_LABEL};
use super::path::Path;
use super::search::shortest_path;
use crate::common::{DomainError, DomainResult};
use tracing::debug;

/// A copy of a network with ephemeral nodes for one query.
#[derive(Debug, Clone)]
pub struct AugmentedNetwork {
    pub network: NodalNetwork,
    pub unit: NodeId,
    pub destination: NodeId,
}

/// Make `position` a node of `network`.
///
/// An existing node at that position is reused. Otherwise a node labelled
/// `label` is added, connected both ways to the junctions around it, and when it
/// sits in the middle of a corridor the now-redundant edge between its two
/// neighbours is dropped.
pub fn add_position_to_network(
    network: &mut NodalNetwork,
    surface: &WalkableSurface,
    position: GridPoint,
    label: &str,
) -> DomainResult<NodeId> {
    if let Some(existing) = network.node_at(position) {
        return Ok(existing);
    }
    if !surface.contains(position) {
        return Err(DomainError::degenerate(format!("{} is not on the walkable surface", position)));
    }

    let mut labeler = NodeLabeler::starting_at(network.len());
    let id = network.add_node(label, position);
    let discovery = discover_edges_from(surface, network, id, &mut labeler, surface.iteration_cap());
    if discovery.limit_reached {
        return Err(DomainError::limit("edge discovery", surface.iteration_cap()));
    }

    for edge in &discovery.edges {
        network.add_edge(edge.target, id, edge.weight);
    }

    if let [first, second] = discovery.edges[..] {
        let direct = network[first.target].edge_to(second.target).map(|e| e.weight);
        if direct == Some(first.weight + second.weight) {
            network.remove_edges_between(first.target, second.target);
        }
    }
    Ok(id)
}

/// Copy `base` and add the unit node first, then the destination node.
pub fn network_with_unit_and_destination(
    base: &NodalNetwork,
    surface: &WalkableSurface,
    unit: GridPoint,
    destination: GridPoint,
) -> DomainResult<AugmentedNetwork> {
    let mut network = base.clone();
    let unit = add_position_to_network(&mut network, surface, unit, UNIT_LABEL)?;
    let destination = add_position_to_network(&mut network, surface, destination, DESTINATION_LABEL)?;
    Ok(AugmentedNetwork {
        network,
        unit,
        destination,
    })
}

/// Single-agent query from world positions. The base network is left untouched.
pub fn find_path_from_unit_to_destination(
    base: &NodalNetwork,
    surface: &WalkableSurface,
    unit: WorldPosition,
    destination: WorldPosition,
) -> Path {
    let (from, to) = (unit.snap_to_grid(), destination.snap_to_grid());
    match network_with_unit_and_destination(base, surface, from, to) {
        Ok(augmented) => shortest_path(&augmented.network, augmented.unit, augmented.destination),
        Err(e) => {
            debug!(%from, %to, error = %e, "cannot place query endpoints");
            Path::no_route()
        }
    }
}

/// Junctions directly reachable from `position`: the edges of the node standing
/// there, or the junctions discovered around an off-network point.
pub fn neighbouring_nodes(base: &NodalNetwork, surface: &WalkableSurface, position: GridPoint) -> Vec<NodeId> {
    if let Some(id) = base.node_at(position) {
        return base[id].edges.iter().map(|e| e.target).collect();
    }

    let mut probe = base.clone();
    match add_position_to_network(&mut probe, surface, position, UNIT_LABEL) {
        Ok(id) => probe[id]
            .edges
            .iter()
            .map(|e| e.target)
            .filter(|t| base.contains(*t))
            .collect(),
        Err(_) => Vec::new(),
    }
}

use super::network::NodalNetwork;
use super::path::Path;
use super::search::{shortest_path_with, SearchConstraints};
use tracing::warn;

/// For each interior waypoint of `shortest`, the shortest route that avoids it.
///
/// Waypoints are resolved by position in `network`, so the path may come from
/// another copy of the same graph.
pub fn alternate_routes(shortest: &Path, network: &NodalNetwork) -> Vec<Path> {
    let (Some(origin), Some(destination)) = (shortest.origin(), shortest.destination()) else {
        return Vec::new();
    };
    let (Some(origin), Some(destination)) = (network.node_at(origin.position), network.node_at(destination.position)) else {
        return Vec::new();
    };

    shortest
        .interior()
        .iter()
        .filter_map(|waypoint| network.node_at(waypoint.position))
        .map(|avoid| shortest_path_with(network, origin, destination, SearchConstraints::avoiding(avoid)))
        .filter(Path::is_found)
        .collect()
}

/// The lightest alternate whose overlap with every established path is at most
/// `max_overlap`. Falls back to `proposed` unchanged when nothing qualifies.
pub fn most_unique_below(max_overlap: f64, proposed: &Path, established: &[Path], network: &NodalNetwork) -> Path {
    let mut alternates = alternate_routes(proposed, network);
    alternates.sort_by_key(Path::total_weight);

    if let Some(path) = alternates
        .into_iter()
        .find(|candidate| established.iter().all(|e| candidate.similarity(e) <= max_overlap))
    {
        return path;
    }

    warn!(
        max_overlap,
        path = %proposed.describe(),
        "no sufficiently distinct alternate; keeping the proposed path"
    );
    proposed.clone()
}

use super::geometry::{GridBounds, GridPoint, WalkableSurface};
use super::network::{Edge, NodalNetwork, NodeId, NodeLabeler};
use super::search::{shortest_path_with, SearchConstraints};
use crate::common::{DomainError, DomainResult};
use crate::domains::logger::DynLogger;
use std::collections::{HashSet, VecDeque};

/// The walk recorded while discovering one edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDetails {
    pub start: NodeId,
    pub end: NodeId,
    /// Grid points from `end` back to `start`, both included.
    pub trail: Vec<GridPoint>,
}

impl PathDetails {
    pub fn weight(&self) -> u32 {
        self.trail.len().saturating_sub(1) as u32
    }

    /// The point half way along the walk; where a halfway node goes.
    pub fn halfway_point(&self) -> GridPoint {
        self.trail[self.trail.len() / 2]
    }
}

/// Result of a single edge discovery.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub edges: Vec<Edge>,
    pub details: Vec<PathDetails>,
    pub limit_reached: bool,
}

struct Step {
    point: GridPoint,
    weight: u32,
    previous: Option<usize>,
}

/// Breadth-first walk outward from `origin` along the surface. Each branch ends
/// at the first junction or known node it meets; reaching an unseen junction
/// adds it to the network. Only the first (shortest) arrival at a target becomes an edge.
///
/// The found edges are written to `origin`. Returns them together with the walked trails.
pub fn discover_edges_from(
    surface: &WalkableSurface,
    network: &mut NodalNetwork,
    origin: NodeId,
    labeler: &mut NodeLabeler,
    max_iterations: usize,
) -> Discovery {
    let start = network[origin].position;
    let mut steps = vec![Step {
        point: start,
        weight: 0,
        previous: None,
    }];
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::new();
    for neighbour in surface.neighbours_on_surface(start) {
        visited.insert(neighbour);
        steps.push(Step {
            point: neighbour,
            weight: 1,
            previous: Some(0),
        });
        queue.push_back(steps.len() - 1);
    }

    let mut discovery = Discovery::default();
    let mut iterations = 0;
    while let Some(index) = queue.pop_front() {
        iterations += 1;
        if iterations > max_iterations {
            discovery.limit_reached = true;
            break;
        }

        let point = steps[index].point;
        let weight = steps[index].weight;

        let known = network.node_at(point);
        if known.is_some() || surface.is_junction(point) {
            let target = match known {
                Some(id) => id,
                None => network.add_node(labeler.next_label(), point),
            };
            if target != origin && !discovery.edges.iter().any(|e| e.target == target) {
                discovery.edges.push(Edge::new(target, weight));
                discovery.details.push(PathDetails {
                    start: origin,
                    end: target,
                    trail: trail_back(&steps, index),
                });
            }
            continue;
        }

        for neighbour in surface.neighbours_on_surface(point) {
            if visited.insert(neighbour) {
                steps.push(Step {
                    point: neighbour,
                    weight: weight + 1,
                    previous: Some(index),
                });
                queue.push_back(steps.len() - 1);
            }
        }
    }

    network.set_edges(origin, discovery.edges.clone());
    discovery
}

fn trail_back(steps: &[Step], mut index: usize) -> Vec<GridPoint> {
    let mut trail = vec![steps[index].point];
    while let Some(prev) = steps[index].previous {
        trail.push(steps[prev].point);
        index = prev;
    }
    trail
}

/// Iteration caps for network construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildLimits {
    pub max_iterations: usize,
    pub max_halfway_nodes: usize,
}

impl BuildLimits {
    /// Both caps at the grid cell count.
    pub fn for_bounds(bounds: GridBounds) -> Self {
        let cap = bounds.cell_count().max(1);
        Self {
            max_iterations: cap,
            max_halfway_nodes: cap,
        }
    }

    pub fn for_surface(surface: &WalkableSurface) -> Self {
        Self::for_bounds(surface.bounds())
    }
}

/// A built network plus whatever went wrong on the way.
#[derive(Debug, Clone, Default)]
pub struct NetworkBuild {
    pub network: NodalNetwork,
    pub diagnostics: Vec<DomainError>,
    pub halfway_nodes: usize,
}

impl NetworkBuild {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub struct NetworkBuilder<'a> {
    surface: &'a WalkableSurface,
    labeler: NodeLabeler,
    limits: BuildLimits,
    logger: DynLogger,
    details: Vec<PathDetails>,
}

impl<'a> NetworkBuilder<'a> {
    pub fn new(surface: &'a WalkableSurface, logger: DynLogger) -> Self {
        Self {
            surface,
            labeler: NodeLabeler::new(),
            limits: BuildLimits::for_surface(surface),
            logger,
            details: Vec::new(),
        }
    }

    pub fn with_limits(mut self, limits: BuildLimits) -> Self {
        self.limits = limits;
        self
    }

    /// First walkable point in scan order.
    pub fn find_start_point(&self) -> DomainResult<GridPoint> {
        self.surface
            .bounds()
            .points()
            .find(|p| self.surface.contains(*p))
            .ok_or_else(|| DomainError::degenerate("walkable surface has no point inside the grid bounds"))
    }

    /// Expand outward from `point` until a junction turns up.
    pub fn find_starting_node(&self, point: GridPoint) -> DomainResult<GridPoint> {
        if !self.surface.contains(point) {
            return Err(DomainError::degenerate(format!("start point {} is not walkable", point)));
        }

        let mut candidates = VecDeque::from([point]);
        let mut seen = HashSet::from([point]);
        let mut iterations = 0;
        while let Some(candidate) = candidates.pop_front() {
            iterations += 1;
            if iterations > self.limits.max_iterations {
                return Err(DomainError::limit("starting node search", self.limits.max_iterations));
            }
            if self.surface.is_junction(candidate) {
                return Ok(candidate);
            }
            for neighbour in self.surface.neighbours_on_surface(candidate) {
                if seen.insert(neighbour) {
                    candidates.push_back(neighbour);
                }
            }
        }

        // a closed loop with no junction anywhere
        Err(DomainError::degenerate(format!("no junction reachable from {}", point)))
    }

    /// Run the whole extraction: starting node, edge discovery until every node
    /// is connected, then the halfway-node correction pass.
    pub fn build(mut self) -> NetworkBuild {
        let mut build = NetworkBuild::default();

        let start = match self
            .find_start_point()
            .and_then(|p| self.find_starting_node(p))
        {
            Ok(start) => start,
            Err(e) => {
                self.logger.report(&e);
                build.diagnostics.push(e);
                return build;
            }
        };

        let mut network = NodalNetwork::new();
        let first = network.add_node(self.labeler.next_label(), start);
        let mut explored: Vec<NodeId> = Vec::new();
        let mut rounds = 0;

        while let Some(id) = network.unconnected_node(&explored) {
            rounds += 1;
            if rounds > self.limits.max_iterations {
                let e = DomainError::limit("network construction", self.limits.max_iterations);
                self.logger.report(&e);
                build.diagnostics.push(e);
                break;
            }
            explored.push(id);
            let discovery = self.discover(&mut network, id);
            if discovery.limit_reached {
                let e = DomainError::limit("edge discovery", self.limits.max_iterations);
                self.logger.report(&e);
                build.diagnostics.push(e);
            }
        }

        if network[first].edges.is_empty() {
            let e = DomainError::degenerate(format!("starting node {} has no connections", start));
            self.logger.report(&e);
            build.diagnostics.push(e);
            return build;
        }

        self.logger.info(&format!(
            "Discovered {} nodes and {} edges",
            network.len(),
            network.edge_count()
        ));

        build.halfway_nodes = self.insert_halfway_nodes(&mut network, &mut build.diagnostics);
        if build.halfway_nodes > 0 {
            self.logger.info(&format!("Inserted {} halfway nodes", build.halfway_nodes));
        }
        build.network = network;
        build
    }

    fn discover(&mut self, network: &mut NodalNetwork, id: NodeId) -> Discovery {
        let discovery = discover_edges_from(
            self.surface,
            network,
            id,
            &mut self.labeler,
            self.limits.max_iterations,
        );
        self.details.extend(discovery.details.iter().cloned());
        discovery
    }

    /// Split every direct edge that the search would never take because a
    /// strictly shorter detour exists. Restarts after each split.
    fn insert_halfway_nodes(&mut self, network: &mut NodalNetwork, diagnostics: &mut Vec<DomainError>) -> usize {
        let mut inserted = 0;
        let mut skipped: HashSet<(NodeId, NodeId)> = HashSet::new();

        while let Some((a, b)) = self.find_shortcut_edge(network, &skipped) {
            if inserted >= self.limits.max_halfway_nodes {
                let e = DomainError::limit("halfway node correction", self.limits.max_halfway_nodes);
                self.logger.report(&e);
                diagnostics.push(e);
                break;
            }
            if self.split_edge(network, a, b) {
                inserted += 1;
            } else {
                skipped.insert(ordered(a, b));
            }
        }
        inserted
    }

    fn find_shortcut_edge(
        &self,
        network: &NodalNetwork,
        skipped: &HashSet<(NodeId, NodeId)>,
    ) -> Option<(NodeId, NodeId)> {
        for node in network.nodes() {
            // removing the edge would leave a dead end; no detour can exist
            if node.degree() <= 2 {
                continue;
            }
            for edge in &node.edges {
                if network[edge.target].degree() <= 2 || skipped.contains(&ordered(node.id, edge.target)) {
                    continue;
                }
                let detour = shortest_path_with(
                    network,
                    node.id,
                    edge.target,
                    SearchConstraints::excluding_edge(node.id, edge.target),
                );
                if detour.is_found() && detour.total_weight() < edge.weight {
                    return Some((node.id, edge.target));
                }
            }
        }
        None
    }

    fn split_edge(&mut self, network: &mut NodalNetwork, a: NodeId, b: NodeId) -> bool {
        let Some(halfway) = self.halfway_point(a, b) else {
            self.logger.warn(&format!(
                "No recorded walk between {} and {}; keeping the direct edge",
                network[a].position, network[b].position
            ));
            return false;
        };
        if network.node_at(halfway).is_some() {
            return false;
        }

        // probe on a copy so a failed split leaves no orphan node behind
        let mut trial = network.clone();
        let mut labeler = self.labeler.clone();
        let h = trial.add_node(labeler.next_label(), halfway);
        let discovery = discover_edges_from(self.surface, &mut trial, h, &mut labeler, self.limits.max_iterations);
        let to_a = discovery.edges.iter().find(|e| e.target == a).map(|e| e.weight);
        let to_b = discovery.edges.iter().find(|e| e.target == b).map(|e| e.weight);

        let (Some(wa), Some(wb)) = (to_a, to_b) else {
            return false;
        };
        trial.remove_edges_between(a, b);
        trial.add_edge(a, h, wa);
        trial.add_edge(b, h, wb);
        self.logger.info(&format!(
            "Split {} - {} at halfway node {} {}",
            trial[a].label, trial[b].label, trial[h].label, halfway
        ));

        *network = trial;
        self.labeler = labeler;
        self.details.extend(discovery.details);
        true
    }

    fn halfway_point(&self, a: NodeId, b: NodeId) -> Option<GridPoint> {
        self.details
            .iter()
            .find(|d| (d.start == a && d.end == b) || (d.start == b && d.end == a))
            .map(PathDetails::halfway_point)
    }
}

fn ordered(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

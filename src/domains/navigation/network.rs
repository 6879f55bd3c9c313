use super::geometry::GridPoint;
use crate::common::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

pub const MAX_EDGES_PER_NODE: usize = 4;

/// Labels reserved for the ephemeral nodes added for a single query.
pub const UNIT_LABEL: &str = "unit";
pub const DESTINATION_LABEL: &str = "player";

/// Stable index of a node in its network's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Directed connection; weight is the number of grid steps along the walkable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub target: NodeId,
    pub weight: u32,
}

impl Edge {
    pub fn new(target: NodeId, weight: u32) -> Self {
        Self { target, weight }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub position: GridPoint,
    pub edges: Vec<Edge>,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<String>, position: GridPoint) -> Self {
        Self {
            id,
            label: label.into(),
            position,
            edges: Vec::new(),
        }
    }

    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_to(&self, target: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.target == target)
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        self.position.distance_to(other.position)
    }
}

/// Hands out display labels A, B, … Z, AA, AB, … in creation order.
/// One labeler belongs to one network build, so independent graphs never share a counter.
#[derive(Debug, Clone, Default)]
pub struct NodeLabeler {
    next: usize,
}

impl NodeLabeler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: usize) -> Self {
        Self { next }
    }

    pub fn next_label(&mut self) -> String {
        let label = Self::label_for(self.next);
        self.next += 1;
        label
    }

    /// Bijective base-26 label for an arena index.
    pub fn label_for(index: usize) -> String {
        let mut n = index + 1;
        let mut chars = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            chars.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        chars.iter().rev().collect()
    }
}

/// Arena of junction nodes. A node's id is its index; at most one node per grid point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodalNetwork {
    nodes: Vec<Node>,
    by_position: HashMap<GridPoint, NodeId>,
}

impl NodalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a network from nodes whose ids must equal their positions in the list.
    pub fn from_nodes(nodes: Vec<Node>) -> DomainResult<Self> {
        let mut by_position = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if node.id.index() != i {
                return Err(DomainError::degenerate(format!(
                    "node {} stored at index {}",
                    node.id, i
                )));
            }
            if by_position.insert(node.position, node.id).is_some() {
                return Err(DomainError::degenerate(format!(
                    "two nodes share position {}",
                    node.position
                )));
            }
        }
        for node in &nodes {
            if let Some(edge) = node.edges.iter().find(|e| e.target.index() >= nodes.len()) {
                return Err(DomainError::degenerate(format!(
                    "node {} has an edge to unknown node {}",
                    node.id, edge.target
                )));
            }
        }
        Ok(Self { nodes, by_position })
    }

    pub fn add_node(&mut self, label: impl Into<String>, position: GridPoint) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, label, position));
        self.by_position.insert(position, id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_at(&self, position: GridPoint) -> Option<NodeId> {
        self.by_position.get(&position).copied()
    }

    /// Number of directed edge entries across all nodes.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(Node::degree).sum()
    }

    pub fn set_edges(&mut self, id: NodeId, edges: Vec<Edge>) {
        self.nodes[id.index()].edges = edges;
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: u32) {
        self.nodes[from.index()].edges.push(Edge::new(to, weight));
    }

    /// Drop the connection in both directions.
    pub fn remove_edges_between(&mut self, a: NodeId, b: NodeId) {
        self.nodes[a.index()].edges.retain(|e| e.target != b);
        self.nodes[b.index()].edges.retain(|e| e.target != a);
    }

    /// First node (in arena order) with no edges that has not been explored yet.
    pub fn unconnected_node(&self, explored: &[NodeId]) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.edges.is_empty() && !explored.contains(&n.id))
            .map(|n| n.id)
    }
}

impl Index<NodeId> for NodalNetwork {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

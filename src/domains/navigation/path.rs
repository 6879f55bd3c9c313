use super::geometry::GridPoint;
use super::network::Node;
use crate::common::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One directed hop of a path, keyed by grid positions so paths computed on
/// different copies of a network can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub from: GridPoint,
    pub to: GridPoint,
    pub weight: u32,
}

/// Ordered waypoints from origin to destination (inclusive).
///
/// A path that is not `found` is the "no route" sentinel. It may still carry
/// the origin node so a movement controller knows whose request failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    nodes: Vec<Node>,
    total_weight: u32,
    found: bool,
}

impl Path {
    pub fn new(nodes: Vec<Node>, total_weight: u32) -> Self {
        Self {
            nodes,
            total_weight,
            found: true,
        }
    }

    pub fn no_route() -> Self {
        Self {
            nodes: Vec::new(),
            total_weight: 0,
            found: false,
        }
    }

    pub fn unreachable_from(origin: Node) -> Self {
        Self {
            nodes: vec![origin],
            total_weight: 0,
            found: false,
        }
    }

    pub(crate) fn from_parts(nodes: Vec<Node>, total_weight: u32, found: bool) -> Self {
        Self {
            nodes,
            total_weight,
            found,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn origin(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn destination(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn positions(&self) -> Vec<GridPoint> {
        self.nodes.iter().map(|n| n.position).collect()
    }

    /// Interior waypoints, excluding both endpoints.
    pub fn interior(&self) -> &[Node] {
        if self.nodes.len() < 3 {
            return &[];
        }
        &self.nodes[1..self.nodes.len() - 1]
    }

    pub fn ensure_found(self) -> DomainResult<Self> {
        if self.found {
            return Ok(self);
        }
        let from = self.origin().map(|n| n.position).unwrap_or_default();
        let to = self.destination().map(|n| n.position).unwrap_or_default();
        Err(DomainError::NoRouteFound { from, to })
    }

    /// Weighted directed hops. A hop with no recorded edge between its nodes is skipped.
    pub fn segments(&self) -> Vec<PathSegment> {
        self.nodes
            .windows(2)
            .filter_map(|pair| {
                pair[0].edge_to(pair[1].id).map(|edge| PathSegment {
                    from: pair[0].position,
                    to: pair[1].position,
                    weight: edge.weight,
                })
            })
            .collect()
    }

    /// Fraction of the shorter path's weight that both paths travel along the same directed hops.
    pub fn similarity(&self, other: &Path) -> f64 {
        if !self.found || !other.found {
            return 0.0;
        }
        let shorter = self.total_weight.min(other.total_weight);
        if shorter == 0 {
            return 0.0;
        }

        let theirs: HashMap<(GridPoint, GridPoint), u32> = other
            .segments()
            .into_iter()
            .map(|s| ((s.from, s.to), s.weight))
            .collect();

        let shared: u32 = self
            .segments()
            .iter()
            .filter_map(|s| theirs.get(&(s.from, s.to)).map(|w| s.weight.min(*w)))
            .sum();

        shared as f64 / shorter as f64
    }

    /// `A -> B (x, y) -> C (x, y)` for log lines.
    pub fn describe(&self) -> String {
        if !self.found && self.nodes.is_empty() {
            return "<no route>".to_string();
        }
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i == 0 {
                out.push_str(&node.label);
            } else {
                out.push_str(&format!(" -> {} {}", node.label, node.position));
            }
        }
        if !self.found {
            out.push_str(" (no route)");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::navigation::network::{Edge, NodeId};

    fn node(id: usize, label: &str, x: i32, y: i32, edges: &[(usize, u32)]) -> Node {
        let mut n = Node::new(NodeId(id), label, GridPoint::new(x, y));
        n.edges = edges.iter().map(|(t, w)| Edge::new(NodeId(*t), *w)).collect();
        n
    }

    #[test]
    fn describe_lists_labels_and_positions() {
        let path = Path::new(
            vec![node(0, "A", 0, 0, &[(1, 2)]), node(1, "B", 2, 0, &[])],
            2,
        );
        assert_eq!(path.describe(), "A -> B (2, 0)");
        assert_eq!(Path::no_route().describe(), "<no route>");
    }

    #[test]
    fn sentinel_converts_to_no_route_error() {
        let err = Path::unreachable_from(node(3, "unit", 4, 1, &[])).ensure_found().unwrap_err();
        assert!(matches!(err, DomainError::NoRouteFound { from, .. } if from == GridPoint::new(4, 1)));
    }

    #[test]
    fn hop_without_edge_is_not_a_segment() {
        let path = Path::new(vec![node(0, "A", 0, 0, &[]), node(1, "B", 1, 0, &[])], 1);
        assert!(path.segments().is_empty());
    }
}

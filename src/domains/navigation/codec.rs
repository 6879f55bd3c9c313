//! Flat numeric layouts used to move a network, agent positions and computed
//! paths across the batch worker boundary.
//!
//! Node record, `NODE_RECORD_LEN` ints:
//! `[id, x, y, target0, weight0, target1, weight1, target2, weight2, target3, weight3]`
//! with `EMPTY_SLOT` in both fields of an unused edge slot.
//!
//! Path stream: for each path `[valid (1|0), total_weight, node records…, END_OF_PATH]`.
//!
//! Display labels are not numeric; they travel in a parallel list, one per node record.

use super::geometry::{GridPoint, WorldPosition};
use super::network::{Edge, NodalNetwork, Node, NodeId, MAX_EDGES_PER_NODE};
use super::path::Path;
use crate::common::DomainResult;
use thiserror::Error;

pub const NODE_RECORD_LEN: usize = 3 + 2 * MAX_EDGES_PER_NODE;
pub const AGENT_RECORD_LEN: usize = 3;
pub const PATH_HEADER_LEN: usize = 2;
pub const EMPTY_SLOT: i32 = -1;
pub const END_OF_PATH: i32 = -2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("node {node} has {edges} edges; a record holds at most 4")]
    TooManyEdges { node: usize, edges: usize },

    #[error("buffer truncated: expected {expected} values, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("{field} value {value} does not fit the record layout")]
    ValueOutOfRange { field: &'static str, value: i64 },

    #[error("path stream ended without a terminator")]
    MissingTerminator,

    #[error("invalid node id {0}")]
    InvalidNodeId(i32),

    #[error("{records} node records but {labels} labels")]
    LabelCountMismatch { records: usize, labels: usize },
}

/// Network snapshot: fixed-width node records plus their labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeBuffer {
    pub records: Vec<i32>,
    pub labels: Vec<String>,
}

impl NodeBuffer {
    pub fn node_count(&self) -> usize {
        self.records.len() / NODE_RECORD_LEN
    }
}

/// Agent positions, `AGENT_RECORD_LEN` floats per agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentBuffer(pub Vec<f32>);

impl AgentBuffer {
    pub fn agent_count(&self) -> usize {
        self.0.len() / AGENT_RECORD_LEN
    }
}

/// Result stream of a batch job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathBuffer {
    pub values: Vec<i32>,
    pub labels: Vec<String>,
}

impl PathBuffer {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn to_i32(field: &'static str, value: i64) -> Result<i32, CodecError> {
    i32::try_from(value).map_err(|_| CodecError::ValueOutOfRange { field, value })
}

fn write_node(out: &mut Vec<i32>, node: &Node) -> Result<(), CodecError> {
    if node.edges.len() > MAX_EDGES_PER_NODE {
        return Err(CodecError::TooManyEdges {
            node: node.id.index(),
            edges: node.edges.len(),
        });
    }
    out.push(to_i32("node id", node.id.index() as i64)?);
    out.push(node.position.x);
    out.push(node.position.y);
    for slot in 0..MAX_EDGES_PER_NODE {
        match node.edges.get(slot) {
            Some(edge) => {
                out.push(to_i32("edge target", edge.target.index() as i64)?);
                out.push(to_i32("edge weight", edge.weight as i64)?);
            }
            None => {
                out.push(EMPTY_SLOT);
                out.push(EMPTY_SLOT);
            }
        }
    }
    Ok(())
}

fn read_node(record: &[i32], label: String) -> Result<Node, CodecError> {
    let id = record[0];
    if id < 0 {
        return Err(CodecError::InvalidNodeId(id));
    }
    let mut node = Node::new(NodeId(id as usize), label, GridPoint::new(record[1], record[2]));
    for slot in record[3..].chunks_exact(2) {
        let (target, weight) = (slot[0], slot[1]);
        if target == EMPTY_SLOT {
            continue;
        }
        if target < 0 {
            return Err(CodecError::InvalidNodeId(target));
        }
        if weight < 0 {
            return Err(CodecError::ValueOutOfRange {
                field: "edge weight",
                value: weight as i64,
            });
        }
        node.edges.push(Edge::new(NodeId(target as usize), weight as u32));
    }
    Ok(node)
}

pub fn encode_nodes(nodes: &[Node]) -> Result<NodeBuffer, CodecError> {
    let mut records = Vec::with_capacity(nodes.len() * NODE_RECORD_LEN);
    for node in nodes {
        write_node(&mut records, node)?;
    }
    Ok(NodeBuffer {
        records,
        labels: nodes.iter().map(|n| n.label.clone()).collect(),
    })
}

pub fn decode_nodes(buffer: &NodeBuffer) -> Result<Vec<Node>, CodecError> {
    if buffer.records.len() % NODE_RECORD_LEN != 0 {
        return Err(CodecError::Truncated {
            expected: (buffer.node_count() + 1) * NODE_RECORD_LEN,
            actual: buffer.records.len(),
        });
    }
    if buffer.labels.len() != buffer.node_count() {
        return Err(CodecError::LabelCountMismatch {
            records: buffer.node_count(),
            labels: buffer.labels.len(),
        });
    }
    buffer
        .records
        .chunks_exact(NODE_RECORD_LEN)
        .zip(buffer.labels.iter())
        .map(|(record, label)| read_node(record, label.clone()))
        .collect()
}

pub fn encode_network(network: &NodalNetwork) -> Result<NodeBuffer, CodecError> {
    encode_nodes(network.nodes())
}

pub fn decode_network(buffer: &NodeBuffer) -> DomainResult<NodalNetwork> {
    NodalNetwork::from_nodes(decode_nodes(buffer)?)
}

pub fn encode_agents(agents: &[WorldPosition]) -> AgentBuffer {
    AgentBuffer(
        agents
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect(),
    )
}

pub fn decode_agents(buffer: &AgentBuffer) -> Result<Vec<WorldPosition>, CodecError> {
    if buffer.0.len() % AGENT_RECORD_LEN != 0 {
        return Err(CodecError::Truncated {
            expected: (buffer.agent_count() + 1) * AGENT_RECORD_LEN,
            actual: buffer.0.len(),
        });
    }
    Ok(buffer
        .0
        .chunks_exact(AGENT_RECORD_LEN)
        .map(|r| WorldPosition::new(r[0] as f64, r[1] as f64, r[2] as f64))
        .collect())
}

pub fn encode_paths(paths: &[Path]) -> Result<PathBuffer, CodecError> {
    let mut buffer = PathBuffer::default();
    for path in paths {
        buffer.values.push(i32::from(path.is_found()));
        buffer.values.push(to_i32("total weight", path.total_weight() as i64)?);
        for node in path.nodes() {
            write_node(&mut buffer.values, node)?;
            buffer.labels.push(node.label.clone());
        }
        buffer.values.push(END_OF_PATH);
    }
    Ok(buffer)
}

pub fn decode_paths(buffer: &PathBuffer) -> Result<Vec<Path>, CodecError> {
    let values = &buffer.values;
    let mut used_labels = 0;
    let mut paths = Vec::new();
    let mut cursor = 0;

    while cursor < values.len() {
        if cursor + PATH_HEADER_LEN > values.len() {
            return Err(CodecError::Truncated {
                expected: cursor + PATH_HEADER_LEN,
                actual: values.len(),
            });
        }
        let found = match values[cursor] {
            0 => false,
            1 => true,
            other => {
                return Err(CodecError::ValueOutOfRange {
                    field: "validity flag",
                    value: other as i64,
                })
            }
        };
        let weight = values[cursor + 1];
        if weight < 0 {
            return Err(CodecError::ValueOutOfRange {
                field: "total weight",
                value: weight as i64,
            });
        }
        cursor += PATH_HEADER_LEN;

        let mut nodes = Vec::new();
        loop {
            match values.get(cursor) {
                None => return Err(CodecError::MissingTerminator),
                Some(&END_OF_PATH) => {
                    cursor += 1;
                    break;
                }
                Some(_) => {
                    let record = values.get(cursor..cursor + NODE_RECORD_LEN).ok_or(CodecError::Truncated {
                        expected: cursor + NODE_RECORD_LEN,
                        actual: values.len(),
                    })?;
                    let label = buffer.labels.get(used_labels).cloned().ok_or(CodecError::LabelCountMismatch {
                        records: used_labels + 1,
                        labels: buffer.labels.len(),
                    })?;
                    nodes.push(read_node(record, label)?);
                    used_labels += 1;
                    cursor += NODE_RECORD_LEN;
                }
            }
        }
        paths.push(Path::from_parts(nodes, weight as u32, found));
    }

    if used_labels != buffer.labels.len() {
        return Err(CodecError::LabelCountMismatch {
            records: used_labels,
            labels: buffer.labels.len(),
        });
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_slots_are_marked_empty() {
        let mut node = Node::new(NodeId(2), "C", GridPoint::new(4, 7));
        node.edges.push(Edge::new(NodeId(0), 3));
        let buffer = encode_nodes(&[node]).unwrap();
        assert_eq!(buffer.records, vec![2, 4, 7, 0, 3, -1, -1, -1, -1, -1, -1]);
    }

    #[test]
    fn fifth_edge_is_rejected() {
        let mut node = Node::new(NodeId(0), "A", GridPoint::new(0, 0));
        node.edges = (1..=5).map(|t| Edge::new(NodeId(t), 1)).collect();
        assert_eq!(
            encode_nodes(&[node]).unwrap_err(),
            CodecError::TooManyEdges { node: 0, edges: 5 }
        );
    }

    #[test]
    fn path_without_terminator_is_rejected() {
        let buffer = PathBuffer {
            values: vec![1, 3, 0, 0, 0, -1, -1, -1, -1, -1, -1, -1, -1],
            labels: vec!["A".into()],
        };
        assert_eq!(decode_paths(&buffer).unwrap_err(), CodecError::MissingTerminator);
    }
}

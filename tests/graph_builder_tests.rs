use nodal_nav::adapters::outbound::{init_noop_logger, CaptureLogger};
use nodal_nav::domains::logger::DomainLogger;
use nodal_nav::domains::navigation::{
    discover_edges_from, BuildLimits, GridPoint, NetworkBuilder, NodalNetwork, NodeLabeler, WalkableSurface,
};
use nodal_nav::DomainError;
use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use std::sync::Arc;

fn build(rows: &[&str]) -> nodal_nav::domains::navigation::NetworkBuild {
    let surface = WalkableSurface::from_ascii(rows);
    NetworkBuilder::new(&surface, init_noop_logger()).build()
}

fn node_at(network: &NodalNetwork, x: i32, y: i32) -> nodal_nav::domains::navigation::NodeId {
    network
        .node_at(GridPoint::new(x, y))
        .unwrap_or_else(|| panic!("expected a node at ({}, {})", x, y))
}

const ROOMS: &[&str] = &[
    "#########",
    "#...#...#",
    "#########",
    "#...#...#",
    "#########",
];

// A–B joined directly by a long top corridor, with a shorter route through C.
const DETOUR: &[&str] = &[
    ".#####.",
    ".#...#.",
    "#######",
    "...#...",
];

#[test]
fn test_every_node_has_between_one_and_four_edges() {
    for rows in [ROOMS, DETOUR, &["###", "###", "###"][..], &["#####"][..]] {
        let build = build(rows);
        assert!(!build.network.is_empty());
        for node in build.network.nodes() {
            assert!(
                (1..=4).contains(&node.degree()),
                "node {} at {} has {} edges",
                node.label,
                node.position,
                node.degree()
            );
        }
    }
}

#[test]
fn test_starting_node_on_solid_block_is_not_a_corridor_point() {
    let surface = WalkableSurface::from_ascii(&["###", "###", "###"]);
    let builder = NetworkBuilder::new(&surface, init_noop_logger());

    let start = builder.find_start_point().unwrap();
    assert_eq!(start, GridPoint::new(0, 0));

    let node = builder.find_starting_node(start).unwrap();
    assert_ne!(surface.neighbours_on_surface(node).len(), 2);
}

#[test]
fn test_start_point_scans_column_by_column() {
    let surface = WalkableSurface::from_ascii(&["..#", "#.."]);
    let builder = NetworkBuilder::new(&surface, init_noop_logger());
    assert_eq!(builder.find_start_point().unwrap(), GridPoint::new(0, 1));
}

#[test]
fn test_empty_surface_is_degenerate_not_fatal() {
    let capture = CaptureLogger::new();
    let surface = WalkableSurface::from_ascii(&["....", "...."]);
    let build = NetworkBuilder::new(&surface, capture.clone()).build();

    assert!(build.network.is_empty());
    assert!(matches!(build.diagnostics.as_slice(), [DomainError::DegenerateInput { .. }]));
    assert!(capture.contains("WARN:Degenerate input"));
}

#[test]
fn test_isolated_point_yields_empty_network() {
    let build = build(&["...", ".#.", "..."]);
    assert!(build.network.is_empty());
    assert!(!build.is_clean());
}

#[test]
fn test_straight_corridor_has_two_dead_end_nodes() {
    let build = build(&["#####"]);
    let network = &build.network;

    assert_eq!(network.len(), 2);
    let a = node_at(network, 0, 0);
    let b = node_at(network, 4, 0);
    assert_eq!(network[a].edge_to(b).map(|e| e.weight), Some(4));
    assert_eq!(network[b].edge_to(a).map(|e| e.weight), Some(4));
    assert_eq!(network[a].label, "A");
    assert_eq!(network[b].label, "B");
}

#[test]
fn test_halfway_node_replaces_edge_the_search_would_never_take() {
    let build = build(DETOUR);
    let network = &build.network;
    assert!(build.is_clean(), "{:?}", build.diagnostics);
    assert_eq!(build.halfway_nodes, 1);

    let a = node_at(network, 1, 2);
    let b = node_at(network, 5, 2);
    let c = node_at(network, 3, 2);
    assert!(network[a].edge_to(b).is_none());
    assert!(network[b].edge_to(a).is_none());
    assert_eq!(network[a].edge_to(c).map(|e| e.weight), Some(2));

    // midpoint of the original eight-step walk along the top corridor
    let h = node_at(network, 3, 0);
    assert_eq!(network[a].edge_to(h).map(|e| e.weight), Some(4));
    assert_eq!(network[b].edge_to(h).map(|e| e.weight), Some(4));
    assert_eq!(network[h].edge_to(a).map(|e| e.weight), Some(4));
    assert_eq!(network[h].edge_to(b).map(|e| e.weight), Some(4));
    assert_eq!(network[h].degree(), 2);
}

#[test]
fn test_halfway_cap_is_reported() {
    let surface = WalkableSurface::from_ascii(DETOUR);
    let limits = BuildLimits {
        max_iterations: surface.iteration_cap(),
        max_halfway_nodes: 0,
    };
    let build = NetworkBuilder::new(&surface, init_noop_logger()).with_limits(limits).build();

    assert_eq!(build.halfway_nodes, 0);
    assert!(build
        .diagnostics
        .iter()
        .any(|d| matches!(d, DomainError::StructuralLimitExceeded { operation, .. } if operation.contains("halfway"))));
    // the uncorrected edge is still there
    let a = node_at(&build.network, 1, 2);
    let b = node_at(&build.network, 5, 2);
    assert_eq!(build.network[a].edge_to(b).map(|e| e.weight), Some(8));
}

#[test]
fn test_construction_cap_keeps_partial_network() {
    let capture = CaptureLogger::new();
    let surface = WalkableSurface::from_ascii(&["###", "###", "###"]);
    let limits = BuildLimits {
        max_iterations: 3,
        max_halfway_nodes: 3,
    };
    let build = NetworkBuilder::new(&surface, capture.clone()).with_limits(limits).build();

    // three discovery rounds each stop early, the fourth round is never run
    let operations: Vec<&str> = build
        .diagnostics
        .iter()
        .map(|d| match d {
            DomainError::StructuralLimitExceeded { operation, limit: 3 } => operation.as_str(),
            other => panic!("unexpected diagnostic {:?}", other),
        })
        .collect();
    assert_eq!(
        operations,
        vec!["edge discovery", "edge discovery", "edge discovery", "network construction"]
    );

    let network = &build.network;
    assert_eq!(network.len(), 4);
    let start = node_at(network, 0, 1);
    let centre = node_at(network, 1, 1);
    assert_eq!(network[start].edge_to(centre).map(|e| e.weight), Some(1));
    assert_eq!(network[centre].degree(), 3);
    assert_eq!(network[node_at(network, 2, 1)].degree(), 0);

    assert!(capture.contains("ERR:Structural limit exceeded: edge discovery stopped after 3"));
    assert!(capture.contains("ERR:Structural limit exceeded: network construction stopped after 3"));
    assert!(capture.contains("INFO:Discovered 4 nodes"));
}

#[test]
fn test_discovery_records_walks_and_adds_new_junctions() {
    let surface = WalkableSurface::from_ascii(DETOUR);
    let mut network = NodalNetwork::new();
    let mut labeler = NodeLabeler::new();
    let origin = network.add_node(labeler.next_label(), GridPoint::new(1, 2));

    let discovery = discover_edges_from(&surface, &mut network, origin, &mut labeler, surface.iteration_cap());

    assert!(!discovery.limit_reached);
    let targets: Vec<GridPoint> = discovery.edges.iter().map(|e| network[e.target].position).collect();
    assert_eq!(targets, vec![GridPoint::new(0, 2), GridPoint::new(3, 2), GridPoint::new(5, 2)]);
    let weights: Vec<u32> = discovery.edges.iter().map(|e| e.weight).collect();
    assert_eq!(weights, vec![1, 2, 8]);
    assert_eq!(network.len(), 4);

    for details in &discovery.details {
        assert_eq!(details.trail.last(), Some(&GridPoint::new(1, 2)));
        assert_eq!(details.trail.first(), Some(&network[details.end].position));
        let weight = discovery.edges.iter().find(|e| e.target == details.end).map(|e| e.weight);
        assert_eq!(Some(details.weight()), weight);
    }
}

#[test]
fn test_network_is_one_connected_component() {
    let build = build(ROOMS);
    let network = &build.network;

    let mut graph = UnGraph::<(), u32>::new_undirected();
    let indices: Vec<_> = network.nodes().iter().map(|_| graph.add_node(())).collect();
    for node in network.nodes() {
        for edge in &node.edges {
            graph.add_edge(indices[node.id.index()], indices[edge.target.index()], edge.weight);
        }
    }
    assert_eq!(connected_components(&graph), 1);
}

#[test]
fn test_every_edge_has_a_reverse_edge_of_equal_weight() {
    let build = build(ROOMS);
    let network = &build.network;
    for node in network.nodes() {
        for edge in &node.edges {
            assert_eq!(
                network[edge.target].edge_to(node.id).map(|e| e.weight),
                Some(edge.weight),
                "{} -> {}",
                node.position,
                network[edge.target].position
            );
        }
    }
}

#[test]
fn test_independent_builds_label_from_a() {
    let first = build(&["#####"]);
    let second = build(ROOMS);
    assert_eq!(first.network.nodes()[0].label, "A");
    assert_eq!(second.network.nodes()[0].label, "A");
}

#[test]
fn test_build_progress_is_logged() {
    let capture = CaptureLogger::new();
    let surface = WalkableSurface::from_ascii(DETOUR);
    let logger: Arc<dyn DomainLogger> = capture.clone();
    NetworkBuilder::new(&surface, logger).build();

    assert!(capture.contains("INFO:Discovered"));
    assert!(capture.contains("Inserted 1 halfway nodes"));
}

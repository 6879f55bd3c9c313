use nodal_nav::adapters::outbound::init_noop_logger;
use nodal_nav::domains::navigation::codec::{
    decode_agents, decode_network, decode_nodes, decode_paths, encode_agents, encode_network, encode_paths,
    AgentBuffer, CodecError, NodeBuffer, PathBuffer, END_OF_PATH, NODE_RECORD_LEN,
};
use nodal_nav::domains::navigation::{
    AssignmentSettings, GridPoint, MultiAgentAssigner, NetworkBuilder, Node, NodeId, Path, WalkableSurface,
    WorldPosition,
};
use nodal_nav::DomainError;

const MAP: &[&str] = &[
    "#########",
    "#...#...#",
    "#########",
];

#[test]
fn test_built_network_survives_the_node_buffer() {
    let surface = WalkableSurface::from_ascii(MAP);
    let network = NetworkBuilder::new(&surface, init_noop_logger()).build().network;

    let buffer = encode_network(&network).unwrap();
    assert_eq!(buffer.node_count(), network.len());
    assert_eq!(buffer.records.len(), network.len() * NODE_RECORD_LEN);

    let decoded = decode_network(&buffer).unwrap();
    assert_eq!(decoded, network);
    for (before, after) in network.nodes().iter().zip(decoded.nodes()) {
        assert_eq!(before.edges, after.edges, "edge order of {}", before.label);
    }
}

#[test]
fn test_assigned_paths_survive_the_result_stream() {
    let surface = WalkableSurface::from_ascii(MAP);
    let network = NetworkBuilder::new(&surface, init_noop_logger()).build().network;
    let agents = [
        WorldPosition::on_grid(GridPoint::new(0, 1)),
        WorldPosition::on_grid(GridPoint::new(2, 0)),
        WorldPosition::on_grid(GridPoint::new(30, 30)),
    ];
    let outcome = MultiAgentAssigner::new(&network, &surface, AssignmentSettings::default())
        .assign(&agents, WorldPosition::on_grid(GridPoint::new(8, 2)));
    let paths: Vec<Path> = outcome.routes.into_iter().map(|r| r.path).collect();
    assert!(!paths[2].is_found());

    let buffer = encode_paths(&paths).unwrap();
    let decoded = decode_paths(&buffer).unwrap();
    assert_eq!(decoded, paths);
    assert_eq!(decoded[0].nodes()[0].label, "unit");
    assert_eq!(decoded[0].destination().map(|n| n.label.as_str()), Some("player"));
}

#[test]
fn test_path_stream_layout() {
    let mut a = Node::new(NodeId(0), "A", GridPoint::new(0, 0));
    a.edges.push(nodal_nav::domains::navigation::Edge::new(NodeId(1), 5));
    let b = Node::new(NodeId(1), "B", GridPoint::new(5, 0));
    let paths = [Path::new(vec![a, b], 5), Path::no_route()];

    let buffer = encode_paths(&paths).unwrap();
    assert_eq!(
        buffer.values,
        vec![
            1, 5, //
            0, 0, 0, 1, 5, -1, -1, -1, -1, -1, -1, //
            1, 5, 0, -1, -1, -1, -1, -1, -1, -1, -1, //
            END_OF_PATH, //
            0, 0, END_OF_PATH,
        ]
    );
    assert_eq!(buffer.labels, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn test_empty_result_stream_decodes_to_nothing() {
    let buffer = encode_paths(&[]).unwrap();
    assert!(buffer.is_empty());
    assert!(decode_paths(&buffer).unwrap().is_empty());
}

#[test]
fn test_agent_buffer_round_trip() {
    let agents = vec![WorldPosition::new(1.5, 0.25, -3.0), WorldPosition::new(0.0, 2.0, 7.0)];
    let buffer = encode_agents(&agents);
    assert_eq!(buffer.agent_count(), 2);
    assert_eq!(decode_agents(&buffer).unwrap(), agents);
}

#[test]
fn test_truncated_buffers_are_rejected() {
    let agents = AgentBuffer(vec![1.0, 2.0]);
    assert!(matches!(decode_agents(&agents), Err(CodecError::Truncated { .. })));

    let nodes = NodeBuffer {
        records: vec![0, 1, 2],
        labels: vec!["A".into()],
    };
    assert!(matches!(decode_nodes(&nodes), Err(CodecError::Truncated { .. })));

    let paths = PathBuffer {
        values: vec![1],
        labels: Vec::new(),
    };
    assert!(matches!(decode_paths(&paths), Err(CodecError::Truncated { .. })));
}

#[test]
fn test_label_list_must_match_records() {
    let surface = WalkableSurface::from_ascii(MAP);
    let network = NetworkBuilder::new(&surface, init_noop_logger()).build().network;
    let mut buffer = encode_network(&network).unwrap();
    buffer.labels.pop();
    assert!(matches!(decode_nodes(&buffer), Err(CodecError::LabelCountMismatch { .. })));

    let mut paths = encode_paths(&[Path::new(network.nodes()[..1].to_vec(), 0)]).unwrap();
    paths.labels.push("extra".into());
    assert!(matches!(decode_paths(&paths), Err(CodecError::LabelCountMismatch { .. })));
}

#[test]
fn test_bad_values_are_rejected() {
    let mut record = vec![-4, 0, 0];
    record.extend([-1; 8]);
    let buffer = NodeBuffer {
        records: record,
        labels: vec!["A".into()],
    };
    assert_eq!(decode_nodes(&buffer).unwrap_err(), CodecError::InvalidNodeId(-4));

    let flag = PathBuffer {
        values: vec![7, 0, END_OF_PATH],
        labels: Vec::new(),
    };
    assert!(matches!(decode_paths(&flag), Err(CodecError::ValueOutOfRange { .. })));
}

#[test]
fn test_dangling_edge_target_fails_network_decode() {
    let mut record = vec![0, 0, 0, 9, 1];
    record.extend([-1; 6]);
    let buffer = NodeBuffer {
        records: record,
        labels: vec!["A".into()],
    };
    assert!(decode_nodes(&buffer).is_ok());
    assert!(matches!(decode_network(&buffer), Err(DomainError::DegenerateInput { .. })));
}

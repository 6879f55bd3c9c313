use nodal_nav::adapters::outbound::init_noop_logger;
use nodal_nav::domains::navigation::{
    AssignmentSettings, GridPoint, MultiAgentAssigner, NetworkBuilder, NodalNetwork, WalkableSurface, WorldPosition,
    UNIT_LABEL,
};
use nodal_nav::DomainError;

// One 4-way junction at (4, 1) in the middle of a corridor.
const CROSSING: &[&str] = &[
    "....#....",
    "#########",
    "....#....",
];

// Two junctions W(1,2) and E(5,2) joined by a northern arm through N(3,1)
// and a southern arm through S(3,3).
const RING: &[&str] = &[
    "...#...",
    ".#####.",
    "##...##",
    ".#####.",
    "...#...",
];

fn setup(rows: &[&str]) -> (WalkableSurface, NodalNetwork) {
    let surface = WalkableSurface::from_ascii(rows);
    let network = NetworkBuilder::new(&surface, init_noop_logger()).build().network;
    (surface, network)
}

fn at(x: i32, y: i32) -> WorldPosition {
    WorldPosition::on_grid(GridPoint::new(x, y))
}

#[test]
fn test_agents_on_opposite_sides_take_their_own_corridors() {
    let (surface, network) = setup(CROSSING);
    let settings = AssignmentSettings::default();
    let outcome = MultiAgentAssigner::new(&network, &surface, settings).assign(&[at(1, 1), at(7, 1)], at(4, 1));

    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.routes.len(), 2);
    let (west, east) = (&outcome.routes[0].path, &outcome.routes[1].path);
    assert_eq!(outcome.routes[0].agent, 0);
    assert_eq!(outcome.routes[1].agent, 1);

    assert_eq!(west.positions(), vec![GridPoint::new(1, 1), GridPoint::new(4, 1)]);
    assert_eq!(east.positions(), vec![GridPoint::new(7, 1), GridPoint::new(4, 1)]);
    assert_eq!(west.total_weight(), 3);
    assert_eq!(east.total_weight(), 3);
    assert!(west.similarity(east) < settings.first_pass_similarity);
}

#[test]
fn test_second_agent_is_sent_round_the_other_arm() {
    let (surface, network) = setup(RING);
    let settings = AssignmentSettings::default();
    let outcome = MultiAgentAssigner::new(&network, &surface, settings).assign(&[at(0, 2), at(1, 2)], at(6, 2));

    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let (outer, inner) = (&outcome.routes[0].path, &outcome.routes[1].path);
    assert!(outer.is_found() && inner.is_found());
    assert_eq!(inner.total_weight(), 7);
    assert_eq!(outer.total_weight(), 8);
    assert_eq!(outer.positions().first(), Some(&GridPoint::new(0, 2)));
    assert_eq!(inner.positions().first(), Some(&GridPoint::new(1, 2)));
    assert_eq!(outer.positions().last(), Some(&GridPoint::new(6, 2)));

    assert!(outer.similarity(inner) <= settings.second_pass_similarity);
    let (north, south) = (GridPoint::new(3, 1), GridPoint::new(3, 3));
    let arms = [outer, inner].map(|p| (p.positions().contains(&north), p.positions().contains(&south)));
    assert!(arms.contains(&(true, false)));
    assert!(arms.contains(&(false, true)));
}

#[test]
fn test_off_surface_agent_gets_sentinel_with_its_position() {
    let (surface, network) = setup(CROSSING);
    let outcome = MultiAgentAssigner::new(&network, &surface, AssignmentSettings::default())
        .assign(&[at(1, 1), at(20, 20)], at(4, 1));

    assert_eq!(outcome.routes.len(), 2);
    assert!(outcome.routes[0].path.is_found());

    let stranded = &outcome.routes[1];
    assert_eq!(stranded.agent, 1);
    assert!(!stranded.path.is_found());
    assert_eq!(stranded.path.positions(), vec![GridPoint::new(20, 20)]);
    assert_eq!(stranded.path.nodes()[0].label, UNIT_LABEL);
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| matches!(d, DomainError::DegenerateInput { .. })));
}

#[test]
fn test_agent_in_disconnected_region_gets_sentinel() {
    let (surface, network) = setup(&["##.##"]);
    assert_eq!(network.len(), 2);

    let outcome =
        MultiAgentAssigner::new(&network, &surface, AssignmentSettings::default()).assign(&[at(3, 0)], at(0, 0));

    let path = &outcome.routes[0].path;
    assert!(!path.is_found());
    assert_eq!(path.positions(), vec![GridPoint::new(3, 0)]);
    assert_eq!(
        outcome.diagnostics,
        vec![DomainError::NoRouteFound { from: GridPoint::new(3, 0), to: GridPoint::new(0, 0) }]
    );
}

#[test]
fn test_no_agents_no_routes() {
    let (surface, network) = setup(CROSSING);
    let outcome = MultiAgentAssigner::new(&network, &surface, AssignmentSettings::default()).assign(&[], at(4, 1));
    assert!(outcome.routes.is_empty());
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_iteration_limit_keeps_direct_paths() {
    let (surface, network) = setup(CROSSING);
    let settings = AssignmentSettings { iteration_limit: 0, ..AssignmentSettings::default() };
    let outcome = MultiAgentAssigner::new(&network, &surface, settings).assign(&[at(1, 1), at(7, 1)], at(4, 1));

    assert_eq!(outcome.routes.len(), 2);
    assert!(outcome.routes.iter().all(|r| r.path.is_found()));
    assert!(matches!(
        outcome.diagnostics.as_slice(),
        [DomainError::StructuralLimitExceeded { .. }]
    ));
}

#[test]
fn test_agents_sharing_a_spot_each_get_a_route() {
    let (surface, network) = setup(RING);
    let outcome = MultiAgentAssigner::new(&network, &surface, AssignmentSettings::default())
        .assign(&[at(0, 2), at(0, 2), at(0, 2)], at(6, 2));

    assert_eq!(outcome.routes.len(), 3);
    assert!(outcome.routes.iter().all(|r| r.path.is_found()));
    assert_eq!(outcome.routes.iter().map(|r| r.agent).collect::<Vec<_>>(), vec![0, 1, 2]);
}

use nodal_nav::adapters::outbound::{init_combined_logger, FilesystemDataSource};
use nodal_nav::common::EventEnvelope;
use nodal_nav::domains::logger::parse_level;
use nodal_nav::domains::navigation::{
    Behaviour, GraphStore, GridPoint, MovementController, Path, SurfaceProvider, WalkableSurface, WorldPosition,
};
use nodal_nav::{Config, NavigationService};
use std::error::Error;
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Used when no surface file can be loaded.
const DEMO_MAP: &[&str] = &[
    "##########",
    "#...#....#",
    "#...#....#",
    "##########",
    "#....#...#",
    "#....#...#",
    "##########",
];

/// Stand-in movement controller: stays put and remembers the last path it was given.
struct DemoAgent {
    position: WorldPosition,
    path: Mutex<Option<Path>>,
}

impl DemoAgent {
    fn at(x: i32, y: i32) -> Arc<Self> {
        Arc::new(Self { position: WorldPosition::on_grid(GridPoint::new(x, y)), path: Mutex::new(None) })
    }
}

impl MovementController for DemoAgent {
    fn position(&self) -> WorldPosition {
        self.position
    }

    fn assign_path(&self, path: Path) {
        if let Ok(mut slot) = self.path.lock() {
            *slot = Some(path);
        }
    }

    fn has_active_path(&self) -> bool {
        self.path.lock().map(|p| p.is_some()).unwrap_or(false)
    }

    fn previous_destination(&self) -> Option<GridPoint> {
        None
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config_path = FsPath::new("config.toml");
    let config = Config::load_layered(config_path.exists().then_some(config_path))?;

    // fast_log takes the `log` backend first; the subscriber only serves `tracing`
    let logger = init_combined_logger(config.logging.file.as_deref(), parse_level(&config.logging.level));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing::subscriber::set_global_default(tracing_subscriber::fmt().with_env_filter(filter).finish())?;

    info!("Starting nodal-nav with {} log sinks", logger.sink_count());

    let data = Arc::new(FilesystemDataSource::new(config.data.dir.clone()));
    info!("Data directory: {}", data.base().display());
    let service = NavigationService::new(data.clone() as Arc<dyn SurfaceProvider>, logger.clone(), config.clone())
        .with_graph_store(data as Arc<dyn GraphStore>);

    let state = match service.initialise() {
        Ok(state) => state,
        Err(e) => {
            warn!("Falling back to the built-in demo map: {}", e);
            service.initialise_with(WalkableSurface::from_ascii(DEMO_MAP))?
        }
    };
    info!(
        "Network ready: {} nodes, {} edges, {} diagnostics",
        state.network.len(),
        state.network.edge_count(),
        state.diagnostics.len()
    );

    let target = WorldPosition::on_grid(GridPoint::new(9, 3));
    let single = service.find_path(&state, WorldPosition::on_grid(GridPoint::new(0, 0)), target);
    info!("Single query: {} (weight {})", single.describe(), single.total_weight());

    let (event_sender, mut event_receiver) = mpsc::channel(64);
    let mut coordinator = service
        .coordinator(&state, tokio::runtime::Handle::current())
        .with_events(event_sender);

    let agents = [DemoAgent::at(0, 0), DemoAgent::at(0, 6), DemoAgent::at(0, 3)];
    for agent in &agents {
        let name = coordinator.add_agent(agent.clone() as Arc<dyn MovementController>);
        info!("Registered {}", name);
    }

    coordinator.set_behaviour(Behaviour::Chase)?;
    coordinator.assign_chase_paths(target)?;

    loop {
        let report = coordinator.tick();
        if let Some(job) = report.completed_job {
            info!("Batch job {} done: {} paths assigned, {} unmatched", job, report.assigned.len(), report.unmatched.len());
            for diagnostic in &report.diagnostics {
                warn!("{}", diagnostic);
            }
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }

    while let Ok(event) = event_receiver.try_recv() {
        match EventEnvelope::new(&event, "coordinator") {
            Ok(envelope) => info!("{}", serde_json::to_string(&envelope)?),
            Err(e) => error!("Could not serialize event: {}", e),
        }
    }

    for agent in &agents {
        if let Ok(path) = agent.path.lock() {
            if let Some(path) = path.as_ref() {
                info!("{}", path.describe());
            }
        }
    }

    info!("Shutting down nodal-nav");
    Ok(())
}

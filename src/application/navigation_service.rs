// Navigation Service - wires the surface provider, network extraction and path coordination
use std::sync::Arc;
use tokio::runtime::Handle;
use crate::adapters::outbound::navigation_data::{decode_graph_file, encode_graph_file, graph_from_network, network_from_graph};
use crate::common::{ApplicationResult, DomainError};
use crate::config::Config;
use crate::domains::logger::DynLogger;
use crate::domains::navigation::{
    find_path_from_unit_to_destination, GraphStore, NetworkBuild, NetworkBuilder, NodalNetwork, Path, PathCoordinator,
    SurfaceProvider, WalkableSurface, WorldPosition,
};

/// Immutable state shared by queries and the coordinator once initialisation is done.
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub surface: Arc<WalkableSurface>,
    pub network: Arc<NodalNetwork>,
    pub diagnostics: Vec<DomainError>,
}

pub struct NavigationService {
    surfaces: Arc<dyn SurfaceProvider>,
    graphs: Option<Arc<dyn GraphStore>>,
    logger: DynLogger,
    config: Config,
}

impl NavigationService {
    pub fn new(surfaces: Arc<dyn SurfaceProvider>, logger: DynLogger, config: Config) -> Self {
        Self { surfaces, graphs: None, logger, config }
    }

    pub fn with_graph_store(mut self, graphs: Arc<dyn GraphStore>) -> Self {
        self.graphs = Some(graphs);
        self
    }

    pub fn load_surface(&self) -> ApplicationResult<WalkableSurface> {
        let surface = self.surfaces.load_surface(&self.config.data.surface, self.config.bounds())?;
        if surface.is_empty() {
            return Err(DomainError::degenerate(format!("surface {} has no triangles", self.config.data.surface)).into());
        }
        self.logger.info(&format!("Loaded surface {} with {} triangles", self.config.data.surface, surface.triangles().len()));
        Ok(surface)
    }

    pub fn build_network(&self, surface: &WalkableSurface) -> NetworkBuild {
        NetworkBuilder::new(surface, self.logger.clone())
            .with_limits(self.config.build_limits())
            .build()
    }

    /// Load the surface, then reuse the cached network when one is configured
    /// and readable, otherwise extract it and cache the result.
    pub fn initialise(&self) -> ApplicationResult<NavigationState> {
        let surface = self.load_surface()?;
        if let Some(network) = self.load_cached_network() {
            return Ok(NavigationState { surface: Arc::new(surface), network: Arc::new(network), diagnostics: Vec::new() });
        }

        let state = self.initialise_with(surface)?;
        self.store_network(&state.network);
        Ok(state)
    }

    /// Extract the network from a surface supplied by the caller. The configured
    /// graph cache belongs to the configured surface, so it is neither read nor written.
    pub fn initialise_with(&self, surface: WalkableSurface) -> ApplicationResult<NavigationState> {
        let build = self.build_network(&surface);
        if build.network.is_empty() {
            let reason = build.diagnostics.first().map(|d| d.to_string()).unwrap_or_else(|| "no nodes found".to_string());
            return Err(DomainError::degenerate(format!("network extraction failed: {}", reason)).into());
        }

        Ok(NavigationState {
            surface: Arc::new(surface),
            network: Arc::new(build.network),
            diagnostics: build.diagnostics,
        })
    }

    fn load_cached_network(&self) -> Option<NodalNetwork> {
        let (store, name) = (self.graphs.as_ref()?, self.config.data.graph.as_ref()?);
        let loaded = store
            .load_graph_bytes(name)
            .and_then(|bytes| decode_graph_file(&bytes))
            .and_then(|graph| network_from_graph(&graph));
        match loaded {
            Ok(network) if !network.is_empty() => {
                self.logger.info(&format!("Loaded cached network {} ({} nodes)", name, network.len()));
                Some(network)
            }
            Ok(_) => None,
            Err(e) => {
                self.logger.info(&format!("No usable cached network {}: {}", name, e));
                None
            }
        }
    }

    fn store_network(&self, network: &NodalNetwork) {
        let (Some(store), Some(name)) = (self.graphs.as_ref(), self.config.data.graph.as_ref()) else {
            return;
        };
        let saved = encode_graph_file(&graph_from_network(network)).and_then(|bytes| store.save_graph_bytes(name, &bytes));
        if let Err(e) = saved {
            self.logger.warn(&format!("Could not cache network {}: {}", name, e));
        }
    }

    pub fn coordinator(&self, state: &NavigationState, runtime: Handle) -> PathCoordinator {
        PathCoordinator::new(
            Arc::clone(&state.network),
            Arc::clone(&state.surface),
            runtime,
            self.config.assignment,
            self.logger.clone(),
        )
    }

    /// Single-agent query; runs synchronously on the caller's thread.
    pub fn find_path(&self, state: &NavigationState, unit: WorldPosition, destination: WorldPosition) -> Path {
        let path = find_path_from_unit_to_destination(&state.network, &state.surface, unit, destination);
        if !path.is_found() {
            self.logger.warn(&format!(
                "No route from {} to {}",
                unit.snap_to_grid(),
                destination.snap_to_grid()
            ));
        }
        path
    }
}

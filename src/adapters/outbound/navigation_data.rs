use crate::common::{DomainError, DomainResult};
use crate::domains::logger::DynLogger;
use crate::domains::navigation::builder::{BuildLimits, NetworkBuilder};
use crate::domains::navigation::geometry::{GridBounds, GridPoint, Triangle, Vec2, WalkableSurface};
use crate::domains::navigation::network::{Edge, NodalNetwork, Node, NodeId};
use crate::domains::navigation::ports::{GraphStore, SurfaceProvider};
use geojson::{GeoJson, Geometry, Value};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const GRAPH_MAGIC: &[u8; 4] = b"PGPH";
const GRAPH_FORMAT: &str = "petgraph-bincode";
const GRAPH_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub label: String,
    pub x: i32,
    pub y: i32,
}

/// `slot` keeps the per-node edge order, which petgraph does not preserve on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub slot: u8,
    pub weight: u32,
}

pub type NavGraph = DiGraph<NodeRecord, EdgeRecord>;

#[derive(Debug, Serialize, Deserialize)]
struct GraphHeader {
    format: String,
    version: u8,
}

fn infra(e: impl std::fmt::Display) -> DomainError {
    DomainError::InfrastructureError(e.to_string())
}

pub struct FilesystemDataSource {
    base: PathBuf,
}

impl FilesystemDataSource {
    pub fn new(base: Option<PathBuf>) -> Self {
        let base = base.unwrap_or_else(|| {
            if let Ok(v) = env::var("NODAL_NAV_DATA_DIR") {
                PathBuf::from(v)
            } else {
                let cwd_default = Path::new("resources/navigation");
                if cwd_default.exists() { cwd_default.to_path_buf() } else { PathBuf::from("/usr/share/nodal-nav/navigation") }
            }
        });
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn dir(&self, sub: &str) -> PathBuf {
        self.base.join(sub)
    }

    pub fn load_geojson(&self, name: &str) -> DomainResult<String> {
        fs::read_to_string(self.dir("geojson").join(name)).map_err(infra)
    }

    /// Where the parsed triangles of surface `name` are cached.
    pub fn triangle_cache_path(&self, name: &str) -> PathBuf {
        let stem = Path::new(name).file_stem().and_then(|s| s.to_str()).unwrap_or(name);
        self.dir("surfaces").join(format!("{}.tris", stem))
    }

    fn read_triangle_cache(&self, path: &Path) -> DomainResult<Vec<Triangle>> {
        let bytes = fs::read(path).map_err(infra)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn write_triangle_cache(&self, path: &Path, triangles: &[Triangle]) -> DomainResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(infra)?;
        }
        let bytes = bincode::serialize(triangles)?;
        fs::write(path, bytes).map_err(infra)
    }

    /// Parse a GeoJSON surface, extract the network and convert it to a petgraph graph.
    pub fn build_graph_struct(
        &self,
        geojson: &str,
        bounds: GridBounds,
        limits: BuildLimits,
        logger: DynLogger,
    ) -> DomainResult<NavGraph> {
        let surface = WalkableSurface::new(triangles_from_geojson(geojson)?, bounds);
        let build = NetworkBuilder::new(&surface, logger).with_limits(limits).build();
        if build.network.is_empty() {
            return Err(build
                .diagnostics
                .into_iter()
                .next()
                .unwrap_or_else(|| DomainError::degenerate("surface produced an empty network")));
        }
        Ok(graph_from_network(&build.network))
    }

    pub fn save_graph(&self, name: &str, graph: &NavGraph) -> DomainResult<()> {
        self.save_graph_bytes(name, &encode_graph_file(graph)?)
    }

    pub fn load_graph(&self, name: &str) -> DomainResult<NavGraph> {
        decode_graph_file(&self.load_graph_bytes(name)?)
    }
}

impl SurfaceProvider for FilesystemDataSource {
    /// Uses the triangle cache when present, otherwise parses `geojson/<name>` and writes the cache.
    fn load_surface(&self, name: &str, bounds: GridBounds) -> DomainResult<WalkableSurface> {
        let cache = self.triangle_cache_path(name);
        if cache.exists() {
            match self.read_triangle_cache(&cache) {
                Ok(triangles) => return Ok(WalkableSurface::new(triangles, bounds)),
                Err(e) => tracing::warn!(path = %cache.display(), error = %e, "ignoring unreadable triangle cache"),
            }
        }

        let triangles = triangles_from_geojson(&self.load_geojson(name)?)?;
        if let Err(e) = self.write_triangle_cache(&cache, &triangles) {
            tracing::warn!(path = %cache.display(), error = %e, "could not write triangle cache");
        }
        Ok(WalkableSurface::new(triangles, bounds))
    }
}

impl GraphStore for FilesystemDataSource {
    fn save_graph_bytes(&self, name: &str, bytes: &[u8]) -> DomainResult<()> {
        let dir = self.dir("graphs");
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(infra)?;
        }
        fs::write(dir.join(name), bytes).map_err(infra)
    }

    fn load_graph_bytes(&self, name: &str) -> DomainResult<Vec<u8>> {
        fs::read(self.dir("graphs").join(name)).map_err(infra)
    }

    fn delete_graph(&self, name: &str) -> DomainResult<()> {
        fs::remove_file(self.dir("graphs").join(name)).map_err(infra)
    }
}

/// Triangles from the exterior rings of every `Polygon` / `MultiPolygon` in the document.
/// Rings with more than three corners are fanned from their first corner, so they must be convex.
pub fn triangles_from_geojson(geojson: &str) -> DomainResult<Vec<Triangle>> {
    let parsed: GeoJson = geojson.parse().map_err(|e| DomainError::SerializationError(format!("{}", e)))?;
    let mut triangles = Vec::new();
    match parsed {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                if let Some(geometry) = feature.geometry {
                    collect_triangles(&geometry, &mut triangles);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                collect_triangles(&geometry, &mut triangles);
            }
        }
        GeoJson::Geometry(geometry) => collect_triangles(&geometry, &mut triangles),
    }
    Ok(triangles)
}

fn collect_triangles(geometry: &Geometry, out: &mut Vec<Triangle>) {
    match &geometry.value {
        Value::Polygon(rings) => fan_ring(rings.first(), out),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                fan_ring(rings.first(), out);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_triangles(g, out);
            }
        }
        _ => {}
    }
}

fn fan_ring(ring: Option<&Vec<Vec<f64>>>, out: &mut Vec<Triangle>) {
    let Some(ring) = ring else { return };
    let mut corners: Vec<Vec2> = ring
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Vec2::new(p[0], p[1]))
        .collect();
    // closed rings repeat the first corner
    if corners.len() > 1 && corners[0].roughly_equals(corners[corners.len() - 1]) {
        corners.pop();
    }
    for i in 1..corners.len().saturating_sub(1) {
        out.push(Triangle::new(corners[0], corners[i], corners[i + 1]));
    }
}

pub fn graph_from_network(network: &NodalNetwork) -> NavGraph {
    let mut graph = NavGraph::with_capacity(network.len(), network.edge_count());
    for node in network.nodes() {
        graph.add_node(NodeRecord {
            label: node.label.clone(),
            x: node.position.x,
            y: node.position.y,
        });
    }
    for node in network.nodes() {
        for (slot, edge) in node.edges.iter().enumerate() {
            graph.add_edge(
                NodeIndex::new(node.id.index()),
                NodeIndex::new(edge.target.index()),
                EdgeRecord {
                    slot: slot as u8,
                    weight: edge.weight,
                },
            );
        }
    }
    graph
}

pub fn network_from_graph(graph: &NavGraph) -> DomainResult<NodalNetwork> {
    let mut nodes = Vec::with_capacity(graph.node_count());
    for index in graph.node_indices() {
        let record = &graph[index];
        let mut node = Node::new(NodeId(index.index()), record.label.clone(), GridPoint::new(record.x, record.y));
        let mut edges: Vec<(u8, Edge)> = graph
            .edges(index)
            .map(|e| (e.weight().slot, Edge::new(NodeId(e.target().index()), e.weight().weight)))
            .collect();
        edges.sort_by_key(|(slot, _)| *slot);
        node.edges = edges.into_iter().map(|(_, edge)| edge).collect();
        nodes.push(node);
    }
    NodalNetwork::from_nodes(nodes)
}

/// `PGPH` + version byte + little-endian header length + JSON header + bincode payload.
pub fn encode_graph_file(graph: &NavGraph) -> DomainResult<Vec<u8>> {
    let header = serde_json::to_vec(&GraphHeader {
        format: GRAPH_FORMAT.to_string(),
        version: GRAPH_VERSION,
    })?;
    let payload = bincode::serialize(graph)?;

    let mut bytes = Vec::with_capacity(GRAPH_MAGIC.len() + 5 + header.len() + payload.len());
    bytes.extend_from_slice(GRAPH_MAGIC);
    bytes.push(GRAPH_VERSION);
    bytes.extend_from_slice(&(header.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Accepts version 1 files and headerless version 0 files.
pub fn decode_graph_file(bytes: &[u8]) -> DomainResult<NavGraph> {
    if bytes.len() < 9 || &bytes[..4] != GRAPH_MAGIC {
        return Err(DomainError::SerializationError("not a PGPH graph file".to_string()));
    }
    let version = bytes[4];
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&bytes[5..9]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let body = &bytes[9..];
    if body.len() < header_len {
        return Err(DomainError::SerializationError("graph header truncated".to_string()));
    }

    match version {
        0 => {}
        GRAPH_VERSION => {
            let header: GraphHeader = serde_json::from_slice(&body[..header_len])?;
            if header.format != GRAPH_FORMAT {
                return Err(DomainError::SerializationError(format!(
                    "unsupported graph format {}",
                    header.format
                )));
            }
        }
        other => {
            return Err(DomainError::SerializationError(format!(
                "unsupported graph file version {}",
                other
            )))
        }
    }
    Ok(bincode::deserialize(&body[header_len..])?)
}

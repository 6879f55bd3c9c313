use super::geometry::{GridBounds, GridPoint, WalkableSurface, WorldPosition};
use super::path::Path;
use crate::common::DomainResult;

/// Port for loading the triangulated walkable surface once at startup.
/// Implementations may cache what they load; the core treats the result as read-only.
pub trait SurfaceProvider: Send + Sync {
    fn load_surface(&self, name: &str, bounds: GridBounds) -> DomainResult<WalkableSurface>;
}

/// Drives one agent along the waypoints it is given. Steering, timing and
/// arrival detection all live behind this port.
pub trait MovementController: Send + Sync {
    fn position(&self) -> WorldPosition;
    /// The first waypoint is where the agent stands when the path was computed.
    fn assign_path(&self, path: Path);
    fn has_active_path(&self) -> bool;
    /// Grid point of the waypoint the agent last reached, if any.
    fn previous_destination(&self) -> Option<GridPoint>;
}

/// Port for storing and retrieving graphs in various backends (filesystem, memory, ...)
pub trait GraphStore: Send + Sync {
    /// Save raw graph bytes under the given name
    fn save_graph_bytes(&self, name: &str, bytes: &[u8]) -> DomainResult<()>;
    /// Load raw graph bytes previously saved
    fn load_graph_bytes(&self, name: &str) -> DomainResult<Vec<u8>>;
    /// Delete a stored graph
    fn delete_graph(&self, name: &str) -> DomainResult<()>;
}

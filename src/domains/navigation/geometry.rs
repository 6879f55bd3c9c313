use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive slack, in surface units, for containment and position comparisons.
pub const POINT_TOLERANCE: f64 = 0.01;

/// A point on the unit grid laid over the walkable surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }

    /// Straight-line distance; never larger than the number of grid steps between the two points.
    pub fn distance_to(self, other: GridPoint) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// The four axis-aligned unit steps, always in the order left, up, right, down.
    pub fn neighbours(self) -> [GridPoint; 4] {
        [
            GridPoint::new(self.x - 1, self.y),
            GridPoint::new(self.x, self.y + 1),
            GridPoint::new(self.x + 1, self.y),
            GridPoint::new(self.x, self.y - 1),
        ]
    }

    pub fn is_next_to(self, other: GridPoint) -> bool {
        self.neighbours().contains(&other)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Continuous 2D surface coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn roughly_equals(self, other: Vec2) -> bool {
        (self.x - other.x).abs() < POINT_TOLERANCE && (self.y - other.y).abs() < POINT_TOLERANCE
    }
}

/// 3D world position of an agent or target. The ground plane is x/z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPosition {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// World position standing on a grid point at ground height.
    pub fn on_grid(point: GridPoint) -> Self {
        Self::new(point.x as f64, 0.0, point.y as f64)
    }

    /// Assumes a 1x1 grid.
    pub fn snap_to_grid(self) -> GridPoint {
        GridPoint::new(self.x.round() as i32, self.z.round() as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Vec2; 3],
}

impl Triangle {
    pub fn new(a: Vec2, b: Vec2, c: Vec2) -> Self {
        Self { vertices: [a, b, c] }
    }

    pub fn center(&self) -> Vec2 {
        let [a, b, c] = self.vertices;
        Vec2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }

    pub fn signed_area(&self) -> f64 {
        let [p0, p1, p2] = self.vertices;
        0.5 * (-p1.y * p2.x + p0.y * (-p1.x + p2.x) + p0.x * (p1.y - p2.y) + p1.x * p2.y)
    }

    /// Barycentric containment, accepting points up to `POINT_TOLERANCE` outside an edge.
    pub fn contains(&self, point: Vec2) -> bool {
        let area = self.signed_area();
        if area.abs() < f64::EPSILON {
            return false;
        }

        let [p0, p1, p2] = self.vertices;
        let s = 1.0 / (2.0 * area) * (p0.y * p2.x - p0.x * p2.y + (p2.y - p0.y) * point.x + (p0.x - p2.x) * point.y);
        let t = 1.0 / (2.0 * area) * (p0.x * p1.y - p0.y * p1.x + (p0.y - p1.y) * point.x + (p1.x - p0.x) * point.y);

        s >= -POINT_TOLERANCE && t >= -POINT_TOLERANCE && 1.0 - s - t >= -POINT_TOLERANCE
    }
}

/// Grid window scanned for walkable points: x in `0..width`, y in `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Scan order used everywhere a "first" point matters: column by column.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| GridPoint::new(x, y)))
    }
}

impl Default for GridBounds {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

/// Read-only snapshot of the triangulated walkable region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkableSurface {
    triangles: Vec<Triangle>,
    bounds: GridBounds,
}

impl WalkableSurface {
    pub fn new(triangles: Vec<Triangle>, bounds: GridBounds) -> Self {
        Self { triangles, bounds }
    }

    /// Build a surface from an ASCII map: `#` cells are walkable, anything else is not.
    /// Row `r`, column `c` is grid point `(c, r)`. Each walkable cell gets a small
    /// triangle that contains its grid point and none of its neighbours.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let mut triangles = Vec::new();
        let mut width = 0;
        for (y, row) in rows.iter().enumerate() {
            width = width.max(row.chars().count());
            for (x, cell) in row.chars().enumerate() {
                if cell != '#' {
                    continue;
                }
                let (cx, cy) = (x as f64, y as f64);
                triangles.push(Triangle::new(
                    Vec2::new(cx - 0.4, cy - 0.4),
                    Vec2::new(cx + 0.4, cy - 0.4),
                    Vec2::new(cx, cy + 0.4),
                ));
            }
        }
        Self::new(triangles, GridBounds::new(width as i32, rows.len() as i32))
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Upper bound for every exploration loop over this surface.
    pub fn iteration_cap(&self) -> usize {
        self.bounds.cell_count().max(1)
    }

    /// Linear scan; surfaces are small enough that no spatial index pays off.
    pub fn contains(&self, point: GridPoint) -> bool {
        let p = point.to_vec2();
        self.triangles.iter().any(|t| t.contains(p))
    }

    /// Walkable members of `point.neighbours()`, order preserved.
    pub fn neighbours_on_surface(&self, point: GridPoint) -> Vec<GridPoint> {
        point.neighbours().into_iter().filter(|n| self.contains(*n)).collect()
    }

    /// A junction is any walkable point that does not have exactly two walkable neighbours.
    pub fn is_junction(&self, point: GridPoint) -> bool {
        self.neighbours_on_surface(point).len() != 2
    }

    pub fn walkable_points(&self) -> Vec<GridPoint> {
        self.bounds.points().filter(|p| self.contains(*p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0))
    }

    #[test]
    fn contains_interior_and_tolerates_edge_snapping() {
        let t = unit_triangle();
        assert!(t.contains(Vec2::new(1.0, 1.0)));
        assert!(t.contains(Vec2::new(2.0, 2.0)));
        assert!(t.contains(Vec2::new(-0.005, 1.0)));
        assert!(!t.contains(Vec2::new(-0.5, 1.0)));
        assert!(!t.contains(Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn winding_order_does_not_matter() {
        let t = Triangle::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 4.0), Vec2::new(4.0, 0.0));
        assert!(t.signed_area() < 0.0);
        assert!(t.contains(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn degenerate_triangle_contains_nothing() {
        let t = Triangle::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0));
        assert!(!t.contains(Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn neighbours_keep_left_up_right_down_order() {
        let surface = WalkableSurface::from_ascii(&["###", "###", "###"]);
        let n = surface.neighbours_on_surface(GridPoint::new(1, 1));
        assert_eq!(
            n,
            vec![GridPoint::new(0, 1), GridPoint::new(1, 2), GridPoint::new(2, 1), GridPoint::new(1, 0)]
        );
        // corner keeps the relative order of what survives
        let corner = surface.neighbours_on_surface(GridPoint::new(0, 0));
        assert_eq!(corner, vec![GridPoint::new(0, 1), GridPoint::new(1, 0)]);
    }

    #[test]
    fn ascii_cells_do_not_leak_into_neighbours() {
        let surface = WalkableSurface::from_ascii(&["#.#"]);
        assert!(surface.contains(GridPoint::new(0, 0)));
        assert!(!surface.contains(GridPoint::new(1, 0)));
        assert!(surface.contains(GridPoint::new(2, 0)));
        assert_eq!(surface.walkable_points().len(), 2);
    }

    #[test]
    fn snap_uses_ground_plane() {
        let p = WorldPosition::new(2.6, 7.0, -0.4).snap_to_grid();
        assert_eq!(p, GridPoint::new(3, 0));
    }
}

// This is the models module containing shared data structures
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// A planar point or a (longitude, latitude, height) triple.
///
/// Serialized as `[x, y]` or `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Height of the coordinate, 0 when it has none.
    pub fn z_or_zero(&self) -> f64 {
        self.z.unwrap_or(0.0)
    }

    /// Exact planar equality, ignoring z.
    pub fn same_xy(&self, other: &Coordinate) -> bool {
        self.x == other.x && self.y == other.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f64::is_finite)
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = GeometryError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y] => Ok(Coordinate::new(*x, *y)),
            [x, y, z] => Ok(Coordinate::with_z(*x, *y, *z)),
            other => Err(GeometryError::malformed_input(format!(
                "coordinate must have 2 or 3 components, got {}",
                other.len()
            ))),
        }
    }
}

impl From<Coordinate> for Vec<f64> {
    fn from(coord: Coordinate) -> Self {
        match coord.z {
            Some(z) => vec![coord.x, coord.y, z],
            None => vec![coord.x, coord.y],
        }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(p: [f64; 2]) -> Self {
        Coordinate::new(p[0], p[1])
    }
}

impl From<[f64; 3]> for Coordinate {
    fn from(p: [f64; 3]) -> Self {
        Coordinate::with_z(p[0], p[1], p[2])
    }
}

/// Implicitly closed sequence of coordinates.
pub type Ring = Vec<Coordinate>;

/// Caller supplied ring set `[outer, holes...]` with no validity guarantees.
pub type RawPolygon = Vec<Ring>;

/// Contour plus holes with no self-intersections and correctly nested holes.
///
/// Rings are open (no closing duplicate). The contour is counter-clockwise and
/// every hole clockwise once the polygon has been through the decomposer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimplePolygon {
    pub contour: Ring,
    pub holes: Vec<Ring>,
}

impl SimplePolygon {
    pub fn new(contour: Ring, holes: Vec<Ring>) -> Self {
        Self { contour, holes }
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.contour).chain(self.holes.iter())
    }
}

/// Output of the constrained triangulator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangulationResult {
    /// Contour points, then hole points, then interior sample points.
    pub points: Vec<Coordinate>,
    /// Clockwise (y-up) triangles in flood-fill order.
    pub triangles: Vec<[usize; 3]>,
    /// Required edges, directed so the polygon interior lies to the right.
    pub boundary_edges: Vec<[usize; 2]>,
}

impl TriangulationResult {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Planar area covered by the triangles.
    pub fn area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let (pa, pb, pc) = (self.points[a], self.points[b], self.points[c]);
                ((pb.x - pa.x) * (pc.y - pa.y) - (pc.x - pa.x) * (pb.y - pa.y)).abs() * 0.5
            })
            .sum()
    }
}

/// A single line loop handed to the line builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineLoop {
    pub coordinates: Ring,
    #[serde(default)]
    pub closed: bool,
}

impl LineLoop {
    pub fn open(coordinates: Ring) -> Self {
        Self { coordinates, closed: false }
    }

    pub fn closed(coordinates: Ring) -> Self {
        Self { coordinates, closed: true }
    }

    pub fn segment_count(&self) -> usize {
        let n = self.coordinates.len();
        match (n, self.closed) {
            (0 | 1, _) => 0,
            (_, true) => n,
            (_, false) => n - 1,
        }
    }
}

/// Non-indexed triangle buffer, re-centered about its bounding-box center.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct MeshBuffer {
    pub positions: Vec<f32>,
    pub normals: Option<Vec<f32>>,
    pub indices: Option<Vec<u32>>,
    /// Offset subtracted from every position.
    pub center: [f64; 3],
}

impl MeshBuffer {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Disjoint two-point segments, re-centered about their bounding-box center.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct LineBuffer {
    pub positions: Vec<f32>,
    pub center: [f64; 3],
}

impl LineBuffer {
    pub fn segment_count(&self) -> usize {
        self.positions.len() / 6
    }
}

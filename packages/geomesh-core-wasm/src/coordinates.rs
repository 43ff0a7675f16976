// Pure helpers operating on flat coordinate rings
use nalgebra::Vector3;
use std::f64::consts::PI;

use crate::models::{Coordinate, Ring};

// Struct to represent an axis aligned box over a set of rings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Bounds {
    pub fn empty() -> Self {
        Bounds {
            min: Vector3::repeat(f64::INFINITY),
            max: Vector3::repeat(f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand(&mut self, x: f64, y: f64, z: f64) {
        self.min.x = self.min.x.min(x);
        self.min.y = self.min.y.min(y);
        self.min.z = self.min.z.min(z);
        self.max.x = self.max.x.max(x);
        self.max.y = self.max.y.max(y);
        self.max.z = self.max.z.max(z);
    }

    /// Center of the box, the origin for an empty box.
    pub fn center(&self) -> Vector3<f64> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f64> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }
}

/// Removes every vertex that is exactly equal (x, y) to its cyclic successor.
///
/// The closing duplicate of a closed ring is removed as well, so the result is
/// always an open ring.
pub fn dedupe(ring: &[Coordinate]) -> Ring {
    let mut result: Ring = Vec::with_capacity(ring.len());
    for coord in ring {
        if result.last().map_or(true, |last| !last.same_xy(coord)) {
            result.push(*coord);
        }
    }

    while result.len() > 1 && result[0].same_xy(&result[result.len() - 1]) {
        result.pop();
    }

    result
}

/// Bounding box over all coordinates of all rings. Missing z counts as 0.
pub fn bounds<'a>(rings: impl IntoIterator<Item = &'a Ring>) -> Bounds {
    let mut result = Bounds::empty();
    for ring in rings {
        for coord in ring {
            result.expand(coord.x, coord.y, coord.z_or_zero());
        }
    }
    result
}

/// Inserts evenly spaced points so no edge (wraparound included) is longer than
/// `max_segment_length`. Original vertices are kept in order.
pub fn resample(ring: &[Coordinate], max_segment_length: f64) -> Ring {
    if ring.len() < 2 || !(max_segment_length.is_finite() && max_segment_length > 0.0) {
        return ring.to_vec();
    }

    let mut result = Vec::with_capacity(ring.len());
    for i in 0..ring.len() {
        let c = ring[i];
        let nc = ring[(i + 1) % ring.len()];
        result.push(c);

        let dx = nc.x - c.x;
        let dy = nc.y - c.y;
        let dist = (dx * dx + dy * dy).sqrt();
        let steps = (dist / max_segment_length).ceil() as usize;

        for j in 1..steps {
            let t = j as f64 / steps as f64;
            let z = match (c.z, nc.z) {
                (Some(z0), Some(z1)) => Some(z0 + (z1 - z0) * t),
                (z0, z1) => z0.or(z1),
            };
            result.push(Coordinate {
                x: c.x + dx * t,
                y: c.y + dy * t,
                z,
            });
        }
    }

    result
}

/// Twice the signed area of the ring, positive when counter-clockwise (y-up).
pub fn signed_area2(ring: &[Coordinate]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        area += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    area
}

// Check if points are ordered clockwise
pub fn is_clockwise(ring: &[Coordinate]) -> bool {
    // Implementation of the "shoelace formula" (also called the surveyor's formula)
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        sum += (ring[j].x - ring[i].x) * (ring[j].y + ring[i].y);
    }
    sum > 0.0
}

/// Angle-sum winding test: the angles subtended by consecutive ring vertices
/// add up to ±2π for an interior point and to 0 for an exterior one.
pub fn angle_sum_point_in_polygon(ring: &[Coordinate], point: &Coordinate) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut total = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];

        let ax = a.x - point.x;
        let ay = a.y - point.y;
        let bx = b.x - point.x;
        let by = b.y - point.y;

        let cross = ax * by - ay * bx;
        let dot = ax * bx + ay * by;
        total += cross.atan2(dot);
    }

    total.abs() > PI
}

/// Inside the contour and inside none of the holes.
pub fn point_in_polygon(contour: &[Coordinate], holes: &[Ring], point: &Coordinate) -> bool {
    angle_sum_point_in_polygon(contour, point)
        && !holes.iter().any(|hole| angle_sum_point_in_polygon(hole, point))
}

// Helper function to check if a point lies exactly on a line segment
pub fn is_point_on_segment(a: &Coordinate, b: &Coordinate, p: &Coordinate) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    cross == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Exact edge-membership test against every edge of the ring, wraparound included.
pub fn point_on_ring(ring: &[Coordinate], point: &Coordinate) -> bool {
    (0..ring.len()).any(|i| is_point_on_segment(&ring[i], &ring[(i + 1) % ring.len()], point))
}

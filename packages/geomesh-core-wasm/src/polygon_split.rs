// Cleans up raw polygons and splits self-intersecting ring sets into simple polygons
use geo::BooleanOps;
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use crate::coordinates::{bounds, dedupe, is_clockwise};
use crate::error::{GeometryError, GeometryResult};
use crate::models::{Coordinate, Ring, SimplePolygon};

// Output vertices closer than this (relative to the polygon extent) to an input
// vertex are snapped back onto it
const SNAP_TOLERANCE: f64 = 1e-7;

/// Dedupes every ring and drops rings with fewer than three distinct points.
pub fn dedupe_polygon_points(polygon: &[Ring]) -> Vec<Ring> {
    polygon
        .iter()
        .map(|ring| dedupe(ring))
        .filter(|ring| ring.len() >= 3)
        .collect()
}

/// Orients the contour counter-clockwise and every hole clockwise.
pub fn correct_polygon_winding(polygon: &mut SimplePolygon) {
    if is_clockwise(&polygon.contour) {
        polygon.contour.reverse();
    }
    for hole in &mut polygon.holes {
        if !is_clockwise(hole) {
            hole.reverse();
        }
    }
}

/// Decomposes a raw ring set into zero or more simple polygons.
///
/// The caller's rings are never modified. Self-intersections and disjoint or
/// nested loops are resolved by the polygon overlay solver; a panic inside the
/// solver is reported as a decomposition error for this polygon only.
pub fn split_polygon(polygon: &[Ring]) -> GeometryResult<Vec<SimplePolygon>> {
    let rings = dedupe_polygon_points(polygon);
    if rings.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(bad) = rings.iter().flatten().find(|c| !c.is_finite()) {
        return Err(GeometryError::malformed_input(format!(
            "non-finite coordinate ({}, {})",
            bad.x, bad.y
        )));
    }

    let extent = bounds(&rings);
    let center = extent.center();
    let size = extent.size();
    let has_z = rings.iter().flatten().any(|c| c.z.is_some());
    // every vertex the solver invents gets this, one output component or many
    let mid_z = has_z.then(|| {
        let (lo, hi) = rings
            .iter()
            .flatten()
            .filter_map(|c| c.z)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), z| (lo.min(z), hi.max(z)));
        (lo + hi) * 0.5
    });

    // translated toward the origin to keep the overlay solver precise
    let to_line_string = |ring: &Ring| -> LineString<f64> {
        ring.iter()
            .map(|c| Coord { x: c.x - center.x, y: c.y - center.y })
            .collect::<Vec<_>>()
            .into()
    };
    let subject = MultiPolygon::new(vec![Polygon::new(
        to_line_string(&rings[0]),
        rings[1..].iter().map(to_line_string).collect(),
    )]);

    let resolved = panic::catch_unwind(AssertUnwindSafe(|| {
        subject.union(&MultiPolygon::new(Vec::new()))
    }))
    .map_err(|cause| {
        let message = cause
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| cause.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "overlay solver panicked".to_string());
        GeometryError::decomposition(message)
    })?;

    let snapper = VertexSnapper::new(&rings, size.x.max(size.y) * SNAP_TOLERANCE);
    let restore = |line: &LineString<f64>| -> Ring {
        let ring: Ring = line
            .coords()
            .map(|c| {
                let x = c.x + center.x;
                let y = c.y + center.y;
                snapper.find(x, y).unwrap_or(Coordinate { x, y, z: mid_z })
            })
            .collect();
        dedupe(&ring)
    };

    let mut result = Vec::with_capacity(resolved.0.len());
    for part in &resolved {
        let contour = restore(part.exterior());
        if contour.len() < 3 {
            continue;
        }
        let holes = part
            .interiors()
            .iter()
            .map(|hole| restore(hole))
            .filter(|hole| hole.len() >= 3)
            .collect();

        let mut simple = SimplePolygon::new(contour, holes);
        correct_polygon_winding(&mut simple);
        result.push(simple);
    }

    Ok(result)
}

// Grid lookup from overlay output positions back to the caller's coordinates
struct VertexSnapper<'a> {
    cell: f64,
    tolerance: f64,
    grid: HashMap<(i64, i64), Vec<&'a Coordinate>>,
}

impl<'a> VertexSnapper<'a> {
    fn new(rings: &'a [Ring], tolerance: f64) -> Self {
        let cell = if tolerance > 0.0 { tolerance } else { f64::MIN_POSITIVE };
        let mut grid: HashMap<(i64, i64), Vec<&'a Coordinate>> = HashMap::new();
        for coord in rings.iter().flatten() {
            grid.entry(Self::key(cell, coord.x, coord.y)).or_default().push(coord);
        }
        Self { cell, tolerance, grid }
    }

    fn key(cell: f64, x: f64, y: f64) -> (i64, i64) {
        ((x / cell).floor() as i64, (y / cell).floor() as i64)
    }

    fn find(&self, x: f64, y: f64) -> Option<Coordinate> {
        let (kx, ky) = Self::key(self.cell, x, y);
        let mut best: Option<(f64, &Coordinate)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = self.grid.get(&(kx + dx, ky + dy)) else {
                    continue;
                };
                for coord in bucket {
                    let dist = (coord.x - x).abs().max((coord.y - y).abs());
                    if dist <= self.tolerance && best.map_or(true, |(d, _)| dist < d) {
                        best = Some((dist, *coord));
                    }
                }
            }
        }
        best.map(|(_, coord)| *coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::signed_area2;
    use approx::assert_relative_eq;

    fn ring(points: &[[f64; 2]]) -> Ring {
        points.iter().map(|&p| p.into()).collect()
    }

    fn area(polygon: &SimplePolygon) -> f64 {
        polygon.rings().map(|r| signed_area2(r) * 0.5).sum()
    }

    #[test]
    fn square_stays_a_single_polygon() {
        let square = ring(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]);
        let parts = split_polygon(&[square]).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].contour.len(), 4);
        assert!(parts[0].holes.is_empty());
        assert!(!is_clockwise(&parts[0].contour));
        assert_relative_eq!(area(&parts[0]), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn figure_eight_splits_into_two_triangles() {
        let bowtie = ring(&[[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0]]);
        let parts = split_polygon(&[bowtie]).unwrap();
        assert_eq!(parts.len(), 2);

        for part in &parts {
            assert_eq!(part.contour.len(), 3);
            assert!(part.holes.is_empty());
            assert_relative_eq!(area(part), 0.25, epsilon = 1e-9);
        }

        // disjoint: neither contains a vertex strictly inside the other
        let a = &parts[0];
        let b = &parts[1];
        let centroid = |p: &SimplePolygon| {
            let n = p.contour.len() as f64;
            Coordinate::new(
                p.contour.iter().map(|c| c.x).sum::<f64>() / n,
                p.contour.iter().map(|c| c.y).sum::<f64>() / n,
            )
        };
        assert!(!crate::coordinates::angle_sum_point_in_polygon(&a.contour, &centroid(b)));
        assert!(!crate::coordinates::angle_sum_point_in_polygon(&b.contour, &centroid(a)));
    }

    #[test]
    fn holes_get_opposite_winding() {
        let outer = ring(&[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]);
        let hole = ring(&[[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]);
        let parts = split_polygon(&[outer, hole]).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].holes.len(), 1);
        for hole in &parts[0].holes {
            assert_ne!(is_clockwise(&parts[0].contour), is_clockwise(hole));
        }
        assert_relative_eq!(area(&parts[0]), 96.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_rings_are_dropped() {
        let sliver = ring(&[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!(split_polygon(&[sliver]).unwrap().is_empty());
        assert!(split_polygon(&[]).unwrap().is_empty());
    }

    #[test]
    fn input_is_not_mutated() {
        let square = ring(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]);
        let input = vec![square];
        let copy = input.clone();
        let _ = split_polygon(&input).unwrap();
        assert_eq!(input, copy);
    }

    #[test]
    fn original_heights_survive_and_new_points_get_mid_range() {
        let bowtie = vec![
            Coordinate::with_z(0.0, 0.0, 10.0),
            Coordinate::with_z(1.0, 1.0, 20.0),
            Coordinate::with_z(1.0, 0.0, 30.0),
            Coordinate::with_z(0.0, 1.0, 40.0),
        ];
        let parts = split_polygon(&[bowtie]).unwrap();
        assert_eq!(parts.len(), 2);

        for coord in parts.iter().flat_map(|p| p.contour.iter()) {
            if (coord.x - 0.5).abs() < 1e-6 && (coord.y - 0.5).abs() < 1e-6 {
                assert_relative_eq!(coord.z.unwrap(), 25.0);
            } else if coord.x == 0.0 && coord.y == 0.0 {
                assert_eq!(coord.z, Some(10.0));
            } else {
                assert!(coord.z.is_some());
            }
        }
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let bad = ring(&[[0.0, 0.0], [f64::NAN, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        let err = split_polygon(&[bad]).unwrap_err();
        assert!(matches!(err, GeometryError::MalformedInput(_)));
    }

    #[test]
    fn winding_correction_flips_both_ring_kinds() {
        let mut polygon = SimplePolygon::new(
            ring(&[[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0]]),
            vec![ring(&[[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0]])],
        );
        correct_polygon_winding(&mut polygon);
        assert!(!is_clockwise(&polygon.contour));
        assert!(is_clockwise(&polygon.holes[0]));
    }
}

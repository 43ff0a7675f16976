// Polygon mesh pipeline: decompose, densify, triangulate, extrude
use rayon::prelude::*;

use crate::config::{ErrorPolicy, MeshOptions};
use crate::console_log;
use crate::coordinates::{bounds, point_in_polygon, point_on_ring, resample};
use crate::error::GeometryResult;
use crate::extrude::extrude_triangulations;
use crate::models::{Coordinate, MeshBuffer, RawPolygon, SimplePolygon, TriangulationResult};
use crate::polygon_split::split_polygon;
use crate::triangulate::triangulate;

/// Grid points at multiples of `resolution` strictly inside the polygon.
///
/// Points on any ring edge are left out, the resampled boundary already covers
/// them. When the rings carry z the samples get the mid-range height.
pub fn interior_sample_points(polygon: &SimplePolygon, resolution: f64) -> Vec<Coordinate> {
    let extent = bounds(polygon.rings());
    if extent.is_empty() || !(resolution.is_finite() && resolution > 0.0) {
        return Vec::new();
    }

    let has_z = polygon.rings().flatten().any(|c| c.z.is_some());
    let z = has_z.then(|| (extent.min.z + extent.max.z) * 0.5);

    let start_x = (extent.min.x / resolution).ceil() as i64;
    let start_y = (extent.min.y / resolution).ceil() as i64;

    let mut points = Vec::new();
    let mut ix = start_x;
    loop {
        let x = ix as f64 * resolution;
        if x >= extent.max.x {
            break;
        }
        let mut iy = start_y;
        loop {
            let y = iy as f64 * resolution;
            if y >= extent.max.y {
                break;
            }
            let candidate = Coordinate { x, y, z };
            if point_in_polygon(&polygon.contour, &polygon.holes, &candidate)
                && !polygon.rings().any(|ring| point_on_ring(ring, &candidate))
            {
                points.push(candidate);
            }
            iy += 1;
        }
        ix += 1;
    }
    points
}

// Everything one raw polygon contributes before assembly
fn triangulate_polygon(raw: &RawPolygon, resolution: Option<f64>) -> GeometryResult<Vec<TriangulationResult>> {
    let mut parts = Vec::new();
    for simple in split_polygon(raw)? {
        let result = match resolution {
            Some(res) => {
                let interior = interior_sample_points(&simple, res);
                let contour = resample(&simple.contour, res);
                let holes: Vec<_> = simple.holes.iter().map(|hole| resample(hole, res)).collect();
                triangulate(&contour, &holes, &interior)?
            }
            None => triangulate(&simple.contour, &simple.holes, &[])?,
        };
        if !result.is_empty() {
            parts.push(result);
        }
    }
    Ok(parts)
}

/// Builds one mesh buffer out of many raw polygons.
///
/// Polygons are processed in parallel and assembled in input order. A polygon
/// that fails is logged and dropped under [`ErrorPolicy::Skip`]; under
/// [`ErrorPolicy::Abort`] its error is returned instead of a mesh.
pub fn build_polygon_mesh(polygons: &[RawPolygon], options: &MeshOptions) -> GeometryResult<MeshBuffer> {
    options.validate()?;

    let results: Vec<GeometryResult<Vec<TriangulationResult>>> = polygons
        .par_iter()
        .map(|raw| triangulate_polygon(raw, options.resolution))
        .collect();

    let mut parts = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(mut triangulated) => parts.append(&mut triangulated),
            Err(e) => match options.error_policy {
                ErrorPolicy::Skip => console_log!("Skipping polygon {}: {}", index, e),
                ErrorPolicy::Abort => return Err(e),
            },
        }
    }

    let mesh = extrude_triangulations(&parts, options);
    console_log!(
        "Built polygon mesh: {} polygons, {} parts, {} triangles",
        polygons.len(),
        parts.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipsoid::ReferenceEllipsoid;
    use crate::error::GeometryError;
    use crate::flat_buffer::get_center;
    use approx::assert_relative_eq;

    fn ring(points: &[[f64; 2]]) -> Vec<Coordinate> {
        points.iter().map(|&p| p.into()).collect()
    }

    fn square(size: f64) -> RawPolygon {
        vec![ring(&[[0.0, 0.0], [size, 0.0], [size, size], [0.0, size], [0.0, 0.0]])]
    }

    fn square_with_hole() -> RawPolygon {
        vec![
            ring(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]),
            ring(&[[3.0, 3.0], [3.0, 6.0], [6.0, 6.0], [6.0, 3.0], [3.0, 3.0]]),
        ]
    }

    #[test]
    fn cap_closes_simple_polygon() {
        let pentagon = vec![ring(&[[0.0, 0.0], [4.0, 0.0], [5.0, 3.0], [2.0, 5.0], [-1.0, 3.0]])];
        let mesh = build_polygon_mesh(&[pentagon], &MeshOptions::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 5 - 2);
    }

    #[test]
    fn cap_closes_polygon_with_hole() {
        let mesh = build_polygon_mesh(&[square_with_hole()], &MeshOptions::default()).unwrap();
        // N + H + 2 * holes - 2
        assert_eq!(mesh.triangle_count(), 4 + 4 + 2 - 2);
    }

    #[test]
    fn extrusion_is_watertight() {
        let options = MeshOptions { thickness: 3.0, ..Default::default() };
        let mesh = build_polygon_mesh(&[square_with_hole()], &options).unwrap();
        let caps = 8;
        let edges = 8;
        assert_eq!(mesh.triangle_count(), caps * 2 + edges * 2);

        // every wall triangle spans the full thickness
        let wall_start = caps * 2 * 9;
        for tri in mesh.positions[wall_start..].chunks_exact(9) {
            let zs = [tri[2], tri[5], tri[8]];
            let lo = zs.iter().cloned().fold(f32::INFINITY, f32::min);
            let hi = zs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            assert_relative_eq!(hi - lo, 3.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn output_is_recentered() {
        let options = MeshOptions { thickness: 2.0, vertical_offset: 1.0, ..Default::default() };
        let mesh = build_polygon_mesh(&[square(4.0)], &options).unwrap();
        assert_eq!(mesh.center, [2.0, 2.0, 2.0]);

        let positions: Vec<f64> = mesh.positions.iter().map(|&v| v as f64).collect();
        assert_relative_eq!(get_center(&positions).norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn projected_output_is_recentered() {
        let sphere = ReferenceEllipsoid::sphere(10_000.0);
        let options = MeshOptions { ellipsoid: Some(&sphere), thickness: 10.0, ..Default::default() };
        let mesh = build_polygon_mesh(&[square(1.0)], &options).unwrap();
        assert!(mesh.center[0] > 9_000.0);

        let positions: Vec<f64> = mesh.positions.iter().map(|&v| v as f64).collect();
        assert_relative_eq!(get_center(&positions).norm(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn normals_can_be_left_out() {
        let options = MeshOptions { generate_normals: false, ..Default::default() };
        let mesh = build_polygon_mesh(&[square(1.0)], &options).unwrap();
        assert!(mesh.normals.is_none());
        assert_eq!(mesh.indices.as_ref().unwrap().len(), 6);
    }

    #[test]
    fn flat_ignores_source_heights() {
        let raw = vec![vec![
            Coordinate::with_z(0.0, 0.0, 50.0),
            Coordinate::with_z(1.0, 0.0, 60.0),
            Coordinate::with_z(1.0, 1.0, 70.0),
        ]];
        let options = MeshOptions { flat: true, vertical_offset: 2.0, ..Default::default() };
        let mesh = build_polygon_mesh(&[raw.clone()], &options).unwrap();
        assert_eq!(mesh.center[2], 2.0);

        let mesh = build_polygon_mesh(&[raw], &MeshOptions::default()).unwrap();
        assert_eq!(mesh.center[2], 60.0);
    }

    #[test]
    fn figure_eight_is_split_before_triangulation() {
        let bowtie = vec![ring(&[[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0]])];
        let mesh = build_polygon_mesh(&[bowtie], &MeshOptions::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn failing_polygon_respects_error_policy() {
        let broken = vec![ring(&[[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0], [0.0, 1.0]])];
        let input = vec![square(1.0), broken];

        let mesh = build_polygon_mesh(&input, &MeshOptions::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);

        let options = MeshOptions { error_policy: ErrorPolicy::Abort, ..Default::default() };
        let err = build_polygon_mesh(&input, &options).unwrap_err();
        assert!(matches!(err, GeometryError::MalformedInput(_)));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = MeshOptions { thickness: -2.0, ..Default::default() };
        let err = build_polygon_mesh(&[square(1.0)], &options).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidOptions(_)));
    }

    #[test]
    fn resolution_densifies_the_cap() {
        let options = MeshOptions { resolution: Some(1.0), ..Default::default() };
        let mesh = build_polygon_mesh(&[square(4.0)], &options).unwrap();
        // 16 boundary points, 9 interior points: 2 * 25 - 16 - 2
        assert_eq!(mesh.triangle_count(), 32);
    }

    #[test]
    fn interior_samples_skip_boundary_and_holes() {
        let simple = SimplePolygon::new(
            ring(&[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]),
            vec![ring(&[[1.5, 1.5], [1.5, 2.5], [2.5, 2.5], [2.5, 1.5]])],
        );
        let points = interior_sample_points(&simple, 1.0);
        assert_eq!(points.len(), 8);
        assert!(!points.iter().any(|p| p.x == 2.0 && p.y == 2.0));
        assert!(points.iter().all(|p| p.z.is_none()));
    }

    #[test]
    fn empty_input_gives_empty_mesh() {
        let mesh = build_polygon_mesh(&[], &MeshOptions::default()).unwrap();
        assert!(mesh.is_empty());
    }
}

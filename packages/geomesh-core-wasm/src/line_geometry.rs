// Builds disjoint line segment buffers from coordinate loops
use crate::config::LineOptions;
use crate::ellipsoid::Projector;
use crate::flat_buffer::{recenter, to_f32, transform_to_ellipsoid};
use crate::models::{Coordinate, LineBuffer, LineLoop};

/// Emits one two-point segment per edge of every loop.
///
/// A closed loop also gets its wraparound edge. Heights are the coordinate's z
/// (dropped when `flat`) plus `vertical_offset`; with an ellipsoid every vertex
/// is read as (longitude°, latitude°, height) and projected. The result is
/// re-centered on its bounding-box center.
pub fn build_line_buffer(loops: &[LineLoop], options: &LineOptions) -> LineBuffer {
    let segment_count: usize = loops.iter().map(LineLoop::segment_count).sum();
    let mut positions: Vec<f64> = Vec::with_capacity(segment_count * 6);

    let height = |c: &Coordinate| {
        let z = if options.flat { 0.0 } else { c.z_or_zero() };
        z + options.vertical_offset
    };

    for line in loops {
        let coords = &line.coordinates;
        let n = coords.len();
        for i in 0..line.segment_count() {
            let a = &coords[i];
            let b = &coords[(i + 1) % n];
            positions.extend_from_slice(&[a.x, a.y, height(a), b.x, b.y, height(b)]);
        }
    }

    if let Some(ellipsoid) = options.ellipsoid {
        transform_to_ellipsoid(&mut positions, &Projector::new(ellipsoid));
    }

    let center = recenter(&mut positions);

    LineBuffer {
        positions: to_f32(&positions),
        center,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipsoid::ReferenceEllipsoid;
    use crate::flat_buffer::get_center;
    use approx::assert_relative_eq;

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::with_z(0.0, 0.0, 1.0),
            Coordinate::with_z(2.0, 0.0, 1.0),
            Coordinate::with_z(2.0, 2.0, 3.0),
            Coordinate::with_z(0.0, 2.0, 3.0),
        ]
    }

    #[test]
    fn closed_loop_has_one_segment_per_edge() {
        let buffer = build_line_buffer(&[LineLoop::closed(square())], &LineOptions::default());
        assert_eq!(buffer.positions.len(), 8 * 3);
        assert_eq!(buffer.segment_count(), 4);
    }

    #[test]
    fn open_loop_skips_wraparound_edge() {
        let buffer = build_line_buffer(&[LineLoop::open(square())], &LineOptions::default());
        assert_eq!(buffer.positions.len(), 6 * 3);
    }

    #[test]
    fn buffer_is_recentered() {
        let buffer = build_line_buffer(&[LineLoop::closed(square())], &LineOptions::default());
        assert_eq!(buffer.center, [1.0, 1.0, 2.0]);

        let positions: Vec<f64> = buffer.positions.iter().map(|&v| v as f64).collect();
        assert_relative_eq!(get_center(&positions).norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn flat_and_offset_heights() {
        let options = LineOptions { flat: true, vertical_offset: 5.0, ellipsoid: None };
        let buffer = build_line_buffer(&[LineLoop::closed(square())], &options);
        assert_eq!(buffer.center[2], 5.0);
        for p in buffer.positions.chunks_exact(3) {
            assert_eq!(p[2], 0.0);
        }
    }

    #[test]
    fn short_loops_produce_nothing() {
        let single = LineLoop::closed(vec![Coordinate::new(1.0, 1.0)]);
        let buffer = build_line_buffer(&[single, LineLoop::open(Vec::new())], &LineOptions::default());
        assert!(buffer.positions.is_empty());
        assert_eq!(buffer.center, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn projected_lines_sit_on_the_sphere() {
        let sphere = ReferenceEllipsoid::sphere(1000.0);
        let options = LineOptions { ellipsoid: Some(&sphere), ..Default::default() };
        let line = LineLoop::open(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)]);
        let buffer = build_line_buffer(&[line], &options);

        for p in buffer.positions.chunks_exact(3) {
            let x = p[0] as f64 + buffer.center[0];
            let y = p[1] as f64 + buffer.center[1];
            let z = p[2] as f64 + buffer.center[2];
            assert_relative_eq!((x * x + y * y + z * z).sqrt(), 1000.0, epsilon = 1e-3);
        }
    }
}

// Helpers for flat xyz position buffers
use nalgebra::Vector3;

use crate::coordinates::Bounds;
use crate::ellipsoid::Projector;

/// Bounding-box center of a flat xyz buffer.
pub fn get_center(positions: &[f64]) -> Vector3<f64> {
    let mut bounds = Bounds::empty();
    for p in positions.chunks_exact(3) {
        bounds.expand(p[0], p[1], p[2]);
    }
    bounds.center()
}

pub fn offset_points(positions: &mut [f64], offset: &Vector3<f64>) {
    for p in positions.chunks_exact_mut(3) {
        p[0] += offset.x;
        p[1] += offset.y;
        p[2] += offset.z;
    }
}

/// Moves the buffer so its bounding-box center sits at the origin and returns
/// the removed center.
pub fn recenter(positions: &mut [f64]) -> [f64; 3] {
    let center = get_center(positions);
    offset_points(positions, &-center);
    [center.x, center.y, center.z]
}

/// Reads every vertex as (longitude°, latitude°, height) and replaces it with
/// its Cartesian position on the ellipsoid.
pub fn transform_to_ellipsoid(positions: &mut [f64], projector: &Projector) {
    for p in positions.chunks_exact_mut(3) {
        let pos = projector.to_position(p[0], p[1], p[2]);
        p[0] = pos.x;
        p[1] = pos.y;
        p[2] = pos.z;
    }
}

/// Writes the face normal of the triangle starting at `index` to all three of
/// its vertices. Degenerate triangles get a Z-up normal.
pub fn add_face_normals(index: usize, positions: &[f64], normals: &mut [f64]) {
    let a = Vector3::new(positions[index], positions[index + 1], positions[index + 2]);
    let b = Vector3::new(positions[index + 3], positions[index + 4], positions[index + 5]);
    let c = Vector3::new(positions[index + 6], positions[index + 7], positions[index + 8]);

    let normal = (b - a)
        .cross(&(c - a))
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::z);

    for v in 0..3 {
        let i = index + v * 3;
        normals[i] = normal.x;
        normals[i + 1] = normal.y;
        normals[i + 2] = normal.z;
    }
}

pub fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

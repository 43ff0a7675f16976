use js_sys::{Array, Float32Array, Object, Uint32Array};
use wasm_bindgen::prelude::*;

use crate::config::MeshOptions;
use crate::ellipsoid::Projector;
use crate::flat_buffer::{add_face_normals, recenter, to_f32, transform_to_ellipsoid};
use crate::models::{Coordinate, MeshBuffer, TriangulationResult};

// Working buffers for one mesh, f64 until the final conversion
struct MeshBuilder<'a> {
    positions: Vec<f64>,
    normals: Vec<f64>,
    projector: Option<Projector<'a>>,
    flat: bool,
    generate_normals: bool,
}

impl<'a> MeshBuilder<'a> {
    fn height(&self, coord: &Coordinate, base: f64) -> f64 {
        if self.flat {
            base
        } else {
            coord.z_or_zero() + base
        }
    }

    fn push_vertex(&mut self, coord: &Coordinate, base: f64) {
        let z = self.height(coord, base);
        self.positions.extend_from_slice(&[coord.x, coord.y, z]);
    }

    // Cap normals are known before projection: ellipsoid surface normal or ±z
    fn push_cap_normal(&mut self, coord: &Coordinate, sign: f64) {
        if !self.generate_normals {
            return;
        }
        let normal = match &self.projector {
            Some(projector) => projector.to_surface_normal(coord.x, coord.y) * sign,
            None => nalgebra::Vector3::new(0.0, 0.0, sign),
        };
        self.normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
    }

    fn add_cap(&mut self, part: &TriangulationResult, base: f64, upward: bool) {
        let sign = if upward { 1.0 } else { -1.0 };
        for &[a, b, c] in &part.triangles {
            // raw triangles are clockwise, the top cap flips them to face +z
            let order = if upward { [c, b, a] } else { [a, b, c] };
            for i in order {
                let coord = part.points[i];
                self.push_vertex(&coord, base);
                self.push_cap_normal(&coord, sign);
            }
        }
    }

    fn add_walls(&mut self, part: &TriangulationResult, bottom: f64, top: f64) {
        for &[p, q] in &part.boundary_edges {
            let (cp, cq) = (part.points[p], part.points[q]);
            // interior lies right of p -> q, so these face outward
            self.push_vertex(&cp, bottom);
            self.push_vertex(&cp, top);
            self.push_vertex(&cq, bottom);

            self.push_vertex(&cq, bottom);
            self.push_vertex(&cp, top);
            self.push_vertex(&cq, top);
        }
    }
}

/// Assembles caps and side walls for a set of triangulated polygons.
///
/// Buffer layout is every top cap triangle, then (when `thickness > 0`) every
/// bottom cap triangle, then the side walls. Positions are re-centered on
/// their bounding-box center after the optional ellipsoid projection.
pub fn extrude_triangulations(parts: &[TriangulationResult], options: &MeshOptions) -> MeshBuffer {
    let cap_vertices: usize = parts.iter().map(|p| p.triangles.len() * 3).sum();
    let wall_vertices: usize = parts.iter().map(|p| p.boundary_edges.len() * 6).sum();
    let extruded = options.thickness > 0.0;
    let vertex_capacity = if extruded { cap_vertices * 2 + wall_vertices } else { cap_vertices };
    let capacity = vertex_capacity * 3;

    let mut builder = MeshBuilder {
        positions: Vec::with_capacity(capacity),
        normals: Vec::with_capacity(if options.generate_normals { capacity } else { 0 }),
        projector: options.ellipsoid.map(Projector::new),
        flat: options.flat,
        generate_normals: options.generate_normals,
    };

    let bottom = options.vertical_offset;
    let top = options.vertical_offset + options.thickness;

    for part in parts {
        builder.add_cap(part, top, true);
    }

    let mut wall_start = builder.positions.len();
    if extruded {
        for part in parts {
            builder.add_cap(part, bottom, false);
        }
        wall_start = builder.positions.len();
        for part in parts {
            builder.add_walls(part, bottom, top);
        }
    }

    let MeshBuilder { mut positions, mut normals, projector, .. } = builder;

    if let Some(projector) = &projector {
        transform_to_ellipsoid(&mut positions, projector);
    }

    if options.generate_normals {
        // wall normals come from the final (possibly projected) geometry
        normals.resize(positions.len(), 0.0);
        for index in (wall_start..positions.len()).step_by(9) {
            add_face_normals(index, &positions, &mut normals);
        }
    }

    let center = recenter(&mut positions);
    let vertex_count = (positions.len() / 3) as u32;

    MeshBuffer {
        positions: to_f32(&positions),
        normals: options.generate_normals.then(|| to_f32(&normals)),
        indices: Some((0..vertex_count).collect()),
        center,
    }
}

/// Converts a mesh into the plain object handed to JavaScript:
/// `{ position, normal?, index?, center }`.
pub fn mesh_buffer_to_js(mesh: &MeshBuffer) -> Result<JsValue, JsValue> {
    let result = Object::new();
    let pos_arr = Float32Array::from(mesh.positions.as_slice());
    js_sys::Reflect::set(&result, &JsValue::from_str("position"), &pos_arr)?;

    if let Some(normals) = &mesh.normals {
        let normal_arr = Float32Array::from(normals.as_slice());
        js_sys::Reflect::set(&result, &JsValue::from_str("normal"), &normal_arr)?;
    }
    if let Some(indices) = &mesh.indices {
        let index_arr = Uint32Array::from(indices.as_slice());
        js_sys::Reflect::set(&result, &JsValue::from_str("index"), &index_arr)?;
    }

    js_sys::Reflect::set(&result, &JsValue::from_str("center"), &center_to_js(mesh.center))?;
    Ok(result.into())
}

pub(crate) fn center_to_js(center: [f64; 3]) -> Array {
    center.iter().map(|&v| JsValue::from_f64(v)).collect()
}

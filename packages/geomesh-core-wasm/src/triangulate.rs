// Constrained triangulation of a simple polygon with holes
use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};

use crate::coordinates::is_clockwise;
use crate::error::{GeometryError, GeometryResult};
use crate::models::{Coordinate, Ring, TriangulationResult};

type Cdt = ConstrainedDelaunayTriangulation<Point2<f64>>;

// Edges of a cyclic loop stored at `offset` in the combined point list
fn get_loop_edges(len: usize, offset: usize, target: &mut Vec<[usize; 2]>) {
    for i in 0..len {
        target.push([offset + i, offset + (i + 1) % len]);
    }
}

/// Triangulates `contour` minus `holes`, optionally densified with `interior_points`.
///
/// Rings must satisfy the simple polygon invariant and carry no closing
/// duplicate. Triangles in the result are clockwise (y-up) and ordered by the
/// flood fill that collects them; boundary edges are directed with the polygon
/// interior on their right.
pub fn triangulate(
    contour: &[Coordinate],
    holes: &[Ring],
    interior_points: &[Coordinate],
) -> GeometryResult<TriangulationResult> {
    let mut points: Vec<Coordinate> = Vec::with_capacity(
        contour.len() + holes.iter().map(Vec::len).sum::<usize>() + interior_points.len(),
    );
    points.extend_from_slice(contour);
    for hole in holes {
        points.extend_from_slice(hole);
    }
    points.extend_from_slice(interior_points);

    if contour.len() < 3 {
        return Ok(TriangulationResult { points, ..Default::default() });
    }

    // required edges, plus which side of each ring the polygon interior lies on
    let contour_ccw = !is_clockwise(contour);
    let mut constrained: Vec<[usize; 2]> = Vec::new();
    let mut interior_left: Vec<bool> = Vec::new();
    let mut offset = 0;
    get_loop_edges(contour.len(), offset, &mut constrained);
    interior_left.resize(constrained.len(), contour_ccw);
    offset += contour.len();
    for hole in holes {
        get_loop_edges(hole.len(), offset, &mut constrained);
        interior_left.resize(constrained.len(), is_clockwise(hole));
        offset += hole.len();
    }

    let mut cdt = Cdt::new();
    let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(points.len());
    // triangulation vertex index -> first input point at that position
    let mut vertex_to_point: Vec<usize> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let handle = cdt.insert(Point2::new(p.x, p.y)).map_err(|e| {
            GeometryError::malformed_input(format!("cannot triangulate point ({}, {}): {:?}", p.x, p.y, e))
        })?;
        if handle.index() == vertex_to_point.len() {
            vertex_to_point.push(i);
        }
        handles.push(handle);
    }

    let mut boundary_edges = Vec::with_capacity(constrained.len());
    for (&[e0, e1], &left) in constrained.iter().zip(&interior_left) {
        if handles[e0] != handles[e1] {
            boundary_edges.push(if left { [e1, e0] } else { [e0, e1] });
        }
    }

    // collinear or coincident input, nothing to fill
    if cdt.num_inner_faces() == 0 {
        return Ok(TriangulationResult { points, triangles: Vec::new(), boundary_edges });
    }

    for &[e0, e1] in &constrained {
        let (h0, h1) = (handles[e0], handles[e1]);
        if h0 == h1 {
            continue;
        }
        if !cdt.can_add_constraint(h0, h1) {
            return Err(GeometryError::internal(format!(
                "boundary edge {}-{} crosses another boundary edge",
                e0, e1
            )));
        }
        cdt.add_constraint(h0, h1);
    }

    let start = find_start_face(&cdt, &handles, contour.len(), contour_ccw)?;

    let mut triangles = Vec::with_capacity(cdt.num_inner_faces());
    let mut traversed = vec![false; cdt.num_all_faces()];
    let mut stack = vec![start];
    while let Some(fixed) = stack.pop() {
        if traversed[fixed.index()] {
            continue;
        }
        traversed[fixed.index()] = true;

        let face = cdt.face(fixed);
        let [a, b, c] = face.vertices();
        triangles.push([
            vertex_to_point[a.fix().index()],
            vertex_to_point[c.fix().index()],
            vertex_to_point[b.fix().index()],
        ]);

        for edge in face.adjacent_edges() {
            // a constraint edge is polygon boundary, crossing it leaks outside
            if cdt.is_constraint_edge(edge.fix().as_undirected()) {
                continue;
            }
            if let Some(other) = edge.rev().face().as_inner() {
                if !traversed[other.fix().index()] {
                    stack.push(other.fix());
                }
            }
        }
    }

    Ok(TriangulationResult { points, triangles, boundary_edges })
}

// Find the triangle on the interior side of the first usable contour edge
fn find_start_face(
    cdt: &Cdt,
    handles: &[FixedVertexHandle],
    contour_len: usize,
    contour_ccw: bool,
) -> GeometryResult<FixedFaceHandle<InnerTag>> {
    let (h0, h1) = (0..contour_len)
        .map(|i| (handles[i], handles[(i + 1) % contour_len]))
        .find(|(h0, h1)| h0 != h1)
        .ok_or_else(|| GeometryError::internal("contour has no usable edge"))?;

    let from = cdt.vertex(h0).position();
    let to = cdt.vertex(h1).position();
    let (dx, dy) = (to.x - from.x, to.y - from.y);

    // the edge may have been split by collinear points during constraint insertion
    let edge = cdt.get_edge_from_neighbors(h0, h1).or_else(|| {
        cdt.vertex(h0).out_edges().find(|e| {
            let p = e.to().position();
            let (tx, ty) = (p.x - from.x, p.y - from.y);
            let cross = dx * ty - dy * tx;
            let tolerance = 1e-12 * (dx.hypot(dy) * tx.hypot(ty));
            cross.abs() <= tolerance && dx * tx + dy * ty > 0.0
        })
    });

    let face = edge.and_then(|e| {
        let side = if contour_ccw { e.face() } else { e.rev().face() };
        side.as_inner()
    });

    face.map(|f| f.fix()).ok_or_else(|| {
        GeometryError::internal(format!(
            "no triangle found on the interior side of boundary edge {}-{}",
            h0.index(),
            h1.index()
        ))
    })
}

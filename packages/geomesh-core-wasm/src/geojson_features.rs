// Geometry tree handed over by the parser, plus dispatch into the builders
use crate::config::{LineOptions, MeshOptions};
use crate::coordinates::Bounds;
use crate::error::{GeometryError, GeometryResult};
use crate::line_geometry::build_line_buffer;
use crate::models::{Coordinate, LineBuffer, LineLoop, MeshBuffer, RawPolygon, Ring};
use crate::polygon_geometry::build_polygon_mesh;

/// Feature wrapper around at most one geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub id: Option<String>,
    /// Original properties
    pub properties: Option<serde_json::Value>,
    /// `None` for a feature whose geometry is `null`.
    pub geometry: Option<Box<GeoObject>>,
    pub bbox: Option<Bounds>,
    /// Members the parser did not recognize, kept as they were.
    pub foreign: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    pub fn new(id: Option<String>, geometry: Option<GeoObject>) -> Self {
        Self {
            id,
            geometry: geometry.map(Box::new),
            ..Default::default()
        }
    }
}

/// Reads a GeoJSON `bbox` member: `[minX, minY, maxX, maxY]` (z = 0) or the six
/// number 3-D form.
pub fn parse_bbox(values: &[f64]) -> GeometryResult<Bounds> {
    let mut bounds = Bounds::empty();
    match values {
        [x0, y0, x1, y1] => {
            bounds.expand(*x0, *y0, 0.0);
            bounds.expand(*x1, *y1, 0.0);
        }
        [x0, y0, z0, x1, y1, z1] => {
            bounds.expand(*x0, *y0, *z0);
            bounds.expand(*x1, *y1, *z1);
        }
        other => {
            return Err(GeometryError::malformed_input(format!(
                "bbox must have 4 or 6 numbers, got {}",
                other.len()
            )))
        }
    }
    Ok(bounds)
}

/// Parsed geometry tree. Each variant carries only its own data.
///
/// `FeatureCollection` members are expected to be `GeoObject::Feature` nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoObject {
    Point(Coordinate),
    MultiPoint(Vec<Coordinate>),
    LineString(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
    Polygon(RawPolygon),
    MultiPolygon(Vec<RawPolygon>),
    GeometryCollection(Vec<GeoObject>),
    Feature(Feature),
    FeatureCollection(Vec<GeoObject>),
}

impl GeoObject {
    /// Pre-order walk over this object and everything below it.
    pub fn traverse(&self) -> Traverse<'_> {
        traverse(self)
    }
}

/// Lazy pre-order iterator: an object, then its children in source order.
pub struct Traverse<'a> {
    stack: Vec<&'a GeoObject>,
}

pub fn traverse(root: &GeoObject) -> Traverse<'_> {
    Traverse { stack: vec![root] }
}

impl<'a> Iterator for Traverse<'a> {
    type Item = &'a GeoObject;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        match current {
            GeoObject::GeometryCollection(children) | GeoObject::FeatureCollection(children) => {
                self.stack.extend(children.iter().rev());
            }
            GeoObject::Feature(feature) => self.stack.extend(feature.geometry.as_deref()),
            _ => {}
        }
        Some(current)
    }
}

/// One entry of [`collect_features`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectedItem<'a> {
    Feature(&'a Feature),
    Geometry {
        geometry: &'a GeoObject,
        feature_id: Option<&'a str>,
    },
}

/// Flattens a tree into its features and plain geometries, in traversal order.
///
/// Geometries found below a feature carry that feature's id.
pub fn collect_features(root: &GeoObject) -> Vec<CollectedItem<'_>> {
    fn visit<'a>(obj: &'a GeoObject, feature_id: Option<&'a str>, out: &mut Vec<CollectedItem<'a>>) {
        match obj {
            GeoObject::GeometryCollection(children) | GeoObject::FeatureCollection(children) => {
                for child in children {
                    visit(child, feature_id, out);
                }
            }
            GeoObject::Feature(feature) => {
                out.push(CollectedItem::Feature(feature));
                if let Some(geometry) = &feature.geometry {
                    visit(geometry, feature.id.as_deref(), out);
                }
            }
            geometry => out.push(CollectedItem::Geometry { geometry, feature_id }),
        }
    }

    let mut out = Vec::new();
    visit(root, None, &mut out);
    out
}

fn without_closing_duplicate(ring: &Ring) -> Ring {
    let mut open = ring.clone();
    if open.len() > 1 && open[0].same_xy(&open[open.len() - 1]) {
        open.pop();
    }
    open
}

/// Line loops for every line or polygon ring reachable from `obj`.
///
/// Line strings stay open; polygon rings become closed loops.
pub fn line_loops(obj: &GeoObject) -> Vec<LineLoop> {
    let mut loops = Vec::new();
    for item in obj.traverse() {
        match item {
            GeoObject::LineString(coords) => loops.push(LineLoop::open(coords.clone())),
            GeoObject::MultiLineString(lines) => {
                loops.extend(lines.iter().cloned().map(LineLoop::open));
            }
            GeoObject::Polygon(rings) => {
                loops.extend(rings.iter().map(|r| LineLoop::closed(without_closing_duplicate(r))));
            }
            GeoObject::MultiPolygon(polygons) => {
                loops.extend(
                    polygons
                        .iter()
                        .flatten()
                        .map(|r| LineLoop::closed(without_closing_duplicate(r))),
                );
            }
            _ => {}
        }
    }
    loops
}

/// Raw polygons for every polygon reachable from `obj`.
pub fn polygons(obj: &GeoObject) -> Vec<RawPolygon> {
    let mut result = Vec::new();
    for item in obj.traverse() {
        match item {
            GeoObject::Polygon(rings) => result.push(rings.clone()),
            GeoObject::MultiPolygon(parts) => result.extend(parts.iter().cloned()),
            _ => {}
        }
    }
    result
}

/// Line buffer over every line and polygon outline below `obj`.
pub fn line_object(obj: &GeoObject, options: &LineOptions) -> LineBuffer {
    build_line_buffer(&line_loops(obj), options)
}

/// Polygon mesh over every polygon below `obj`; `None` when there are none.
pub fn mesh_object(obj: &GeoObject, options: &MeshOptions) -> GeometryResult<Option<MeshBuffer>> {
    let polys = polygons(obj);
    if polys.is_empty() {
        return Ok(None);
    }
    build_polygon_mesh(&polys, options).map(Some)
}

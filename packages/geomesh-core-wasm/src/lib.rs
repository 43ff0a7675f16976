use js_sys::{Float32Array, Object};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
// Shared data structures
pub mod models;
pub mod error;
pub mod config;
pub mod coordinates;
pub mod ellipsoid;
pub mod flat_buffer;
// Self-intersection splitting
pub mod polygon_split;
pub mod triangulate;
pub mod line_geometry;
// Polygon mesh pipeline
pub mod polygon_geometry;
// Geometry tree and dispatch
pub mod geojson_features;
// Import our geometry functions
#[path = "../geometry_functions/extrude.rs"]
pub mod extrude;

pub use config::{ErrorPolicy, LineOptions, MeshOptions};
pub use ellipsoid::{Ellipsoid, Projector, ReferenceEllipsoid};
pub use error::{GeometryError, GeometryResult};
pub use geojson_features::{collect_features, line_object, mesh_object, traverse, Feature, GeoObject};
pub use line_geometry::build_line_buffer;
pub use models::{Coordinate, LineBuffer, LineLoop, MeshBuffer, RawPolygon, Ring, SimplePolygon, TriangulationResult};
pub use polygon_geometry::build_polygon_mesh;
pub use polygon_split::split_polygon;
pub use triangulate::triangulate;

use config::{LineBufferInput, LineOptionsJson, MeshOptionsJson, PolygonMeshInput};
use extrude::{center_to_js, mesh_buffer_to_js};

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("geomesh WASM module initialized");
    });
}

// Missing options mean defaults
fn options_from_js<T: DeserializeOwned + Default>(options: &JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(options.clone())
        .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))
}

fn line_buffer_to_js(buffer: &LineBuffer) -> Result<JsValue, JsValue> {
    let result = Object::new();
    let pos_arr = Float32Array::from(buffer.positions.as_slice());
    js_sys::Reflect::set(&result, &JsValue::from_str("position"), &pos_arr)?;
    js_sys::Reflect::set(&result, &JsValue::from_str("center"), &center_to_js(buffer.center))?;
    Ok(result.into())
}

fn run_line_buffer(loops: &[LineLoop], options: &LineOptionsJson) -> Result<JsValue, JsValue> {
    let ellipsoid = options.reference_ellipsoid()?;
    let opts = options.to_options(ellipsoid.as_ref().map(|e| e as &dyn Ellipsoid));
    line_buffer_to_js(&build_line_buffer(loops, &opts))
}

fn run_polygon_mesh(polygons: &[RawPolygon], options: &MeshOptionsJson) -> Result<JsValue, JsValue> {
    let ellipsoid = options.reference_ellipsoid()?;
    let opts = options.to_options(ellipsoid.as_ref().map(|e| e as &dyn Ellipsoid));
    let mesh = build_polygon_mesh(polygons, &opts)?;
    mesh_buffer_to_js(&mesh)
}

/// Builds a line segment buffer from an array of `{ coordinates, closed }` loops.
/// Returns `{ position: Float32Array, center: [x, y, z] }`.
#[wasm_bindgen]
pub fn build_line_buffer_js(loops: &JsValue, options: &JsValue) -> Result<JsValue, JsValue> {
    let loops: Vec<LineLoop> = serde_wasm_bindgen::from_value(loops.clone())
        .map_err(|e| JsValue::from_str(&format!("Invalid loops: {}", e)))?;
    let options: LineOptionsJson = options_from_js(options)?;
    run_line_buffer(&loops, &options)
}

/// Builds a triangle mesh from an array of polygons, each `[outer, holes...]`.
/// Returns `{ position, normal?, index, center }`.
#[wasm_bindgen]
pub fn build_polygon_mesh_js(polygons: &JsValue, options: &JsValue) -> Result<JsValue, JsValue> {
    let polygons: Vec<RawPolygon> = serde_wasm_bindgen::from_value(polygons.clone())
        .map_err(|e| JsValue::from_str(&format!("Invalid polygons: {}", e)))?;
    let options: MeshOptionsJson = options_from_js(options)?;
    run_polygon_mesh(&polygons, &options)
}

// JSON string variants, for callers that already hold serialized input
#[wasm_bindgen]
pub fn build_line_buffer_json(input_json: &str) -> Result<JsValue, JsValue> {
    let input: LineBufferInput = serde_json::from_str(input_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse input: {}", e)))?;
    run_line_buffer(&input.loops, &input.options)
}

#[wasm_bindgen]
pub fn build_polygon_mesh_json(input_json: &str) -> Result<JsValue, JsValue> {
    let input: PolygonMeshInput = serde_json::from_str(input_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse input: {}", e)))?;
    console_log!("Building mesh for {} polygons", input.polygons.len());
    run_polygon_mesh(&input.polygons, &input.options)
}

// Per-call options for the line and mesh builders
use serde::Deserialize;

use crate::ellipsoid::{Ellipsoid, ReferenceEllipsoid};
use crate::error::{GeometryError, GeometryResult};
use crate::models::{LineLoop, RawPolygon};

/// What `build_polygon_mesh` does when one polygon cannot be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPolicy {
    /// Log the failure and leave the polygon out of the mesh.
    #[default]
    Skip,
    /// Return the first failure instead of a mesh.
    Abort,
}

/// Line builder options.
#[derive(Clone, Copy, Default)]
pub struct LineOptions<'a> {
    /// Discard source elevation.
    pub flat: bool,
    /// Added to every height.
    pub vertical_offset: f64,
    /// Project (lon°, lat°, height) onto this surface when set.
    pub ellipsoid: Option<&'a dyn Ellipsoid>,
}

/// Polygon mesh builder options.
#[derive(Clone, Copy)]
pub struct MeshOptions<'a> {
    /// Extrusion height, 0 for a single cap.
    pub thickness: f64,
    /// Base height shift.
    pub vertical_offset: f64,
    /// Discard source elevation.
    pub flat: bool,
    pub generate_normals: bool,
    /// Spacing of interior densification points.
    pub resolution: Option<f64>,
    pub ellipsoid: Option<&'a dyn Ellipsoid>,
    pub error_policy: ErrorPolicy,
}

impl Default for MeshOptions<'_> {
    fn default() -> Self {
        Self {
            thickness: 0.0,
            vertical_offset: 0.0,
            flat: false,
            generate_normals: true,
            resolution: None,
            ellipsoid: None,
            error_policy: ErrorPolicy::Skip,
        }
    }
}

impl MeshOptions<'_> {
    pub fn validate(&self) -> GeometryResult<()> {
        if !(self.thickness.is_finite() && self.thickness >= 0.0) {
            return Err(GeometryError::invalid_options(format!(
                "thickness must be a non-negative number, got {}",
                self.thickness
            )));
        }
        if !self.vertical_offset.is_finite() {
            return Err(GeometryError::invalid_options("verticalOffset must be finite"));
        }
        if let Some(resolution) = self.resolution {
            if !(resolution.is_finite() && resolution > 0.0) {
                return Err(GeometryError::invalid_options(format!(
                    "resolution must be a positive number, got {}",
                    resolution
                )));
            }
        }
        Ok(())
    }
}

/// Ellipsoid as named in JSON: `"WGS84"` or `[rx, ry, rz]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EllipsoidJson {
    Named(String),
    Radii([f64; 3]),
}

impl EllipsoidJson {
    pub fn to_ellipsoid(&self) -> GeometryResult<ReferenceEllipsoid> {
        match self {
            EllipsoidJson::Named(name) if name.eq_ignore_ascii_case("wgs84") => {
                Ok(ReferenceEllipsoid::wgs84())
            }
            EllipsoidJson::Named(name) => Err(GeometryError::invalid_options(format!(
                "unknown ellipsoid '{}'",
                name
            ))),
            EllipsoidJson::Radii([x, y, z]) => {
                if [x, y, z].iter().all(|r| r.is_finite() && **r > 0.0) {
                    Ok(ReferenceEllipsoid::new(*x, *y, *z))
                } else {
                    Err(GeometryError::invalid_options("ellipsoid radii must be positive"))
                }
            }
        }
    }
}

// For JSON deserialization compatibility
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineOptionsJson {
    pub flat: bool,
    pub vertical_offset: f64,
    pub ellipsoid: Option<EllipsoidJson>,
}

impl LineOptionsJson {
    pub fn reference_ellipsoid(&self) -> GeometryResult<Option<ReferenceEllipsoid>> {
        self.ellipsoid.as_ref().map(EllipsoidJson::to_ellipsoid).transpose()
    }

    pub fn to_options<'a>(&self, ellipsoid: Option<&'a dyn Ellipsoid>) -> LineOptions<'a> {
        LineOptions {
            flat: self.flat,
            vertical_offset: self.vertical_offset,
            ellipsoid,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeshOptionsJson {
    pub thickness: f64,
    pub vertical_offset: f64,
    pub flat: bool,
    pub generate_normals: bool,
    pub resolution: Option<f64>,
    pub ellipsoid: Option<EllipsoidJson>,
    pub error_policy: ErrorPolicy,
}

impl Default for MeshOptionsJson {
    fn default() -> Self {
        Self {
            thickness: 0.0,
            vertical_offset: 0.0,
            flat: false,
            generate_normals: true,
            resolution: None,
            ellipsoid: None,
            error_policy: ErrorPolicy::Skip,
        }
    }
}

impl MeshOptionsJson {
    pub fn reference_ellipsoid(&self) -> GeometryResult<Option<ReferenceEllipsoid>> {
        self.ellipsoid.as_ref().map(EllipsoidJson::to_ellipsoid).transpose()
    }

    pub fn to_options<'a>(&self, ellipsoid: Option<&'a dyn Ellipsoid>) -> MeshOptions<'a> {
        MeshOptions {
            thickness: self.thickness,
            vertical_offset: self.vertical_offset,
            flat: self.flat,
            generate_normals: self.generate_normals,
            resolution: self.resolution,
            ellipsoid,
            error_policy: self.error_policy,
        }
    }
}

// Input for the line buffer entry point
#[derive(Debug, Deserialize)]
pub struct LineBufferInput {
    pub loops: Vec<LineLoop>,
    #[serde(default)]
    pub options: LineOptionsJson,
}

// Input for the polygon mesh entry point
#[derive(Debug, Deserialize)]
pub struct PolygonMeshInput {
    pub polygons: Vec<RawPolygon>,
    #[serde(default)]
    pub options: MeshOptionsJson,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_defaults() {
        let opts = MeshOptions::default();
        assert_eq!(opts.thickness, 0.0);
        assert_eq!(opts.vertical_offset, 0.0);
        assert!(!opts.flat);
        assert!(opts.generate_normals);
        assert!(opts.resolution.is_none());
        assert!(opts.ellipsoid.is_none());
        assert_eq!(opts.error_policy, ErrorPolicy::Skip);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn json_options_use_camel_case_and_defaults() {
        let json: MeshOptionsJson =
            serde_json::from_str(r#"{"thickness": 2.5, "verticalOffset": 1, "errorPolicy": "abort"}"#)
                .unwrap();
        assert_eq!(json.thickness, 2.5);
        assert_eq!(json.vertical_offset, 1.0);
        assert!(json.generate_normals);
        assert_eq!(json.error_policy, ErrorPolicy::Abort);

        let opts = json.to_options(None);
        assert_eq!(opts.thickness, 2.5);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let opts = MeshOptions { thickness: -1.0, ..Default::default() };
        assert!(matches!(opts.validate(), Err(GeometryError::InvalidOptions(_))));

        let opts = MeshOptions { resolution: Some(0.0), ..Default::default() };
        assert!(opts.validate().is_err());

        let opts = MeshOptions { vertical_offset: f64::NAN, ..Default::default() };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn ellipsoid_from_json() {
        let named: EllipsoidJson = serde_json::from_str(r#""WGS84""#).unwrap();
        assert_eq!(named.to_ellipsoid().unwrap(), ReferenceEllipsoid::wgs84());

        let radii: EllipsoidJson = serde_json::from_str("[1.0, 1.0, 1.0]").unwrap();
        assert_eq!(radii.to_ellipsoid().unwrap(), ReferenceEllipsoid::sphere(1.0));

        let unknown: EllipsoidJson = serde_json::from_str(r#""mars""#).unwrap();
        assert!(unknown.to_ellipsoid().is_err());
    }

    #[test]
    fn polygon_input_parses() {
        let input: PolygonMeshInput = serde_json::from_str(
            r#"{"polygons": [[[[0,0],[1,0],[1,1],[0,1],[0,0]]]], "options": {"flat": true}}"#,
        )
        .unwrap();
        assert_eq!(input.polygons.len(), 1);
        assert_eq!(input.polygons[0][0].len(), 5);
        assert!(input.options.flat);
    }
}

// Ellipsoid capability and the degree based projector used by the builders
use nalgebra::Vector3;

use crate::models::Coordinate;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// Reference surface that maps geodetic coordinates (radians) to Cartesian space.
///
/// Implementations are read-only and must be callable from several threads.
pub trait Ellipsoid: Sync {
    fn cartographic_to_position(&self, lat: f64, lon: f64, height: f64) -> Vector3<f64>;

    /// Outward unit surface normal.
    fn cartographic_to_normal(&self, lat: f64, lon: f64) -> Vector3<f64>;
}

/// Triaxial ellipsoid described by its radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceEllipsoid {
    radii_squared: Vector3<f64>,
}

impl ReferenceEllipsoid {
    pub fn wgs84() -> Self {
        Self::new(WGS84_A, WGS84_A, WGS84_B)
    }

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            radii_squared: Vector3::new(x * x, y * y, z * z),
        }
    }

    pub fn sphere(radius: f64) -> Self {
        Self::new(radius, radius, radius)
    }
}

impl Default for ReferenceEllipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Ellipsoid for ReferenceEllipsoid {
    fn cartographic_to_position(&self, lat: f64, lon: f64, height: f64) -> Vector3<f64> {
        let n = self.cartographic_to_normal(lat, lon);
        let k = self.radii_squared.component_mul(&n);
        let gamma = n.dot(&k).sqrt();
        k / gamma + n * height
    }

    fn cartographic_to_normal(&self, lat: f64, lon: f64) -> Vector3<f64> {
        let cos_lat = lat.cos();
        Vector3::new(cos_lat * lon.cos(), cos_lat * lon.sin(), lat.sin()).normalize()
    }
}

/// Degree based view of an ellipsoid, called once per vertex.
#[derive(Clone, Copy)]
pub struct Projector<'a> {
    ellipsoid: &'a dyn Ellipsoid,
}

impl<'a> Projector<'a> {
    pub fn new(ellipsoid: &'a dyn Ellipsoid) -> Self {
        Self { ellipsoid }
    }

    #[inline]
    pub fn to_position(&self, lon_deg: f64, lat_deg: f64, height: f64) -> Vector3<f64> {
        self.ellipsoid
            .cartographic_to_position(lat_deg.to_radians(), lon_deg.to_radians(), height)
    }

    #[inline]
    pub fn to_surface_normal(&self, lon_deg: f64, lat_deg: f64) -> Vector3<f64> {
        self.ellipsoid
            .cartographic_to_normal(lat_deg.to_radians(), lon_deg.to_radians())
            .normalize()
    }

    /// Maps a (longitude, latitude, height) coordinate to Cartesian space.
    #[inline]
    pub fn transform_point(&self, coord: &Coordinate) -> Vector3<f64> {
        self.to_position(coord.x, coord.y, coord.z_or_zero())
    }
}

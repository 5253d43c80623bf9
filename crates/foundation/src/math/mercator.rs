//! Spherical Web Mercator <-> geographic (WGS84 degrees).

use super::MapPoint;

/// WGS84 semi-major axis (meters), used as the Web Mercator sphere radius.
pub const WGS84_A: f64 = 6_378_137.0;

/// Half the projected world width in meters.
pub const MERCATOR_HALF_WORLD: f64 = std::f64::consts::PI * WGS84_A;

/// Latitudes beyond this are clamped before projecting; the poles map to infinity.
pub const MERCATOR_MAX_LAT: f64 = 89.999_99;

pub fn mercator_to_geographic(p: MapPoint) -> MapPoint {
    let lon = (p.x / WGS84_A).to_degrees();
    let lat = (2.0 * (p.y / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    MapPoint::new(lon, lat)
}

pub fn geographic_to_mercator(p: MapPoint) -> MapPoint {
    let lat = p.y.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let x = WGS84_A * p.x.to_radians();
    let y = WGS84_A * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    MapPoint::new(x, y)
}

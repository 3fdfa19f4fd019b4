//! Great-circle distance between fixes.
//!
//! Uses the haversine formula on a spherical earth. Accurate to well under
//! a percent at the scales a runner covers between fixes.

use crate::GeoPoint;

/// Mean earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distance in meters between two fixes along the surface of a sphere of
/// the given radius.
///
/// The haversine term is clamped to `[0, 1]` so rounding near antipodal or
/// coincident points cannot push `sqrt`/`atan2` outside their domain.
pub fn great_circle_distance(a: &GeoPoint, b: &GeoPoint, earth_radius_meters: f64) -> f64 {
    let phi1 = a.latitude().to_radians();
    let phi2 = b.latitude().to_radians();
    let d_phi = (b.latitude() - a.latitude()).to_radians();
    let d_lambda = (b.longitude() - a.longitude()).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    earth_radius_meters * c
}

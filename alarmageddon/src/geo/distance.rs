/// Mean Earth radius used by the spherical model.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in degrees.
///
/// Symmetric in its arguments and zero for identical points. NaN inputs
/// produce NaN.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let sin_d_phi_2 = (d_phi / 2.0).sin();
    let sin_d_lambda_2 = (d_lambda / 2.0).sin();
    let a = sin_d_phi_2 * sin_d_phi_2 + phi1.cos() * phi2.cos() * sin_d_lambda_2 * sin_d_lambda_2;

    // Rounding can push `a` a hair past 1 for antipodal points. `clamp`
    // keeps NaN where `min` would turn it into 1.
    let c = 2.0 * a.sqrt().clamp(0.0, 1.0).asin();

    EARTH_RADIUS_M * c
}

//! Effective pressure: projection of a load direction onto a face normal

use crate::error::Result;
use crate::mesh::geometry::unit_vector;
use crate::mesh::types::Vec3;

/// Cosines at or below this are treated as perpendicular
pub const PERPENDICULAR_TOLERANCE: f64 = 1e-9;

/// Absolute cosine of the angle between a load direction and a face normal
///
/// Returns exactly `0.0` when the two are perpendicular within
/// [`PERPENDICULAR_TOLERANCE`].
pub fn projection_factor(direction: &Vec3, normal: &Vec3) -> Result<f64> {
    let d = unit_vector(direction, "load direction")?;
    let n = unit_vector(normal, "face normal")?;

    let cos = d.dot(&n).abs().min(1.0);
    if cos <= PERPENDICULAR_TOLERANCE {
        return Ok(0.0);
    }

    Ok(cos)
}

/// Effective pressure `intensity * |cos θ|` between load direction and normal
///
/// Fails with `InvalidDirection` if either vector is zero-length or
/// non-finite. A perpendicular load is not an error: the result is `0.0`
/// and downstream stages still produce (zero) force records.
pub fn effective_pressure(intensity: f64, direction: &Vec3, normal: &Vec3) -> Result<f64> {
    let factor = projection_factor(direction, normal)?;
    if factor == 0.0 {
        return Ok(0.0);
    }

    Ok(intensity * factor)
}

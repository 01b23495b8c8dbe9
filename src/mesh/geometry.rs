//! Geometric operations for surfaces, edges and load vectors

use crate::error::{AreaLoadError, Result};
use crate::mesh::types::{Point, Vec3};

/// Vectors shorter than this are treated as zero
pub const LENGTH_EPSILON: f64 = 1e-12;

/// Faces with less area than this are degenerate
pub const AREA_EPSILON: f64 = 1e-12;

/// Normalize a vector, rejecting zero-length and non-finite input
pub fn unit_vector(v: &Vec3, what: &str) -> Result<Vec3> {
    if !v.iter().all(|c| c.is_finite()) {
        return Err(AreaLoadError::InvalidDirection(format!(
            "{} has non-finite components ({}, {}, {})",
            what, v.x, v.y, v.z
        )));
    }

    let norm = v.norm();
    if norm < LENGTH_EPSILON {
        return Err(AreaLoadError::InvalidDirection(format!(
            "{} is zero-length",
            what
        )));
    }

    Ok(v / norm)
}

/// Compute the unit normal and area of a closed planar polygon
///
/// Uses Newell's method: the summed cross products of consecutive vertices
/// (taken relative to the first vertex) give a vector whose direction follows
/// the winding by the right-hand rule and whose length is twice the area.
pub fn compute_polygon_normal(vertices: &[Point]) -> Result<(Vec3, f64)> {
    if vertices.len() < 3 {
        return Err(AreaLoadError::DegenerateGeometry(format!(
            "polygon has {} vertices, at least 3 required",
            vertices.len()
        )));
    }

    let origin = vertices[0];
    let mut sum = Vec3::zeros();
    for i in 1..vertices.len() - 1 {
        let a = vertices[i] - origin;
        let b = vertices[i + 1] - origin;
        sum += a.cross(&b);
    }

    let area = sum.norm() / 2.0;
    if !area.is_finite() || area < AREA_EPSILON {
        return Err(AreaLoadError::DegenerateGeometry(
            "Degenerate face (zero area)".to_string(),
        ));
    }

    Ok((sum / (2.0 * area), area))
}

/// Compute the distance between two points
pub fn distance(p1: &Point, p2: &Point) -> f64 {
    (p2 - p1).norm()
}

/// Compute the signed distance from a point to a plane defined by a point and normal
/// Positive distance means the point is on the side the normal points to
pub fn signed_distance_to_plane(point: &Point, plane_point: &Point, plane_normal: &Vec3) -> f64 {
    let v = point - plane_point;
    v.dot(plane_normal)
}

/// Remove the component of `v` along the unit vector `normal`
pub fn project_onto_plane(v: &Vec3, normal: &Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

/// Compute the angle between two vectors in degrees
pub fn angle_between_vectors(v1: &Vec3, v2: &Vec3) -> f64 {
    let dot = v1.dot(v2);
    let norm_product = v1.norm() * v2.norm();

    if norm_product < LENGTH_EPSILON {
        return 0.0;
    }

    let cos_angle = (dot / norm_product).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Angle between two lines in degrees, ignoring orientation (0..=90)
pub fn angle_between_lines(v1: &Vec3, v2: &Vec3) -> f64 {
    let angle = angle_between_vectors(v1, v2);
    angle.min(180.0 - angle)
}

/// Distance from a point to the segment `a`-`b`
pub fn point_segment_distance(point: &Point, a: &Point, b: &Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < LENGTH_EPSILON * LENGTH_EPSILON {
        return distance(point, a);
    }

    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    distance(point, &(a + ab * t))
}

/// Orthonormal in-plane basis `(u, v)` for a unit normal, with `u x v = normal`
pub fn plane_basis(normal: &Vec3) -> (Vec3, Vec3) {
    // Seed with the global axis least aligned with the normal
    let seed = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
        Vec3::x()
    } else if normal.y.abs() <= normal.z.abs() {
        Vec3::y()
    } else {
        Vec3::z()
    };

    let u = project_onto_plane(&seed, normal).normalize();
    let v = normal.cross(&u);
    (u, v)
}

/// Test whether two 2D segments intersect, touching endpoints included
pub fn segments_intersect_2d(p1: (f64, f64), p2: (f64, f64), q1: (f64, f64), q2: (f64, f64)) -> bool {
    const EPS: f64 = 1e-12;

    fn orient(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
        (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
    }

    fn on_segment(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> bool {
        c.0 >= a.0.min(b.0) - EPS
            && c.0 <= a.0.max(b.0) + EPS
            && c.1 >= a.1.min(b.1) - EPS
            && c.1 <= a.1.max(b.1) + EPS
    }

    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    if ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
    {
        return true;
    }

    (d1.abs() <= EPS && on_segment(q1, q2, p1))
        || (d2.abs() <= EPS && on_segment(q1, q2, p2))
        || (d3.abs() <= EPS && on_segment(p1, p2, q1))
        || (d4.abs() <= EPS && on_segment(p1, p2, q2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_polygon_normal() {
        let (normal, area) = compute_polygon_normal(&make_square()).unwrap();

        // Counter-clockwise in XY gives +z
        assert_relative_eq!(normal.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(normal.y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(normal.z, 1.0, epsilon = 1e-10);
        assert_relative_eq!(area, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_polygon_normal_reversed_winding() {
        let mut square = make_square();
        square.reverse();
        let (normal, _) = compute_polygon_normal(&square).unwrap();
        assert_relative_eq!(normal.z, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_polygon_normal_collinear_is_degenerate() {
        let line = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
        ];
        assert!(matches!(
            compute_polygon_normal(&line),
            Err(AreaLoadError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_unit_vector_rejects_zero_and_nan() {
        assert!(matches!(
            unit_vector(&Vec3::zeros(), "direction"),
            Err(AreaLoadError::InvalidDirection(_))
        ));
        assert!(matches!(
            unit_vector(&Vec3::new(f64::NAN, 0.0, 1.0), "direction"),
            Err(AreaLoadError::InvalidDirection(_))
        ));

        let u = unit_vector(&Vec3::new(0.0, 3.0, 4.0), "direction").unwrap();
        assert_relative_eq!(u.y, 0.6, epsilon = 1e-12);
        assert_relative_eq!(u.z, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_signed_distance_to_plane() {
        let plane_point = Point::new(0.0, 0.0, 0.0);
        let plane_normal = Vec3::new(0.0, 0.0, 1.0);

        let point_above = Point::new(0.0, 0.0, 2.0);
        let point_below = Point::new(0.0, 0.0, -1.5);

        assert_relative_eq!(
            signed_distance_to_plane(&point_above, &plane_point, &plane_normal),
            2.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(
            signed_distance_to_plane(&point_below, &plane_point, &plane_normal),
            -1.5,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_angle_between_vectors() {
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);
        let v3 = Vec3::new(-1.0, 0.0, 0.0);

        assert_relative_eq!(angle_between_vectors(&v1, &v2), 90.0, epsilon = 1e-8);
        assert_relative_eq!(angle_between_vectors(&v1, &v3), 180.0, epsilon = 1e-8);
        assert_relative_eq!(angle_between_vectors(&v1, &v1), 0.0, epsilon = 1e-8);
        assert_relative_eq!(angle_between_lines(&v1, &v3), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(4.0, 0.0, 0.0);

        assert_relative_eq!(point_segment_distance(&Point::new(2.0, 3.0, 0.0), &a, &b), 3.0);
        assert_relative_eq!(point_segment_distance(&Point::new(7.0, 4.0, 0.0), &a, &b), 5.0);
        assert_relative_eq!(point_segment_distance(&Point::new(1.0, 0.0, 0.0), &a, &b), 0.0);
    }

    #[test]
    fn test_plane_basis_is_orthonormal() {
        let normal = Vec3::new(1.0, 2.0, 2.0).normalize();
        let (u, v) = plane_basis(&normal);

        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(u.dot(&normal), 0.0, epsilon = 1e-12);
        assert_relative_eq!(u.cross(&v).dot(&normal), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_segments_intersect_2d() {
        assert!(segments_intersect_2d((0.0, 0.0), (2.0, 2.0), (0.0, 2.0), (2.0, 0.0)));
        assert!(!segments_intersect_2d((0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)));
        // Shared endpoint counts as touching
        assert!(segments_intersect_2d((0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 1.0)));
    }
}

pub mod intersect_2d;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Projects a vector onto the horizontal (XY) plane and normalizes it.
///
/// Returns the zero vector when the horizontal component vanishes.
#[must_use]
pub fn horizontal(v: &Vector3) -> Vector3 {
    let flat = Vector3::new(v.x, v.y, 0.0);
    let len = flat.norm();
    if len < TOLERANCE {
        Vector3::zeros()
    } else {
        flat / len
    }
}

/// Left-hand (counter-clockwise) horizontal normal of a direction.
#[must_use]
pub fn left_normal(v: &Vector3) -> Vector3 {
    let h = horizontal(v);
    Vector3::new(-h.y, h.x, 0.0)
}

/// Rotates a vector counter-clockwise around the Z axis.
#[must_use]
pub fn rotate_z(v: &Vector3, degrees: f64) -> Vector3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vector3::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos, v.z)
}

/// Signed 2D cross product (Z component) of two vectors in the XY plane.
#[must_use]
pub fn cross_2d(a: &Vector3, b: &Vector3) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Absolute angle of a direction in the XY plane, in radians within `[0, 2π)`.
#[must_use]
pub fn absolute_angle(v: &Vector3) -> f64 {
    let angle = v.y.atan2(v.x);
    if angle < 0.0 {
        angle + std::f64::consts::TAU
    } else {
        angle
    }
}

/// Pitch of a direction against the horizontal plane, in degrees.
#[must_use]
pub fn pitch_degrees(v: &Vector3) -> f64 {
    let flat = (v.x * v.x + v.y * v.y).sqrt();
    v.z.atan2(flat).to_degrees()
}

/// Returns `true` if every component of the point is finite.
#[must_use]
pub fn is_finite(p: &Point3) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn left_normal_is_counter_clockwise() {
        let n = left_normal(&Vector3::new(1.0, 0.0, 0.3));
        assert_abs_diff_eq!(n.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(n.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rotate_quarter_turn() {
        let r = rotate_z(&Vector3::new(1.0, 0.0, 0.0), 90.0);
        assert_abs_diff_eq!(r.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn absolute_angle_wraps_negative() {
        let a = absolute_angle(&Vector3::new(0.0, -1.0, 0.0));
        assert_abs_diff_eq!(a, 1.5 * std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn pitch_of_rising_direction() {
        let p = pitch_degrees(&Vector3::new(1.0, 0.0, 1.0));
        assert_abs_diff_eq!(p, 45.0, epsilon = 1e-9);
    }
}

use crate::math::{Point3, Vector3};

use super::{Aabb, Curve};

/// A bounded straight segment from `start` to `end`.
///
/// The parametric form is: `P(t) = start + t * (end - start)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    start: Point3,
    end: Point3,
}

impl LineSegment {
    /// Creates a new segment between two points.
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Creates a segment from an origin, a direction and a length.
    #[must_use]
    pub fn from_ray(origin: Point3, direction: &Vector3, length: f64) -> Self {
        Self {
            start: origin,
            end: origin + direction * length,
        }
    }

    /// Returns the start point.
    #[must_use]
    pub fn start(&self) -> &Point3 {
        &self.start
    }

    /// Returns the end point.
    #[must_use]
    pub fn end(&self) -> &Point3 {
        &self.end
    }
}

impl Curve for LineSegment {
    fn position(&self, t: f64) -> Point3 {
        self.start + (self.end - self.start) * t
    }

    fn tangent(&self, _t: f64) -> Vector3 {
        self.end - self.start
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_points(&[self.start, self.end])
    }

    fn cut(&self, t0: f64, t1: f64) -> Self {
        Self {
            start: self.position(t0),
            end: self.position(t1),
        }
    }

    fn distance(&self, t0: f64, t1: f64) -> f64 {
        (self.end - self.start).norm() * (t1 - t0).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ray_endpoint() {
        let seg = LineSegment::from_ray(Point3::origin(), &Vector3::new(0.0, 1.0, 0.0), 3.0);
        assert_abs_diff_eq!(seg.end().y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn travel_is_linear() {
        let seg = LineSegment::new(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        assert_abs_diff_eq!(seg.travel(0.0, 2.5), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(seg.travel(0.0, 20.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn closest_t_projects_perpendicular() {
        let seg = LineSegment::new(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        let t = seg.closest_t(&Point3::new(4.0, 3.0, 0.0));
        assert_abs_diff_eq!(t, 0.4, epsilon = 1e-6);
    }
}

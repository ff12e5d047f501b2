use crate::math::{left_normal, Point3, Vector3, TOLERANCE};

use super::{Aabb, Curve};

/// A cubic Bézier curve in 3D space.
///
/// Control points `a` and `d` are the endpoints; `b` and `c` shape the
/// tangents: `P'(0) = 3 (b - a)` and `P'(1) = 3 (d - c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bezier {
    /// Start point.
    pub a: Point3,
    /// First control point.
    pub b: Point3,
    /// Second control point.
    pub c: Point3,
    /// End point.
    pub d: Point3,
}

impl Bezier {
    /// Creates a curve from its four control points.
    #[must_use]
    pub fn new(a: Point3, b: Point3, c: Point3, d: Point3) -> Self {
        Self { a, b, c, d }
    }

    /// Creates a curve from two endpoints and their directions.
    ///
    /// `start_dir` points from `start` into the curve and `end_dir` points
    /// from `end` back into the curve, so a straight curve has opposite
    /// directions. Both control points sit one third of the chord away from
    /// their endpoint.
    #[must_use]
    pub fn from_directions(
        start: Point3,
        start_dir: &Vector3,
        end: Point3,
        end_dir: &Vector3,
    ) -> Self {
        let chord = (end - start).norm() / 3.0;
        let start_dir = normalize_or_zero(start_dir);
        let end_dir = normalize_or_zero(end_dir);
        Self {
            a: start,
            b: start + start_dir * chord,
            c: end + end_dir * chord,
            d: end,
        }
    }

    /// Straight curve between two points with uniform parametrization.
    #[must_use]
    pub fn straight(start: Point3, end: Point3) -> Self {
        let dir = end - start;
        Self::from_directions(start, &dir, end, &(-dir))
    }

    /// The same curve traversed from `d` to `a`.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self {
            a: self.d,
            b: self.c,
            c: self.b,
            d: self.a,
        }
    }

    /// Curve running parallel to this one at `half_width` along the
    /// horizontal left normal; a negative width offsets to the right.
    ///
    /// Only the endpoints are offset exactly; the interior follows the
    /// endpoint tangents, which is exact for straight curves.
    #[must_use]
    pub fn offset(&self, half_width: f64) -> Self {
        let start_tangent = self.tangent(0.0);
        let end_tangent = self.tangent(1.0);
        let start = self.a + left_normal(&start_tangent) * half_width;
        let end = self.d + left_normal(&end_tangent) * half_width;
        Self::from_directions(start, &start_tangent, end, &(-end_tangent))
    }

    /// Total sampled length of the curve.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.distance(0.0, 1.0)
    }
}

impl Curve for Bezier {
    fn position(&self, t: f64) -> Point3 {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point3::from(self.a.coords * a + self.b.coords * b + self.c.coords * c + self.d.coords * d)
    }

    fn tangent(&self, t: f64) -> Vector3 {
        let mt = 1.0 - t;
        let ab = self.b - self.a;
        let bc = self.c - self.b;
        let cd = self.d - self.c;
        let tangent = (ab * (mt * mt) + bc * (2.0 * mt * t) + cd * (t * t)) * 3.0;
        if tangent.norm() < TOLERANCE {
            // Coincident control points: fall back to the chord.
            self.d - self.a
        } else {
            tangent
        }
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_points(&[self.a, self.b, self.c, self.d])
    }

    fn cut(&self, t0: f64, t1: f64) -> Self {
        let span = (t1 - t0) / 3.0;
        let a = self.position(t0);
        let d = self.position(t1);
        let raw0 = raw_derivative(self, t0);
        let raw1 = raw_derivative(self, t1);
        Self {
            a,
            b: a + raw0 * span,
            c: d - raw1 * span,
            d,
        }
    }
}

/// Exact polynomial derivative, without the degenerate-tangent fallback.
fn raw_derivative(curve: &Bezier, t: f64) -> Vector3 {
    let mt = 1.0 - t;
    let ab = curve.b - curve.a;
    let bc = curve.c - curve.b;
    let cd = curve.d - curve.c;
    (ab * (mt * mt) + bc * (2.0 * mt * t) + cd * (t * t)) * 3.0
}

fn normalize_or_zero(v: &Vector3) -> Vector3 {
    let len = v.norm();
    if len < TOLERANCE {
        Vector3::zeros()
    } else {
        v / len
    }
}

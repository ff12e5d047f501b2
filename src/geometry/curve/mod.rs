mod bezier;
mod line;

pub use bezier::Bezier;
pub use line::LineSegment;

use crate::math::Point3;

/// Number of chords used when measuring arc length.
const LENGTH_SAMPLES: u32 = 16;

/// Bisection steps used when inverting arc length.
const TRAVEL_DEPTH: u32 = 32;

/// Axis-aligned bounding box, compared in the horizontal plane only.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Smallest box containing all `points`.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Self {
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Self { min, max }
    }

    /// Whether the XY footprints of two boxes overlap, padded by `tolerance`.
    #[must_use]
    pub fn overlaps_xy(&self, other: &Self, tolerance: f64) -> bool {
        self.min.x <= other.max.x + tolerance
            && other.min.x <= self.max.x + tolerance
            && self.min.y <= other.max.y + tolerance
            && other.min.y <= self.max.y + tolerance
    }
}

/// Parametric curve over `t ∈ [0, 1]`.
///
/// Arc-length queries are sampled, so they are exact only for straight
/// curves with uniform parametrization.
pub trait Curve {
    /// Evaluates the curve at parameter `t`.
    fn position(&self, t: f64) -> Point3;

    /// Derivative of the curve at parameter `t` (not normalized).
    fn tangent(&self, t: f64) -> crate::math::Vector3;

    /// Bounding box of the curve's control polygon.
    fn bounds(&self) -> Aabb;

    /// Sub-curve covering `[t0, t1]` of this curve, reparametrized to `[0, 1]`.
    #[must_use]
    fn cut(&self, t0: f64, t1: f64) -> Self
    where
        Self: Sized;

    /// Sampled arc length between two parameters.
    fn distance(&self, t0: f64, t1: f64) -> f64 {
        let (from, to) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        if to - from < crate::math::TOLERANCE {
            return 0.0;
        }
        let step = (to - from) / f64::from(LENGTH_SAMPLES);
        let mut prev = self.position(from);
        let mut length = 0.0;
        for i in 1..=LENGTH_SAMPLES {
            let next = self.position(from + step * f64::from(i));
            length += (next - prev).norm();
            prev = next;
        }
        length
    }

    /// Parameter reached after travelling `distance` along the curve from `t0`.
    ///
    /// Clamped to `1.0` when the curve is shorter than `distance`.
    fn travel(&self, t0: f64, distance: f64) -> f64 {
        if distance <= 0.0 {
            return t0;
        }
        if self.distance(t0, 1.0) <= distance {
            return 1.0;
        }
        let mut lo = t0;
        let mut hi = 1.0;
        for _ in 0..TRAVEL_DEPTH {
            let mid = 0.5 * (lo + hi);
            if self.distance(t0, mid) < distance {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    /// Parameter of the point on the curve closest to `point`.
    fn closest_t(&self, point: &Point3) -> f64 {
        let n_samples = 32_u32;
        let mut best_t = 0.0;
        let mut best_dist = f64::INFINITY;
        for i in 0..=n_samples {
            let t = f64::from(i) / f64::from(n_samples);
            let d = (point - self.position(t)).norm();
            if d < best_dist {
                best_dist = d;
                best_t = t;
            }
        }

        // Refine with ternary search around the best sample.
        let dt = 1.0 / f64::from(n_samples);
        let mut lo = (best_t - dt).max(0.0);
        let mut hi = (best_t + dt).min(1.0);
        for _ in 0..60 {
            let mid1 = lo + (hi - lo) / 3.0;
            let mid2 = hi - (hi - lo) / 3.0;
            let d1 = (point - self.position(mid1)).norm();
            let d2 = (point - self.position(mid2)).norm();
            if d1 < d2 {
                hi = mid2;
            } else {
                lo = mid1;
            }
        }
        0.5 * (lo + hi)
    }
}

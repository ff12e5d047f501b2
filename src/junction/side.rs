use serde::{Deserialize, Serialize};

use crate::geometry::{intersect_single, Bezier, Curve, LineSegment};
use crate::math::{left_normal, rotate_z, Point3, Vector3};

/// Which curb of a segment end, looking from the node along the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideType {
    /// Counter-clockwise curb.
    Left,
    /// Clockwise curb.
    Right,
}

impl SideType {
    /// `1.0` for the left curb, `-1.0` for the right one.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }

    /// The curb on the other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// One curb line of a segment end and its valid parametric window.
///
/// Keeps `0 ≤ min_t ≤ t ≤ max_t ≤ 1` and `min_t ≤ default_t ≤ max_t`.
#[derive(Debug, Clone)]
pub struct SegmentSide {
    side: SideType,
    raw: Bezier,
    min_t: f64,
    max_t: f64,
    default_t: f64,
    t: f64,
}

impl SegmentSide {
    /// Creates a side with an unrestricted window.
    #[must_use]
    pub fn new(side: SideType, raw: Bezier) -> Self {
        Self {
            side,
            raw,
            min_t: 0.0,
            max_t: 1.0,
            default_t: 0.0,
            t: 0.0,
        }
    }

    /// Builds the curb of `centerline` at `half_width` on `side`.
    #[must_use]
    pub fn from_centerline(side: SideType, centerline: &Bezier, half_width: f64) -> Self {
        Self::new(side, centerline.offset(side.sign() * half_width))
    }

    #[must_use]
    pub fn side(&self) -> SideType {
        self.side
    }

    /// The untrimmed curb curve, starting at the node.
    #[must_use]
    pub fn raw(&self) -> &Bezier {
        &self.raw
    }

    #[must_use]
    pub fn min_t(&self) -> f64 {
        self.min_t
    }

    #[must_use]
    pub fn max_t(&self) -> f64 {
        self.max_t
    }

    #[must_use]
    pub fn default_t(&self) -> f64 {
        self.default_t
    }

    /// Currently chosen parameter.
    #[must_use]
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Corner point at the current parameter.
    #[must_use]
    pub fn position(&self) -> Point3 {
        self.raw.position(self.t)
    }

    /// Unit curb direction at the current parameter, pointing away from the node.
    #[must_use]
    pub fn direction(&self) -> Vector3 {
        self.raw.tangent(self.t).normalize()
    }

    /// Part of the curb that remains after trimming.
    #[must_use]
    pub fn trimmed(&self) -> Bezier {
        self.raw.cut(self.t, 1.0)
    }

    /// Replaces the curb curve and resets the window.
    pub fn reset(&mut self, raw: Bezier) {
        *self = Self::new(self.side, raw);
    }

    /// Stores the solved minimum and default, leaving the maximum open.
    pub fn set_limits(&mut self, min_t: f64, default_t: f64) {
        self.default_t = default_t;
        self.set_range(min_t, 1.0);
    }

    /// Restricts the window to `[min, max]`, clamping `t` and `default_t`.
    ///
    /// A maximum below the minimum collapses the window onto the minimum.
    /// Re-applying the same bounds leaves a valid `t` untouched.
    pub fn set_range(&mut self, min: f64, max: f64) {
        let min = min.clamp(0.0, 1.0);
        let max = max.clamp(0.0, 1.0).max(min);
        self.min_t = min;
        self.max_t = max;
        self.t = self.t.max(min).min(max);
        self.default_t = self.default_t.max(min).min(max);
    }

    /// Pins the window onto the current parameter.
    pub fn lock(&mut self) {
        let t = self.t.clamp(0.0, 1.0);
        self.default_t = t;
        self.set_range(t, t);
    }

    /// Sets `t`, clamped into the current window.
    pub fn set_t(&mut self, t: f64) {
        self.t = t.max(self.min_t).min(self.max_t);
    }

    /// Places the corner where a line through the centerline point at
    /// `offset_t`, rotated by `rotate` degrees counter-clockwise from the
    /// perpendicular, crosses this curb.
    ///
    /// Without a crossing the corner falls back to an end of the curb: the
    /// one the rotation tilts toward, or for no rotation the one nearer to
    /// `offset_t`.
    pub fn set_by_offset_and_rotation(
        &mut self,
        centerline: &Bezier,
        offset_t: f64,
        rotate: f64,
        probe_length: f64,
        depth: u32,
    ) {
        let origin = centerline.position(offset_t);
        let normal = left_normal(&centerline.tangent(offset_t)) * self.side.sign();
        let direction = rotate_z(&normal, rotate);
        let probe = LineSegment::from_ray(origin, &direction, probe_length);

        let t = match intersect_single(&self.raw, &probe, depth) {
            Some(hit) => hit.first_t,
            None => self.fallback_t(offset_t, rotate),
        };
        self.set_t(t);
    }

    fn fallback_t(&self, offset_t: f64, rotate: f64) -> f64 {
        if rotate.abs() < 1e-3 {
            if offset_t < 0.5 {
                0.0
            } else {
                1.0
            }
        } else {
            // A positive rotation turns the left probe back toward the node.
            let toward_node = (rotate > 0.0) == (self.side == SideType::Left);
            if toward_node {
                0.0
            } else {
                1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn east(length: f64) -> Bezier {
        Bezier::straight(Point3::origin(), Point3::new(length, 0.0, 0.0))
    }

    #[test]
    fn left_curb_is_counter_clockwise() {
        let side = SegmentSide::from_centerline(SideType::Left, &east(20.0), 3.0);
        assert_abs_diff_eq!(side.raw().position(0.5).y, 3.0, epsilon = 1e-12);
        let right = SegmentSide::from_centerline(SideType::Right, &east(20.0), 3.0);
        assert_abs_diff_eq!(right.raw().position(0.5).y, -3.0, epsilon = 1e-12);
    }

    #[test]
    fn set_range_clamps_and_is_idempotent() {
        let mut side = SegmentSide::from_centerline(SideType::Left, &east(20.0), 3.0);
        side.set_t(0.05);
        side.set_range(0.1, 0.8);
        assert_abs_diff_eq!(side.t(), 0.1);

        side.set_t(0.4);
        side.set_range(0.1, 0.8);
        side.set_range(0.1, 0.8);
        assert_abs_diff_eq!(side.t(), 0.4);
        assert!(side.min_t() <= side.default_t() && side.default_t() <= side.max_t());
    }

    #[test]
    fn inverted_range_collapses_to_min() {
        let mut side = SegmentSide::from_centerline(SideType::Left, &east(20.0), 3.0);
        side.set_t(0.9);
        side.set_range(0.6, 0.2);
        assert_abs_diff_eq!(side.min_t(), 0.6);
        assert_abs_diff_eq!(side.max_t(), 0.6);
        assert_abs_diff_eq!(side.t(), 0.6);
    }

    #[test]
    fn perpendicular_probe_hits_at_offset() {
        let line = east(20.0);
        let mut side = SegmentSide::from_centerline(SideType::Right, &line, 3.0);
        side.set_by_offset_and_rotation(&line, 0.25, 0.0, 24.0, 10);
        assert_abs_diff_eq!(side.t(), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn rotation_moves_corners_in_opposite_directions() {
        let line = east(20.0);
        let mut left = SegmentSide::from_centerline(SideType::Left, &line, 3.0);
        let mut right = SegmentSide::from_centerline(SideType::Right, &line, 3.0);
        left.set_by_offset_and_rotation(&line, 0.5, 45.0, 24.0, 10);
        right.set_by_offset_and_rotation(&line, 0.5, 45.0, 24.0, 10);
        // 45° shifts each corner by half-width along the curb.
        assert_abs_diff_eq!(left.position().x, 7.0, epsilon = 1e-6);
        assert_abs_diff_eq!(right.position().x, 13.0, epsilon = 1e-6);
    }

    #[test]
    fn extreme_rotation_falls_back_to_curb_end() {
        let line = east(4.0);
        let mut left = SegmentSide::from_centerline(SideType::Left, &line, 3.0);
        let mut right = SegmentSide::from_centerline(SideType::Right, &line, 3.0);
        left.set_by_offset_and_rotation(&line, 0.5, 80.0, 24.0, 10);
        right.set_by_offset_and_rotation(&line, 0.5, 80.0, 24.0, 10);
        assert_abs_diff_eq!(left.t(), 0.0);
        assert_abs_diff_eq!(right.t(), 1.0);
    }

    #[test]
    fn lock_pins_window() {
        let mut side = SegmentSide::from_centerline(SideType::Left, &east(20.0), 3.0);
        side.set_t(0.3);
        side.lock();
        assert_abs_diff_eq!(side.min_t(), 0.3);
        assert_abs_diff_eq!(side.max_t(), 0.3);
        side.set_t(0.9);
        assert_abs_diff_eq!(side.t(), 0.3);
    }
}

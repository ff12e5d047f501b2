use crate::config::SolverConfig;
use crate::geometry::{intersect_single, Curve, LineSegment};
use crate::math::{cross_2d, Point3, TOLERANCE};

use super::segment_end::{Claim, MaxLimitInput, SegmentEndGeometry, Window};
use super::side::SideType;
use super::style::NodeStyle;

/// Opposite directions with a dot product below this value pass straight through.
const STRAIGHT_DOT: f64 = -0.999;

/// Two-segment folds sharper than this angle also intersect like-sided curbs.
const FOLD_DOT: f64 = -0.75;
const FOLD_CROSS: f64 = 0.001;

/// Chord hits must exceed the current limit by this much to raise it.
const RAISE_EPSILON: f64 = 1e-9;

#[derive(Debug, Default, Clone, Copy)]
struct SideLimit {
    main: Option<f64>,
    additional: Option<f64>,
}

impl SideLimit {
    fn raise(&mut self, t: f64) {
        self.main = Some(self.main.map_or(t, |current| current.max(t)));
    }
}

/// Computes corner limits for the segment ends of one node.
#[derive(Debug, Clone, Copy)]
pub struct LimitSolver<'a> {
    config: &'a SolverConfig,
    style: NodeStyle,
}

impl<'a> LimitSolver<'a> {
    #[must_use]
    pub fn new(config: &'a SolverConfig, style: NodeStyle) -> Self {
        Self { config, style }
    }

    /// Stores minimum and default parameters on every side of `ends`.
    ///
    /// `ends` must be sorted by ascending absolute angle; neighbour `i + 1`
    /// pairs its right curb with the left curb of `i`.
    pub fn update_min_limits(&self, ends: &mut [SegmentEndGeometry]) {
        let count = ends.len();
        let mut left = vec![SideLimit::default(); count];
        let mut right = vec![SideLimit::default(); count];
        let pass_through = count == 2 && is_pass_through(&ends[0], &ends[1]);
        tracing::trace!(count, pass_through, style = ?self.style, "solving minimum limits");

        if pass_through {
            for limit in left.iter_mut().chain(right.iter_mut()) {
                limit.main = Some(0.0);
            }
        } else if count >= 2 {
            self.pair_limits(ends, &mut left, &mut right);
            if count >= 3 {
                self.chord_limits(ends, &mut left, &mut right);
            }
            self.additional_limits(ends, &mut left, &mut right);
        }

        // A straight pass-through has no corner to clear, only the style's own push.
        let extra = self.style.additional_offset();
        let push = if pass_through {
            extra
        } else {
            self.config.min_corner_offset.max(extra)
        };
        for (k, end) in ends.iter_mut().enumerate() {
            for (side_type, limit) in [(SideType::Left, left[k]), (SideType::Right, right[k])] {
                let nodeless = end.is_nodeless();
                let collision = end.collision();
                let side = end.side_mut(side_type);
                let mut min = limit.main.or(limit.additional).unwrap_or(0.0);
                let mut default = side.raw().travel(min, push);

                if nodeless {
                    min = limit.main.unwrap_or(0.0);
                    default = min;
                } else if !collision {
                    min = 0.0;
                }
                side.set_limits(min, default);
            }
        }
    }

    /// Step one: each adjacent pair intersects left curb `i` with right curb `j`.
    fn pair_limits(
        &self,
        ends: &[SegmentEndGeometry],
        left: &mut [SideLimit],
        right: &mut [SideLimit],
    ) {
        let count = ends.len();
        let depth = self.config.intersection_depth;
        for i in 0..count {
            let j = (i + 1) % count;
            let (a, b) = (&ends[i], &ends[j]);
            if !(a.collision() && b.collision()) {
                continue;
            }
            let Some(hit) = intersect_single(a.left().raw(), b.right().raw(), depth) else {
                continue;
            };
            left[i].raise(hit.first_t);
            right[j].raise(hit.second_t);

            if count == 2 && is_sharp_fold(a, b) {
                if let Some(hit) = intersect_single(a.left().raw(), b.left().raw(), depth) {
                    left[i].raise(hit.first_t);
                    left[j].raise(hit.second_t);
                }
                if let Some(hit) = intersect_single(b.right().raw(), a.right().raw(), depth) {
                    right[j].raise(hit.first_t);
                    right[i].raise(hit.second_t);
                }
            }
        }
    }

    /// Step two: the chord between the far corners of an end's two
    /// neighbours pushes both of its curbs past it, so the end cannot sit
    /// inside a corner its neighbours already fixed.
    fn chord_limits(
        &self,
        ends: &[SegmentEndGeometry],
        left: &mut [SideLimit],
        right: &mut [SideLimit],
    ) {
        let count = ends.len();
        let depth = self.config.intersection_depth;
        let found_left: Vec<Option<f64>> = left.iter().map(|limit| limit.main).collect();
        let found_right: Vec<Option<f64>> = right.iter().map(|limit| limit.main).collect();
        for k in 0..count {
            let end = &ends[k];
            if !end.collision() {
                continue;
            }
            let prev = (k + count - 1) % count;
            let next = (k + 1) % count;
            let start = corner_or_start(&ends[prev], SideType::Right, found_right[prev]);
            let finish = corner_or_start(&ends[next], SideType::Left, found_left[next]);
            if (finish - start).norm() < TOLERANCE {
                continue;
            }
            let chord = LineSegment::new(start, finish);

            for (side_type, limit) in [(SideType::Left, &mut left[k]), (SideType::Right, &mut right[k])] {
                if let Some(hit) = intersect_single(end.side(side_type).raw(), &chord, depth) {
                    if hit.first_t > limit.main.unwrap_or(0.0) + RAISE_EPSILON {
                        limit.main = Some(hit.first_t);
                    }
                }
            }
        }
    }

    /// Step four: sides still without a limit intersect a widened copy of
    /// their curb with the neighbour's raw curb.
    fn additional_limits(
        &self,
        ends: &[SegmentEndGeometry],
        left: &mut [SideLimit],
        right: &mut [SideLimit],
    ) {
        let count = ends.len();
        let depth = self.config.intersection_depth;
        let width = self.config.additional_width;
        for i in 0..count {
            let j = (i + 1) % count;
            let (a, b) = (&ends[i], &ends[j]);
            if left[i].main.is_none() {
                let widened = a.left().raw().offset(width);
                left[i].additional =
                    intersect_single(&widened, b.right().raw(), depth).map(|hit| hit.first_t);
            }
            if right[j].main.is_none() {
                let widened = b.right().raw().offset(-width);
                right[j].additional =
                    intersect_single(&widened, a.left().raw(), depth).map(|hit| hit.first_t);
            }
        }
    }

    /// Windows for the two ends of one segment, `a` at its start and `b` at
    /// its end.
    ///
    /// The centerlines run in opposite directions, so `a`'s left curb is the
    /// same road edge as `b`'s right curb.
    #[must_use]
    pub fn shared_limits(a: &MaxLimitInput, b: &MaxLimitInput) -> [[Window; 3]; 2] {
        let (main_a, main_b) = split(a.main, b.main);
        let (left_a, right_b) = split(a.left, b.right);
        let (right_a, left_b) = split(a.right, b.left);
        [[main_a, left_a, right_a], [main_b, left_b, right_b]]
    }
}

/// Splits one curve between two claims measured from opposite ends.
fn split(a: Claim, b: Claim) -> (Window, Window) {
    let min_sum = a.min + b.min;
    if min_sum > 1.0 {
        let (ma, mb) = (a.min / min_sum, b.min / min_sum);
        return (Window { min: ma, max: ma }, Window { min: mb, max: mb });
    }
    if a.t + b.t <= 1.0 {
        return (
            Window {
                min: a.min,
                max: 1.0 - b.t,
            },
            Window {
                min: b.min,
                max: 1.0 - a.t,
            },
        );
    }

    let sum = a.t + b.t;
    let (mut ma, mut mb) = (a.t / sum, b.t / sum);
    if ma < a.min {
        ma = a.min;
        mb = 1.0 - a.min;
    } else if mb < b.min {
        mb = b.min;
        ma = 1.0 - b.min;
    }
    (
        Window {
            min: a.min,
            max: ma,
        },
        Window {
            min: b.min,
            max: mb,
        },
    )
}

/// Whether two ends continue each other in a straight line.
#[must_use]
pub fn is_pass_through(a: &SegmentEndGeometry, b: &SegmentEndGeometry) -> bool {
    let (da, db) = (a.raw_direction(), b.raw_direction());
    if da.dot(&db) >= STRAIGHT_DOT {
        return false;
    }
    let offset = b.centerline().position(0.0) - a.centerline().position(0.0);
    cross_2d(&da, &offset).abs() < 1e-6
}

fn is_sharp_fold(a: &SegmentEndGeometry, b: &SegmentEndGeometry) -> bool {
    let (da, db) = (a.raw_direction(), b.raw_direction());
    cross_2d(&da, &db).abs() > FOLD_CROSS && da.dot(&db) < FOLD_DOT
}

/// Corner of one curb at its found limit, or the curb's start.
fn corner_or_start(end: &SegmentEndGeometry, side: SideType, limit: Option<f64>) -> Point3 {
    end.side(side).raw().position(limit.unwrap_or(0.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::junction::segment_end::SegmentEndId;
    use crate::math::{absolute_angle, Vector3};
    use crate::network::{NetworkSource, NetworkStore, NodeId};
    use approx::assert_abs_diff_eq;

    /// Straight arms of length 30 from the origin toward each direction.
    fn star(directions: &[Vector3], half_width: f64, style: NodeStyle) -> Vec<SegmentEndGeometry> {
        let mut store = NetworkStore::new();
        let center = store.add_node(Point3::origin());
        let mut ends: Vec<SegmentEndGeometry> = directions
            .iter()
            .map(|dir| {
                let far = store.add_node(Point3::origin() + dir.normalize() * 30.0);
                let segment = store.add_straight_segment(center, far, half_width).unwrap();
                end_of(&store, center, segment, style)
            })
            .collect();
        ends.sort_by(|a, b| a.angle().total_cmp(&b.angle()));
        ends
    }

    fn end_of(
        store: &NetworkStore,
        node: NodeId,
        segment: crate::network::SegmentId,
        style: NodeStyle,
    ) -> SegmentEndGeometry {
        let mut end = SegmentEndGeometry::new(SegmentEndId { segment, node }, style);
        end.calculate_main(store.segment(segment).unwrap()).unwrap();
        end.set_nodeless(style);
        end
    }

    fn cross() -> Vec<Vector3> {
        vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
        ]
    }

    #[test]
    fn four_way_limits_are_one_half_width() {
        let config = SolverConfig::default();
        let mut ends = star(&cross(), 3.0, NodeStyle::Custom);
        LimitSolver::new(&config, NodeStyle::Custom).update_min_limits(&mut ends);
        for end in &ends {
            for side in [end.left(), end.right()] {
                assert_abs_diff_eq!(side.min_t(), 0.1, epsilon = 1e-9);
                assert_abs_diff_eq!(side.default_t(), 0.1 + 0.5 / 30.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn straight_pass_through_has_no_limits() {
        let config = SolverConfig::default();
        let dirs = [Vector3::new(1.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0)];
        let mut ends = star(&dirs, 3.0, NodeStyle::Middle);
        assert!(is_pass_through(&ends[0], &ends[1]));
        LimitSolver::new(&config, NodeStyle::Middle).update_min_limits(&mut ends);
        for end in &ends {
            for side in [end.left(), end.right()] {
                assert_abs_diff_eq!(side.min_t(), 0.0);
                assert_abs_diff_eq!(side.default_t(), 0.0);
            }
        }
    }

    #[test]
    fn right_angle_bend_limits_inner_curbs() {
        let config = SolverConfig::default();
        let dirs = [Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)];
        let mut ends = star(&dirs, 3.0, NodeStyle::Bend);
        LimitSolver::new(&config, NodeStyle::Bend).update_min_limits(&mut ends);
        // The inner corner sits at (3, 3): east's left curb and north's right curb.
        assert_abs_diff_eq!(ends[0].left().min_t(), 0.1, epsilon = 1e-9);
        assert_abs_diff_eq!(ends[1].right().min_t(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn disabled_collision_uses_additional_fallback() {
        let config = SolverConfig::default();
        let mut ends = star(&cross(), 3.0, NodeStyle::Custom);
        assert_abs_diff_eq!(absolute_angle(&ends[0].raw_direction()), 0.0);
        ends[0].set_collision(false);
        LimitSolver::new(&config, NodeStyle::Custom).update_min_limits(&mut ends);

        assert_abs_diff_eq!(ends[0].left().min_t(), 0.0);
        assert_abs_diff_eq!(ends[0].right().min_t(), 0.0);
        // South's widened left curb meets east's right curb at (4, -3).
        assert_abs_diff_eq!(ends[3].left().min_t(), 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(ends[1].right().min_t(), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn uturn_pushes_default_further() {
        let config = SolverConfig::default();
        let dirs = [Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)];
        let mut ends = star(&dirs, 3.0, NodeStyle::UTurn);
        LimitSolver::new(&config, NodeStyle::UTurn).update_min_limits(&mut ends);
        assert_abs_diff_eq!(ends[0].left().default_t(), 0.1 + 8.0 / 30.0, epsilon = 1e-6);
    }

    /// Straight arms of length 30 given as `(degrees, half_width)`.
    fn fan(arms: &[(f64, f64)]) -> Vec<SegmentEndGeometry> {
        let mut store = NetworkStore::new();
        let center = store.add_node(Point3::origin());
        let mut ends: Vec<SegmentEndGeometry> = arms
            .iter()
            .map(|&(degrees, half_width)| {
                let rad = degrees.to_radians();
                let far = store.add_node(Point3::new(30.0 * rad.cos(), 30.0 * rad.sin(), 0.0));
                let segment = store.add_straight_segment(center, far, half_width).unwrap();
                end_of(&store, center, segment, NodeStyle::Custom)
            })
            .collect();
        ends.sort_by(|a, b| a.angle().total_cmp(&b.angle()));
        ends
    }

    #[test]
    fn neighbour_corners_push_recessed_end() {
        let config = SolverConfig::default();
        // Wide through road with two shallow arms; the narrow north arm sits
        // between corners fixed at y = 5 by its neighbours.
        let mut ends = fan(&[(0.0, 5.0), (20.0, 3.0), (90.0, 1.0), (160.0, 3.0), (180.0, 5.0)]);
        let north = &ends[2];
        let pair = intersect_single(
            ends[1].left().raw(),
            north.right().raw(),
            config.intersection_depth,
        )
        .unwrap();
        assert!(pair.second_t < 0.15);

        LimitSolver::new(&config, NodeStyle::Custom).update_min_limits(&mut ends);
        assert_abs_diff_eq!(ends[2].right().min_t(), 5.0 / 30.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ends[2].left().min_t(), 5.0 / 30.0, epsilon = 1e-6);
        // The neighbours keep their own pair corners.
        assert_abs_diff_eq!(ends[1].left().min_t(), pair.first_t, epsilon = 1e-9);
    }

    #[test]
    fn sharp_fold_intersects_like_sided_curbs() {
        let config = SolverConfig::default();
        let mut store = NetworkStore::new();
        let center = store.add_node(Point3::origin());
        let east = store.add_node(Point3::new(30.0, 0.0, 0.0));
        let hook = store.add_node(Point3::new(10.0, -10.0, 0.0));
        let straight = store.add_straight_segment(center, east, 2.0).unwrap();
        // Leaves at 150 degrees, then swings clockwise back across the east arm.
        let leave = Vector3::new(-(3.0_f64.sqrt()) / 2.0, 0.5, 0.0);
        let curved = store
            .add_segment(center, leave, hook, Vector3::new(0.0, 1.0, 0.0), 2.0)
            .unwrap();
        let mut ends = vec![
            end_of(&store, center, straight, NodeStyle::Bend),
            end_of(&store, center, curved, NodeStyle::Bend),
        ];
        ends.sort_by(|a, b| a.angle().total_cmp(&b.angle()));
        assert!(is_sharp_fold(&ends[0], &ends[1]));

        let (east_end, hook_end) = (&ends[0], &ends[1]);
        let depth = config.intersection_depth;
        let pair = intersect_single(hook_end.left().raw(), east_end.right().raw(), depth).unwrap();
        let fold = intersect_single(hook_end.right().raw(), east_end.right().raw(), depth).unwrap();
        assert!(fold.second_t > pair.second_t + 0.01);

        LimitSolver::new(&config, NodeStyle::Bend).update_min_limits(&mut ends);
        assert_abs_diff_eq!(ends[0].right().min_t(), fold.second_t, epsilon = 1e-6);
    }

    #[test]
    fn pass_through_crossing_pushes_default() {
        let config = SolverConfig::default();
        let dirs = [Vector3::new(1.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0)];
        let mut ends = star(&dirs, 3.0, NodeStyle::Crossing);
        LimitSolver::new(&config, NodeStyle::Crossing).update_min_limits(&mut ends);
        for end in &ends {
            for side in [end.left(), end.right()] {
                assert_abs_diff_eq!(side.min_t(), 0.0);
                assert_abs_diff_eq!(side.default_t(), 2.0 / 30.0, epsilon = 1e-6);
            }
        }
    }

    fn claim(t: f64, min: f64) -> Claim {
        Claim { t, min }
    }

    #[test]
    fn split_leaves_room_when_claims_fit() {
        let (a, b) = split(claim(0.2, 0.1), claim(0.3, 0.0));
        assert_abs_diff_eq!(a.max, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max, 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(a.min, 0.1);
    }

    #[test]
    fn split_is_proportional_when_claims_overlap() {
        let (a, b) = split(claim(0.9, 0.0), claim(0.3, 0.0));
        assert_abs_diff_eq!(a.max, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(b.max, 0.25, epsilon = 1e-12);
        assert!(a.max + b.max <= 1.0 + 1e-12);
    }

    #[test]
    fn split_respects_minimum() {
        let (a, b) = split(claim(0.9, 0.1), claim(0.9, 0.6));
        assert_abs_diff_eq!(b.max, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(a.max, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn split_shrinks_overlapping_minimums() {
        let (a, b) = split(claim(0.9, 0.9), claim(0.3, 0.3));
        assert_abs_diff_eq!(a.min, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(a.max, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(b.min, 0.25, epsilon = 1e-12);
    }
}

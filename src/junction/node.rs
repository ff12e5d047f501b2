use crate::config::SolverConfig;
use crate::error::{GeometryError, NetworkError, Result, SolverError};
use crate::geometry::Curve;
use crate::math::{horizontal, pitch_degrees, Point3, Vector3, TOLERANCE};
use crate::network::{NetworkSource, NodeId, NodeInfo, SegmentId};

use super::limits::{is_pass_through, LimitSolver};
use super::main_road::{MainRoad, MainRoadCandidate};
use super::segment_end::{
    CornerContext, CornerDelta, MainSlope, SegmentEndGeometry, SegmentEndId, SegmentEndMode,
};
use super::side::SideType;
use super::style::{Attribute, NodeShape, NodeStyle, SupportOption};

/// Most segments a supported node may have.
pub const MAX_SEGMENTS: usize = 8;

/// Half-widths closer than this count as one width.
const SAME_WIDTH_TOLERANCE: f64 = 1e-3;

/// Topological class of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Single segment.
    DeadEnd,
    /// Two segments continuing each other in a straight line.
    PassThrough,
    /// Two segments meeting at an angle.
    DirectionChange,
    /// Three or more segments.
    Junction,
}

impl NodeKind {
    #[must_use]
    pub fn from_shape(shape: NodeShape) -> Self {
        match shape.count {
            0 | 1 => Self::DeadEnd,
            2 if shape.is_straight => Self::PassThrough,
            2 => Self::DirectionChange,
            _ => Self::Junction,
        }
    }
}

/// Health of a managed node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeStatus {
    #[default]
    Ready,
    /// A calculation fault froze the node until its topology changes.
    Error,
}

/// What an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    /// Every segment end of the node.
    Node,
    /// One segment end.
    SegmentEnd(SegmentId),
}

impl EditTarget {
    fn name(self) -> &'static str {
        match self {
            Self::Node => "per node",
            Self::SegmentEnd(_) => "per segment end",
        }
    }
}

/// Solved shape of one junction together with its editable state.
#[derive(Debug, Clone)]
pub struct NodeGeometry {
    id: NodeId,
    position: Point3,
    style: NodeStyle,
    style_pinned: bool,
    shape: NodeShape,
    kind: NodeKind,
    main_road: MainRoad,
    ends: Vec<SegmentEndGeometry>,
    status: NodeStatus,
    centroid: Point3,
}

impl NodeGeometry {
    /// Builds the geometry of a supported node.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Unsupported`] if the solver does not handle the
    /// node's topology, or a geometry error for non-finite input.
    pub fn new<N: NetworkSource>(id: NodeId, network: &N) -> Result<Self> {
        let mut node = Self {
            id,
            position: Point3::origin(),
            style: NodeStyle::End,
            style_pinned: false,
            shape: NodeShape {
                count: 0,
                is_straight: false,
                same_width: true,
            },
            kind: NodeKind::DeadEnd,
            main_road: MainRoad::default(),
            ends: Vec::new(),
            status: NodeStatus::Ready,
            centroid: Point3::origin(),
        };
        node.sync(network)?;
        node.calculate_main(network)?;
        Ok(node)
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn position(&self) -> Point3 {
        self.position
    }

    #[must_use]
    pub fn style(&self) -> NodeStyle {
        self.style
    }

    #[must_use]
    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn main_road(&self) -> &MainRoad {
        &self.main_road
    }

    #[must_use]
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }

    /// Mean of all corner positions.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        self.centroid
    }

    /// Segment ends sorted by ascending absolute angle.
    #[must_use]
    pub fn ends(&self) -> &[SegmentEndGeometry] {
        &self.ends
    }

    pub(crate) fn ends_mut(&mut self) -> &mut Vec<SegmentEndGeometry> {
        &mut self.ends
    }

    #[must_use]
    pub fn segment_end(&self, segment: SegmentId) -> Option<&SegmentEndGeometry> {
        self.ends.iter().find(|end| end.segment() == segment)
    }

    fn end_mut(&mut self, segment: SegmentId) -> Result<&mut SegmentEndGeometry> {
        self.ends
            .iter_mut()
            .find(|end| end.segment() == segment)
            .ok_or_else(|| NetworkError::EntityNotFound("segment end".into()).into())
    }

    // --- Calculation phases ---

    /// Reconciles segment ends with the node's current segment list, keeping
    /// the parameters of segments that are still attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or unsupported.
    pub fn sync<N: NetworkSource>(&mut self, network: &N) -> Result<()> {
        let info = network
            .node(self.id)
            .ok_or_else(|| NetworkError::EntityNotFound("node".into()))?;
        check_supported(self.id, info, network)?;
        self.position = info.position;

        let mut ends = Vec::with_capacity(info.segments.len());
        for &segment in &info.segments {
            match self.ends.iter().position(|end| end.segment() == segment) {
                Some(index) => ends.push(self.ends.swap_remove(index)),
                None => {
                    let id = SegmentEndId {
                        segment,
                        node: self.id,
                    };
                    ends.push(SegmentEndGeometry::new(id, self.style));
                }
            }
        }
        self.ends = ends;
        Ok(())
    }

    /// Rebuilds raw geometry, sorts ends by angle, settles the style and
    /// refreshes the main road.
    ///
    /// # Errors
    ///
    /// Returns an error for missing segments or non-finite geometry.
    pub fn calculate_main<N: NetworkSource>(&mut self, network: &N) -> Result<()> {
        for end in &mut self.ends {
            let info = network
                .segment(end.segment())
                .ok_or_else(|| NetworkError::EntityNotFound("segment".into()))?;
            end.calculate_main(info)?;
        }
        self.ends.sort_by(|a, b| {
            a.angle()
                .total_cmp(&b.angle())
                .then_with(|| a.segment().cmp(&b.segment()))
        });

        self.shape = shape_of(&self.ends);
        self.kind = NodeKind::from_shape(self.shape);
        if !self.style_pinned {
            self.change_style(NodeStyle::default_for(self.shape));
        } else if !self.style.is_valid(self.shape) {
            let fallback = NodeStyle::default_for(self.shape);
            tracing::debug!(
                node = ?self.id,
                from = self.style.name(),
                to = fallback.name(),
                "style no longer valid, falling back"
            );
            self.style_pinned = false;
            self.change_style(fallback);
        }

        let candidates: Vec<MainRoadCandidate> = self
            .ends
            .iter()
            .map(|end| MainRoadCandidate {
                segment: end.segment(),
                direction: end.raw_direction(),
                width: 2.0 * end.half_width(),
            })
            .collect();
        self.main_road.update(&candidates);
        for end in &mut self.ends {
            end.set_nodeless(self.style);
        }
        Ok(())
    }

    /// Solves minimum limits and resolves every end's offset and rotation.
    ///
    /// # Errors
    ///
    /// Returns an error if an offset is not finite.
    pub fn update_min_limits(&mut self, config: &SolverConfig) -> Result<()> {
        LimitSolver::new(config, self.style).update_min_limits(&mut self.ends);
        for end in &mut self.ends {
            end.calculate_offset(config);
            if !end.main_t().is_finite() {
                return Err(GeometryError::NonFinite("segment end offset").into());
            }
        }
        Ok(())
    }

    /// Resolves corners, then the centroid.
    ///
    /// # Errors
    ///
    /// Returns an error if any corner is not finite.
    pub fn after_calculate(&mut self) -> Result<()> {
        let main_slope = self
            .main_road
            .first()
            .and_then(|segment| self.segment_end(segment))
            .map(|end| {
                let tangent = end.centerline().tangent(0.0);
                MainSlope {
                    direction: horizontal(&tangent),
                    slope: pitch_degrees(&tangent),
                }
            });
        for end in &mut self.ends {
            let context = CornerContext {
                is_main: self.main_road.contains(end.segment()),
                main_slope,
            };
            end.after_calculate(&context)?;
        }

        let corners: Vec<Point3> = self
            .ends
            .iter()
            .flat_map(|end| {
                [
                    end.corner(SideType::Left).position,
                    end.corner(SideType::Right).position,
                ]
            })
            .collect();
        if !corners.is_empty() {
            let sum = corners
                .iter()
                .fold(Vector3::zeros(), |acc, p| acc + p.coords);
            #[allow(clippy::cast_precision_loss)]
            let count = corners.len() as f64;
            self.centroid = Point3::from(sum / count);
        }
        Ok(())
    }

    // --- Editing ---

    /// Applies a style chosen by the user.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidStyle`] if the style does not fit the
    /// node's shape.
    pub fn set_style(&mut self, style: NodeStyle) -> Result<()> {
        if !style.is_valid(self.shape) {
            return Err(SolverError::InvalidStyle {
                style: style.name(),
            }
            .into());
        }
        self.style_pinned = true;
        self.change_style(style);
        Ok(())
    }

    /// Returns to the style picked from the node's shape.
    pub fn reset_style(&mut self) {
        self.style_pinned = false;
        self.change_style(NodeStyle::default_for(self.shape));
    }

    fn change_style(&mut self, style: NodeStyle) {
        if style == self.style {
            return;
        }
        let previous = std::mem::replace(&mut self.style, style);
        for end in &mut self.ends {
            if end.is_default(previous) {
                end.reset(style);
            } else {
                for attribute in Attribute::ALL {
                    if style.support(attribute) == SupportOption::None {
                        end.reset_attribute(attribute, style);
                    }
                }
            }
            end.set_nodeless(style);
        }
    }

    /// Pins the main road to two of the node's segments.
    ///
    /// # Errors
    ///
    /// Returns an error unless both segments are distinct ends of this node.
    pub fn set_main_road(&mut self, first: SegmentId, second: SegmentId) -> Result<()> {
        if first == second {
            return Err(SolverError::InvalidInput("main road needs two segments".into()).into());
        }
        if self.segment_end(first).is_none() || self.segment_end(second).is_none() {
            return Err(NetworkError::EntityNotFound("segment end".into()).into());
        }
        self.main_road.pin(first, second);
        Ok(())
    }

    /// Returns the main road to automatic selection.
    pub fn reset_main_road(&mut self) {
        self.main_road.unpin();
    }

    /// Sets a scalar attribute node-wide or on one segment end.
    ///
    /// Node-wide slope and twist of mirroring styles are negated on the
    /// second main segment, so the road stays continuous through the node.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is not a scalar, the value is not
    /// finite, or the style does not allow the edit on `target`.
    pub fn set_scalar(&mut self, target: EditTarget, attribute: Attribute, value: f64) -> Result<()> {
        if attribute.is_flag() || attribute == Attribute::CornerDelta {
            return Err(SolverError::InvalidInput(format!(
                "{} is not a scalar attribute",
                attribute.name()
            ))
            .into());
        }
        if !value.is_finite() {
            return Err(SolverError::InvalidInput(format!(
                "{} must be finite",
                attribute.name()
            ))
            .into());
        }
        self.check_support(target, attribute)?;

        match target {
            EditTarget::Node => {
                let mirrored = self.style.mirrors_main_road()
                    && matches!(attribute, Attribute::Slope | Attribute::Twist);
                let second = self.main_road.second();
                for end in &mut self.ends {
                    let value = if mirrored && Some(end.segment()) == second {
                        -value
                    } else {
                        value
                    };
                    apply_scalar(end, attribute, value);
                }
            }
            EditTarget::SegmentEnd(segment) => {
                apply_scalar(self.end_mut(segment)?, attribute, value);
            }
        }
        Ok(())
    }

    /// Sets a flag attribute node-wide or on one segment end.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is not a flag or the style does
    /// not allow the edit on `target`.
    pub fn set_flag(&mut self, target: EditTarget, attribute: Attribute, value: bool) -> Result<()> {
        if !attribute.is_flag() {
            return Err(SolverError::InvalidInput(format!(
                "{} is not a flag attribute",
                attribute.name()
            ))
            .into());
        }
        self.check_support(target, attribute)?;

        match target {
            EditTarget::Node => {
                for end in &mut self.ends {
                    apply_flag(end, attribute, value);
                }
            }
            EditTarget::SegmentEnd(segment) => apply_flag(self.end_mut(segment)?, attribute, value),
        }
        Ok(())
    }

    /// Switches one segment end's editing mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the style does not support the mode.
    pub fn set_mode(&mut self, segment: SegmentId, mode: SegmentEndMode) -> Result<()> {
        let required = match mode {
            SegmentEndMode::Flat => None,
            SegmentEndMode::Slope => Some(Attribute::Slope),
            SegmentEndMode::FreeForm => Some(Attribute::CornerDelta),
        };
        if let Some(attribute) = required {
            if self.style.support(attribute) == SupportOption::None {
                return Err(SolverError::NotEditable {
                    attribute: attribute.name(),
                    target: "as a mode",
                    style: self.style.name(),
                }
                .into());
            }
        }
        self.end_mut(segment)?.set_mode(mode);
        Ok(())
    }

    /// Sets one corner's free-form delta.
    ///
    /// # Errors
    ///
    /// Returns an error unless the style allows corner deltas and the end is
    /// in FreeForm mode.
    pub fn set_corner_delta(
        &mut self,
        segment: SegmentId,
        side: SideType,
        delta: CornerDelta,
    ) -> Result<()> {
        self.check_support(EditTarget::SegmentEnd(segment), Attribute::CornerDelta)?;
        let end = self.end_mut(segment)?;
        if end.mode() != SegmentEndMode::FreeForm {
            return Err(
                SolverError::InvalidInput("corner deltas need FreeForm mode".into()).into(),
            );
        }
        end.set_corner_delta(side, delta);
        Ok(())
    }

    /// Restores the automatic style, main road and every segment end default.
    pub fn reset_to_default(&mut self) {
        self.reset_style();
        self.main_road.unpin();
        let style = self.style;
        for end in &mut self.ends {
            end.reset(style);
            end.set_nodeless(style);
        }
    }

    /// Whether the node carries nothing but defaults.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.style == NodeStyle::default_for(self.shape)
            && self.main_road.is_auto()
            && self.ends.iter().all(|end| end.is_default(self.style))
    }

    fn check_support(&self, target: EditTarget, attribute: Attribute) -> Result<()> {
        let support = self.style.support(attribute);
        let allowed = match target {
            EditTarget::Node => support.group(),
            EditTarget::SegmentEnd(_) => support.individually(),
        };
        if allowed {
            Ok(())
        } else {
            Err(SolverError::NotEditable {
                attribute: attribute.name(),
                target: target.name(),
                style: self.style.name(),
            }
            .into())
        }
    }
}

fn apply_scalar(end: &mut SegmentEndGeometry, attribute: Attribute, value: f64) {
    match attribute {
        Attribute::Offset => end.set_offset(value),
        Attribute::Shift => end.set_shift(value),
        Attribute::Rotate => end.set_rotate(value),
        Attribute::Slope => end.set_slope(value),
        Attribute::Twist => end.set_twist(value),
        Attribute::Stretch => end.set_stretch(value),
        Attribute::DeltaHeight => end.set_delta_height(value),
        _ => {}
    }
}

fn apply_flag(end: &mut SegmentEndGeometry, attribute: Attribute, value: bool) {
    match attribute {
        Attribute::Collision => end.set_collision(value),
        Attribute::ForceNodeless => end.set_force_nodeless(value),
        Attribute::FollowMainSlope => end.set_follow_main_slope(value),
        Attribute::Marking => end.set_no_markings(!value),
        _ => {}
    }
}

/// Rejects topologies the solver does not handle.
fn check_supported<N: NetworkSource>(id: NodeId, info: &NodeInfo, network: &N) -> Result<()> {
    let unsupported = |reason: &str| -> Result<()> {
        Err(NetworkError::Unsupported(format!("{reason} at node {id:?}")).into())
    };
    if info.untouchable {
        return unsupported("untouchable node");
    }
    if info.segments.is_empty() {
        return unsupported("node without segments");
    }
    if info.segments.len() > MAX_SEGMENTS {
        return unsupported("too many segments");
    }
    for &segment in &info.segments {
        let Some(data) = network.segment(segment) else {
            return Err(NetworkError::EntityNotFound("segment".into()).into());
        };
        if data.untouchable {
            return unsupported("untouchable segment");
        }
        if data.start_node == data.end_node {
            return unsupported("loop segment");
        }
        if data.chord_length() < TOLERANCE {
            return unsupported("zero-length segment");
        }
        if data.half_width.is_nan() || data.half_width <= 0.0 {
            return unsupported("segment without width");
        }
    }
    Ok(())
}

fn shape_of(ends: &[SegmentEndGeometry]) -> NodeShape {
    let is_straight = ends.len() == 2 && is_pass_through(&ends[0], &ends[1]);
    let same_width = ends.windows(2).all(|pair| {
        (pair[0].half_width() - pair[1].half_width()).abs() < SAME_WIDTH_TOLERANCE
    });
    NodeShape {
        count: ends.len(),
        is_straight,
        same_width,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::NodeshapeError;
    use crate::network::NetworkStore;
    use approx::assert_abs_diff_eq;

    /// Node at the origin with straight arms of length 30.
    fn star(arms: &[(Vector3, f64)]) -> (NetworkStore, NodeId, Vec<SegmentId>) {
        let mut store = NetworkStore::new();
        let center = store.add_node(Point3::origin());
        let segments = arms
            .iter()
            .map(|(dir, half_width)| {
                let far = store.add_node(Point3::origin() + dir.normalize() * 30.0);
                store.add_straight_segment(center, far, *half_width).unwrap()
            })
            .collect();
        (store, center, segments)
    }

    fn solve(node: &mut NodeGeometry) {
        node.update_min_limits(&SolverConfig::default()).unwrap();
        node.after_calculate().unwrap();
    }

    #[test]
    fn straight_equal_widths_become_middle() {
        let (store, id, _) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
        ]);
        let mut node = NodeGeometry::new(id, &store).unwrap();
        solve(&mut node);
        assert_eq!(node.style(), NodeStyle::Middle);
        assert_eq!(node.kind(), NodeKind::PassThrough);
        for end in node.ends() {
            assert_abs_diff_eq!(end.default_offset(), 0.0, epsilon = 1e-9);
            assert!(end.is_nodeless());
        }
        assert!(node.is_default());
    }

    #[test]
    fn straight_styles_push_their_extra_offset() {
        let (store, id, _) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
        ]);
        for (style, expected) in [(NodeStyle::Crossing, 2.0), (NodeStyle::UTurn, 8.0)] {
            let mut node = NodeGeometry::new(id, &store).unwrap();
            node.set_style(style).unwrap();
            solve(&mut node);
            for end in node.ends() {
                assert_abs_diff_eq!(end.default_offset(), expected, epsilon = 1e-6);
                assert_abs_diff_eq!(end.offset(), expected, epsilon = 1e-6);
                assert_abs_diff_eq!(end.min_offset(), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn width_change_becomes_bend() {
        let (store, id, _) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 5.0),
        ]);
        let node = NodeGeometry::new(id, &store).unwrap();
        assert_eq!(node.style(), NodeStyle::Bend);
        assert_eq!(node.kind(), NodeKind::PassThrough);
    }

    #[test]
    fn invalid_style_is_rejected() {
        let (store, id, _) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(0.0, 1.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
        ]);
        let mut node = NodeGeometry::new(id, &store).unwrap();
        assert_eq!(node.kind(), NodeKind::Junction);
        let err = node.set_style(NodeStyle::Crossing).unwrap_err();
        assert!(matches!(
            err,
            NodeshapeError::Solver(SolverError::InvalidStyle { .. })
        ));
        assert_eq!(node.style(), NodeStyle::Custom);
    }

    #[test]
    fn unsupported_edit_is_rejected() {
        let (store, id, segments) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
        ]);
        let mut node = NodeGeometry::new(id, &store).unwrap();
        let err = node
            .set_scalar(EditTarget::SegmentEnd(segments[0]), Attribute::Offset, 4.0)
            .unwrap_err();
        assert!(matches!(
            err,
            NodeshapeError::Solver(SolverError::NotEditable { .. })
        ));
        assert!(node
            .set_flag(EditTarget::Node, Attribute::Collision, false)
            .is_err());
    }

    #[test]
    fn middle_mirrors_slope_onto_second_main() {
        let (store, id, _) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
        ]);
        let mut node = NodeGeometry::new(id, &store).unwrap();
        node.set_scalar(EditTarget::Node, Attribute::Slope, 4.0).unwrap();
        let first = node.main_road().first().unwrap();
        let second = node.main_road().second().unwrap();
        assert_abs_diff_eq!(node.segment_end(first).unwrap().params().slope, 4.0);
        assert_abs_diff_eq!(node.segment_end(second).unwrap().params().slope, -4.0);
    }

    #[test]
    fn through_road_is_main_at_t_junction() {
        let (store, id, segments) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(0.0, 1.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
        ]);
        let node = NodeGeometry::new(id, &store).unwrap();
        assert!(node.main_road().contains(segments[0]));
        assert!(node.main_road().contains(segments[2]));
    }

    #[test]
    fn main_road_pin_is_validated() {
        let (store, id, segments) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(0.0, 1.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
        ]);
        let mut node = NodeGeometry::new(id, &store).unwrap();
        assert!(node.set_main_road(segments[0], segments[0]).is_err());
        node.set_main_road(segments[0], segments[1]).unwrap();
        assert!(!node.main_road().is_auto());
        assert!(!node.is_default());
    }

    #[test]
    fn corner_delta_requires_free_form() {
        let (store, id, segments) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(0.0, 1.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
        ]);
        let mut node = NodeGeometry::new(id, &store).unwrap();
        let delta = CornerDelta::new(Vector3::new(0.0, 0.0, 0.5), Vector3::zeros());
        assert!(node
            .set_corner_delta(segments[1], SideType::Left, delta)
            .is_err());
        node.set_mode(segments[1], SegmentEndMode::FreeForm).unwrap();
        node.set_corner_delta(segments[1], SideType::Left, delta).unwrap();
        solve(&mut node);
        let end = node.segment_end(segments[1]).unwrap();
        assert_abs_diff_eq!(end.corner(SideType::Left).position.z, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn centroid_of_symmetric_cross_is_center() {
        let (store, id, _) = star(&[
            (Vector3::new(1.0, 0.0, 0.0), 3.0),
            (Vector3::new(0.0, 1.0, 0.0), 3.0),
            (Vector3::new(-1.0, 0.0, 0.0), 3.0),
            (Vector3::new(0.0, -1.0, 0.0), 3.0),
        ]);
        let mut node = NodeGeometry::new(id, &store).unwrap();
        solve(&mut node);
        assert_abs_diff_eq!(node.centroid().coords.norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn untouchable_node_is_unsupported() {
        let (mut store, id, _) = star(&[(Vector3::new(1.0, 0.0, 0.0), 3.0)]);
        store.node_mut(id).unwrap().untouchable = true;
        let err = NodeGeometry::new(id, &store).unwrap_err();
        assert!(matches!(
            err,
            NodeshapeError::Network(NetworkError::Unsupported(_))
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::error::{GeometryError, Result};
use crate::geometry::{Bezier, Curve};
use crate::math::{
    absolute_angle, horizontal, is_finite, left_normal, pitch_degrees, Point3, Vector3,
    TOLERANCE,
};
use crate::network::{NodeId, SegmentId, SegmentInfo};

use super::side::{SegmentSide, SideType};
use super::style::{Attribute, NodeStyle};

/// Largest rotate, slope and twist angle, in degrees.
pub const MAX_ANGLE: f64 = 89.0;

/// Stretch ratio bounds.
pub const MIN_STRETCH: f64 = 0.01;
pub const MAX_STRETCH: f64 = 5.0;

/// How the corners of a segment end are shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentEndMode {
    /// Corners stay level; slope is ignored.
    #[default]
    Flat,
    /// Corners follow the slope and twist angles.
    Slope,
    /// Each corner carries its own 3D position and direction delta.
    FreeForm,
}

/// Identifies the approach of one segment into one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentEndId {
    pub segment: SegmentId,
    pub node: NodeId,
}

/// Corner displacement in the segment end's local frame:
/// `x` along the segment, `y` to the left, `z` up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CornerDelta {
    pub position: Vector3,
    pub direction: Vector3,
}

impl CornerDelta {
    #[must_use]
    pub fn new(position: Vector3, direction: Vector3) -> Self {
        Self {
            position,
            direction,
        }
    }

    /// Whether every component is within `tolerance` of zero.
    #[must_use]
    pub fn is_zero(&self, tolerance: f64) -> bool {
        self.position.amax() < tolerance && self.direction.amax() < tolerance
    }
}

/// Scalar shape parameters of a segment end. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    pub offset: f64,
    pub rotate: f64,
    pub slope: f64,
    pub twist: f64,
    pub shift: f64,
    pub stretch: f64,
    pub delta_height: f64,
}

impl ShapeParams {
    /// Style defaults.
    #[must_use]
    pub fn new(style: NodeStyle) -> Self {
        Self {
            offset: style.default_value(Attribute::Offset),
            rotate: style.default_value(Attribute::Rotate),
            slope: style.default_value(Attribute::Slope),
            twist: style.default_value(Attribute::Twist),
            shift: style.default_value(Attribute::Shift),
            stretch: style.default_value(Attribute::Stretch),
            delta_height: style.default_value(Attribute::DeltaHeight),
        }
    }
}

/// Corner deltas `[left, right]` equivalent to the scalar parameters.
///
/// Left and right are mirrored: rotation, stretch and twist move them in
/// opposite directions, shift and slope move them together.
#[must_use]
pub fn deltas_from_params(params: &ShapeParams, half_width: f64) -> [CornerDelta; 2] {
    let w = half_width;
    let s = params.stretch;
    let rotate = params.rotate.to_radians().tan();
    let twist = params.twist.to_radians().tan();
    let slope = params.slope.to_radians().tan();
    let direction = Vector3::new(0.0, 0.0, slope);

    [
        CornerDelta::new(
            Vector3::new(-w * rotate, w * (s - 1.0) + params.shift, w * s * twist),
            direction,
        ),
        CornerDelta::new(
            Vector3::new(w * rotate, -w * (s - 1.0) + params.shift, -w * s * twist),
            direction,
        ),
    ]
}

/// Inverse of [`deltas_from_params`]; `offset` and `delta_height` are taken
/// from `base`.
#[must_use]
pub fn params_from_deltas(
    left: &CornerDelta,
    right: &CornerDelta,
    half_width: f64,
    base: &ShapeParams,
) -> ShapeParams {
    let w = half_width;
    if w < TOLERANCE {
        return *base;
    }
    let (l, r) = (&left.position, &right.position);
    let stretch = 1.0 + (l.y - r.y) / (2.0 * w);
    let scaled = w * stretch;
    let twist = if scaled.abs() < TOLERANCE {
        0.0
    } else {
        ((l.z - r.z) / (2.0 * scaled)).atan().to_degrees()
    };

    ShapeParams {
        offset: base.offset,
        rotate: ((r.x - l.x) / (2.0 * w)).atan().to_degrees(),
        slope: (0.5 * (left.direction.z + right.direction.z))
            .atan()
            .to_degrees(),
        twist,
        shift: 0.5 * (l.y + r.y),
        stretch,
        delta_height: base.delta_height,
    }
}

/// Resolved corner of a segment end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub position: Point3,
    pub direction: Vector3,
}

impl Default for Corner {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            direction: Vector3::x(),
        }
    }
}

/// Slope reference taken from the node's main road.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MainSlope {
    pub direction: Vector3,
    pub slope: f64,
}

/// Node-level inputs of [`SegmentEndGeometry::after_calculate`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct CornerContext {
    pub is_main: bool,
    pub main_slope: Option<MainSlope>,
}

/// Parametric window `[min, max]` produced by the max-limit pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub min: f64,
    pub max: f64,
}

/// Current parameter and minimum of one curve, read by the max-limit pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Claim {
    pub t: f64,
    pub min: f64,
}

/// Snapshot of a segment end read by the max-limit pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxLimitInput {
    pub main: Claim,
    pub left: Claim,
    pub right: Claim,
}

/// Geometry and editable parameters of one segment's approach into one node.
#[derive(Debug, Clone)]
pub struct SegmentEndGeometry {
    id: SegmentEndId,
    is_start: bool,

    mode: SegmentEndMode,
    params: ShapeParams,
    keep_default: bool,
    collision: bool,
    force_nodeless: bool,
    follow_main_slope: bool,
    no_markings: bool,
    left_delta: CornerDelta,
    right_delta: CornerDelta,

    nodeless: bool,
    centerline: Bezier,
    half_width: f64,
    angle: f64,
    left: SegmentSide,
    right: SegmentSide,

    min_main_t: f64,
    max_main_t: f64,
    default_main_t: f64,
    main_t: f64,

    position: Point3,
    direction: Vector3,
    left_corner: Corner,
    right_corner: Corner,
    vehicle_twist: f64,
}

impl SegmentEndGeometry {
    /// Creates a segment end with the style's default parameters.
    #[must_use]
    pub fn new(id: SegmentEndId, style: NodeStyle) -> Self {
        let placeholder = Bezier::straight(Point3::origin(), Point3::origin());
        Self {
            id,
            is_start: true,
            mode: SegmentEndMode::Flat,
            params: ShapeParams::new(style),
            keep_default: true,
            collision: style.default_flag(Attribute::Collision),
            force_nodeless: style.default_flag(Attribute::ForceNodeless),
            follow_main_slope: style.default_flag(Attribute::FollowMainSlope),
            no_markings: !style.default_flag(Attribute::Marking),
            left_delta: CornerDelta::default(),
            right_delta: CornerDelta::default(),
            nodeless: style.is_nodeless(),
            centerline: placeholder,
            half_width: 0.0,
            angle: 0.0,
            left: SegmentSide::new(SideType::Left, placeholder),
            right: SegmentSide::new(SideType::Right, placeholder),
            min_main_t: 0.0,
            max_main_t: 1.0,
            default_main_t: 0.0,
            main_t: 0.0,
            position: Point3::origin(),
            direction: Vector3::x(),
            left_corner: Corner::default(),
            right_corner: Corner::default(),
            vehicle_twist: 0.0,
        }
    }

    // --- Identity and raw geometry ---

    #[must_use]
    pub fn id(&self) -> SegmentEndId {
        self.id
    }

    #[must_use]
    pub fn segment(&self) -> SegmentId {
        self.id.segment
    }

    /// Whether the node sits at the start of the segment.
    #[must_use]
    pub fn is_start(&self) -> bool {
        self.is_start
    }

    /// Raw centerline, starting at the node.
    #[must_use]
    pub fn centerline(&self) -> &Bezier {
        &self.centerline
    }

    #[must_use]
    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    /// Absolute angle of the outgoing tangent, in radians.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Horizontal unit direction leaving the node.
    #[must_use]
    pub fn raw_direction(&self) -> Vector3 {
        horizontal(&self.centerline.tangent(0.0))
    }

    #[must_use]
    pub fn side(&self, side: SideType) -> &SegmentSide {
        match side {
            SideType::Left => &self.left,
            SideType::Right => &self.right,
        }
    }

    pub(crate) fn side_mut(&mut self, side: SideType) -> &mut SegmentSide {
        match side {
            SideType::Left => &mut self.left,
            SideType::Right => &mut self.right,
        }
    }

    #[must_use]
    pub fn left(&self) -> &SegmentSide {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &SegmentSide {
        &self.right
    }

    // --- Parameters ---

    #[must_use]
    pub fn mode(&self) -> SegmentEndMode {
        self.mode
    }

    /// Live scalar parameters; derived from the corner deltas in FreeForm mode.
    #[must_use]
    pub fn params(&self) -> ShapeParams {
        if self.mode == SegmentEndMode::FreeForm {
            params_from_deltas(
                &self.left_delta,
                &self.right_delta,
                self.half_width,
                &self.params,
            )
        } else {
            self.params
        }
    }

    /// Whether the offset follows the solved default.
    #[must_use]
    pub fn keeps_default(&self) -> bool {
        self.keep_default
    }

    #[must_use]
    pub fn collision(&self) -> bool {
        self.collision
    }

    #[must_use]
    pub fn force_nodeless(&self) -> bool {
        self.force_nodeless
    }

    #[must_use]
    pub fn follow_main_slope(&self) -> bool {
        self.follow_main_slope
    }

    #[must_use]
    pub fn no_markings(&self) -> bool {
        self.no_markings
    }

    /// Whether the end is drawn without a node mesh and left untrimmed.
    #[must_use]
    pub fn is_nodeless(&self) -> bool {
        self.nodeless
    }

    #[must_use]
    pub fn corner_delta(&self, side: SideType) -> CornerDelta {
        match side {
            SideType::Left => self.left_delta,
            SideType::Right => self.right_delta,
        }
    }

    // --- Setters ---

    /// Sets the offset in metres from the node and stops following the default.
    pub fn set_offset(&mut self, offset: f64) {
        self.keep_default = false;
        self.params.offset = offset.max(0.0);
    }

    /// Makes the offset follow the solved default again.
    pub fn reset_offset(&mut self) {
        self.keep_default = true;
    }

    pub fn set_rotate(&mut self, degrees: f64) {
        self.update_params(|p| p.rotate = degrees.clamp(-MAX_ANGLE, MAX_ANGLE));
    }

    pub fn set_slope(&mut self, degrees: f64) {
        self.update_params(|p| p.slope = degrees.clamp(-MAX_ANGLE, MAX_ANGLE));
    }

    pub fn set_twist(&mut self, degrees: f64) {
        self.update_params(|p| p.twist = degrees.clamp(-MAX_ANGLE, MAX_ANGLE));
    }

    pub fn set_shift(&mut self, shift: f64) {
        self.update_params(|p| p.shift = shift);
    }

    pub fn set_stretch(&mut self, ratio: f64) {
        self.update_params(|p| p.stretch = ratio.clamp(MIN_STRETCH, MAX_STRETCH));
    }

    pub fn set_delta_height(&mut self, height: f64) {
        self.params.delta_height = height;
    }

    pub fn set_collision(&mut self, collision: bool) {
        self.collision = collision;
    }

    pub fn set_force_nodeless(&mut self, force: bool) {
        self.force_nodeless = force;
    }

    pub fn set_follow_main_slope(&mut self, follow: bool) {
        self.follow_main_slope = follow;
    }

    pub fn set_no_markings(&mut self, no_markings: bool) {
        self.no_markings = no_markings;
    }

    /// Switches the editing mode, converting between scalar parameters and
    /// corner deltas so that a round trip restores the scalars.
    pub fn set_mode(&mut self, mode: SegmentEndMode) {
        let free_form = SegmentEndMode::FreeForm;
        if mode == free_form && self.mode != free_form {
            [self.left_delta, self.right_delta] = deltas_from_params(&self.params, self.half_width);
        } else if mode != free_form && self.mode == free_form {
            self.params = self.params();
        }
        self.mode = mode;
    }

    /// Sets the mode without converting parameters.
    pub(crate) fn restore_mode(&mut self, mode: SegmentEndMode) {
        self.mode = mode;
    }

    pub fn set_corner_delta(&mut self, side: SideType, delta: CornerDelta) {
        match side {
            SideType::Left => self.left_delta = delta,
            SideType::Right => self.right_delta = delta,
        }
    }

    /// Restores every parameter to the style's defaults.
    pub fn reset(&mut self, style: NodeStyle) {
        let id = self.id;
        let geometry = (
            self.is_start,
            self.centerline,
            self.half_width,
            self.angle,
            self.left.clone(),
            self.right.clone(),
        );
        *self = Self::new(id, style);
        (
            self.is_start,
            self.centerline,
            self.half_width,
            self.angle,
            self.left,
            self.right,
        ) = geometry;
    }

    /// Restores one attribute to the style's default.
    pub(crate) fn reset_attribute(&mut self, attribute: Attribute, style: NodeStyle) {
        let value = style.default_value(attribute);
        let flag = style.default_flag(attribute);
        match attribute {
            Attribute::Offset => self.reset_offset(),
            Attribute::Rotate => self.set_rotate(value),
            Attribute::Slope => self.set_slope(value),
            Attribute::Twist => self.set_twist(value),
            Attribute::Shift => self.set_shift(value),
            Attribute::Stretch => self.set_stretch(value),
            Attribute::DeltaHeight => self.set_delta_height(value),
            Attribute::Collision => self.collision = flag,
            Attribute::ForceNodeless => self.force_nodeless = flag,
            Attribute::FollowMainSlope => self.follow_main_slope = flag,
            Attribute::Marking => self.no_markings = !flag,
            Attribute::CornerDelta => {
                if self.mode == SegmentEndMode::FreeForm {
                    self.set_mode(SegmentEndMode::Flat);
                }
                self.left_delta = CornerDelta::default();
                self.right_delta = CornerDelta::default();
            }
        }
    }

    fn update_params(&mut self, edit: impl FnOnce(&mut ShapeParams)) {
        if self.mode == SegmentEndMode::FreeForm {
            let mut params = self.params();
            edit(&mut params);
            [self.left_delta, self.right_delta] = deltas_from_params(&params, self.half_width);
        } else {
            edit(&mut self.params);
        }
    }

    pub(crate) fn set_nodeless(&mut self, style: NodeStyle) {
        self.nodeless = style.is_nodeless() || self.force_nodeless;
    }

    // --- Solved values ---

    /// Parameter of the corner line on the centerline.
    #[must_use]
    pub fn main_t(&self) -> f64 {
        self.main_t
    }

    #[must_use]
    pub fn min_main_t(&self) -> f64 {
        self.min_main_t
    }

    #[must_use]
    pub fn max_main_t(&self) -> f64 {
        self.max_main_t
    }

    /// Effective offset in metres along the centerline.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.centerline.distance(0.0, self.main_t)
    }

    #[must_use]
    pub fn min_offset(&self) -> f64 {
        self.centerline.distance(0.0, self.min_main_t)
    }

    #[must_use]
    pub fn max_offset(&self) -> f64 {
        self.centerline.distance(0.0, self.max_main_t)
    }

    #[must_use]
    pub fn default_offset(&self) -> f64 {
        self.centerline.distance(0.0, self.default_main_t)
    }

    #[must_use]
    pub fn position(&self) -> Point3 {
        self.position
    }

    #[must_use]
    pub fn direction(&self) -> Vector3 {
        self.direction
    }

    #[must_use]
    pub fn corner(&self, side: SideType) -> Corner {
        match side {
            SideType::Left => self.left_corner,
            SideType::Right => self.right_corner,
        }
    }

    /// Horizontal distance between the two corners.
    #[must_use]
    pub fn width(&self) -> f64 {
        let d = self.left_corner.position - self.right_corner.position;
        (d.x * d.x + d.y * d.y).sqrt()
    }

    /// Twist applied to vehicles crossing the corner line, in degrees.
    #[must_use]
    pub fn vehicle_twist(&self) -> f64 {
        self.vehicle_twist
    }

    /// Whether every live value matches the style's defaults.
    #[must_use]
    pub fn is_default(&self, style: NodeStyle) -> bool {
        let near = |attribute: Attribute, value: f64| {
            (value - style.default_value(attribute)).abs() < attribute.default_tolerance()
        };
        let params = self.params();
        let offset_default = self.keep_default
            || (self.params.offset - self.default_offset()).abs()
                < Attribute::Offset.default_tolerance();

        offset_default
            && self.mode == SegmentEndMode::Flat
            && near(Attribute::Rotate, params.rotate)
            && near(Attribute::Slope, params.slope)
            && near(Attribute::Twist, params.twist)
            && near(Attribute::Shift, params.shift)
            && near(Attribute::Stretch, params.stretch)
            && near(Attribute::DeltaHeight, params.delta_height)
            && self.collision == style.default_flag(Attribute::Collision)
            && self.force_nodeless == style.default_flag(Attribute::ForceNodeless)
            && self.follow_main_slope == style.default_flag(Attribute::FollowMainSlope)
            && self.no_markings != style.default_flag(Attribute::Marking)
    }

    // --- Calculation phases ---

    /// Rebuilds the centerline and curbs from the host segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment yields non-finite geometry.
    pub fn calculate_main(&mut self, segment: &SegmentInfo) -> Result<()> {
        self.is_start = segment.is_start(self.id.node);
        self.centerline = segment.trajectory_from(self.id.node);
        self.half_width = segment.half_width;

        let points = [
            self.centerline.a,
            self.centerline.b,
            self.centerline.c,
            self.centerline.d,
        ];
        if !points.iter().all(is_finite) || !self.half_width.is_finite() {
            return Err(GeometryError::NonFinite("segment centerline").into());
        }

        self.angle = absolute_angle(&self.centerline.tangent(0.0));
        self.left = SegmentSide::from_centerline(SideType::Left, &self.centerline, self.half_width);
        self.right =
            SegmentSide::from_centerline(SideType::Right, &self.centerline, self.half_width);
        self.min_main_t = 0.0;
        self.max_main_t = 1.0;
        self.default_main_t = 0.0;
        self.main_t = 0.0;
        Ok(())
    }

    /// Resolves offset and rotation into side parameters, once the sides
    /// carry their solved minimum and default.
    pub fn calculate_offset(&mut self, config: &SolverConfig) {
        let free_form = self.mode == SegmentEndMode::FreeForm;

        self.min_main_t = if free_form {
            0.0
        } else {
            self.project_to_main(SideType::Left, self.left.min_t())
                .max(self.project_to_main(SideType::Right, self.right.min_t()))
        };
        self.default_main_t = self
            .project_to_main(SideType::Left, self.left.default_t())
            .max(self.project_to_main(SideType::Right, self.right.default_t()))
            .max(self.min_main_t);
        self.max_main_t = self
            .centerline
            .travel(0.0, config.max_offset)
            .max(self.min_main_t);
        self.default_main_t = self.default_main_t.min(self.max_main_t);

        let target = if self.keep_default {
            self.default_main_t
        } else {
            self.centerline.travel(0.0, self.params.offset)
        };
        self.main_t = target.max(self.min_main_t).min(self.max_main_t);

        if free_form {
            self.left.set_range(0.0, 1.0);
            self.right.set_range(0.0, 1.0);
        }
        self.place_sides(config);
    }

    /// Places both corners through the centerline point at `main_t`.
    ///
    /// FreeForm corners sit square to the centerline and stay pinned there;
    /// their shape comes from the corner deltas instead.
    fn place_sides(&mut self, config: &SolverConfig) {
        let probe = config.probe_length * self.half_width.max(1.0);
        let depth = config.intersection_depth;
        let (centerline, main_t) = (self.centerline, self.main_t);
        let free_form = self.mode == SegmentEndMode::FreeForm;
        let rotate = if free_form { 0.0 } else { self.params.rotate };
        for side in [&mut self.left, &mut self.right] {
            side.set_by_offset_and_rotation(&centerline, main_t, rotate, probe, depth);
            if free_form {
                side.lock();
            }
        }
    }

    fn project_to_main(&self, side: SideType, t: f64) -> f64 {
        if t <= 0.0 {
            0.0
        } else {
            let point = self.side(side).raw().position(t);
            self.centerline.closest_t(&point)
        }
    }

    /// Snapshot read by the max-limit pass.
    #[must_use]
    pub fn max_limit_input(&self) -> MaxLimitInput {
        // Pinned FreeForm corners may still give way to the other end.
        let free_form = self.mode == SegmentEndMode::FreeForm;
        let claim = |side: &SegmentSide| Claim {
            t: side.t(),
            min: if free_form { 0.0 } else { side.min_t() },
        };
        MaxLimitInput {
            main: Claim {
                t: self.main_t,
                min: self.min_main_t,
            },
            left: claim(&self.left),
            right: claim(&self.right),
        }
    }

    /// Applies windows computed by the max-limit pass and places the corners
    /// again through the clamped `main_t`.
    pub fn apply_max_limits(
        &mut self,
        main: Window,
        left: Window,
        right: Window,
        config: &SolverConfig,
    ) {
        self.min_main_t = main.min;
        self.max_main_t = self.max_main_t.min(main.max).max(main.min);
        self.main_t = self.main_t.max(self.min_main_t).min(self.max_main_t);
        self.default_main_t = self.default_main_t.max(self.min_main_t).min(self.max_main_t);
        self.left.set_range(left.min, left.max);
        self.right.set_range(right.min, right.max);
        self.place_sides(config);
    }

    /// Resolves position, direction and corners for consumers.
    ///
    /// # Errors
    ///
    /// Returns an error if the result is not finite.
    pub(crate) fn after_calculate(&mut self, context: &CornerContext) -> Result<()> {
        let forward = horizontal(&self.centerline.tangent(self.main_t));
        let lateral = left_normal(&forward);
        let up = Vector3::z();
        let params = self.params();
        let slope = self.effective_slope(&params, context, &forward);
        let rise = slope.to_radians().tan();

        self.position = self.centerline.position(self.main_t)
            + lateral * params.shift
            + up * params.delta_height;
        self.direction = (forward + up * rise).normalize();

        for side_type in [SideType::Left, SideType::Right] {
            let side = self.side(side_type);
            let base = side.position();
            let curb = horizontal(&side.direction());
            let corner = if self.mode == SegmentEndMode::FreeForm {
                let delta = self.corner_delta(side_type);
                let d = delta.position;
                let dd = delta.direction;
                Corner {
                    position: base
                        + forward * d.x
                        + lateral * d.y
                        + up * (d.z + params.delta_height),
                    direction: (curb + forward * dd.x + lateral * dd.y + up * dd.z).normalize(),
                }
            } else {
                let sign = side_type.sign();
                let w = self.half_width;
                let spread = sign * w * (params.stretch - 1.0) + params.shift;
                let lift = sign * w * params.stretch * params.twist.to_radians().tan()
                    + params.delta_height;
                Corner {
                    position: base + lateral * spread + up * lift,
                    direction: (curb + up * rise).normalize(),
                }
            };
            match side_type {
                SideType::Left => self.left_corner = corner,
                SideType::Right => self.right_corner = corner,
            }
        }
        self.vehicle_twist = params.twist;

        let finite = is_finite(&self.position)
            && is_finite(&self.left_corner.position)
            && is_finite(&self.right_corner.position);
        if finite {
            Ok(())
        } else {
            Err(GeometryError::NonFinite("segment end corners").into())
        }
    }

    fn effective_slope(
        &self,
        params: &ShapeParams,
        context: &CornerContext,
        forward: &Vector3,
    ) -> f64 {
        match self.mode {
            SegmentEndMode::Flat => 0.0,
            SegmentEndMode::FreeForm => params.slope,
            SegmentEndMode::Slope if self.follow_main_slope => {
                if context.is_main {
                    pitch_degrees(&self.centerline.tangent(0.0))
                } else if let Some(main) = context.main_slope {
                    (forward.dot(&main.direction) * main.slope.to_radians().tan())
                        .atan()
                        .to_degrees()
                } else {
                    params.slope
                }
            }
            SegmentEndMode::Slope => params.slope,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::network::{NetworkSource, NetworkStore};
    use approx::assert_abs_diff_eq;

    fn single_end() -> (NetworkStore, SegmentEndGeometry) {
        let mut store = NetworkStore::new();
        let a = store.add_node(Point3::new(0.0, 0.0, 0.0));
        let b = store.add_node(Point3::new(40.0, 0.0, 0.0));
        let s = store.add_straight_segment(a, b, 4.0).unwrap();
        let id = SegmentEndId { segment: s, node: a };
        let mut end = SegmentEndGeometry::new(id, NodeStyle::End);
        end.calculate_main(store.segment(s).unwrap()).unwrap();
        (store, end)
    }

    fn sample_params() -> ShapeParams {
        ShapeParams {
            offset: 3.0,
            rotate: 20.0,
            slope: 5.0,
            twist: -7.0,
            shift: 0.4,
            stretch: 1.3,
            delta_height: 0.2,
        }
    }

    #[test]
    fn delta_conversion_round_trips() {
        let params = sample_params();
        let [left, right] = deltas_from_params(&params, 4.0);
        let back = params_from_deltas(&left, &right, 4.0, &params);
        assert_abs_diff_eq!(back.rotate, params.rotate, epsilon = 1e-9);
        assert_abs_diff_eq!(back.slope, params.slope, epsilon = 1e-9);
        assert_abs_diff_eq!(back.twist, params.twist, epsilon = 1e-9);
        assert_abs_diff_eq!(back.shift, params.shift, epsilon = 1e-9);
        assert_abs_diff_eq!(back.stretch, params.stretch, epsilon = 1e-9);
    }

    #[test]
    fn deltas_are_mirrored() {
        let [left, right] = deltas_from_params(&sample_params(), 4.0);
        assert_abs_diff_eq!(left.position.x, -right.position.x, epsilon = 1e-12);
        assert_abs_diff_eq!(left.position.z, -right.position.z, epsilon = 1e-12);
        assert_abs_diff_eq!(left.direction.z, right.direction.z, epsilon = 1e-12);
    }

    #[test]
    fn calculate_main_builds_curbs() {
        let (_, end) = single_end();
        assert!(end.is_start());
        assert_abs_diff_eq!(end.left().raw().position(0.0).y, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(end.right().raw().position(0.0).y, -4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(end.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn offset_places_both_corners() {
        let (_, mut end) = single_end();
        end.set_offset(10.0);
        end.calculate_offset(&SolverConfig::default());
        assert_abs_diff_eq!(end.offset(), 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(end.left().position().x, 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(end.right().position().x, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn flat_mode_ignores_slope() {
        let (_, mut end) = single_end();
        end.set_slope(10.0);
        end.calculate_offset(&SolverConfig::default());
        let context = CornerContext {
            is_main: false,
            main_slope: None,
        };
        end.after_calculate(&context).unwrap();
        assert_abs_diff_eq!(end.direction().z, 0.0, epsilon = 1e-12);

        end.set_mode(SegmentEndMode::Slope);
        end.after_calculate(&context).unwrap();
        assert!(end.direction().z > 0.0);
    }

    #[test]
    fn free_form_matches_rotated_flat_corners() {
        let (_, mut end) = single_end();
        end.set_offset(10.0);
        end.set_rotate(30.0);
        let context = CornerContext {
            is_main: false,
            main_slope: None,
        };
        end.calculate_offset(&SolverConfig::default());
        end.after_calculate(&context).unwrap();
        let flat_left = end.corner(SideType::Left).position;

        end.set_mode(SegmentEndMode::FreeForm);
        end.calculate_offset(&SolverConfig::default());
        end.after_calculate(&context).unwrap();
        let free_left = end.corner(SideType::Left).position;
        assert_abs_diff_eq!((flat_left - free_left).norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn scalar_edit_in_free_form_updates_deltas() {
        let (_, mut end) = single_end();
        end.set_mode(SegmentEndMode::FreeForm);
        end.set_shift(1.5);
        assert_abs_diff_eq!(end.params().shift, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(end.corner_delta(SideType::Left).position.y, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn reset_keeps_geometry() {
        let (_, mut end) = single_end();
        end.set_rotate(12.0);
        end.set_collision(false);
        end.reset(NodeStyle::End);
        assert!(end.is_default(NodeStyle::End));
        assert_abs_diff_eq!(end.half_width(), 4.0);
    }
}

use serde::{Deserialize, Serialize};

use crate::math::Vector3;
use crate::network::SegmentId;

use super::node::NodeGeometry;
use super::segment_end::{CornerDelta, SegmentEndGeometry, SegmentEndMode};
use super::side::SideType;
use super::style::{Attribute, NodeStyle, SupportOption};

/// Saved state of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    #[serde(rename = "T", default, skip_serializing_if = "Option::is_none")]
    pub style: Option<NodeStyle>,
    #[serde(rename = "MR", default, skip_serializing_if = "Option::is_none")]
    pub main_road: Option<[SegmentId; 2]>,
    #[serde(rename = "E", default, skip_serializing_if = "Vec::is_empty")]
    pub ends: Vec<SegmentEndState>,
}

/// Saved state of one segment end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEndState {
    #[serde(rename = "Id")]
    pub segment: SegmentId,
    #[serde(rename = "O", default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    #[serde(rename = "RA", default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    #[serde(rename = "SA", default, skip_serializing_if = "Option::is_none")]
    pub slope: Option<f64>,
    #[serde(rename = "TA", default, skip_serializing_if = "Option::is_none")]
    pub twist: Option<f64>,
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<f64>,
    #[serde(rename = "ST", default, skip_serializing_if = "Option::is_none")]
    pub stretch: Option<f64>,
    #[serde(rename = "DH", default, skip_serializing_if = "Option::is_none")]
    pub delta_height: Option<f64>,
    #[serde(rename = "M", default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SegmentEndMode>,
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub collision: Option<bool>,
    #[serde(rename = "FNL", default, skip_serializing_if = "Option::is_none")]
    pub force_nodeless: Option<bool>,
    #[serde(rename = "FS", default, skip_serializing_if = "Option::is_none")]
    pub follow_main_slope: Option<bool>,
    #[serde(rename = "NM", default, skip_serializing_if = "Option::is_none")]
    pub no_markings: Option<bool>,
    #[serde(rename = "KD", default, skip_serializing_if = "Option::is_none")]
    pub keep_default: Option<bool>,
    #[serde(rename = "LP", default, skip_serializing_if = "Option::is_none")]
    pub left_position: Option<[f64; 3]>,
    #[serde(rename = "LD", default, skip_serializing_if = "Option::is_none")]
    pub left_direction: Option<[f64; 3]>,
    #[serde(rename = "RP", default, skip_serializing_if = "Option::is_none")]
    pub right_position: Option<[f64; 3]>,
    #[serde(rename = "RD", default, skip_serializing_if = "Option::is_none")]
    pub right_direction: Option<[f64; 3]>,
}

impl NodeState {
    /// Reads the persistable values of `node`.
    #[must_use]
    pub fn capture(node: &NodeGeometry) -> Self {
        let style = node.style();
        let road = node.main_road();
        Self {
            style: (style != NodeStyle::default_for(node.shape())).then_some(style),
            main_road: if road.is_auto() {
                None
            } else {
                road.first().zip(road.second()).map(|(a, b)| [a, b])
            },
            ends: node
                .ends()
                .iter()
                .map(|end| SegmentEndState::capture(end, style))
                .filter(|state| !state.is_empty())
                .collect(),
        }
    }

    /// Restores the saved values onto `node`.
    ///
    /// Entries that no longer fit the node are skipped with a warning.
    pub fn apply(&self, node: &mut NodeGeometry) {
        if let Some(style) = self.style {
            if let Err(error) = node.set_style(style) {
                tracing::warn!(node = ?node.id(), %error, "ignoring saved style");
            }
        }
        if let Some([first, second]) = self.main_road {
            if let Err(error) = node.set_main_road(first, second) {
                tracing::warn!(node = ?node.id(), %error, "ignoring saved main road");
            }
        }

        let style = node.style();
        let id = node.id();
        for state in &self.ends {
            let end = node
                .ends_mut()
                .iter_mut()
                .find(|end| end.segment() == state.segment);
            match end {
                Some(end) => state.apply(end, style),
                None => tracing::warn!(node = ?id, segment = ?state.segment, "saved segment end is gone"),
            }
        }
    }
}

impl SegmentEndState {
    fn empty(segment: SegmentId) -> Self {
        Self {
            segment,
            offset: None,
            rotate: None,
            slope: None,
            twist: None,
            shift: None,
            stretch: None,
            delta_height: None,
            mode: None,
            collision: None,
            force_nodeless: None,
            follow_main_slope: None,
            no_markings: None,
            keep_default: None,
            left_position: None,
            left_direction: None,
            right_position: None,
            right_direction: None,
        }
    }

    /// Whether nothing differs from the defaults.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::empty(self.segment)
    }

    /// Reads the values of `end` that differ from `style`'s defaults.
    #[must_use]
    pub fn capture(end: &SegmentEndGeometry, style: NodeStyle) -> Self {
        let params = end.params();
        let scalar = |attribute: Attribute, value: f64| {
            let delta = (value - style.default_value(attribute)).abs();
            (delta >= attribute.default_tolerance()).then_some(value)
        };
        let flag = |attribute: Attribute, value: bool| {
            (value != style.default_flag(attribute)).then_some(value)
        };
        let component = |v: Vector3| {
            (v.amax() >= Attribute::CornerDelta.default_tolerance()).then_some([v.x, v.y, v.z])
        };
        let free_form = end.mode() == SegmentEndMode::FreeForm;
        let scalar_unless_free = |attribute: Attribute, value: f64| {
            if free_form {
                None
            } else {
                scalar(attribute, value)
            }
        };

        let mut state = Self::empty(end.segment());
        if !end.keeps_default() {
            state.offset = Some(params.offset);
            state.keep_default = Some(false);
        }
        state.rotate = scalar_unless_free(Attribute::Rotate, params.rotate);
        state.slope = scalar_unless_free(Attribute::Slope, params.slope);
        state.twist = scalar_unless_free(Attribute::Twist, params.twist);
        state.shift = scalar_unless_free(Attribute::Shift, params.shift);
        state.stretch = scalar_unless_free(Attribute::Stretch, params.stretch);
        state.delta_height = scalar(Attribute::DeltaHeight, params.delta_height);
        state.mode = (end.mode() != SegmentEndMode::Flat).then_some(end.mode());
        state.collision = flag(Attribute::Collision, end.collision());
        state.force_nodeless = flag(Attribute::ForceNodeless, end.force_nodeless());
        state.follow_main_slope = flag(Attribute::FollowMainSlope, end.follow_main_slope());
        state.no_markings = flag(Attribute::Marking, !end.no_markings()).map(|marking| !marking);

        if free_form {
            let left = end.corner_delta(SideType::Left);
            let right = end.corner_delta(SideType::Right);
            state.left_position = component(left.position);
            state.left_direction = component(left.direction);
            state.right_position = component(right.position);
            state.right_direction = component(right.direction);
        }
        state
    }

    /// Writes the saved values onto `end`, skipping attributes `style` does
    /// not support.
    pub fn apply(&self, end: &mut SegmentEndGeometry, style: NodeStyle) {
        let supported = |attribute: Attribute| style.support(attribute) != SupportOption::None;
        end.reset(style);

        if self.keep_default == Some(false) || self.offset.is_some() {
            if supported(Attribute::Offset) {
                end.set_offset(self.offset.unwrap_or(style.default_value(Attribute::Offset)));
            }
        }
        let scalars: [(Attribute, Option<f64>, fn(&mut SegmentEndGeometry, f64)); 6] = [
            (Attribute::Rotate, self.rotate, SegmentEndGeometry::set_rotate),
            (Attribute::Slope, self.slope, SegmentEndGeometry::set_slope),
            (Attribute::Twist, self.twist, SegmentEndGeometry::set_twist),
            (Attribute::Shift, self.shift, SegmentEndGeometry::set_shift),
            (Attribute::Stretch, self.stretch, SegmentEndGeometry::set_stretch),
            (Attribute::DeltaHeight, self.delta_height, SegmentEndGeometry::set_delta_height),
        ];
        for (attribute, value, set) in scalars {
            if let Some(value) = value.filter(|v| v.is_finite()) {
                if supported(attribute) {
                    set(end, value);
                }
            }
        }

        let flags: [(Attribute, Option<bool>, fn(&mut SegmentEndGeometry, bool)); 4] = [
            (Attribute::Collision, self.collision, SegmentEndGeometry::set_collision),
            (Attribute::ForceNodeless, self.force_nodeless, SegmentEndGeometry::set_force_nodeless),
            (
                Attribute::FollowMainSlope,
                self.follow_main_slope,
                SegmentEndGeometry::set_follow_main_slope,
            ),
            (Attribute::Marking, self.no_markings, SegmentEndGeometry::set_no_markings),
        ];
        for (attribute, value, set) in flags {
            if let Some(value) = value {
                if supported(attribute) {
                    set(end, value);
                }
            }
        }

        match self.mode {
            Some(SegmentEndMode::FreeForm) if supported(Attribute::CornerDelta) => {
                end.restore_mode(SegmentEndMode::FreeForm);
                let vector = |v: Option<[f64; 3]>| v.map(Vector3::from).unwrap_or_default();
                end.set_corner_delta(
                    SideType::Left,
                    CornerDelta::new(vector(self.left_position), vector(self.left_direction)),
                );
                end.set_corner_delta(
                    SideType::Right,
                    CornerDelta::new(vector(self.right_position), vector(self.right_direction)),
                );
            }
            Some(SegmentEndMode::Slope) if supported(Attribute::Slope) => {
                end.restore_mode(SegmentEndMode::Slope);
            }
            _ => {}
        }
    }
}

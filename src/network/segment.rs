use crate::geometry::Bezier;
use crate::math::{Point3, Vector3};

use super::node::NodeId;

slotmap::new_key_type! {
    /// Unique identifier for a segment in the network store.
    pub struct SegmentId;
}

/// Host-side data of a segment.
///
/// Both directions point from their endpoint into the segment, so a straight
/// segment has opposite start and end directions.
#[derive(Debug, Clone)]
pub struct SegmentInfo {
    /// Node at the start of the segment.
    pub start_node: NodeId,
    /// Node at the end of the segment.
    pub end_node: NodeId,
    /// Centerline start point.
    pub start_position: Point3,
    /// Centerline direction at the start.
    pub start_direction: Vector3,
    /// Centerline end point.
    pub end_position: Point3,
    /// Centerline direction at the end.
    pub end_direction: Vector3,
    /// Half of the segment's width.
    pub half_width: f64,
    /// Host flag forbidding any reshaping of this segment.
    pub untouchable: bool,
}

impl SegmentInfo {
    /// Whether `node` is the start node of this segment.
    #[must_use]
    pub fn is_start(&self, node: NodeId) -> bool {
        self.start_node == node
    }

    /// The node at the other end of the segment.
    #[must_use]
    pub fn other_node(&self, node: NodeId) -> NodeId {
        if self.is_start(node) {
            self.end_node
        } else {
            self.start_node
        }
    }

    /// Centerline oriented away from `node`: `t = 0` sits at `node`.
    #[must_use]
    pub fn trajectory_from(&self, node: NodeId) -> Bezier {
        if self.is_start(node) {
            Bezier::from_directions(
                self.start_position,
                &self.start_direction,
                self.end_position,
                &self.end_direction,
            )
        } else {
            Bezier::from_directions(
                self.end_position,
                &self.end_direction,
                self.start_position,
                &self.start_direction,
            )
        }
    }

    /// Chord length between the two endpoints.
    #[must_use]
    pub fn chord_length(&self) -> f64 {
        (self.end_position - self.start_position).norm()
    }
}

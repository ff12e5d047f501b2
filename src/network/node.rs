use crate::math::Point3;

use super::segment::SegmentId;

slotmap::new_key_type! {
    /// Unique identifier for a node in the network store.
    pub struct NodeId;
}

/// Host-side data of a junction.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Position of the junction.
    pub position: Point3,
    /// Incident segments, in the order the host lists them.
    pub segments: Vec<SegmentId>,
    /// Host flag forbidding any reshaping of this node.
    pub untouchable: bool,
}

impl NodeInfo {
    /// Creates a node without segments.
    #[must_use]
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            segments: Vec::new(),
            untouchable: false,
        }
    }
}

pub mod node;
pub mod segment;

pub use node::{NodeId, NodeInfo};
pub use segment::{SegmentId, SegmentInfo};

use crate::error::NetworkError;
use crate::math::{Point3, Vector3};
use slotmap::SlotMap;

/// Read access to the host's road network.
///
/// The solver never mutates the network; it only reads centerlines and
/// incident segment lists.
pub trait NetworkSource {
    /// Returns the segment data, if the segment exists.
    fn segment(&self, id: SegmentId) -> Option<&SegmentInfo>;

    /// Returns the node data, if the node exists.
    fn node(&self, id: NodeId) -> Option<&NodeInfo>;
}

/// Arena that owns nodes and segments of a road network.
///
/// Entities reference each other via typed IDs (generational indices); the
/// null key of each ID type is never a valid entry.
#[derive(Debug, Default)]
pub struct NetworkStore {
    nodes: SlotMap<NodeId, NodeInfo>,
    segments: SlotMap<SegmentId, SegmentInfo>,
}

impl NetworkStore {
    /// Creates a new, empty network store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node operations ---

    /// Inserts a node at `position` and returns its ID.
    pub fn add_node(&mut self, position: Point3) -> NodeId {
        self.nodes.insert(NodeInfo::new(position))
    }

    /// Returns a mutable reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeInfo, NetworkError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| NetworkError::EntityNotFound("node".into()))
    }

    /// Iterates over all node IDs.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    // --- Segment operations ---

    /// Connects two nodes with a straight segment.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is not found.
    pub fn add_straight_segment(
        &mut self,
        start_node: NodeId,
        end_node: NodeId,
        half_width: f64,
    ) -> Result<SegmentId, NetworkError> {
        let start = self.node_position(start_node)?;
        let end = self.node_position(end_node)?;
        let dir = end - start;
        self.add_segment(start_node, dir, end_node, -dir, half_width)
    }

    /// Connects two nodes with a curved segment leaving `start_node` along
    /// `start_direction` and entering `end_node` against `end_direction`.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is not found.
    pub fn add_segment(
        &mut self,
        start_node: NodeId,
        start_direction: Vector3,
        end_node: NodeId,
        end_direction: Vector3,
        half_width: f64,
    ) -> Result<SegmentId, NetworkError> {
        let start_position = self.node_position(start_node)?;
        let end_position = self.node_position(end_node)?;
        let id = self.segments.insert(SegmentInfo {
            start_node,
            end_node,
            start_position,
            start_direction: normalized(start_direction),
            end_position,
            end_direction: normalized(end_direction),
            half_width,
            untouchable: false,
        });
        self.node_mut(start_node)?.segments.push(id);
        if end_node != start_node {
            self.node_mut(end_node)?.segments.push(id);
        }
        Ok(id)
    }

    /// Returns a mutable reference to the segment data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn segment_mut(&mut self, id: SegmentId) -> Result<&mut SegmentInfo, NetworkError> {
        self.segments
            .get_mut(id)
            .ok_or_else(|| NetworkError::EntityNotFound("segment".into()))
    }

    /// Removes a segment and unlinks it from both nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is not found.
    pub fn remove_segment(&mut self, id: SegmentId) -> Result<SegmentInfo, NetworkError> {
        let info = self
            .segments
            .remove(id)
            .ok_or_else(|| NetworkError::EntityNotFound("segment".into()))?;
        for node in [info.start_node, info.end_node] {
            if let Some(data) = self.nodes.get_mut(node) {
                data.segments.retain(|s| *s != id);
            }
        }
        Ok(info)
    }

    fn node_position(&self, id: NodeId) -> Result<Point3, NetworkError> {
        self.nodes
            .get(id)
            .map(|n| n.position)
            .ok_or_else(|| NetworkError::EntityNotFound("node".into()))
    }
}

impl NetworkSource for NetworkStore {
    fn segment(&self, id: SegmentId) -> Option<&SegmentInfo> {
        self.segments.get(id)
    }

    fn node(&self, id: NodeId) -> Option<&NodeInfo> {
        self.nodes.get(id)
    }
}

fn normalized(v: Vector3) -> Vector3 {
    let len = v.norm();
    if len < crate::math::TOLERANCE {
        v
    } else {
        v / len
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn straight_segment_links_both_nodes() {
        let mut store = NetworkStore::new();
        let a = store.add_node(Point3::new(0.0, 0.0, 0.0));
        let b = store.add_node(Point3::new(10.0, 0.0, 0.0));
        let s = store.add_straight_segment(a, b, 2.0).unwrap();

        assert_eq!(store.node(a).unwrap().segments, vec![s]);
        assert_eq!(store.node(b).unwrap().segments, vec![s]);
        let info = store.segment(s).unwrap();
        assert!(info.is_start(a));
        assert_eq!(info.other_node(a), b);
        assert!((info.start_direction.x - 1.0).abs() < 1e-12);
        assert!((info.end_direction.x + 1.0).abs() < 1e-12);
    }

    #[test]
    fn trajectory_starts_at_requested_node() {
        let mut store = NetworkStore::new();
        let a = store.add_node(Point3::new(0.0, 0.0, 0.0));
        let b = store.add_node(Point3::new(10.0, 0.0, 0.0));
        let s = store.add_straight_segment(a, b, 2.0).unwrap();
        let info = store.segment(s).unwrap();

        use crate::geometry::Curve;
        let from_b = info.trajectory_from(b);
        assert!((from_b.position(0.0).x - 10.0).abs() < 1e-12);
        assert!((from_b.position(1.0).x).abs() < 1e-12);
    }

    #[test]
    fn remove_segment_unlinks_nodes() {
        let mut store = NetworkStore::new();
        let a = store.add_node(Point3::new(0.0, 0.0, 0.0));
        let b = store.add_node(Point3::new(10.0, 0.0, 0.0));
        let s = store.add_straight_segment(a, b, 2.0).unwrap();
        store.remove_segment(s).unwrap();

        assert!(store.node(a).unwrap().segments.is_empty());
        assert!(store.segment(s).is_none());
        assert!(store.remove_segment(s).is_err());
    }

    #[test]
    fn null_key_is_never_valid() {
        let mut store = NetworkStore::new();
        store.add_node(Point3::origin());
        assert!(store.node(NodeId::default()).is_none());
    }
}

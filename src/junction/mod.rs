pub mod limits;
pub mod main_road;
pub mod manager;
pub mod node;
pub mod segment_end;
pub mod side;
pub mod state;
pub mod style;

pub use limits::LimitSolver;
pub use main_road::{MainRoad, MainRoadCandidate};
pub use manager::{JunctionManager, UpdateReport};
pub use node::{EditTarget, NodeGeometry, NodeKind, NodeStatus};
pub use segment_end::{
    Corner, CornerDelta, SegmentEndGeometry, SegmentEndId, SegmentEndMode, ShapeParams,
};
pub use side::{SegmentSide, SideType};
pub use state::{NodeState, SegmentEndState};
pub use style::{Attribute, NodeShape, NodeStyle, SupportOption};

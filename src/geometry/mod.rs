pub mod curve;
pub mod intersect;

pub use curve::{Aabb, Bezier, Curve, LineSegment};
pub use intersect::{intersect_single, Intersection};

pub mod config;
pub mod error;
pub mod geometry;
pub mod junction;
pub mod math;
pub mod network;

pub use config::SolverConfig;
pub use error::{NodeshapeError, Result};

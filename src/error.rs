use thiserror::Error;

/// Top-level error type for the junction geometry solver.
#[derive(Debug, Error)]
pub enum NodeshapeError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Errors related to the host network store.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("unsupported topology: {0}")]
    Unsupported(String),
}

/// Errors related to editing and solving junction geometry.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("attribute {attribute} is not editable {target} for style {style}")]
    NotEditable {
        attribute: &'static str,
        target: &'static str,
        style: &'static str,
    },

    #[error("style {style} is not valid for this node")]
    InvalidStyle { style: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for results using [`NodeshapeError`].
pub type Result<T> = std::result::Result<T, NodeshapeError>;

use thiserror::Error;

/// Errors surfaced by network construction, stepping and stimulus preparation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// More input values than the input layer has nodes. Raised before any
    /// node is touched.
    #[error("got {got} inputs but the input layer has {capacity} nodes")]
    InvalidInput { got: usize, capacity: usize },

    #[error("invalid network shape: {0}")]
    InvalidShape(String),

    #[error("invalid network configuration: {0}")]
    InvalidConfig(String),

    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("matrix size {size} is not divisible by reduction factor {factor}")]
    NotDivisible { size: usize, factor: usize },

    #[error("sample feed needs at least one sample")]
    EmptySamples,
}

pub type Result<T> = std::result::Result<T, NetworkError>;

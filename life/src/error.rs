use thiserror::Error;

pub type Result<T, E = GridError> = std::result::Result<T, E>;

/// Misuse of the grid or simulation API. None of these are transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {rows}x{columns} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        columns: usize,
    },
    #[error("invalid grid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("alive probability {0} is not within 0.0..=1.0")]
    InvalidProbability(f64),
    #[error("unrecognised cell marker {marker:?} at line {line}")]
    InvalidCell { marker: char, line: usize },
}

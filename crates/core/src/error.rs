//! Error types for popgrid
//!
//! Two failure classes matter to callers: acquisition failures (a raster,
//! boundary or facility source could not be materialized) are fatal to the
//! current run; computation preconditions (size/CRS mismatch, empty facility
//! set) are fatal to the operation that hit them but leave independent
//! operations usable. Per-feature masking problems are not errors at all:
//! they are absorbed into zero-valued results by the zonal engine.

use thiserror::Error;

/// Main error type for popgrid operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("No facilities fall within the raster extent")]
    NoFacilitiesInExtent,

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Required column not found: {0}")]
    MissingColumn(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for popgrid operations
pub type Result<T> = std::result::Result<T, Error>;

use std::path::PathBuf;

use thiserror::Error;

use crate::plan::Axis;

/// Broad failure category, used by the binary to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Io,
    Internal,
}

#[derive(Error, Debug)]
pub enum ExtentError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("Invalid plan file: {0}")]
    PlanFile(#[from] serde_json::Error),

    #[error("Input raster does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Output directory does not exist: {}", .0.display())]
    OutputDirNotFound(PathBuf),

    #[error("Input raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Invalid pixel size: {0} (expected positive width and negative height)")]
    InvalidPixelSize(f64),

    #[error("Non-square pixels are not supported ({0} x {1})")]
    NonSquarePixels(f64, f64),

    #[error("Rotated geotransforms are not supported (row rotation {0}, column rotation {1})")]
    RotatedTransform(f64, f64),

    #[error("Unsupported dtype {0}: cannot be stored as int8, int16 or int32")]
    UnsupportedDtype(String),

    #[error("Fill value {fill} for {axis} cannot be stored as {dtype}")]
    FillOutOfRange { axis: Axis, fill: i64, dtype: String },

    #[error("Cannot add {count} {axis}: at most {max} lines per axis")]
    CountTooLarge { axis: Axis, count: usize, max: usize },

    #[error("Invalid {0} request: {1}")]
    IncompleteRequest(Axis, String),

    #[error("Invalid compression type: {0} (expected LZW, DEFLATE, ZSTD or NONE)")]
    InvalidCompression(String),

    #[error("Invalid tile size: {0} (must be multiple of 16)")]
    InvalidTileSize(usize),

    #[error("Expected {requested} new {axis} but the grid grew by {realized}")]
    ShapeMismatch {
        axis: Axis,
        requested: usize,
        realized: isize,
    },

    #[error("Metadata size {width}x{height} does not match grid size {cols}x{rows}")]
    MetadataMismatch {
        width: usize,
        height: usize,
        cols: usize,
        rows: usize,
    },

    #[error("Cell value {value} at ({row},{col}) cannot be stored as {dtype}")]
    ValueOutOfRange {
        value: i64,
        row: usize,
        col: usize,
        dtype: String,
    },
}

impl ExtentError {
    pub fn class(&self) -> ErrorClass {
        use ExtentError::*;
        match self {
            Gdal(_) | Io(_) | InputNotFound(_) | OutputDirNotFound(_) => ErrorClass::Io,
            ShapeError(_) | ShapeMismatch { .. } | MetadataMismatch { .. } | ValueOutOfRange { .. } => {
                ErrorClass::Internal
            }
            PlanFile(_)
            | InvalidDimensions(..)
            | InvalidPixelSize(_)
            | NonSquarePixels(..)
            | RotatedTransform(..)
            | UnsupportedDtype(_)
            | FillOutOfRange { .. }
            | CountTooLarge { .. }
            | IncompleteRequest(..)
            | InvalidCompression(_)
            | InvalidTileSize(_) => ErrorClass::Configuration,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.class() {
            ErrorClass::Io => 1,
            ErrorClass::Configuration => 2,
            ErrorClass::Internal => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtentError>;

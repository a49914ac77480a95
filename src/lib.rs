// Library exports for testing and reuse

pub mod cli;
pub mod creation;
pub mod dtype;
pub mod error;
pub mod expand;
pub mod grid;
pub mod io;
pub mod plan;
pub mod workflow;

// Re-export commonly used types
pub use creation::WriteOptions;
pub use dtype::{PixelType, StorageKind};
pub use error::{ErrorClass, ExtentError, Result};
pub use expand::add_rows_or_cols;
pub use grid::Grid;
pub use io::{read_input_raster, write_output_raster, Bounds, RasterMetadata};
pub use plan::{Axis, AxisRequest, Edge, ExpansionPlan, ExpansionRequest, MAX_LINES};
pub use workflow::{update_extent, update_extent_with, ExtentOutcome};

use crate::creation::WriteOptions;
use crate::error::{ExtentError, Result};
use crate::expand::apply_request;
use crate::grid::Grid;
use crate::io::{read_input_raster, write_output_raster, RasterMetadata};
use crate::plan::{Axis, ExpansionPlan, ExpansionRequest};
use log::{error, info};

/// What a run of [`update_extent`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtentOutcome {
    /// The plan was empty; nothing was read or written.
    NothingToDo,
    /// Grid shapes as (rows, cols) before and after expansion.
    Written {
        before: (usize, usize),
        after: (usize, usize),
    },
}

/// Read `input`, grow it according to `plan` and write the result to `output`.
pub fn update_extent(
    input: &str,
    output: &str,
    plan: &ExpansionPlan,
    options: &WriteOptions,
) -> Result<ExtentOutcome> {
    update_extent_with(input, output, plan, options, apply_request)
}

/// Same as [`update_extent`] with a caller-supplied expansion step.
pub fn update_extent_with<F>(
    input: &str,
    output: &str,
    plan: &ExpansionPlan,
    options: &WriteOptions,
    expander: F,
) -> Result<ExtentOutcome>
where
    F: Fn(&Grid, &ExpansionRequest, &RasterMetadata) -> Result<(Grid, RasterMetadata)>,
{
    if plan.is_empty() {
        info!("No rows or columns to add, nothing written");
        return Ok(ExtentOutcome::NothingToDo);
    }
    plan.validate()?;
    plan.log_summary();

    info!("Reading raster...");
    let (grid, metadata) = read_input_raster(input)?;
    info!(
        "Raster size: {}x{}, cell size {}, dtype {}",
        metadata.width, metadata.height, metadata.cell_size, metadata.pixel_type
    );

    // Fills the declared type cannot hold force a wider signed type up front
    let (grid, metadata) = match plan.storage_for(metadata.pixel_type)? {
        Some(kind) => {
            info!(
                "Converting dtype from {} to {} to hold the fill values",
                metadata.pixel_type,
                kind.name()
            );
            let grid = grid.widen(kind)?;
            let metadata = RasterMetadata {
                pixel_type: kind.pixel_type(),
                ..metadata
            };
            (grid, metadata)
        }
        None => (grid, metadata),
    };

    let before = grid.dim();
    let (grid, metadata) = expand_grid(grid, metadata, plan, expander)?;
    let after = grid.dim();

    info!("Writing results...");
    write_output_raster(output, &metadata, &grid, options)?;

    Ok(ExtentOutcome::Written { before, after })
}

/// Apply every request of `plan` in order and check the result against it.
pub fn expand_grid<F>(
    grid: Grid,
    metadata: RasterMetadata,
    plan: &ExpansionPlan,
    expander: F,
) -> Result<(Grid, RasterMetadata)>
where
    F: Fn(&Grid, &ExpansionRequest, &RasterMetadata) -> Result<(Grid, RasterMetadata)>,
{
    let before = grid.dim();
    let (mut grid, mut metadata) = (grid, metadata);

    for request in plan.requests() {
        info!("Adding {} {}...", request.count, request.axis);
        let (g, m) = expander(&grid, &request, &metadata)?;
        grid = g;
        metadata = m;
    }

    verify_shape_delta(before, grid.dim(), plan)?;

    if (metadata.height, metadata.width) != grid.dim() {
        let (rows, cols) = grid.dim();
        error!(
            "Metadata says {}x{} but grid is {}x{}",
            metadata.width, metadata.height, cols, rows
        );
        return Err(ExtentError::MetadataMismatch {
            width: metadata.width,
            height: metadata.height,
            cols,
            rows,
        });
    }

    Ok((grid, metadata))
}

/// The realized growth on each axis must equal the requested count.
pub fn verify_shape_delta(
    before: (usize, usize),
    after: (usize, usize),
    plan: &ExpansionPlan,
) -> Result<()> {
    let axes = [
        (Axis::Rows, before.0, after.0),
        (Axis::Columns, before.1, after.1),
    ];
    for (axis, start, end) in axes {
        let realized = end as isize - start as isize;
        let requested = plan.count(axis);
        if realized != requested as isize {
            error!("Invalid dimensions: start {:?}, end {:?}", before, after);
            return Err(ExtentError::ShapeMismatch {
                axis,
                requested,
                realized,
            });
        }
    }
    info!("Valid dimensions: start {:?}, end {:?}", before, after);
    Ok(())
}

//! Insert rows or columns of a fill value at one edge of a grid and keep the
//! geotransform and declared size in step with the new shape.
//!
//! The geotransform is translated by whole pixels from the original rather than
//! rebuilt from bounds, and its cell-size terms are always re-set from
//! `RasterMetadata::cell_size`, so repeated expansions never drift the pixel size.

use log::debug;
use ndarray::{s, Array2};

use crate::error::Result;
use crate::grid::Grid;
use crate::io::RasterMetadata;
use crate::plan::{Axis, Edge, ExpansionRequest};

/// Add `count` lines of `fill` along `axis` at `edge`.
///
/// Returns the new grid and metadata; `meta` is left untouched. A zero count
/// returns exact copies.
pub fn add_rows_or_cols<T: Clone>(
    grid: &Array2<T>,
    axis: Axis,
    count: usize,
    edge: Edge,
    fill: T,
    meta: &RasterMetadata,
) -> (Array2<T>, RasterMetadata) {
    if count == 0 {
        return (grid.clone(), meta.clone());
    }

    let (rows, cols) = grid.dim();
    let (new_rows, new_cols) = match axis {
        Axis::Rows => (rows + count, cols),
        Axis::Columns => (rows, cols + count),
    };

    // Offset of the original data inside the new grid
    let (row_off, col_off) = match (axis, edge) {
        (Axis::Rows, Edge::Start) => (count, 0),
        (Axis::Columns, Edge::Start) => (0, count),
        (_, Edge::End) => (0, 0),
    };

    let mut expanded = Array2::from_elem((new_rows, new_cols), fill);
    expanded
        .slice_mut(s![row_off..row_off + rows, col_off..col_off + cols])
        .assign(grid);

    let new_meta = shifted_metadata(meta, axis, count, edge, new_cols, new_rows);

    debug!(
        "Added {} {} at {} ({}): {}x{} -> {}x{}, origin ({}, {}) -> ({}, {})",
        count,
        axis,
        edge,
        edge.direction(axis),
        cols,
        rows,
        new_cols,
        new_rows,
        meta.geotransform[0],
        meta.geotransform[3],
        new_meta.geotransform[0],
        new_meta.geotransform[3]
    );

    (expanded, new_meta)
}

/// Apply one plan entry to a grid in its declared type.
pub fn apply_request(
    grid: &Grid,
    request: &ExpansionRequest,
    meta: &RasterMetadata,
) -> Result<(Grid, RasterMetadata)> {
    grid.expand(request, meta)
}

fn shifted_metadata(
    meta: &RasterMetadata,
    axis: Axis,
    count: usize,
    edge: Edge,
    width: usize,
    height: usize,
) -> RasterMetadata {
    let cell = meta.cell_size;
    let shift = cell * count as f64;
    let mut gt = meta.geotransform;

    // Appending at the end leaves the upper-left origin where it was
    match (axis, edge) {
        (Axis::Rows, Edge::Start) => gt[3] += shift,
        (Axis::Columns, Edge::Start) => gt[0] -= shift,
        (_, Edge::End) => {}
    }
    gt[1] = cell;
    gt[5] = -cell;

    RasterMetadata {
        width,
        height,
        geotransform: gt,
        ..meta.clone()
    }
}

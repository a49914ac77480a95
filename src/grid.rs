//! A band's cells held in their declared storage type.

use ndarray::Array2;

use crate::dtype::{Cell, PixelType, StorageKind};
use crate::error::{ExtentError, Result};
use crate::expand::add_rows_or_cols;
use crate::io::RasterMetadata;
use crate::plan::ExpansionRequest;

/// Band 1 of a raster, one variant per supported pixel type.
#[derive(Debug, Clone, PartialEq)]
pub enum Grid {
    UInt8(Array2<u8>),
    Int8(Array2<i8>),
    UInt16(Array2<u16>),
    Int16(Array2<i16>),
    UInt32(Array2<u32>),
    Int32(Array2<i32>),
    Float32(Array2<f32>),
    Float64(Array2<f64>),
}

/// Run `$body` with `$data` bound to the inner array and `$wrap` to the
/// matching variant constructor.
macro_rules! dispatch {
    ($grid:expr, $data:ident, $wrap:ident => $body:expr) => {
        match $grid {
            Grid::UInt8($data) => {
                #[allow(unused_variables)]
                let $wrap = Grid::UInt8;
                $body
            }
            Grid::Int8($data) => {
                #[allow(unused_variables)]
                let $wrap = Grid::Int8;
                $body
            }
            Grid::UInt16($data) => {
                #[allow(unused_variables)]
                let $wrap = Grid::UInt16;
                $body
            }
            Grid::Int16($data) => {
                #[allow(unused_variables)]
                let $wrap = Grid::Int16;
                $body
            }
            Grid::UInt32($data) => {
                #[allow(unused_variables)]
                let $wrap = Grid::UInt32;
                $body
            }
            Grid::Int32($data) => {
                #[allow(unused_variables)]
                let $wrap = Grid::Int32;
                $body
            }
            Grid::Float32($data) => {
                #[allow(unused_variables)]
                let $wrap = Grid::Float32;
                $body
            }
            Grid::Float64($data) => {
                #[allow(unused_variables)]
                let $wrap = Grid::Float64;
                $body
            }
        }
    };
}

impl Grid {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            Grid::UInt8(_) => PixelType::UInt8,
            Grid::Int8(_) => PixelType::Int8,
            Grid::UInt16(_) => PixelType::UInt16,
            Grid::Int16(_) => PixelType::Int16,
            Grid::UInt32(_) => PixelType::UInt32,
            Grid::Int32(_) => PixelType::Int32,
            Grid::Float32(_) => PixelType::Float32,
            Grid::Float64(_) => PixelType::Float64,
        }
    }

    /// Shape as (rows, cols).
    pub fn dim(&self) -> (usize, usize) {
        dispatch!(self, data, _wrap => data.dim())
    }

    /// Cell value at (row, col) as f64, for inspection and tests.
    pub fn get_f64(&self, row: usize, col: usize) -> Option<f64> {
        dispatch!(self, data, _wrap => data.get((row, col)).map(|&v| v as f64))
    }

    /// Apply one plan entry, keeping the cell type.
    ///
    /// The fill must be exactly representable in the grid's type; see
    /// [`Grid::widen`] for converting first.
    pub fn expand(
        &self,
        request: &ExpansionRequest,
        meta: &RasterMetadata,
    ) -> Result<(Grid, RasterMetadata)> {
        let ty = self.pixel_type();
        dispatch!(self, data, wrap => {
            let (out, out_meta) = expand_cells(data, request, meta, ty)?;
            Ok((wrap(out), out_meta))
        })
    }

    /// Convert an integer grid to a wider signed kind. Every cell must fit;
    /// float grids are never converted.
    pub fn widen(&self, kind: StorageKind) -> Result<Grid> {
        match self {
            Grid::UInt8(data) => widen_to(data, kind),
            Grid::Int8(data) => widen_to(data, kind),
            Grid::UInt16(data) => widen_to(data, kind),
            Grid::Int16(data) => widen_to(data, kind),
            Grid::UInt32(data) => widen_to(data, kind),
            Grid::Int32(data) => widen_to(data, kind),
            Grid::Float32(_) | Grid::Float64(_) => {
                Err(ExtentError::UnsupportedDtype(self.pixel_type().name().to_string()))
            }
        }
    }
}

fn expand_cells<T: Cell>(
    data: &Array2<T>,
    request: &ExpansionRequest,
    meta: &RasterMetadata,
    ty: PixelType,
) -> Result<(Array2<T>, RasterMetadata)> {
    if request.count == 0 {
        return Ok((data.clone(), meta.clone()));
    }
    let fill =T::from_fill(request.fill).ok_or_else(|| ExtentError::FillOutOfRange {
        axis: request.axis,
        fill: request.fill,
        dtype: ty.name().to_string(),
    })?;
    Ok(add_rows_or_cols(
        data,
        request.axis,
        request.count,
        request.edge,
        fill,
        meta,
    ))
}

fn widen_to<S: Copy + Into<i64>>(data: &Array2<S>, kind: StorageKind) -> Result<Grid> {
    let grid = match kind {
        StorageKind::Int8 => Grid::Int8(narrow(data, kind)?),
        StorageKind::Int16 => Grid::Int16(narrow(data, kind)?),
        StorageKind::Int32 => Grid::Int32(narrow(data, kind)?),
    };
    Ok(grid)
}

fn narrow<S, T>(data: &Array2<S>, kind: StorageKind) -> Result<Array2<T>>
where
    S: Copy + Into<i64>,
    T: TryFrom<i64>,
{
    let mut cells = Vec::with_capacity(data.len());
    for ((row, col), &v) in data.indexed_iter() {
        let value: i64 = v.into();
        let cell = T::try_from(value).map_err(|_| ExtentError::ValueOutOfRange {
            value,
            row,
            col,
            dtype: kind.name().to_string(),
        })?;
        cells.push(cell);
    }
    Ok(Array2::from_shape_vec(data.dim(), cells)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Axis, Edge};
    use ndarray::arr2;

    fn meta_2x2(pixel_type: PixelType) -> RasterMetadata {
        RasterMetadata {
            width: 2,
            height: 2,
            geotransform: [0.0, 10.0, 0.0, 20.0, 0.0, -10.0],
            projection: String::new(),
            nodata: None,
            cell_size: 10.0,
            pixel_type,
            driver: "GTiff".to_string(),
        }
    }

    fn request(axis: Axis, edge: Edge, fill: i64) -> ExpansionRequest {
        ExpansionRequest {
            axis,
            count: 1,
            edge,
            fill,
        }
    }

    #[test]
    fn test_expand_keeps_uint8() {
        let grid = Grid::UInt8(arr2(&[[1, 2], [3, 255]]));
        let (out, m) = grid
            .expand(&request(Axis::Rows, Edge::End, 0), &meta_2x2(PixelType::UInt8))
            .unwrap();
        assert_eq!(out, Grid::UInt8(arr2(&[[1, 2], [3, 255], [0, 0]])));
        assert_eq!(m.height, 3);
    }

    #[test]
    fn test_expand_keeps_float32() {
        let grid = Grid::Float32(arr2(&[[0.5, 1.5], [2.5, 3.5]]));
        let (out, _) = grid
            .expand(
                &request(Axis::Columns, Edge::Start, -9999),
                &meta_2x2(PixelType::Float32),
            )
            .unwrap();
        assert_eq!(
            out,
            Grid::Float32(arr2(&[[-9999.0, 0.5, 1.5], [-9999.0, 2.5, 3.5]]))
        );
    }

    #[test]
    fn test_expand_rejects_fill_outside_type() {
        let grid = Grid::UInt8(arr2(&[[1, 2], [3, 4]]));
        let err = grid
            .expand(&request(Axis::Rows, Edge::End, -1), &meta_2x2(PixelType::UInt8))
            .unwrap_err();
        match err {
            ExtentError::FillOutOfRange { axis, fill, dtype } => {
                assert_eq!(axis, Axis::Rows);
                assert_eq!(fill, -1);
                assert_eq!(dtype, "uint8");
            }
            other => panic!("expected FillOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_widen_uint8_to_int16() {
        let grid = Grid::UInt8(arr2(&[[0, 127], [128, 255]]));
        let wide = grid.widen(StorageKind::Int16).unwrap();
        assert_eq!(wide, Grid::Int16(arr2(&[[0, 127], [128, 255]])));
        assert_eq!(wide.pixel_type(), PixelType::Int16);
    }

    #[test]
    fn test_widen_reports_first_cell_that_does_not_fit() {
        let grid = Grid::Int16(arr2(&[[0, 1], [-200, 2]]));
        match grid.widen(StorageKind::Int8) {
            Err(ExtentError::ValueOutOfRange { value, row, col, .. }) => {
                assert_eq!((value, row, col), (-200, 1, 0));
            }
            other => panic!("expected ValueOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_float_grids_are_never_widened() {
        let grid = Grid::Float64(arr2(&[[1.0]]));
        assert!(matches!(
            grid.widen(StorageKind::Int32),
            Err(ExtentError::UnsupportedDtype(name)) if name == "float64"
        ));
    }
}

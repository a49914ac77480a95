use crate::creation::{create_dataset_options, WriteOptions};
use crate::dtype::PixelType;
use crate::error::{ExtentError, Result};
use crate::grid::Grid;
use gdal::cpl::CslStringList;
use gdal::raster::{Buffer, GdalType, RasterBand};
use gdal::{Dataset, DriverManager, Metadata};
use log::{debug, info, warn};
use ndarray::{s, Array2};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub geotransform: [f64; 6],
    pub projection: String,
    pub nodata: Option<f64>,
    pub cell_size: f64,
    pub pixel_type: PixelType,
    pub driver: String,
}

/// Georeferenced extent of a north-up raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl RasterMetadata {
    pub fn bounds(&self) -> Bounds {
        let xmin = self.geotransform[0];
        let ymax = self.geotransform[3];
        Bounds {
            xmin,
            ymin: ymax - self.cell_size * self.height as f64,
            xmax: xmin + self.cell_size * self.width as f64,
            ymax,
        }
    }
}

/// Rows per strip so a strip holds about this many cells
const STRIP_CELLS: usize = 1 << 20;

fn strip_rows(width: usize) -> usize {
    (STRIP_CELLS / width.max(1)).max(1)
}

/// Read band 1 of the input raster, in its declared type, and its metadata
pub fn read_input_raster(path: &str) -> Result<(Grid, RasterMetadata)> {
    if !Path::new(path).exists() {
        return Err(ExtentError::InputNotFound(path.into()));
    }

    info!("Opening input raster: {}", path);
    let dataset = Dataset::open(path)?;

    let band_count = dataset.raster_count();
    if band_count > 1 {
        warn!("Input has {} bands, only band 1 is read", band_count);
    }

    let metadata = extract_metadata_from_dataset(&dataset)?;
    let rasterband: RasterBand = dataset.rasterband(1)?;
    let (width, height) = (metadata.width, metadata.height);

    debug!("Raster dimensions: {}x{}", width, height);
    debug!("Declared pixel type: {}", metadata.pixel_type);

    let grid = match metadata.pixel_type {
        PixelType::UInt8 => Grid::UInt8(read_band(&rasterband, width, height)?),
        PixelType::Int8 if is_legacy_signed_byte(&rasterband) => {
            debug!("Reinterpreting SIGNEDBYTE band as int8");
            Grid::Int8(read_strips::<u8, _>(&rasterband, width, height, reinterpret_signed_byte)?)
        }
        // Native Int8 bands are read through i16; every value fits back into i8
        PixelType::Int8 => {
            Grid::Int8(read_strips::<i16, _>(&rasterband, width, height, |v| v as i8)?)
        }
        PixelType::UInt16 => Grid::UInt16(read_band(&rasterband, width, height)?),
        PixelType::Int16 => Grid::Int16(read_band(&rasterband, width, height)?),
        PixelType::UInt32 => Grid::UInt32(read_band(&rasterband, width, height)?),
        PixelType::Int32 => Grid::Int32(read_band(&rasterband, width, height)?),
        PixelType::Float32 => Grid::Float32(read_band(&rasterband, width, height)?),
        PixelType::Float64 => Grid::Float64(read_band(&rasterband, width, height)?),
    };

    Ok((grid, metadata))
}

fn read_band<T: GdalType + Copy>(
    band: &RasterBand,
    width: usize,
    height: usize,
) -> Result<Array2<T>> {
    let buffer = band.read_as::<T>((0, 0), (width, height), (width, height), None)?;
    let data_vec: Vec<T> = buffer.into_iter().collect();
    Ok(Array2::from_shape_vec((height, width), data_vec)?)
}

/// Read the band strip by strip as `S`, converting each cell into the grid type
fn read_strips<S: GdalType + Copy, T>(
    band: &RasterBand,
    width: usize,
    height: usize,
    convert: impl Fn(S) -> T,
) -> Result<Array2<T>> {
    let mut cells = Vec::with_capacity(width * height);
    let step = strip_rows(width);
    for y_offset in (0..height).step_by(step) {
        let y_size = step.min(height - y_offset);
        let buffer = band.read_as::<S>(
            (0, y_offset as isize),
            (width, y_size),
            (width, y_size),
            None,
        )?;
        cells.extend(buffer.into_iter().map(&convert));
    }
    Ok(Array2::from_shape_vec((height, width), cells)?)
}

/// Two's-complement view of a byte from a SIGNEDBYTE band
pub fn reinterpret_signed_byte(raw: u8) -> i8 {
    raw as i8
}

/// Extract metadata from a dataset without reading any pixels
pub fn extract_metadata_from_dataset(dataset: &Dataset) -> Result<RasterMetadata> {
    let rasterband: RasterBand = dataset.rasterband(1)?;

    let width = rasterband.x_size() as usize;
    let height = rasterband.y_size() as usize;

    if width == 0 || height == 0 {
        return Err(ExtentError::InvalidDimensions(width, height));
    }

    let geotransform = dataset.geo_transform()?;
    let cell_size = validate_geotransform(&geotransform)?;

    let type_name = rasterband.band_type().name();
    let pixel_type = PixelType::from_gdal_name(&type_name, is_legacy_signed_byte(&rasterband))?;

    Ok(RasterMetadata {
        width,
        height,
        geotransform,
        projection: dataset.projection(),
        nodata: rasterband.no_data_value(),
        cell_size,
        pixel_type,
        driver: dataset.driver().short_name(),
    })
}

/// Check for square, north-up pixels and return the cell size.
pub fn validate_geotransform(gt: &[f64; 6]) -> Result<f64> {
    let pixel_width = gt[1];
    let pixel_height = gt[5];

    if pixel_width <= 0.0 {
        return Err(ExtentError::InvalidPixelSize(pixel_width));
    }
    if pixel_height >= 0.0 {
        return Err(ExtentError::InvalidPixelSize(pixel_height));
    }
    if gt[2] != 0.0 || gt[4] != 0.0 {
        return Err(ExtentError::RotatedTransform(gt[2], gt[4]));
    }
    if (pixel_width + pixel_height).abs() > 1e-9 * pixel_width {
        return Err(ExtentError::NonSquarePixels(pixel_width, -pixel_height));
    }
    if pixel_height != -pixel_width {
        debug!(
            "Pixel height {} normalized to {} on expansion",
            -pixel_height, pixel_width
        );
    }

    Ok(pixel_width)
}

fn is_legacy_signed_byte(band: &RasterBand) -> bool {
    band.band_type().name() == "Byte"
        && band.metadata_item("PIXELTYPE", "IMAGE_STRUCTURE").as_deref() == Some("SIGNEDBYTE")
}

/// Write a grid as band 1 of a new compressed GeoTIFF, replacing any existing file
pub fn write_output_raster(
    path: &str,
    metadata: &RasterMetadata,
    grid: &Grid,
    options: &WriteOptions,
) -> Result<()> {
    let parent = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        if !dir.is_dir() {
            return Err(ExtentError::OutputDirNotFound(dir.to_path_buf()));
        }
    }

    let (rows, cols) = grid.dim();
    if (rows, cols) != (metadata.height, metadata.width) {
        return Err(ExtentError::MetadataMismatch {
            width: metadata.width,
            height: metadata.height,
            cols,
            rows,
        });
    }

    let creation = create_dataset_options(options);

    match grid {
        Grid::Int8(data) => write_int8(path, metadata, data, creation)?,
        Grid::UInt8(data) => write_grid(path, metadata, data, creation)?,
        Grid::UInt16(data) => write_grid(path, metadata, data, creation)?,
        Grid::Int16(data) => write_grid(path, metadata, data, creation)?,
        Grid::UInt32(data) => write_grid(path, metadata, data, creation)?,
        Grid::Int32(data) => write_grid(path, metadata, data, creation)?,
        Grid::Float32(data) => write_grid(path, metadata, data, creation)?,
        Grid::Float64(data) => write_grid(path, metadata, data, creation)?,
    }

    info!(
        "Wrote {}x{} {} raster to {}",
        metadata.width,
        metadata.height,
        grid.pixel_type(),
        path
    );
    Ok(())
}

fn write_grid<T: GdalType + Copy>(
    path: &str,
    metadata: &RasterMetadata,
    data: &Array2<T>,
    creation: Vec<String>,
) -> Result<()> {
    let mut dataset = create_output_dataset::<T>(path, metadata, creation)?;
    georeference(&mut dataset, metadata)?;
    let mut band = dataset.rasterband(1)?;
    write_strips(&mut band, metadata, data, |v| v)
}

fn write_int8(
    path: &str,
    metadata: &RasterMetadata,
    data: &Array2<i8>,
    mut creation: Vec<String>,
) -> Result<()> {
    creation.push("PIXELTYPE=SIGNEDBYTE".to_string());
    let mut dataset = create_output_dataset::<u8>(path, metadata, creation)?;
    georeference(&mut dataset, metadata)?;
    let mut band = dataset.rasterband(1)?;
    // GDAL >= 3.7 turns a SIGNEDBYTE request into a native Int8 band, which
    // takes signed values; older builds keep a Byte band of two's-complement bytes
    if band.band_type().name() == "Int8" {
        write_strips(&mut band, metadata, data, |v| v as i16)
    } else {
        write_strips(&mut band, metadata, data, |v| v as u8)
    }
}

fn georeference(dataset: &mut Dataset, metadata: &RasterMetadata) -> Result<()> {
    dataset.set_geo_transform(&metadata.geotransform)?;
    if !metadata.projection.is_empty() {
        dataset.set_projection(&metadata.projection)?;
    }
    debug!("Set geotransform {:?}", metadata.geotransform);
    Ok(())
}

/// Write `data` strip by strip, converting each cell to the band's buffer type
fn write_strips<T: Copy, U: GdalType + Copy>(
    band: &mut RasterBand<'_>,
    metadata: &RasterMetadata,
    data: &Array2<T>,
    convert: impl Fn(T) -> U,
) -> Result<()> {
    if let Some(nodata) = metadata.nodata {
        band.set_no_data_value(Some(nodata))?;
    }

    let (height, width) = data.dim();
    let step = strip_rows(width);
    for y_offset in (0..height).step_by(step) {
        let y_size = step.min(height - y_offset);
        let strip = data.slice(s![y_offset..y_offset + y_size, ..]);
        // ndarray iterates row-major, matching GDAL's buffer layout
        let cells: Vec<U> = strip.iter().map(|&v| convert(v)).collect();
        let mut buffer = Buffer::new((width, y_size), cells);
        band.write((0, y_offset as isize), (width, y_size), &mut buffer)?;
        debug!("Wrote rows {}..{}", y_offset, y_offset + y_size);
    }
    Ok(())
}

/// Create a single-band GTiff dataset with the given creation options
pub fn create_output_dataset<T: GdalType>(
    path: &str,
    metadata: &RasterMetadata,
    options: Vec<String>,
) -> Result<Dataset> {
    info!("Creating output dataset: {}", path);
    debug!("Creation options: {:?}", options);

    let driver = DriverManager::get_driver_by_name("GTiff")?;

    let mut gdal_options = CslStringList::new();
    for opt in options {
        gdal_options.add_string(&opt)?;
    }

    let dataset = driver.create_with_band_type_with_options::<T, _>(
        path,
        metadata.width,
        metadata.height,
        1,
        &gdal_options,
    )?;

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_4x4() -> RasterMetadata {
        RasterMetadata {
            width: 4,
            height: 4,
            geotransform: [0.0, 10.0, 0.0, 40.0, 0.0, -10.0],
            projection: String::new(),
            nodata: None,
            cell_size: 10.0,
            pixel_type: PixelType::Int8,
            driver: "GTiff".to_string(),
        }
    }

    #[test]
    fn test_bounds() {
        let b = meta_4x4().bounds();
        assert_eq!(b, Bounds { xmin: 0.0, ymin: 0.0, xmax: 40.0, ymax: 40.0 });
    }

    #[test]
    fn test_validate_geotransform_north_up() {
        assert_eq!(validate_geotransform(&[0.0, 30.0, 0.0, 0.0, 0.0, -30.0]).unwrap(), 30.0);
    }

    #[test]
    fn test_validate_geotransform_rejects_non_square() {
        assert!(matches!(
            validate_geotransform(&[0.0, 30.0, 0.0, 0.0, 0.0, -10.0]),
            Err(ExtentError::NonSquarePixels(..))
        ));
    }

    #[test]
    fn test_validate_geotransform_rejects_rotation_and_south_up() {
        assert!(matches!(
            validate_geotransform(&[0.0, 30.0, 1.0, 0.0, 0.0, -30.0]),
            Err(ExtentError::RotatedTransform(..))
        ));
        assert!(matches!(
            validate_geotransform(&[0.0, 30.0, 0.0, 0.0, 0.0, 30.0]),
            Err(ExtentError::InvalidPixelSize(_))
        ));
        assert!(matches!(
            validate_geotransform(&[0.0, 0.0, 0.0, 0.0, 0.0, -30.0]),
            Err(ExtentError::InvalidPixelSize(_))
        ));
    }

    #[test]
    fn test_validate_geotransform_tolerates_rounding() {
        let cell = validate_geotransform(&[0.0, 30.0, 0.0, 0.0, 0.0, -30.000_000_000_1]).unwrap();
        assert_eq!(cell, 30.0);
    }

    #[test]
    fn test_reinterpret_signed_byte() {
        let raw = [0u8, 1, 127, 128, 200, 255];
        let signed: Vec<i8> = raw.iter().map(|&v| reinterpret_signed_byte(v)).collect();
        assert_eq!(signed, vec![0, 1, 127, -128, -56, -1]);
    }

    #[test]
    fn test_strip_rows() {
        assert_eq!(strip_rows(1), STRIP_CELLS);
        assert_eq!(strip_rows(STRIP_CELLS), 1);
        assert_eq!(strip_rows(STRIP_CELLS * 4), 1);
        assert_eq!(strip_rows(0), STRIP_CELLS);
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let err = read_input_raster("/definitely/not/here.tif").unwrap_err();
        assert!(matches!(err, ExtentError::InputNotFound(_)));
    }

    #[test]
    fn test_missing_output_dir_is_io_error() {
        let grid = Grid::Int16(Array2::zeros((4, 4)));
        let err = write_output_raster(
            "/definitely/not/here/out.tif",
            &meta_4x4(),
            &grid,
            &WriteOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExtentError::OutputDirNotFound(_)));
    }

    #[test]
    fn test_stale_metadata_is_rejected_before_writing() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("out.tif");
        let grid = Grid::UInt8(Array2::zeros((5, 4)));
        let err = write_output_raster(
            path.to_str().unwrap(),
            &meta_4x4(),
            &grid,
            &WriteOptions::default(),
        )
        .unwrap_err();
        match err {
            ExtentError::MetadataMismatch {
                width,
                height,
                cols,
                rows,
            } => assert_eq!((width, height, cols, rows), (4, 4, 4, 5)),
            other => panic!("expected MetadataMismatch, got {:?}", other),
        }
        assert!(!path.exists());
    }
}

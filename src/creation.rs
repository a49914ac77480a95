use crate::error::{ExtentError, Result};

/// Lossless codecs accepted for the output GeoTIFF.
const LOSSLESS_CODECS: [&str; 4] = ["LZW", "DEFLATE", "ZSTD", "NONE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub compression: String,
    pub tile_size: Option<usize>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: "LZW".to_string(),
            tile_size: None,
        }
    }
}

impl WriteOptions {
    pub fn new(compression: &str, tile_size: Option<usize>) -> Result<Self> {
        let compression = compression.to_ascii_uppercase();
        validate_compression(&compression)?;
        if let Some(size) = tile_size {
            validate_tile_size(size)?;
        }
        Ok(Self {
            compression,
            tile_size,
        })
    }
}

/// Validate compression type
pub fn validate_compression(compression: &str) -> Result<()> {
    if !LOSSLESS_CODECS.contains(&compression) {
        return Err(ExtentError::InvalidCompression(compression.to_string()));
    }
    Ok(())
}

/// Validate tile size (must be multiple of 16)
pub fn validate_tile_size(tile_size: usize) -> Result<()> {
    if tile_size == 0 || tile_size % 16 != 0 {
        return Err(ExtentError::InvalidTileSize(tile_size));
    }
    Ok(())
}

/// GTiff creation options for the output raster
pub fn create_dataset_options(options: &WriteOptions) -> Vec<String> {
    let mut opts = vec![
        format!("COMPRESS={}", options.compression),
        "BIGTIFF=IF_SAFER".to_string(),
    ];
    if let Some(tile_size) = options.tile_size {
        opts.push("TILED=YES".to_string());
        opts.push(format!("BLOCKXSIZE={}", tile_size));
        opts.push(format!("BLOCKYSIZE={}", tile_size));
    }
    opts
}

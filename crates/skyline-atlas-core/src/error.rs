use thiserror::Error;

use crate::model::Region;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported pixel depth {0} (expected 1, 3 or 4)")]
    UnsupportedDepth(u32),
    #[error("Invalid atlas dimensions {width}x{height} (both must be at least 3)")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Region {region:?} lies outside the {width}x{height} surface")]
    RegionOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },
    #[error("Source stride {stride} is smaller than one region row ({row_bytes} bytes)")]
    InvalidStride { stride: usize, row_bytes: usize },
    #[error("Source buffer holds {actual} bytes, region needs {needed}")]
    SourceTooShort { needed: usize, actual: usize },
    #[error("A {w}x{h} rectangle does not fit an empty atlas page")]
    OutOfSpace { w: u32, h: u32 },
    #[error("Key already present in the atlas: {0}")]
    DuplicateKey(String),
    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, AtlasError>;

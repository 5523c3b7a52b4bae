// THEORY:
// This file is the main entry point for the `photomosaic` library crate.
// It exports the `MosaicPipeline` and its configuration as the high-level
// interface, together with the narrow collaborator traits (`PixelSource`,
// `TileFetcher`, `RowSink`) a host application plugs in. The tiling, color
// reduction and row-ordering machinery lives in `core_modules`.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::color::color::{ColorSample, PixelBuffer, average_color};
pub use core_modules::fetcher::{HttpTileFetcher, TileFetcher};
pub use core_modules::input::{open_image, validate_upload};
pub use core_modules::pixel_source::PixelSource;
pub use core_modules::row_pipeline::{HtmlRowSink, RowPipeline, RowSink};
pub use core_modules::tile::tile::{Tile, TileGrid, TileSize};
pub use pipeline::{MosaicConfig, MosaicPipeline, MosaicReport, OffloadMode};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("Pixel bytes not a multiple of four (got {len} bytes)")]
    InvalidPixelData { len: usize },
    #[error("Failed to fetch tile for color {color}: {reason}")]
    FetchFailure { color: String, reason: String },
    #[error("{0}")]
    InputRejected(String),
    #[error("Invalid tile size {width}x{height}: both dimensions must be positive")]
    InvalidTileSize { width: u32, height: u32 },
    #[error("Invalid color sample {0:?}: expected six lowercase hex digits")]
    InvalidColor(String),
    #[error("Compute offload failed: {0}")]
    Offload(String),
    #[error("Output sink error: {0}")]
    Sink(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MosaicError>;

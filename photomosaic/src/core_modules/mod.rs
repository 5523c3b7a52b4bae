pub mod color;
pub mod fetcher;
pub mod input;
pub mod offload;
pub mod pixel_source;
pub mod row_pipeline;
pub mod tile;

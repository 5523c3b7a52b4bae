// THEORY:
// The `pipeline` module is the top-level API of the mosaic engine. It wires the
// layers together into one call: a `PixelSource` is cut into tiles, each row's
// tiles are reduced to colors by the configured offload executor, and the
// `RowPipeline` fetches the markup and emits rows in order to a `RowSink`.
//
// Configuration is explicit. Tile size, the offload executor and the fetch cap
// are all constructor parameters with documented defaults; there is no global
// fallback state.

use crate::core_modules::color::color::{PixelBuffer, Row};
use crate::core_modules::fetcher::TileFetcher;
use crate::core_modules::offload::ComputeOffload;
use crate::core_modules::pixel_source::PixelSource;
use crate::core_modules::row_pipeline::{RowPipeline, RowSink};
use crate::core_modules::tile::tile::{Tile, TileGrid, TileSize};
use crate::parallel_pipeline::WorkerPool;
use crate::Result;
use tracing::info;

/// Where color reduction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffloadMode {
    /// On the task driving the pipeline.
    Inline,
    /// One blocking execution unit per row, discarded afterwards.
    PerRow,
    /// A persistent pool of this many worker threads; `0` means one per CPU.
    Pool(usize),
}

/// Configuration for the MosaicPipeline.
#[derive(Debug, Clone)]
pub struct MosaicConfig {
    /// Nominal tile size. Defaults to 16×16.
    pub tile_size: TileSize,
    /// Color reduction executor. Defaults to `OffloadMode::PerRow`.
    pub offload: OffloadMode,
    /// Cap on simultaneous tile fetches. `None` (the default) fetches every tile at once,
    /// which for very large images means a very large number of open requests.
    pub max_concurrent_fetches: Option<usize>,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            tile_size: TileSize::default(),
            offload: OffloadMode::PerRow,
            max_concurrent_fetches: None,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicReport {
    pub rows: usize,
    pub cols: usize,
}

/// The main, top-level struct for the mosaic engine.
pub struct MosaicPipeline<F> {
    config: MosaicConfig,
    offload: ComputeOffload,
    row_pipeline: RowPipeline<F>,
}

impl<F: TileFetcher> MosaicPipeline<F> {
    pub fn new(config: MosaicConfig, fetcher: F) -> Result<Self> {
        let config = MosaicConfig {
            tile_size: TileSize::new(config.tile_size.width, config.tile_size.height)?,
            ..config
        };
        let offload = match config.offload {
            OffloadMode::Inline => ComputeOffload::Inline,
            OffloadMode::PerRow => ComputeOffload::PerRow,
            OffloadMode::Pool(size) => ComputeOffload::Pooled(WorkerPool::new(size)),
        };
        let row_pipeline = match config.max_concurrent_fetches {
            Some(limit) => RowPipeline::new(fetcher).with_max_concurrent_fetches(limit),
            None => RowPipeline::new(fetcher),
        };
        Ok(Self {
            config,
            offload,
            row_pipeline,
        })
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    /// Renders `source` as a mosaic, writing rows to `sink` top to bottom.
    ///
    /// On failure, rows already written stay in the sink.
    pub async fn render<P, S>(&self, source: &P, sink: &mut S) -> Result<MosaicReport>
    where
        P: PixelSource,
        S: RowSink,
    {
        let (width, height) = source.dimensions();
        let grid = TileGrid::new(width, height, self.config.tile_size)?;
        let report = MosaicReport {
            rows: grid.row_count() as usize,
            cols: grid.col_count() as usize,
        };
        info!(width, height, rows = report.rows, cols = report.cols, "Rendering mosaic");

        let rows = grid.rows().map(|tiles| {
            let buffers = read_row(source, tiles);
            self.reduce(buffers)
        });
        self.row_pipeline.run(rows, sink).await?;

        Ok(report)
    }

    async fn reduce(&self, buffers: Result<Vec<PixelBuffer>>) -> Result<Row> {
        self.offload.reduce_row(buffers?).await
    }
}

fn read_row<P: PixelSource>(source: &P, tiles: impl Iterator<Item = Tile>) -> Result<Vec<PixelBuffer>> {
    tiles
        .map(|tile| source.read_region(tile.x, tile.y, tile.width, tile.height))
        .collect()
}

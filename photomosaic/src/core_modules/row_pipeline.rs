// THEORY:
// The `RowPipeline` is the heart of the mosaic renderer. It takes one future per
// tile row (each resolving to that row's colors), fetches the tile markup for
// every color, and hands finished rows to a `RowSink` strictly top to bottom.
//
// Key architectural principles:
// 1.  **Full Fan-Out**: Every row is dispatched immediately and every column of a
//     row is fetched concurrently. No row waits for an earlier row to render.
// 2.  **Order Reconciliation**: Rows complete in whatever order the network
//     allows. Completed rows are parked in a `RowReorderBuffer` keyed by row index,
//     and a cursor (`next_expected`) releases them only once every earlier row has
//     been released. Row `i` reaches the sink only after rows `0..i`.
// 3.  **Single Driver**: All in-flight rows are polled from one `FuturesUnordered`
//     inside `run`, so the buffer and cursor have exactly one writer and need no
//     lock, however many fetches are outstanding.
// 4.  **Fail-Fast, Atomic Rows**: A row renders all at once or not at all. The
//     first failed fetch fails its row, which ends the run. Rows already flushed
//     stay flushed; nothing after the failure is flushed. Returning drops every
//     remaining in-flight future.
// 5.  **Tunable Fan-Out**: Unbounded fan-out is the default. Callers with very
//     large images can cap simultaneous fetches with a semaphore.

use crate::core_modules::color::color::{ColorSample, Row};
use crate::core_modules::fetcher::TileFetcher;
use crate::{MosaicError, Result};
use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Receives rendered rows in row order.
pub trait RowSink {
    /// `tiles` holds one markup fragment per column, in column order.
    fn append_row(&mut self, index: usize, tiles: Vec<String>) -> Result<()>;
}

/// Collects each row as its fragments concatenated.
impl RowSink for Vec<String> {
    fn append_row(&mut self, _index: usize, tiles: Vec<String>) -> Result<()> {
        self.push(tiles.concat());
        Ok(())
    }
}

/// Writes each row as a `<div>` block and flushes it, so rows appear as they land.
pub struct HtmlRowSink<W: Write> {
    writer: W,
}

impl<W: Write> HtmlRowSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink for HtmlRowSink<W> {
    fn append_row(&mut self, _index: usize, tiles: Vec<String>) -> Result<()> {
        writeln!(self.writer, "<div class=\"mosaic-row\">{}</div>", tiles.concat())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Completed rows waiting for their turn, plus the cursor of the next row to release.
#[derive(Debug)]
pub struct RowReorderBuffer<T> {
    pending: HashMap<usize, T>,
    next_expected: usize,
}

impl<T> RowReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            next_expected: 0,
        }
    }

    /// Parks a completed row.
    pub fn insert(&mut self, index: usize, row: T) {
        self.pending.insert(index, row);
    }

    /// Releases the next row if it has completed, advancing the cursor.
    pub fn pop_ready(&mut self) -> Option<(usize, T)> {
        let row = self.pending.remove(&self.next_expected)?;
        let index = self.next_expected;
        self.next_expected += 1;
        Some((index, row))
    }

    /// Index of the next row to release; equals the number of rows released so far.
    pub fn next_expected(&self) -> usize {
        self.next_expected
    }

    pub fn parked(&self) -> usize {
        self.pending.len()
    }
}

impl<T> Default for RowReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RowPipeline<F> {
    fetcher: F,
    fetch_limit: Option<Semaphore>,
}

impl<F: TileFetcher> RowPipeline<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            fetch_limit: None,
        }
    }

    /// Caps the number of tile fetches outstanding at once. `0` is treated as `1`.
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.fetch_limit = Some(Semaphore::new(limit.max(1)));
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Renders every row and emits them to `sink` in index order.
    ///
    /// Returns the number of rows flushed. On failure, the rows flushed before the
    /// failure was observed remain in the sink and the error is returned.
    pub async fn run<I, Fut, S>(&self, rows: I, sink: &mut S) -> Result<usize>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<Row>>,
        S: RowSink,
    {
        let mut in_flight: FuturesUnordered<_> = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| self.render_row(index, row))
            .collect();
        let total = in_flight.len();
        info!(rows = total, "Row pipeline started");

        let mut buffer = RowReorderBuffer::new();
        while let Some((index, outcome)) = in_flight.next().await {
            let tiles = match outcome {
                Ok(tiles) => tiles,
                Err(e) => {
                    warn!(row = index, flushed = buffer.next_expected(), error = %e, "Row failed, aborting mosaic");
                    return Err(e);
                }
            };

            buffer.insert(index, tiles);
            while let Some((ready, tiles)) = buffer.pop_ready() {
                sink.append_row(ready, tiles)?;
                debug!(row = ready, parked = buffer.parked(), "Flushed row");
            }
        }

        info!(rows = buffer.next_expected(), "Row pipeline finished");
        Ok(buffer.next_expected())
    }

    async fn render_row<Fut>(&self, index: usize, row: Fut) -> (usize, Result<Vec<String>>)
    where
        Fut: Future<Output = Result<Row>>,
    {
        let outcome = async {
            let colors = row.await?;
            debug!(row = index, cols = colors.len(), "Fetching row");
            try_join_all(colors.iter().map(|color| self.fetch_tile(color))).await
        }
        .await;
        (index, outcome)
    }

    async fn fetch_tile(&self, color: &ColorSample) -> Result<String> {
        let _permit = match &self.fetch_limit {
            Some(limit) => Some(limit.acquire().await.map_err(|_| MosaicError::FetchFailure {
                color: color.to_string(),
                reason: "fetch limiter closed".to_string(),
            })?),
            None => None,
        };
        self.fetcher.fetch(color).await
    }
}

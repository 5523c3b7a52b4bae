// THEORY:
// `ComputeOffload` turns one row of pixel buffers into one row of colors without
// blocking the task that drives the pipeline. It is a request/reply channel: the
// whole row goes out in one message, the colors come back in one reply, in column
// order.
//
// Key architectural principles:
// 1.  **Interchangeable Executors**: `Inline` reduces on the calling task,
//     `PerRow` spawns one blocking unit per row and discards it afterwards, and
//     `Pooled` hands the row to a long-lived `WorkerPool`. All three must produce
//     identical output; the choice is purely a performance knob.
// 2.  **Message Passing**: The executor owns the buffers it is sent. Nothing is
//     shared, so no locking is needed around the reduction itself.
// 3.  **Explicit Failure**: Bad pixel data comes back as `InvalidPixelData` and a
//     dead executor as `Offload`, so callers can tell input errors from
//     infrastructure errors.

use crate::core_modules::color::color::{PixelBuffer, Row, reduce_row};
use crate::parallel_pipeline::WorkerPool;
use crate::{MosaicError, Result};
use tokio::sync::oneshot;

pub enum ComputeOffload {
    /// Reduce synchronously on the calling task.
    Inline,
    /// Spawn one blocking execution unit per row.
    PerRow,
    /// Submit rows to a persistent pool of worker threads.
    Pooled(WorkerPool),
}

impl ComputeOffload {
    /// Reduces one row's pixel buffers to their colors, preserving column order.
    pub async fn reduce_row(&self, buffers: Vec<PixelBuffer>) -> Result<Row> {
        match self {
            ComputeOffload::Inline => reduce_row(&buffers),
            ComputeOffload::PerRow => {
                let (reply_tx, reply_rx) = oneshot::channel();
                tokio::task::spawn_blocking(move || {
                    let _ = reply_tx.send(reduce_row(&buffers));
                });
                reply_rx
                    .await
                    .map_err(|_| MosaicError::Offload("row worker exited without replying".to_string()))?
            }
            ComputeOffload::Pooled(pool) => pool.reduce_row(buffers).await,
        }
    }
}

// THEORY:
// The `WorkerPool` is the persistent flavour of compute offload. A fixed set of
// worker threads each own an inbox; rows are dealt to them round-robin and every
// task carries its own oneshot reply channel, so replies can never be confused
// between rows even though workers finish in any order.
//
// Workers are plain OS threads rather than async tasks: color reduction is pure CPU
// work, and running it off the async runtime keeps the row pipeline responsive
// while many fetches are in flight. Dropping the pool closes every inbox, which ends
// the worker loops.

use crate::core_modules::color::color::{PixelBuffer, Row, reduce_row};
use crate::{MosaicError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

pub struct RowTask {
    pub buffers: Vec<PixelBuffer>,
    pub result_sender: oneshot::Sender<Result<Row>>,
}

pub struct WorkerPool {
    task_senders: Vec<mpsc::UnboundedSender<RowTask>>,
    next_worker: AtomicUsize,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads; `0` means one per CPU.
    pub fn new(size: usize) -> Self {
        let size = if size == 0 { num_cpus::get() } else { size };
        let mut task_senders = Vec::with_capacity(size);
        let mut workers = Vec::with_capacity(size);

        for worker_id in 0..size {
            let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<RowTask>();
            let worker = std::thread::spawn(move || {
                while let Some(task) = task_receiver.blocking_recv() {
                    let _ = task.result_sender.send(reduce_row(&task.buffers));
                }
                debug!(worker_id, "Color worker shut down");
            });
            task_senders.push(task_sender);
            workers.push(worker);
        }

        Self {
            task_senders,
            next_worker: AtomicUsize::new(0),
            workers,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Sends one row to the next worker and waits for its colors.
    pub async fn reduce_row(&self, buffers: Vec<PixelBuffer>) -> Result<Row> {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = RowTask {
            buffers,
            result_sender,
        };

        let worker_idx = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.task_senders.len();
        self.task_senders[worker_idx]
            .send(task)
            .map_err(|_| MosaicError::Offload("Failed to send row to worker pool".to_string()))?;

        result_receiver
            .await
            .map_err(|_| MosaicError::Offload("Failed to receive colors from worker".to_string()))?
    }
}

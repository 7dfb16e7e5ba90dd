//! Batch Insert Worker Pool
//!
//! A fixed set of workers draining one bounded queue of user batches. The queue is
//! the backpressure point: once every worker is busy and the queue is full, the
//! producer's `send` waits.
//!
//! ## Responsibilities
//! - **Draining**: each worker pulls the next batch until the producer hangs up.
//! - **Isolation**: a failed batch is logged and counted; the worker moves on.
//! - **Accounting**: inserted/skipped/failed totals shared across workers.

use crate::storage::{NewUser, UserStore, bounded};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

pub type Batch = Vec<NewUser>;

#[derive(Debug, Default)]
pub struct BatchStats {
    inserted: AtomicU64,
    skipped: AtomicU64,
    batches: AtomicU64,
    failed_batches: AtomicU64,
}

impl BatchStats {
    pub fn inserted(&self) -> u64 {
        self.inserted.load(Ordering::SeqCst)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn failed_batches(&self) -> u64 {
        self.failed_batches.load(Ordering::SeqCst)
    }
}

/// Fixed set of insert workers sharing one queue and one set of counters.
pub struct BatchWorkerPool {
    users: Arc<dyn UserStore>,
    stats: Arc<BatchStats>,
    worker_count: usize,
    /// Deadline for each batch insert.
    io_timeout: Duration,
}

impl BatchWorkerPool {
    pub fn new(users: Arc<dyn UserStore>, worker_count: usize, io_timeout: Duration) -> Self {
        Self {
            users,
            stats: Arc::new(BatchStats::default()),
            worker_count: worker_count.max(1),
            io_timeout,
        }
    }

    pub fn stats(&self) -> Arc<BatchStats> {
        self.stats.clone()
    }

    /// Spawns the workers. They exit once `queue` is closed and drained.
    pub fn start(&self, queue: mpsc::Receiver<Batch>) -> JoinSet<()> {
        let queue = Arc::new(Mutex::new(queue));
        let mut workers = JoinSet::new();

        for worker_id in 0..self.worker_count {
            let queue = queue.clone();
            let users = self.users.clone();
            let stats = self.stats.clone();
            let io_timeout = self.io_timeout;
            workers.spawn(async move {
                worker_loop(worker_id, queue, users, stats, io_timeout).await;
            });
        }

        tracing::info!("Started {} batch workers", self.worker_count);
        workers
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Batch>>>,
    users: Arc<dyn UserStore>,
    stats: Arc<BatchStats>,
    io_timeout: Duration,
) {
    tracing::debug!("Batch worker {} started", worker_id);

    loop {
        // Only one worker waits on the channel at a time.
        let next = queue.lock().await.recv().await;
        let Some(batch) = next else {
            break;
        };

        let size = batch.len();
        stats.batches.fetch_add(1, Ordering::SeqCst);

        match bounded(io_timeout, "insert batch", users.insert_batch(batch)).await {
            Ok(outcome) => {
                stats
                    .inserted
                    .fetch_add(outcome.inserted as u64, Ordering::SeqCst);
                stats
                    .skipped
                    .fetch_add(outcome.skipped as u64, Ordering::SeqCst);
                tracing::info!(
                    "Worker {} dumped batch of {} users ({} skipped)",
                    worker_id,
                    outcome.inserted,
                    outcome.skipped
                );
            }
            Err(e) => {
                stats.failed_batches.fetch_add(1, Ordering::SeqCst);
                tracing::error!(
                    "Worker {} failed to dump batch of {} users: {}",
                    worker_id,
                    size,
                    e
                );
            }
        }
    }

    tracing::debug!("Batch worker {} finished", worker_id);
}

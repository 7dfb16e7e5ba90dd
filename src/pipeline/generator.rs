use super::service::BulkPipeline;
use super::types::{BulkJob, BulkReport};
use super::workers::{Batch, BatchWorkerPool};
use crate::error::{Error, Result};
use crate::storage::NewUser;

use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Random address under `example.com`; collisions are improbable, not impossible.
pub fn synthetic_email() -> String {
    format!("{}@example.com", Uuid::new_v4().simple())
}

impl BulkPipeline {
    /// Generates `target` users and inserts them in batches.
    ///
    /// Cancellation stops production; batches already queued are still written
    /// before `Error::Cancelled` is returned.
    pub async fn dump_users_with(
        &self,
        target: u64,
        token: &CancellationToken,
    ) -> Result<BulkReport> {
        let started = Instant::now();
        let batch_size = self.settings.batch_size;

        let (queue, receiver) = mpsc::channel::<Batch>(self.settings.queue_depth);
        let pool = BatchWorkerPool::new(
            self.users.clone(),
            self.settings.worker_count,
            self.settings.io_timeout,
        );
        let stats = pool.stats();
        let mut workers = pool.start(receiver);

        tracing::info!(
            "Generating {} users in batches of {}",
            target,
            batch_size
        );

        let mut submitted = Ok(());
        let mut batch: Batch = Vec::with_capacity(batch_size);
        for _ in 0..target {
            batch.push(NewUser::new(synthetic_email()));

            if batch.len() == batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                submitted = submit(&queue, full, token).await;
                if submitted.is_err() {
                    break;
                }
            }
        }

        if submitted.is_ok() && !batch.is_empty() {
            tracing::debug!("Submitting final batch of {} users", batch.len());
            submitted = submit(&queue, batch, token).await;
        }

        // Closing the queue lets the workers drain and exit.
        drop(queue);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Batch worker terminated abnormally: {}", e);
            }
        }

        let report = BulkReport {
            job: BulkJob::DumpUsers,
            processed: stats.inserted(),
            skipped: stats.skipped(),
            failed_batches: stats.failed_batches(),
            units: stats.batches(),
            elapsed: started.elapsed(),
        };

        if let Err(e) = submitted {
            tracing::warn!("Dump stopped early: {} ({})", e, report.summary());
            return Err(e);
        }

        tracing::info!("{}", report.summary());
        Ok(report)
    }
}

/// Blocks while the queue is full.
async fn submit(
    queue: &mpsc::Sender<Batch>,
    batch: Batch,
    token: &CancellationToken,
) -> Result<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        sent = queue.send(batch) => {
            sent.map_err(|_| Error::Store("batch workers exited".to_string()))
        }
    }
}

use super::service::BulkPipeline;
use super::types::{BulkJob, BulkReport};
use crate::error::{Error, Result};
use crate::hashing::Offset;
use crate::storage::{UserRecord, bounded};

use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

impl BulkPipeline {
    /// Sets the index bit of every stored user, one page at a time.
    ///
    /// Stops at the first empty page. Any read or write failure aborts the
    /// remaining pages.
    pub async fn load_index_with(&self, token: &CancellationToken) -> Result<BulkReport> {
        let started = Instant::now();
        let page_size = self.settings.page_size;

        let mut after = None;
        let mut processed = 0u64;
        let mut pages = 0u64;

        loop {
            if token.is_cancelled() {
                tracing::warn!(
                    "Index load cancelled after {} pages ({} hashes)",
                    pages,
                    processed
                );
                return Err(Error::Cancelled);
            }

            let page = bounded(
                self.settings.io_timeout,
                "scan users page",
                self.users.scan_page(after, page_size),
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to read page {}: {}", pages + 1, e);
                e
            })?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);

            let count = page.len() as u64;
            self.apply_page(page).await.map_err(|e| {
                tracing::error!("Failed to load page {} into the index: {}", pages + 1, e);
                e
            })?;

            pages += 1;
            processed += count;
            tracing::info!("Loaded {} email hashes into the index", processed);
        }

        let report = BulkReport {
            job: BulkJob::LoadIndex,
            processed,
            skipped: 0,
            failed_batches: 0,
            units: pages,
            elapsed: started.elapsed(),
        };
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    /// Sets bits in parallel; order within a page is irrelevant.
    async fn apply_page(&self, page: Vec<UserRecord>) -> Result<()> {
        let offsets: Vec<Offset> = page.into_iter().map(|record| record.offset).collect();
        let chunk_size = offsets
            .len()
            .div_ceil(self.settings.worker_count.max(1))
            .max(1);

        let mut tasks = JoinSet::new();
        for chunk in offsets.chunks(chunk_size) {
            let chunk = chunk.to_vec();
            let index = self.index.clone();
            tasks.spawn(async move {
                for offset in chunk {
                    index.set(offset, true).await?;
                }
                Ok::<(), Error>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| Error::Bitmap(format!("index writer terminated: {}", e)))
                .and_then(|result| result);
            if let Err(e) = outcome {
                tasks.abort_all();
                return Err(e);
            }
        }

        Ok(())
    }
}

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BulkJob {
    DumpUsers,
    LoadIndex,
}

/// Summary returned by a finished bulk job.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub job: BulkJob,
    /// Rows inserted (dump) or offsets written to the index (load).
    pub processed: u64,
    /// Generated rows dropped on a unique constraint.
    pub skipped: u64,
    pub failed_batches: u64,
    /// Batches (dump) or pages (load) handled.
    pub units: u64,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

impl BulkReport {
    /// Items per second, zero for an instantaneous run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> String {
        match self.job {
            BulkJob::DumpUsers => format!(
                "Dumped {} users to the store in {} ms ({:.0} users/s, {} skipped, {} failed batches)",
                self.processed,
                self.elapsed.as_millis(),
                self.throughput(),
                self.skipped,
                self.failed_batches
            ),
            BulkJob::LoadIndex => format!(
                "Loaded {} email hashes into the index in {} ms ({:.0} hashes/s, {} pages)",
                self.processed,
                self.elapsed.as_millis(),
                self.throughput(),
                self.units
            ),
        }
    }
}

fn as_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

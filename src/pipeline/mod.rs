//! Bulk Pipeline Module
//!
//! Long-running maintenance jobs that move data between the durable store and the
//! Membership Index. Neither job is on the request path.
//!
//! ## Jobs
//! - **Generate-and-dump** (`generator`): Produces synthetic users, groups them into
//!   fixed-size batches and feeds a bounded queue drained by a pool of insert workers.
//!   A failed batch is logged and counted; its siblings carry on.
//! - **Reconcile-to-index** (`reconcile`): Pages through every stored user by id and
//!   sets each offset bit, fanning a page out over parallel tasks. The first failure
//!   aborts the job, since a half-rebuilt bitmap is worse than a clean retry.
//!
//! Both jobs observe a cancellation token between batches/pages and report counts,
//! elapsed time and throughput.

pub mod generator;
pub mod handlers;
pub mod protocol;
pub mod reconcile;
pub mod service;
pub mod types;
pub mod workers;

pub use service::BulkPipeline;
pub use types::{BulkJob, BulkReport};

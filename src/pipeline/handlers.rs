use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

use super::protocol::BulkJobResponse;
use super::service::BulkPipeline;
use super::types::BulkReport;
use crate::error::Result;

pub async fn handle_dump_users(
    Extension(pipeline): Extension<Arc<BulkPipeline>>,
) -> (StatusCode, Json<BulkJobResponse>) {
    respond("dump-users", pipeline.dump_users().await)
}

pub async fn handle_load_index(
    Extension(pipeline): Extension<Arc<BulkPipeline>>,
) -> (StatusCode, Json<BulkJobResponse>) {
    respond("load-index", pipeline.load_index().await)
}

fn respond(job: &str, result: Result<BulkReport>) -> (StatusCode, Json<BulkJobResponse>) {
    match result {
        Ok(report) => {
            let message = report.summary();
            tracing::info!("{}", message);
            (
                StatusCode::OK,
                Json(BulkJobResponse {
                    success: true,
                    message,
                    count: report.processed,
                    elapsed_ms: report.elapsed.as_millis() as u64,
                }),
            )
        }
        Err(e) => {
            tracing::error!("Bulk job {} failed: {}", job, e);
            (
                e.status_code(),
                Json(BulkJobResponse {
                    success: false,
                    message: format!("Bulk job {} failed: {}", job, e),
                    count: 0,
                    elapsed_ms: 0,
                }),
            )
        }
    }
}

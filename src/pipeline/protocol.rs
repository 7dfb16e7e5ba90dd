use serde::{Deserialize, Serialize};

/// Triggers generate-and-dump.
pub const ENDPOINT_DUMP_USERS: &str = "/api/emails/dump-users";
/// Triggers reconcile-to-index.
pub const ENDPOINT_LOAD_INDEX: &str = "/api/emails/load-index";

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkJobResponse {
    pub success: bool,
    pub message: String,
    pub count: u64,
    pub elapsed_ms: u64,
}

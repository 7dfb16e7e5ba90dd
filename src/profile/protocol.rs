use crate::storage::UserRecord;
use serde::{Deserialize, Serialize};

/// Profile lookup, `GET /users/:email`.
pub const ENDPOINT_USER_PROFILE: &str = "/users";

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// `None` when the lookup failed; see `error`.
    pub user: Option<UserRecord>,
    pub error: Option<String>,
}

//! Registration HTTP Protocol
//!
//! Endpoint paths and the query/response bodies of the registration API.

use serde::{Deserialize, Serialize};

/// Membership check, `GET ?email=`.
pub const ENDPOINT_CHECK: &str = "/api/emails/check";
/// Registration, `POST ?email=`.
pub const ENDPOINT_REGISTER: &str = "/api/emails/register";

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub email: String,
    pub registered: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub email: String,
    pub registered: bool,
    /// Store-assigned id when the registration persisted.
    pub id: Option<i64>,
    pub message: String,
}

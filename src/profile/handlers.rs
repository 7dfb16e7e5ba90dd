use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::protocol::ProfileResponse;
use super::service::ProfileService;
use crate::error::Error;

pub async fn handle_find_user(
    Extension(profiles): Extension<Arc<ProfileService>>,
    Path(email): Path<String>,
) -> (StatusCode, Json<ProfileResponse>) {
    match profiles.find_user(&email).await {
        Ok(user) => (
            StatusCode::OK,
            Json(ProfileResponse {
                user: Some(user),
                error: None,
            }),
        ),
        Err(e) => {
            match &e {
                Error::NotFound(_) => tracing::debug!("Profile lookup miss for {}", email),
                _ => tracing::error!("Profile lookup for {} failed: {}", email, e),
            }
            (
                e.status_code(),
                Json(ProfileResponse {
                    user: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

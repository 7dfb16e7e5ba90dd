use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
};
use std::sync::Arc;

use super::protocol::{CheckResponse, EmailQuery, RegisterResponse};
use super::service::RegistrationService;
use super::types::RegisterOutcome;

pub async fn handle_check_email(
    Extension(service): Extension<Arc<RegistrationService>>,
    Query(query): Query<EmailQuery>,
) -> (StatusCode, Json<CheckResponse>) {
    match service.is_registered(&query.email).await {
        Ok(registered) => {
            let message = format!(
                "Email '{}' is {}",
                query.email,
                if registered { "registered" } else { "not registered" }
            );
            (
                StatusCode::OK,
                Json(CheckResponse {
                    email: query.email,
                    registered,
                    message,
                }),
            )
        }
        Err(e) => {
            tracing::error!("Membership check for {} failed: {}", query.email, e);
            (
                e.status_code(),
                Json(CheckResponse {
                    email: query.email,
                    registered: false,
                    message: e.to_string(),
                }),
            )
        }
    }
}

pub async fn handle_register_email(
    Extension(service): Extension<Arc<RegistrationService>>,
    Query(query): Query<EmailQuery>,
) -> (StatusCode, Json<RegisterResponse>) {
    let outcome = match service.register(&query.email).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Registration of {} failed: {}", query.email, e);
            return (
                e.status_code(),
                Json(RegisterResponse {
                    email: query.email,
                    registered: false,
                    id: None,
                    message: e.to_string(),
                }),
            );
        }
    };

    let (status, id, message) = match &outcome {
        RegisterOutcome::Registered(record) => (
            StatusCode::CREATED,
            Some(record.id),
            format!("Email '{}' registered successfully", query.email),
        ),
        RegisterOutcome::AlreadyRegistered | RegisterOutcome::Conflict(_) => (
            StatusCode::CONFLICT,
            None,
            format!("Email '{}' is already registered", query.email),
        ),
        RegisterOutcome::InvalidEmail => (
            StatusCode::BAD_REQUEST,
            None,
            "Email must not be blank".to_string(),
        ),
    };

    (
        status,
        Json(RegisterResponse {
            email: query.email,
            registered: outcome.is_registered(),
            id,
            message,
        }),
    )
}

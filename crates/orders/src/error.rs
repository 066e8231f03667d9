//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`. Responses carry a JSON body with a stable machine
//! code alongside the human-readable message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::service::OrderError;

/// Application-level error type for the orders service.
#[derive(Debug, Error)]
pub enum AppError {
    /// An order use case failed.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Structurally invalid inbound payload.
    #[error("Invalid request")]
    Validation(Vec<String>),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error payload returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional per-field details for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Order(err) => match err {
                OrderError::InvalidRequest(_) | OrderError::InvalidIdentity(_) => {
                    StatusCode::BAD_REQUEST
                }
                OrderError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                OrderError::DuplicateOrder(_) => StatusCode::CONFLICT,
                OrderError::ExternalService(_) => StatusCode::BAD_GATEWAY,
                OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Order(err) => match err {
                OrderError::InvalidRequest(_) => "VALIDATION_ERROR",
                OrderError::InvalidIdentity(_) => "INVALID_IDENTITY",
                OrderError::OrderNotFound(_) => "ORDER_NOT_FOUND",
                OrderError::DuplicateOrder(_) => "DUPLICATE_ORDER",
                OrderError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
                OrderError::Store(_) => "INTERNAL_ERROR",
            },
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture infrastructure failures to Sentry
        if matches!(
            self,
            Self::Internal(_)
                | Self::Order(OrderError::Store(_) | OrderError::ExternalService(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let code = self.code();

        // Don't expose internal error details to clients
        let (message, details) = match self {
            Self::Internal(_) | Self::Order(OrderError::Store(_)) => {
                ("An error occurred".to_string(), None)
            }
            Self::Validation(details) => ("Invalid request".to_string(), Some(details)),
            other => (other.to_string(), None),
        };

        (
            status,
            Json(ErrorBody {
                code,
                message,
                details,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use pomelo_core::OrderId;

    use super::*;

    #[test]
    fn test_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Order(OrderError::InvalidRequest(
                "email must not be null".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::InvalidIdentity(
                "ghost@x.com".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::OrderNotFound(OrderId::new(1)))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::DuplicateOrder(
                "duplicate".to_string()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::ExternalService(
                crate::directory::DirectoryError::Api {
                    status: 502,
                    message: "down".to_string(),
                }
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_machine_codes() {
        assert_eq!(
            AppError::Order(OrderError::OrderNotFound(OrderId::new(1))).code(),
            "ORDER_NOT_FOUND"
        );
        assert_eq!(
            AppError::Order(OrderError::DuplicateOrder("d".to_string())).code(),
            "DUPLICATE_ORDER"
        );
        assert_eq!(
            AppError::Validation(vec!["email is required".to_string()]).code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_identity_and_transport_failures_are_distinguishable() {
        let identity = AppError::Order(OrderError::InvalidIdentity("ghost@x.com".to_string()));
        let transport = AppError::Order(OrderError::ExternalService(
            crate::directory::DirectoryError::Parse("bad body".to_string()),
        ));

        assert_ne!(identity.code(), transport.code());
        assert_ne!(identity.status(), transport.status());
    }
}

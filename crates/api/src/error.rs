//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking_store::StoreError;
use client::ClientError;
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Saga or creation-guard error.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::BookingNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        SagaError::NotConfirmable { .. }
        | SagaError::ConfirmationInProgress(_)
        | SagaError::SlotContended
        | SagaError::SlotTaken => (StatusCode::CONFLICT, err.to_string()),
        SagaError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SagaError::Reservation(client_err) | SagaError::Payment(client_err) => {
            client_error_to_response(client_err)
        }
        SagaError::Lock(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        SagaError::Store(StoreError::RowLocked(_)) => (StatusCode::CONFLICT, err.to_string()),
        SagaError::Store(_) => {
            tracing::error!(error = %err, "booking store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn client_error_to_response(err: &ClientError) -> (StatusCode, String) {
    match err {
        ClientError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, err.to_string()),
        ClientError::Auth { status, .. } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::UNAUTHORIZED),
            err.to_string(),
        ),
        ClientError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        // The downstream message passes through verbatim, e.g. a payment
        // decline reason.
        ClientError::Rejected { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        ClientError::Unavailable { .. } => (StatusCode::BAD_GATEWAY, err.to_string()),
        ClientError::InvalidResponse(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BookingId;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::Saga(SagaError::BookingNotFound(BookingId::new()));
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflicts_map_to_409() {
        assert_eq!(
            status_of(ApiError::Saga(SagaError::ConfirmationInProgress(
                BookingId::new()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Saga(SagaError::SlotContended)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Saga(SagaError::SlotTaken)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_payment_rejection_maps_to_400() {
        let err = ApiError::Saga(SagaError::Payment(ClientError::Rejected {
            status: 400,
            message: "Payment declined".to_string(),
        }));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timeout_maps_to_504_and_unavailable_to_502() {
        let timeout = ApiError::Saga(SagaError::Payment(ClientError::Timeout {
            url: "http://payments".to_string(),
            attempts: 4,
        }));
        assert_eq!(status_of(timeout), StatusCode::GATEWAY_TIMEOUT);

        let unavailable = ApiError::Saga(SagaError::Reservation(ClientError::Unavailable {
            url: "http://fleet".to_string(),
            attempts: 4,
            message: "HTTP 503".to_string(),
        }));
        assert_eq!(status_of(unavailable), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_auth_status_passes_through() {
        let err = ApiError::Saga(SagaError::Reservation(ClientError::Auth {
            url: "http://fleet".to_string(),
            status: 403,
        }));
        assert_eq!(status_of(err), StatusCode::FORBIDDEN);
    }
}

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use foodcourtio_shared::Error;
use serde::Serialize;

/// HTTP shape of the shared error taxonomy: `{code, message, details?}`
/// with the status chosen by taxonomy name.
pub struct ApiError(pub Error);

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;

        let status = match &err {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_)
            | Error::AlreadyExists(_)
            | Error::PaymentAlreadyExists(_)
            | Error::RefundFailed(_) => StatusCode::CONFLICT,
            Error::Validation(_) | Error::IllegalTransition { .. } => StatusCode::BAD_REQUEST,
            Error::OverlappingShift => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidWebhookSignature => StatusCode::BAD_REQUEST,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &err {
            Error::Server(inner) => {
                tracing::error!(err = %inner, "internal error");
                "an unexpected error occurred".to_owned()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: err.code(),
            message,
            details: err.details(),
        };

        (status, Json(body)).into_response()
    }
}

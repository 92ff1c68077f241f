//! Mapping of core failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use poncik_core::{CoreError, OAuthError};
use serde_json::json;

/// Error returned by every handler; renders as `{"detail": "<reason>"}`.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

pub type ApiResult<T> = Result<T, ApiError>;

impl<E> From<E> for ApiError
where
    E: Into<CoreError>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    pub fn unauthenticated(reason: &str) -> Self {
        ApiError(CoreError::Unauthenticated(reason.to_string()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CoreError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::InvalidState(_) | CoreError::AlreadyClaimed(_) => StatusCode::BAD_REQUEST,
            CoreError::Locked(_) => StatusCode::FORBIDDEN,
            CoreError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            CoreError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match &self.0 {
            CoreError::Upstream { service, .. } if service == "push" => {
                "Failed to send notification".to_string()
            }
            CoreError::Upstream { service, .. } if service == "payments" => {
                "Payment processing failed".to_string()
            }
            CoreError::Upstream { .. } => "Upstream service unavailable".to_string(),
            CoreError::OAuth(OAuthError::CredentialsNotConfigured { service }) => {
                format!("{service} is not configured")
            }
            CoreError::Database(_) | CoreError::Json(_) | CoreError::Config(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(%status, error = %self.0, "request rejected");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poncik_core::DatabaseError;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let cases = [
            (CoreError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (CoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CoreError::InvalidState("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::Locked("x".into()), StatusCode::FORBIDDEN),
            (CoreError::AlreadyClaimed("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::RateLimited("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (CoreError::upstream("push", "boom"), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err = ApiError(DatabaseError::Sqlite("no such table: users".into()).into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Internal server error");
    }

    #[test]
    fn domain_reason_is_the_detail() {
        let err = ApiError(CoreError::invalid("Not enough credits"));
        assert_eq!(err.detail(), "Not enough credits");
    }
}

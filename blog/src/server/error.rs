//! Mapping of blog errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::Error;

/// Error returned by HTTP handlers.
///
/// Renders as `{"status": "error", "message": ...}` with a status code
/// derived from the underlying [`Error`].
#[derive(Debug)]
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Storage(_)
            | Error::Log(_)
            | Error::Serialization(_)
            | Error::Unsupported(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = serde_json::json!({
            "status": "error",
            "message": self.0.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Error::InvalidInput("bad".to_string()), StatusCode::BAD_REQUEST)]
    #[case(Error::NotFound("article foo".to_string()), StatusCode::NOT_FOUND)]
    #[case(Error::Storage("down".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Error::Log(eventlog::Error::Closed), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Error::Unsupported("nope".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn should_map_error_to_status(#[case] error: Error, #[case] expected: StatusCode) {
        // when
        let response = ApiError(error).into_response();

        // then
        assert_eq!(response.status(), expected);
    }
}

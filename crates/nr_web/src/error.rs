use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nr_core::Error;
use serde_json::json;
use tracing::error;

/// A service error on its way out as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated | Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::RemoteApi { .. } | Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = json!({
            "error": self.0.to_string(),
            "upstreamStatus": self.0.status(),
        });
        (status, Json(body)).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::{logicware, logicware::auth::AuthError, mantra};

/// Failures surfaced to the frontend as the JSON error envelope
/// `{succeeded: false, error, statusCode}`. Upstream HTTP error statuses are
/// not represented here; those are relayed verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to obtain access token: {0}")]
    Auth(#[from] AuthError),
    #[error("Failed to reach upstream API: {0}")]
    Upstream(#[source] anyhow::Error),
    #[error("{0}")]
    Validation(String),
}

impl From<logicware::Error> for ApiError {
    fn from(err: logicware::Error) -> Self {
        match err {
            logicware::Error::Auth(err) => Self::Auth(err),
            other => Self::Upstream(other.into()),
        }
    }
}

impl From<mantra::Error> for ApiError {
    fn from(err: mantra::Error) -> Self {
        Self::Upstream(err.into())
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(_) | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Validation(reason) => warn!(message = "Rejected request body", reason = %reason),
            other => error!(message = "Request failed", error = %other),
        }
        let body = json!({
            "succeeded": false,
            "error": self.to_string(),
            "statusCode": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

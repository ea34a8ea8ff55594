//! HTTP mapping of [`RpcError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use steprpc_core::messages::ErrorResponse;
use tracing::error;

use crate::service::{ErrorKind, RpcError};

/// Status code for each error category.
///
/// Policy denials answer 400, not 403: the caller is authenticated, the
/// request names an operation this server does not expose.
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::PolicyDenied => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!(error = %format!("{e:#}"), "request failed with internal error");
        }
        let status = status_for(self.kind());
        (status, Json(ErrorResponse { error: self.to_body() })).into_response()
    }
}

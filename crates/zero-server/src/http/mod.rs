mod params;
mod routes;

pub use params::UniversalGraphParams;
pub use routes::create_router;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use zero_core::{DiscoveryEngine, NodeId, RedbGraphStore, ZeroError};

/// Header carrying the requesting user's id, set by the auth proxy in front.
pub const USER_HEADER: &str = "x-user-id";

pub type Engine = DiscoveryEngine<RedbGraphStore>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            start_time: std::time::Instant::now(),
        }
    }
}

/// JSON response wrapper
#[derive(Serialize)]
pub struct JsonResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Error returned by HTTP handlers, already mapped to a status code.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ZeroError> for AppError {
    fn from(err: ZeroError) -> Self {
        let status = match &err {
            ZeroError::Validation(_) => StatusCode::BAD_REQUEST,
            ZeroError::AxisNotEligible { .. } => StatusCode::CONFLICT,
            ZeroError::NodeNotFound(_) | ZeroError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            ZeroError::QueryTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ZeroError::Fetch { source, .. } if source.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        } else {
            tracing::debug!("Request rejected: {}", err);
        }

        Self {
            status,
            message: err.public_message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(JsonResponse::<()>::err(self.message))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// The requesting user, if the caller identified one.
pub fn requesting_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Like `requesting_user`, for operations that need someone to act as.
pub fn required_user(headers: &HeaderMap) -> AppResult<String> {
    requesting_user(headers)
        .ok_or_else(|| AppError::bad_request(format!("the {} header is required", USER_HEADER)))
}

pub fn parse_id(raw: &str) -> AppResult<NodeId> {
    raw.parse()
        .map_err(|_| AppError::bad_request(format!("invalid node id '{}'", raw)))
}

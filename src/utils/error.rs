use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use slack_lists::SlackListsError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Erro vindo do núcleo (validação, API do Slack, retry esgotado)
    Slack(SlackListsError),
    UnknownTool(String),
    InvalidArguments(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Slack(err) => write!(f, "{}", err),
            AppError::UnknownTool(name) => write!(f, "Unknown tool: {}", name),
            AppError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<SlackListsError> for AppError {
    fn from(err: SlackListsError) -> Self {
        AppError::Slack(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidArguments(err.to_string())
    }
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Slack(err) => err.kind(),
            AppError::UnknownTool(_) => "unknown_tool",
            AppError::InvalidArguments(_) => "invalid_arguments",
            AppError::InternalError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Slack(err) if err.is_input_error() => StatusCode::BAD_REQUEST,
            AppError::Slack(SlackListsError::TransientFailure { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Slack(SlackListsError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Slack(SlackListsError::ConfigError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Slack(_) => StatusCode::BAD_GATEWAY,
            AppError::UnknownTool(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArguments(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (upstream_status, retryable) = match &self {
            AppError::Slack(err) => (err.status_code(), err.is_retryable()),
            _ => (None, false),
        };

        let body = json!({
            "success": false,
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
                "status_code": upstream_status,
                "retryable": retryable,
            },
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

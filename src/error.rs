use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    JobNotFound(String),
    UpstreamError(String),
    MalformedResponse(String),
    InvalidRequest(String),
    MissingFields(Vec<&'static str>),
    ApplicationLinkMissing(String),
    ApplicationLinkInvalid(String),
    SubmissionRejected(String),
    SubmissionFailed(String),
    ConfigError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::JobNotFound(id) => write!(f, "Job not found: {}", id),
            AppError::UpstreamError(msg) => write!(f, "Upstream request failed: {}", msg),
            AppError::MalformedResponse(msg) => write!(f, "Malformed upstream response: {}", msg),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::MissingFields(fields) => write!(
                f,
                "Please fill in all required fields (missing: {})",
                fields.join(", ")
            ),
            AppError::ApplicationLinkMissing(_) => {
                write!(f, "Application link not available for this position")
            }
            AppError::ApplicationLinkInvalid(link) => {
                write!(f, "Application link is not a valid URL: {}", link)
            }
            AppError::SubmissionRejected(_) => write!(f, "Submission failed. Please try again."),
            AppError::SubmissionFailed(_) => {
                write!(f, "Something went wrong. Please try again later.")
            }
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Whether the caller may reasonably try the same action again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamError(_) | AppError::SubmissionRejected(_) | AppError::SubmissionFailed(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::UpstreamError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::JobNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
            AppError::ApplicationLinkMissing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ApplicationLinkInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::SubmissionRejected(_) => StatusCode::BAD_GATEWAY,
            AppError::SubmissionFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "retryable": self.is_retryable(),
        }));

        (status, body).into_response()
    }
}

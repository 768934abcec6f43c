//! HTTP error mapping and the JSON response envelope.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nomoji_core::AppError;
use serde::Serialize;

pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Successful response envelope: `{success: true, data?, message?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Envelope that carries only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Failure envelope: `{success: false, error, retryAfter?}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            retry_after: None,
        }
    }
}

/// Underlying message of a 500 response, attached as a response extension.
///
/// The error-detail middleware swaps it into the body outside production;
/// the observability middleware reads it for error analytics.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// Error returned by handlers and middleware.
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(message) => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge("Request body too large.".to_string());
        }
        match rejection {
            JsonRejection::JsonSyntaxError(_) => Self::BadRequest("Invalid JSON body.".to_string()),
            JsonRejection::MissingJsonContentType(_) => Self::BadRequest(
                "Expected request with `Content-Type: application/json`.".to_string(),
            ),
            other => Self::BadRequest(format!("Invalid request body: {}", other.body_text())),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                let mut response = (status, Json(ErrorBody::new(INTERNAL_ERROR_MESSAGE))).into_response();
                response.extensions_mut().insert(ErrorDetail(detail));
                response
            }
            Self::BadRequest(message) | Self::NotFound(message) | Self::PayloadTooLarge(message) => {
                (status, Json(ErrorBody::new(message))).into_response()
            }
        }
    }
}

/// `axum::Json` with rejections rendered as the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct ApiJson<T>(pub T);

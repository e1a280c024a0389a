//! Error type shared by every handler.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    /// No credential, or one that does not resolve to an active user.
    #[error("{0}")]
    Unauthorized(String),

    /// Verification token was never issued or has already been consumed.
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    /// Authenticated, but not allowed to act on the resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    NotFound(String),

    /// A single field failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidOrExpiredToken
            | Self::AlreadyExists(_)
            | Self::InvalidArgument(_)
            | Self::UnsupportedMediaType(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Internal(msg) = self {
            tracing::error!(error = %msg, "Request failed with internal error");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "detail": self.to_string(),
            "code": self.error_code(),
        }))
    }
}

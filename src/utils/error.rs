use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Error kinds surfaced by the HTTP API.
///
/// Each kind maps to exactly one status code. Upstream failures keep their
/// detail for the logs only; clients get a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{service} error: {detail}")]
    UpstreamUnavailable {
        service: &'static str,
        detail: String,
    },
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn upstream(service: &'static str, detail: impl ToString) -> Self {
        AppError::UpstreamUnavailable {
            service,
            detail: detail.to_string(),
        }
    }

    /// Stable machine-readable kind, used as the `error` field of the body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::UpstreamUnavailable { .. } => "upstream_unavailable",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::UpstreamUnavailable { service, .. } => format!("{} is unavailable", service),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::UpstreamUnavailable { service, detail } = self {
            log::error!("❌ {} failure: {}", service, detail);
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            error: self.kind().to_string(),
            message: self.public_message(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::upstream("database", err)
    }
}

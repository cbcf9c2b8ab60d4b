/// Error types for the dashboard service
///
/// Each user-facing failure class from the dashboard gets its own variant
/// so handlers surface distinguishable messages: data-fetch failures,
/// the three AI failure kinds (transport, malformed output, semantically
/// invalid choice), and graphic-rendering failures are never conflated.
/// No failure is retried automatically; recovery is always an explicit
/// re-trigger by the operator.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use gemini_client::GeminiError;
use std::fmt;

/// Result type for dashboard-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Database operation failed (whole-page abort for feed fetches)
    DatabaseError(String),

    /// Redis operation failed
    CacheError(String),

    /// No session / invalid token
    Unauthorized(String),

    /// Session present but profile is not dashboard-eligible
    Forbidden(String),

    /// Resource not found
    NotFound(String),

    /// Bad request
    BadRequest(String),

    /// Operation already in flight (feed refresh/load-more exclusion)
    Conflict(String),

    /// AI transport failure: network error or non-2xx from the API
    AiRequest(String),

    /// AI response failure: empty body, non-JSON, or schema mismatch
    AiResponse(String),

    /// AI choice was structurally valid but referentially invalid
    AiChoice(String),

    /// Shareable-graphic rendering failed
    RenderError(String),

    /// Internal server error
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::CacheError(msg) => write!(f, "Cache error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::AiRequest(msg) => write!(f, "AI request failed: {}", msg),
            AppError::AiResponse(msg) => write!(f, "AI response invalid: {}", msg),
            AppError::AiChoice(msg) => write!(f, "AI choice rejected: {}", msg),
            AppError::RenderError(msg) => write!(f, "Graphic rendering failed: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::AiRequest(_) => StatusCode::BAD_GATEWAY,
            AppError::AiResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::AiChoice(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RenderError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<GeminiError> for AppError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Request(_) | GeminiError::Api { .. } => {
                AppError::AiRequest(err.to_string())
            }
            GeminiError::EmptyResponse
            | GeminiError::MalformedJson(_)
            | GeminiError::SchemaMismatch(_) => AppError::AiResponse(err.to_string()),
            GeminiError::MissingImage | GeminiError::InvalidImagePayload(_) => {
                AppError::RenderError(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_failure_kinds_stay_distinguishable() {
        let schema = AppError::from(GeminiError::SchemaMismatch("missing caption".into()));
        assert!(matches!(schema, AppError::AiResponse(_)));
        assert_eq!(schema.status_code(), StatusCode::BAD_GATEWAY);

        let empty = AppError::from(GeminiError::EmptyResponse);
        assert!(matches!(empty, AppError::AiResponse(_)));

        let api = AppError::from(GeminiError::Api {
            status: 500,
            body: "boom".into(),
        });
        assert!(matches!(api, AppError::AiRequest(_)));

        let image = AppError::from(GeminiError::MissingImage);
        assert!(matches!(image, AppError::RenderError(_)));
    }
}

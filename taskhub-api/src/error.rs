/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Failures become a JSON body of the
/// shape
///
/// ```json
/// { "error": true, "code": "not_found", "message": "Task not found" }
/// ```
///
/// with a matching HTTP status. Store failures are logged and reported
/// generically; nothing escapes as a panic.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskhub_shared::{
    auth::{jwt::JwtError, middleware::AuthError},
    models::task::TaskIdError,
    store::StoreError,
};
use validator::{Validate, ValidationErrors};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), e.g. a malformed task id
    BadRequest(String),

    /// Unauthorized (401): no credential, or identity mismatch
    Unauthorized(String),

    /// Forbidden (403): credential failed validation
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),

    /// Store call exceeded its time budget (504)
    Timeout(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `true`
    pub error: bool,

    /// Error code (e.g. "bad_request", "unauthorized")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::Timeout(msg) => write!(f, "Timeout: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ("internal_error", "An internal error occurred".to_string(), None)
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                ("service_unavailable", msg, None)
            }
            ApiError::Timeout(msg) => {
                tracing::warn!("Request timed out: {}", msg);
                ("timeout", msg, None)
            }
        };

        let body = Json(ErrorResponse {
            error: true,
            code: code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Runs `validator` rules on a request body
pub fn validate_request<T: Validate>(req: &T) -> ApiResult<()> {
    req.validate().map_err(ApiError::from)
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                ApiError::Conflict(format!("Constraint violation: {}", constraint))
            }
            StoreError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
            StoreError::Database(sqlx::Error::PoolTimedOut) => {
                ApiError::ServiceUnavailable("Database connection pool exhausted".to_string())
            }
            StoreError::Database(db_err) => ApiError::InternalError(format!("Database error: {}", db_err)),
        }
    }
}

/// Convert gate and guard rejections to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::EmailMismatch => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::InvalidToken(msg) => ApiError::Forbidden(msg),
        }
    }
}

/// Token creation failures are server-side problems
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::InternalError(format!("Token operation failed: {}", err))
    }
}

impl From<TaskIdError> for ApiError {
    fn from(err: TaskIdError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

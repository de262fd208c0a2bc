/// Request authentication primitives for Axum
///
/// Two checks run in front of every caller-scoped route:
///
/// 1. **Token gate** ([`authenticate`]): the `Authorization` header must carry a
///    credential (`<scheme> <token>`) whose signature validates against the
///    shared secret. The embedded email becomes the request's [`AuthContext`].
/// 2. **Email-match guard** ([`ensure_email_matches`]): the `email` the caller
///    claims to operate as must equal the verified identity.
///
/// Rejections:
///
/// | Failure | Error | Status |
/// |---|---|---|
/// | header or token missing | `MissingCredentials` | 401 |
/// | signature/claims invalid | `InvalidToken` | 403 |
/// | claimed email differs | `EmailMismatch` | 401 |
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use taskhub_shared::auth::jwt::{create_token, Claims};
/// use taskhub_shared::auth::middleware::{authenticate, ensure_email_matches};
///
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let token = create_token(&Claims::new("a@x.com"), secret).unwrap();
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     header::AUTHORIZATION,
///     HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
/// );
///
/// let auth = authenticate(&headers, secret).unwrap();
/// assert!(ensure_email_matches(&auth, Some("a@x.com")).is_ok());
/// assert!(ensure_email_matches(&auth, Some("b@x.com")).is_err());
/// ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::jwt::{validate_token, JwtError};

/// Verified caller identity, added to request extensions by the token gate
///
/// Handlers can take it directly as an extractor:
///
/// ```
/// use taskhub_shared::auth::middleware::AuthContext;
///
/// async fn handler(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.email)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Email embedded in the verified credential
    pub email: String,
}

impl AuthContext {
    /// Creates a context for a verified email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// Error type for authentication and the email-match guard
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or no credential inside it
    #[error("Unauthorized entry")]
    MissingCredentials,

    /// Credential present but failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Claimed email does not match the verified identity
    #[error("Invalid email")]
    EmailMismatch,
}

impl AuthError {
    /// HTTP status for this rejection
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials | AuthError::EmailMismatch => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials | AuthError::EmailMismatch => "unauthorized",
            AuthError::InvalidToken(_) => "forbidden",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": true,
            "code": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Pulls the credential out of the `Authorization` header
///
/// The header is split on whitespace and the second item is the credential;
/// the scheme word itself is not checked.
pub fn extract_credential(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .split_whitespace()
        .nth(1)
        .ok_or(AuthError::MissingCredentials)
}

/// Token gate: validates the bearer credential and returns the caller identity
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = extract_credential(headers)?;
    let claims = validate_token(token, secret)?;
    Ok(AuthContext::new(claims.sub))
}

/// Email-match guard
///
/// Exact, case-sensitive comparison. A missing claimed email is a mismatch.
pub fn ensure_email_matches(auth: &AuthContext, claimed: Option<&str>) -> Result<(), AuthError> {
    match claimed {
        Some(email) if email == auth.email => Ok(()),
        _ => Err(AuthError::EmailMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(
            authenticate(&headers, SECRET),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn test_header_without_credential() {
        for value in ["Bearer", "Bearer   ", ""] {
            assert_eq!(
                authenticate(&headers_with(value), SECRET),
                Err(AuthError::MissingCredentials),
                "header {:?}",
                value
            );
        }
    }

    #[test]
    fn test_valid_token() {
        let token = create_token(&Claims::new("a@x.com"), SECRET).unwrap();
        let auth = authenticate(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap();
        assert_eq!(auth, AuthContext::new("a@x.com"));
    }

    #[test]
    fn test_scheme_word_is_not_checked() {
        let token = create_token(&Claims::new("a@x.com"), SECRET).unwrap();
        let auth = authenticate(&headers_with(&format!("Token  {}", token)), SECRET).unwrap();
        assert_eq!(auth.email, "a@x.com");
    }

    #[test]
    fn test_wrong_signature_is_forbidden() {
        let token = create_token(&Claims::new("a@x.com"), "another-secret").unwrap();
        let err = authenticate(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_expired_token_is_forbidden() {
        let claims = Claims::with_expiration("a@x.com", Duration::seconds(-60));
        let token = create_token(&claims, SECRET).unwrap();
        let err = authenticate(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap_err();
        assert_eq!(err, AuthError::InvalidToken("Token expired".to_string()));
    }

    #[test]
    fn test_email_guard() {
        let auth = AuthContext::new("a@x.com");

        assert!(ensure_email_matches(&auth, Some("a@x.com")).is_ok());
        assert_eq!(
            ensure_email_matches(&auth, Some("b@x.com")),
            Err(AuthError::EmailMismatch)
        );
        assert_eq!(ensure_email_matches(&auth, None), Err(AuthError::EmailMismatch));
        // Case-sensitive on purpose
        assert_eq!(
            ensure_email_matches(&auth, Some("A@x.com")),
            Err(AuthError::EmailMismatch)
        );
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::EmailMismatch.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken("bad".to_string()).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}

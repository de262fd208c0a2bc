/// JWT token issuance and validation
///
/// Credentials are HS256-signed JWTs whose subject is the user's email address.
/// A fresh token is minted on every sign-in; nothing about the token is persisted.
///
/// # Claims
///
/// - `sub`: owner email (the identity handed to downstream handlers)
/// - `iss`: always "taskhub"
/// - `iat` / `nbf`: issuance time
/// - `exp`: expiration (24 hours unless configured otherwise)
/// - `jti`: random token id, so two tokens issued in the same second still differ
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new("a@x.com");
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, "a@x.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer stamped into and required on every token
pub const ISSUER: &str = "taskhub";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, structure or claim validation failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Default lifetime of an issued credential
pub fn default_expiration() -> Duration {
    Duration::hours(24)
}

/// JWT claims carried by a TaskHub credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - owner email
    pub sub: String,

    /// Issuer - always "taskhub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Unique token id
    pub jti: Uuid,
}

impl Claims {
    /// Creates claims for `email` with the default expiration
    pub fn new(email: impl Into<String>) -> Self {
        Self::with_expiration(email, default_expiration())
    }

    /// Creates claims with a custom expiration
    ///
    /// A negative duration produces an already-expired token, which is
    /// useful in tests.
    ///
    /// ```
    /// use taskhub_shared::auth::jwt::Claims;
    /// use chrono::Duration;
    ///
    /// let claims = Claims::with_expiration("a@x.com", Duration::hours(1));
    /// assert!(!claims.is_expired());
    /// ```
    pub fn with_expiration(email: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: email.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Signs `claims` with HS256 using `secret`
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a fresh credential for `email`
///
/// Every call produces a distinct token, even for the same email.
///
/// ```
/// use taskhub_shared::auth::jwt::issue_token;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let first = issue_token("a@x.com", "secret", Duration::hours(1))?;
/// let second = issue_token("a@x.com", "secret", Duration::hours(1))?;
/// assert_ne!(first, second);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns `JwtError::CreateError` if the expiration is out of range
pub fn issue_token(email: &str, secret: &str, expires_in: Duration) -> Result<String, JwtError> {
    if Utc::now().checked_add_signed(expires_in).is_none() {
        return Err(JwtError::CreateError(
            "Token expiration is out of range".to_string(),
        ));
    }

    let claims = Claims::with_expiration(email, expires_in);
    create_token(&claims, secret)
}

/// Validates a token and extracts its claims
///
/// Verifies the signature, issuer, `exp` and `nbf`.
///
/// # Errors
///
/// - `JwtError::Expired` when `exp` is in the past
/// - `JwtError::InvalidIssuer` when the issuer is not "taskhub"
/// - `JwtError::ValidationError` for bad signatures and malformed tokens
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_default_expiration() {
        assert_eq!(default_expiration(), Duration::hours(24));
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("a@x.com");

        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.iat, claims.nbf);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_with_custom_expiration() {
        let claims = Claims::with_expiration("a@x.com", Duration::hours(1));

        let time_left = claims.time_until_expiration().unwrap();
        assert!(time_left.num_seconds() > 3500);
        assert!(time_left.num_seconds() <= 3600);
    }

    #[test]
    fn test_create_and_validate_token() {
        let claims = Claims::new("a@x.com");
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated, claims);
    }

    #[test]
    fn test_issue_token_is_not_idempotent() {
        let first = issue_token("a@x.com", SECRET, Duration::hours(1)).unwrap();
        let second = issue_token("a@x.com", SECRET, Duration::hours(1)).unwrap();
        assert_ne!(first, second);

        // Both still resolve to the same identity
        assert_eq!(validate_token(&first, SECRET).unwrap().sub, "a@x.com");
        assert_eq!(validate_token(&second, SECRET).unwrap().sub, "a@x.com");
    }

    #[test]
    fn test_issue_token_rejects_out_of_range_expiration() {
        let result = issue_token("a@x.com", SECRET, Duration::MAX);
        assert!(matches!(result, Err(JwtError::CreateError(_))));
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = issue_token("a@x.com", "secret1", Duration::hours(1)).unwrap();

        let result = validate_token(&token, "wrong-secret");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_garbage() {
        assert!(matches!(
            validate_token("not-a-jwt", SECRET),
            Err(JwtError::ValidationError(_))
        ));
        assert!(validate_token("", SECRET).is_err());
    }

    #[test]
    fn test_validate_tampered_token() {
        let token = issue_token("a@x.com", SECRET, Duration::hours(1)).unwrap();
        let other = issue_token("b@x.com", SECRET, Duration::hours(1)).unwrap();

        // Splice b's payload onto a's signature
        let a: Vec<&str> = token.split('.').collect();
        let b: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", a[0], b[1], a[2]);

        assert!(validate_token(&forged, SECRET).is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration("a@x.com", Duration::seconds(-3600));

        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let mut claims = Claims::new("a@x.com");
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }
}

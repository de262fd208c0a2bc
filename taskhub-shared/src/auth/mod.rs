/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`jwt`]: credential issuance and validation (HS256)
/// - [`middleware`]: token gate, email-match guard and the `AuthContext` extractor
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let token = create_token(&Claims::new("a@x.com"), "secret-key")?;
/// let claims = validate_token(&token, "secret-key")?;
/// assert_eq!(claims.sub, "a@x.com");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;

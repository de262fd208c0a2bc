/// Token gate and email-match guard as Axum middleware
///
/// Both layers are mounted on every caller-scoped route in
/// [`crate::app::build_router`]; the gate must wrap the guard.
///
/// ```text
/// request ─▶ jwt_auth_layer ─▶ email_guard_layer ─▶ handler
///              401 no token      401 ?email missing
///              403 bad token         or different
///                                  400 malformed query
/// ```

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{rejection::QueryRejection, Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use taskhub_shared::auth::middleware::{authenticate, ensure_email_matches, AuthContext, AuthError};

/// Query parameters read by the email-match guard
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    /// Email the caller claims to operate as
    pub email: Option<String>,
}

/// Validates the bearer credential and stores the caller's [`AuthContext`]
/// in request extensions
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret()).map_err(|e| {
        tracing::debug!(path = %req.uri().path(), error = %e, "Token gate rejected request");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Rejects the request unless `?email=` equals the verified identity
pub async fn email_guard_layer(
    query: Result<Query<OwnerQuery>, QueryRejection>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let auth = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(AuthError::MissingCredentials)?;

    ensure_email_matches(auth, query.email.as_deref()).map_err(|e| {
        tracing::debug!(verified = %auth.email, claimed = ?query.email, "Email-match guard rejected request");
        ApiError::from(e)
    })?;

    Ok(next.run(req).await)
}

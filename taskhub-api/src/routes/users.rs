/// Sign-in endpoint
///
/// `POST /users` with `{ "email": "a@x.com" }` looks the user up, creates it
/// on first sight, and returns a freshly issued credential. The token is never
/// stored; signing in again yields the same user with a new token.
///
/// # Response
///
/// ```json
/// {
///   "id": "uuid",
///   "email": "a@x.com",
///   "created_at": "2024-01-01T00:00:00Z",
///   "created": true,
///   "token": "eyJ..."
/// }
/// ```
///
/// `201 Created` for a new user, `200 OK` otherwise. If the store fails, no
/// token is issued.

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::jwt,
    models::user::SignIn,
    store::find_or_create_user,
};
use uuid::Uuid;

/// Sign-in response
#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,

    /// Whether this call created the user
    pub created: bool,

    /// Bearer credential for the gated routes
    pub token: String,
}

/// Sign in (or up) by email
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignIn>,
) -> ApiResult<(StatusCode, Json<SignInResponse>)> {
    validate_request(&req)?;

    let (user, created) = state
        .bounded("sign_in", find_or_create_user(state.store.as_ref(), &req.email))
        .await?;

    let token = jwt::issue_token(&user.email, state.jwt_secret(), state.config.jwt.expiration())?;

    tracing::info!(user_id = %user.id, created, "User signed in");

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(SignInResponse {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            created,
            token,
        }),
    ))
}

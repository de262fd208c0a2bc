/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_api::{app::{build_router, AppState}, config::Config};
/// use taskhub_shared::store::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    middleware::auth::{email_guard_layer, jwt_auth_layer},
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::{future::Future, sync::Arc};
use taskhub_shared::store::{Store, StoreError};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor; both fields
/// are behind `Arc`, so the clone is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Document store, acquired once at startup
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Awaits a store call, giving up after the configured request timeout
    ///
    /// Store errors are converted to [`ApiError`]; an expired budget becomes
    /// `ApiError::Timeout`.
    pub async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> ApiResult<T>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.request_timeout(), fut).await {
            Ok(result) => result.map_err(|e| {
                tracing::warn!(operation, error = %e, "Store operation failed");
                ApiError::from(e)
            }),
            Err(_) => Err(ApiError::Timeout(format!(
                "Store did not answer {} within {}s",
                operation, self.config.api.request_timeout_secs
            ))),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET    /               # Liveness string (public)
/// ├── GET    /health         # Health check with store ping (public)
/// ├── POST   /users          # Sign in, returns a fresh token (public)
/// └── /tasks                 # Token gate + email-match guard
///     ├── POST   /           # Create task
///     ├── GET    /           # List caller's tasks
///     ├── GET    /:id        # Get one task
///     ├── PUT    /:id        # Upsert task
///     └── DELETE /:id        # Delete task
/// ```
///
/// # Middleware Stack
///
/// Outermost first: CORS, tracing, then (task routes only) the token gate
/// followed by the email-match guard.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/", get(routes::health::liveness))
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::sign_in));

    // Layers run bottom-up: the gate wraps the guard, so the guard always
    // sees a verified identity.
    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn(email_guard_layer))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/tasks", task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// CORS: permissive when `*` is configured, explicit origins otherwise
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

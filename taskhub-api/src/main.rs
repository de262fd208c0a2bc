//! # TaskHub API Server
//!
//! REST backend for per-user task lists: email sign-in issuing bearer
//! credentials, and task CRUD guarded by the token gate and email-match guard.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) DATABASE_URL=postgresql://localhost/taskhub \
//!     cargo run -p taskhub-api
//!
//! # Without PostgreSQL
//! STORE_BACKEND=memory JWT_SECRET=... cargo run -p taskhub-api
//! ```

use std::sync::Arc;

use taskhub_api::{
    app::{build_router, AppState},
    config::{Config, StoreBackend},
};
use taskhub_shared::{
    db::{
        migrations::{get_migration_status, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::{memory::MemoryStore, postgres::PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_api=debug,taskhub_shared=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    // The store handle lives for the whole process and is torn down after
    // the server has drained.
    let (store, pool): (Arc<dyn Store>, Option<sqlx::PgPool>) = match config.database.backend {
        StoreBackend::Postgres => {
            let url = config
                .database
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

            let pool = create_pool(DatabaseConfig {
                url,
                max_connections: config.database.max_connections,
                ..Default::default()
            })
            .await?;

            run_migrations(&pool).await?;
            let status = get_migration_status(&pool).await?;
            tracing::info!(
                applied = status.applied_migrations,
                latest = ?status.latest_version,
                "Schema is up to date"
            );

            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    let address = config.bind_address();
    let state = AppState::new(store, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}

//! Common test utilities for API tests
//!
//! Builds the full router over an in-memory store so tests exercise routing,
//! middleware and handlers exactly as the server runs them.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use taskhub_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig, StoreBackend},
};
use taskhub_shared::store::memory::MemoryStore;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing the router and the store behind it
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

/// Response status and parsed JSON body (`Value::Null` for non-JSON bodies)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 5,
        },
        database: DatabaseConfig {
            backend: StoreBackend::Memory,
            url: None,
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 24,
        },
    }
}

impl TestContext {
    /// Creates a context with an empty store
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();
        let state = AppState::new(store.clone(), config.clone());

        Self {
            app: build_router(state),
            store,
            config,
        }
    }

    /// Sends a request and collects the response
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send_request(builder.body(body).unwrap()).await
    }

    /// Sends a pre-built request
    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }

    /// Signs in and returns the issued token
    pub async fn sign_in(&self, email: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/users",
                None,
                Some(serde_json::json!({ "email": email })),
            )
            .await;

        assert!(
            response.status.is_success(),
            "sign-in failed: {} {}",
            response.status,
            response.text
        );

        response.body["token"]
            .as_str()
            .expect("token in sign-in response")
            .to_string()
    }

    /// Creates a task through the API and returns its id
    pub async fn create_task(&self, email: &str, token: &str, body: Value) -> String {
        let response = self
            .send(
                Method::POST,
                &format!("/tasks?email={}", email),
                Some(token),
                Some(body),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);

        response.body["id"]
            .as_str()
            .expect("id in created task")
            .to_string()
    }
}

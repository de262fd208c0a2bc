/// End-to-end tests for the TaskHub API
///
/// Every request goes through the real router (CORS, tracing, token gate,
/// email-match guard, handlers) backed by an in-memory store.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Duration;
use common::{TestContext, TEST_SECRET};
use serde_json::json;
use taskhub_shared::auth::jwt::{create_token, issue_token, Claims};
use uuid::Uuid;

/// Every gated route, with a body where one is required
fn gated_routes(email: &str) -> Vec<(Method, String, Option<serde_json::Value>)> {
    let id = Uuid::new_v4();
    vec![
        (
            Method::POST,
            format!("/tasks?email={}", email),
            Some(json!({ "title": "t" })),
        ),
        (Method::GET, format!("/tasks?email={}", email), None),
        (Method::GET, format!("/tasks/{}?email={}", id, email), None),
        (
            Method::PUT,
            format!("/tasks/{}?email={}", id, email),
            Some(json!({ "title": "t" })),
        ),
        (Method::DELETE, format!("/tasks/{}?email={}", id, email), None),
    ]
}

#[tokio::test]
async fn test_liveness() {
    let ctx = TestContext::new();
    let response = ctx.send(Method::GET, "/", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "Task management server is running");
}

#[tokio::test]
async fn test_health_reports_store_state() {
    let ctx = TestContext::new();

    let response = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["store"], "memory");

    ctx.store.set_unavailable(true);
    let response = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "degraded");
    assert_eq!(response.body["store_status"], "disconnected");
}

#[tokio::test]
async fn test_sign_in_twice_same_identity_new_token() {
    let ctx = TestContext::new();
    let body = json!({ "email": "a@x.com" });

    let first = ctx.send(Method::POST, "/users", None, Some(body.clone())).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["email"], "a@x.com");
    assert_eq!(first.body["created"], true);

    let second = ctx.send(Method::POST, "/users", None, Some(body)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["created"], false);

    assert_eq!(first.body["id"], second.body["id"]);
    assert!(first.body["token"].is_string());
    assert_ne!(first.body["token"], second.body["token"]);
}

#[tokio::test]
async fn test_sign_in_rejects_invalid_email() {
    let ctx = TestContext::new();

    let response = ctx
        .send(Method::POST, "/users", None, Some(json!({ "email": "nope" })))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], true);
    assert_eq!(response.body["code"], "validation_error");
    assert_eq!(response.body["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_sign_in_store_failure_issues_no_token() {
    let ctx = TestContext::new();
    ctx.store.set_unavailable(true);

    let response = ctx
        .send(Method::POST, "/users", None, Some(json!({ "email": "a@x.com" })))
        .await;

    assert!(response.status.is_server_error());
    assert_eq!(response.body["error"], true);
    assert!(response.body.get("token").is_none());
}

#[tokio::test]
async fn test_missing_authorization_is_unauthorized_everywhere() {
    let ctx = TestContext::new();

    for (method, uri, body) in gated_routes("a@x.com") {
        let response = ctx.send(method.clone(), &uri, None, body).await;
        assert_eq!(
            response.status,
            StatusCode::UNAUTHORIZED,
            "{} {} -> {}",
            method,
            uri,
            response.text
        );
        assert_eq!(response.body["error"], true);
    }

    // The handler never ran: nothing was written
    assert_eq!(ctx.store.task_count().await, 0);
}

#[tokio::test]
async fn test_authorization_without_credential_is_unauthorized() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/tasks?email=a@x.com")
        .header(header::AUTHORIZATION, "Bearer")
        .body(Body::empty())
        .unwrap();

    let response = ctx.send_request(request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrongly_signed_token_is_forbidden_everywhere() {
    let ctx = TestContext::new();
    let forged = issue_token("a@x.com", "some-other-secret-that-is-long-enough", Duration::hours(1))
        .unwrap();

    for (method, uri, body) in gated_routes("a@x.com") {
        let response = ctx.send(method.clone(), &uri, Some(&forged), body).await;
        assert_eq!(
            response.status,
            StatusCode::FORBIDDEN,
            "{} {} -> {}",
            method,
            uri,
            response.text
        );
        assert_eq!(response.body["code"], "forbidden");
    }

    let response = ctx
        .send(Method::GET, "/tasks?email=a@x.com", Some("garbage"), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    assert_eq!(ctx.store.task_count().await, 0);
}

#[tokio::test]
async fn test_expired_token_is_forbidden() {
    let ctx = TestContext::new();
    let claims = Claims::with_expiration("a@x.com", Duration::seconds(-60));
    let token = create_token(&claims, TEST_SECRET).unwrap();

    let response = ctx
        .send(Method::GET, "/tasks?email=a@x.com", Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_email_guard() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;

    let ok = ctx
        .send(Method::GET, "/tasks?email=a@x.com", Some(&token), None)
        .await;
    assert_eq!(ok.status, StatusCode::OK);

    for uri in [
        "/tasks?email=b@x.com",
        "/tasks?email=A@x.com",
        "/tasks?email=",
        "/tasks",
    ] {
        let response = ctx.send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.body["code"], "unauthorized");
    }

    // Guard applies to every gated route, not only listing
    for (method, uri, body) in gated_routes("b@x.com") {
        let response = ctx.send(method.clone(), &uri, Some(&token), body).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_create_then_list_example_flow() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;

    ctx.create_task("a@x.com", &token, json!({ "title": "t", "user_email": "a@x.com" }))
        .await;

    let response = ctx
        .send(Method::GET, "/tasks?email=a@x.com", Some(&token), None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let tasks = response.body.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "t");
    assert_eq!(tasks[0]["user_email"], "a@x.com");
}

#[tokio::test]
async fn test_create_derives_owner_from_token() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;

    // Body claims another owner; it is ignored
    ctx.create_task(
        "a@x.com",
        &token,
        json!({ "title": "t", "email": "b@x.com", "user_email": "b@x.com" }),
    )
    .await;

    let b_token = ctx.sign_in("b@x.com").await;
    let b_tasks = ctx
        .send(Method::GET, "/tasks?email=b@x.com", Some(&b_token), None)
        .await;
    assert_eq!(b_tasks.body.as_array().unwrap().len(), 0);

    let a_tasks = ctx
        .send(Method::GET, "/tasks?email=a@x.com", Some(&token), None)
        .await;
    assert_eq!(a_tasks.body[0]["user_email"], "a@x.com");
}

#[tokio::test]
async fn test_create_requires_title() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;

    let response = ctx
        .send(
            Method::POST,
            "/tasks?email=a@x.com",
            Some(&token),
            Some(json!({ "title": "" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["details"][0]["field"], "title");
}

#[tokio::test]
async fn test_get_task() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;
    let id = ctx
        .create_task(
            "a@x.com",
            &token,
            json!({ "title": "t", "description": "d", "priority": "high" }),
        )
        .await;

    let response = ctx
        .send(Method::GET, &format!("/tasks/{}?email=a@x.com", id), Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], id.as_str());
    assert_eq!(response.body["description"], "d");
    assert_eq!(response.body["priority"], "high");
}

#[tokio::test]
async fn test_get_unknown_task_is_not_found() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;

    let response = ctx
        .send(
            Method::GET,
            &format!("/tasks/{}?email=a@x.com", Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "not_found");
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;

    for method in [Method::GET, Method::DELETE] {
        let response = ctx
            .send(method, "/tasks/not-an-id?email=a@x.com", Some(&token), None)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["code"], "bad_request");
    }

    let response = ctx
        .send(
            Method::PUT,
            "/tasks/64b7f0c2e4b0a1a2b3c4d5e6?email=a@x.com",
            Some(&token),
            Some(json!({ "title": "t" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.store.task_count().await, 0);
}

#[tokio::test]
async fn test_tasks_of_other_users_are_invisible() {
    let ctx = TestContext::new();
    let a_token = ctx.sign_in("a@x.com").await;
    let b_token = ctx.sign_in("b@x.com").await;
    let id = ctx.create_task("a@x.com", &a_token, json!({ "title": "mine" })).await;

    let get = ctx
        .send(Method::GET, &format!("/tasks/{}?email=b@x.com", id), Some(&b_token), None)
        .await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);

    let put = ctx
        .send(
            Method::PUT,
            &format!("/tasks/{}?email=b@x.com", id),
            Some(&b_token),
            Some(json!({ "title": "stolen" })),
        )
        .await;
    assert_eq!(put.status, StatusCode::NOT_FOUND);

    let delete = ctx
        .send(Method::DELETE, &format!("/tasks/{}?email=b@x.com", id), Some(&b_token), None)
        .await;
    assert_eq!(delete.status, StatusCode::OK);
    assert_eq!(delete.body["deleted_count"], 0);

    let still_there = ctx
        .send(Method::GET, &format!("/tasks/{}?email=a@x.com", id), Some(&a_token), None)
        .await;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["title"], "mine");
}

#[tokio::test]
async fn test_update_existing_task_replaces_only_supplied_fields() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;
    let id = ctx
        .create_task("a@x.com", &token, json!({ "title": "t", "description": "d" }))
        .await;

    let response = ctx
        .send(
            Method::PUT,
            &format!("/tasks/{}?email=a@x.com", id),
            Some(&token),
            Some(json!({ "status": "done" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["matched_count"], 1);
    assert_eq!(response.body["modified_count"], 1);
    assert!(response.body["upserted_id"].is_null());
    assert_eq!(response.body["task"]["title"], "t");
    assert_eq!(response.body["task"]["description"], "d");
    assert_eq!(response.body["task"]["status"], "done");
}

#[tokio::test]
async fn test_update_unknown_id_upserts_exactly_supplied_fields() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;

    // An unrelated task that must not leak into the upserted one
    ctx.create_task(
        "a@x.com",
        &token,
        json!({ "title": "other", "description": "d", "category": "c" }),
    )
    .await;

    let id = Uuid::new_v4();
    let response = ctx
        .send(
            Method::PUT,
            &format!("/tasks/{}?email=a@x.com", id),
            Some(&token),
            Some(json!({ "priority": "low" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.text);
    assert_eq!(response.body["matched_count"], 0);
    assert_eq!(response.body["modified_count"], 0);
    assert_eq!(response.body["upserted_id"], id.to_string());

    let task = &response.body["task"];
    assert_eq!(task["id"], id.to_string());
    assert_eq!(task["priority"], "low");
    assert_eq!(task["user_email"], "a@x.com");
    for absent in ["title", "description", "deadline", "category", "status"] {
        assert!(task[absent].is_null(), "{} should be empty", absent);
    }

    let fetched = ctx
        .send(Method::GET, &format!("/tasks/{}?email=a@x.com", id), Some(&token), None)
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(&fetched.body, task);
}

#[tokio::test]
async fn test_delete() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;
    let id = ctx.create_task("a@x.com", &token, json!({ "title": "t" })).await;
    let uri = format!("/tasks/{}?email=a@x.com", id);

    let response = ctx.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["deleted_count"], 1);

    // Deleting again is not an error
    let response = ctx.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["deleted_count"], 0);

    let response = ctx.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_failure_is_structured_error() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;
    ctx.store.set_unavailable(true);

    let response = ctx
        .send(Method::GET, "/tasks?email=a@x.com", Some(&token), None)
        .await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], true);
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_malformed_query_is_structured_bad_request() {
    let ctx = TestContext::new();
    let token = ctx.sign_in("a@x.com").await;

    let response = ctx
        .send(
            Method::GET,
            "/tasks?email=a@x.com&email=a@x.com",
            Some(&token),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], true);
    assert_eq!(response.body["code"], "bad_request");
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_malformed_query_without_token_is_still_unauthorized() {
    let ctx = TestContext::new();

    let response = ctx
        .send(Method::GET, "/tasks?email=a@x.com&email=a@x.com", None, None)
        .await;

    // The gate runs before the guard parses the query
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

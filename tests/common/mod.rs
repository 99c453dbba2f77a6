//! Stand-in for the hosted auth backend, shared by the integration tests.

#![allow(dead_code)]

use bsm_portal::backend::{RemoteBackend, RestClient};
use bsm_portal::test_utils::test_helpers;
use bsm_portal::AppState;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANON_KEY: &str = "test-anon-key";
pub const USER_ID: &str = "0b6c1f8e-remote-user";

pub fn profile_row(email: &str, role: &str) -> Value {
    json!({
        "id": USER_ID,
        "email": email,
        "full_name": "Remote Customer",
        "role": role,
        "avatar_url": null,
        "is_verified": true,
        "last_login": null,
    })
}

pub fn token_body(email: &str) -> Value {
    json!({
        "access_token": "user-access-token",
        "token_type": "bearer",
        "user": {
            "id": USER_ID,
            "email": email,
            "email_confirmed_at": "2024-01-01T00:00:00Z",
            "user_metadata": { "full_name": "Remote Customer" },
        },
    })
}

/// Hosted backend that accepts `email` and already has a profile row with `role`.
pub async fn hosted_backend(email: &str, role: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(email)))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([profile_row(email, role)])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    server
}

/// Hosted backend with no routes mounted: every call gets wiremock's 404.
pub async fn empty_backend() -> MockServer {
    MockServer::start().await
}

pub fn remote_app(server: &MockServer) -> (Router, AppState) {
    let rest = RestClient::new(&server.uri(), ANON_KEY);
    let backend = RemoteBackend::new(rest, "http://portal.test");
    test_helpers::app_with_backend(Arc::new(backend), test_helpers::test_config())
}

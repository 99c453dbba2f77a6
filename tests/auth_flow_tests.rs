mod common;

use axum::http::StatusCode;
use bsm_portal::test_utils::test_helpers::{self, TestBrowser};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_remote_sign_in_error_is_shown_verbatim() {
    let server = common::empty_backend().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials",
        })))
        .mount(&server)
        .await;

    let (app, _) = common::remote_app(&server);
    let mut browser = TestBrowser::new(app);

    let response = browser.sign_in("a@b.com", "wrong", "admin").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body.matches("Invalid login credentials").count(),
        1,
        "error should be shown once, inline"
    );
    assert!(response.body.contains(r#"value="a@b.com""#));

    let dashboard = browser.get("/admin/dashboard").await;
    assert!(dashboard.is_redirect_to("/auth/login?role=admin"));
}

#[tokio::test]
async fn test_login_preselects_requested_role() {
    let (app, _) = test_helpers::mock_app();
    let mut browser = TestBrowser::new(app);

    let page = browser.get("/auth/login?role=admin").await;
    assert!(page
        .body
        .contains(r#"<option value="admin" selected>Admin</option>"#));

    let default = browser.get("/auth/login").await;
    assert!(default
        .body
        .contains(r#"<option value="customer" selected>Customer</option>"#));
}

#[tokio::test]
async fn test_bad_csrf_token_blocks_sign_in() {
    let server = common::empty_backend().await;
    let (app, _) = common::remote_app(&server);
    let mut browser = TestBrowser::new(app);
    browser.csrf_token().await;

    let response = browser
        .post_form(
            "/auth/login",
            &[
                ("email", "a@b.com"),
                ("password", "secret1"),
                ("role", "customer"),
                ("csrf_token", "forged"),
            ],
        )
        .await;

    assert!(response.body.contains("Invalid security token"));
    let calls = server.received_requests().await.unwrap_or_default();
    assert!(calls.is_empty(), "backend must not be called");
}

#[tokio::test]
async fn test_logout_without_token_is_forbidden() {
    let (app, _) = test_helpers::mock_app();
    let mut browser = TestBrowser::new(app);
    browser.sign_in("a@b.com", "x", "admin").await;

    let response = browser
        .post_form("/auth/logout", &[("csrf_token", "nope")])
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let dashboard = browser.get("/admin/dashboard").await;
    assert!(dashboard.body.contains("a@b.com"), "user should still be signed in");
}

#[tokio::test]
async fn test_signup_validation_messages() {
    let (app, _) = test_helpers::mock_app();
    let mut browser = TestBrowser::new(app);

    let cases = [
        ("", "a@b.com", "secret1", "secret1", "Please fill in all fields"),
        ("Ann", "a@b.com", "secret1", "secret2", "Passwords do not match"),
        ("Ann", "a@b.com", "abc", "abc", "Password must be at least 6 characters"),
    ];

    for (full_name, email, password, confirm, expected) in cases {
        let token = browser.csrf_token().await;
        let response = browser
            .post_form(
                "/auth/signup",
                &[
                    ("full_name", full_name),
                    ("email", email),
                    ("password", password),
                    ("confirm_password", confirm),
                    ("role", "customer"),
                    ("csrf_token", &token),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(
            response.body.contains(expected),
            "expected {:?} in sign up page",
            expected
        );
    }
}

#[tokio::test]
async fn test_remote_signup_asks_for_email_verification() {
    let server = common::empty_backend().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new-user"})))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = common::remote_app(&server);
    let mut browser = TestBrowser::new(app);
    let token = browser.csrf_token().await;

    let response = browser
        .post_form(
            "/auth/signup",
            &[
                ("full_name", "New Person"),
                ("email", "new@example.com"),
                ("password", "secret1"),
                ("confirm_password", "secret1"),
                ("role", "customer"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert!(response.is_redirect_to("/auth/login"));

    let login = browser.get("/auth/login").await;
    assert!(login.body.contains("Please check your email to verify your account."));

    let dashboard = browser.get("/customer/dashboard").await;
    assert!(dashboard.is_redirect_to("/auth/login?role=customer"));
}

#[tokio::test]
async fn test_reset_password_uses_site_redirect() {
    let server = common::empty_backend().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(query_param(
            "redirect_to",
            "http://portal.test/auth/reset-password",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = common::remote_app(&server);
    let mut browser = TestBrowser::new(app);
    let token = browser.csrf_token().await;

    let response = browser
        .post_form(
            "/auth/reset-password",
            &[("email", "forgot@example.com"), ("csrf_token", &token)],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Password reset email sent!"));
    assert!(response.body.contains("a reset link is on its way"));
}

#[tokio::test]
async fn test_profile_update_keeps_role_and_email() {
    let (app, _) = test_helpers::mock_app();
    let mut browser = TestBrowser::new(app);
    browser.sign_in("cust@example.com", "x", "customer").await;
    browser.get("/customer/dashboard").await;

    let token = browser.csrf_token().await;
    let response = browser
        .post_form(
            "/profile",
            &[
                ("full_name", "Jane Doe"),
                ("avatar_url", ""),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert!(response.is_redirect_to("/customer/dashboard"));

    let page = browser.get("/customer/dashboard").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Welcome, Jane Doe."));
    assert!(page.body.contains("cust@example.com"));
    assert!(page.body.contains("Profile updated successfully!"));
}

#[tokio::test]
async fn test_profile_update_without_user_goes_to_login() {
    let (app, _) = test_helpers::mock_app();
    let mut browser = TestBrowser::new(app);
    let token = browser.csrf_token().await;

    let response = browser
        .post_form("/profile", &[("full_name", "Nobody"), ("csrf_token", &token)])
        .await;
    assert!(response.is_redirect_to("/auth/login?role=customer"));

    let login = browser.get("/auth/login").await;
    assert!(login.body.contains("No user logged in"));
}

#[tokio::test]
async fn test_remote_profile_update_patches_row() {
    let server = common::hosted_backend("cust@example.com", "customer").await;
    let (app, _) = common::remote_app(&server);
    let mut browser = TestBrowser::new(app);
    browser
        .sign_in("cust@example.com", "secret1", "customer")
        .await;

    let token = browser.csrf_token().await;
    let response = browser
        .post_form(
            "/profile",
            &[("full_name", "Renamed Customer"), ("csrf_token", &token)],
        )
        .await;
    assert!(response.is_redirect_to("/customer/dashboard"));

    let requests = server.received_requests().await.unwrap_or_default();
    let patched = requests.iter().any(|request| {
        request.method.as_str() == "PATCH"
            && String::from_utf8_lossy(&request.body).contains("Renamed Customer")
    });
    assert!(patched, "profile change should be written to the users table");
}

#[tokio::test]
async fn test_login_redirect_follows_submitted_role() {
    let server = common::empty_backend().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::token_body("a@b.com")))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "permission denied for table users",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([common::profile_row("a@b.com", "customer")])),
        )
        .mount(&server)
        .await;

    let (app, _) = common::remote_app(&server);
    let mut browser = TestBrowser::new(app);

    let login = browser.sign_in("a@b.com", "secret1", "admin").await;
    assert!(
        login.is_redirect_to("/admin/dashboard"),
        "unexpected login response: {:?}",
        login
    );

    let dashboard = browser.get("/admin/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::OK);
}

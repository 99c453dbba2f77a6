use crate::auth::{login_url, CurrentSession};
use crate::backend::{AuthError, SignInRequest, SignUpRequest};
use crate::error::{AppError, Result};
use crate::handlers::{page_notices, render_page};
use crate::middleware::csrf::{get_or_create_csrf_token, validate_csrf_form_field};
use crate::models::{ProfileUpdate, Role};
use crate::session::Notice;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::debug;

const CSRF_FAILURE: &str = "Invalid security token. Please refresh the page and try again.";
const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    error: Option<String>,
    email: String,
    selected_role: Role,
    csrf_token: String,
    notices: Vec<Notice>,
    demo_mode: bool,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
struct SignupTemplate {
    error: Option<String>,
    full_name: String,
    email: String,
    selected_role: Role,
    csrf_token: String,
    notices: Vec<Notice>,
    demo_mode: bool,
}

#[derive(Template)]
#[template(path = "auth/reset_password.html")]
struct ResetPasswordTemplate {
    error: Option<String>,
    sent: bool,
    email: String,
    csrf_token: String,
    notices: Vec<Notice>,
    demo_mode: bool,
}

#[derive(Deserialize)]
pub struct RoleQuery {
    role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnlyForm {
    #[serde(default)]
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    full_name: Option<String>,
    avatar_url: Option<String>,
    #[serde(default)]
    csrf_token: String,
}

/// Unknown or missing roles fall back to the customer portal.
fn parse_role(raw: Option<&str>) -> Role {
    raw.and_then(|r| r.parse().ok()).unwrap_or_default()
}

async fn csrf_token(session: &Session) -> String {
    get_or_create_csrf_token(session)
        .await
        .unwrap_or_else(|_| String::from("error"))
}

/// Checks run before the backend is asked to create an account.
pub fn validate_signup(form: &SignupForm) -> std::result::Result<(), &'static str> {
    let fields = [
        &form.full_name,
        &form.email,
        &form.password,
        &form.confirm_password,
    ];
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err("Please fill in all fields");
    }
    if form.password != form.confirm_password {
        return Err("Passwords do not match");
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 6 characters");
    }
    if !EMAIL_REGEX.is_match(form.email.trim()) {
        return Err("Please enter a valid email address");
    }
    Ok(())
}

// Login

pub async fn login_page(
    State(app_state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<RoleQuery>,
) -> Response {
    let template = LoginTemplate {
        error: None,
        email: String::new(),
        selected_role: parse_role(query.role.as_deref()),
        csrf_token: csrf_token(&current.session).await,
        notices: page_notices(&current.store, None),
        demo_mode: app_state.auth_service.mode().is_demo(),
    };
    render_page(&template)
}

async fn login_error(
    app_state: &AppState,
    current: &CurrentSession,
    form: &LoginForm,
    msg: &str,
) -> Response {
    let template = LoginTemplate {
        error: Some(msg.to_string()),
        email: form.email.clone(),
        selected_role: parse_role(Some(&form.role)),
        csrf_token: csrf_token(&current.session).await,
        notices: page_notices(&current.store, Some(msg)),
        demo_mode: app_state.auth_service.mode().is_demo(),
    };
    render_page(&template)
}

pub async fn login_handler(
    State(app_state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<LoginForm>,
) -> Response {
    if validate_csrf_form_field(&current.session, &form.csrf_token)
        .await
        .is_err()
    {
        return login_error(&app_state, &current, &form, CSRF_FAILURE).await;
    }

    if form.email.trim().is_empty() || form.password.is_empty() {
        return login_error(&app_state, &current, &form, "Please fill in all fields").await;
    }

    let request = SignInRequest {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
        role: parse_role(Some(&form.role)),
    };

    match app_state.auth_service.sign_in(&current.store, request).await {
        Ok(user) => Redirect::to(&user.role.dashboard_path()).into_response(),
        Err(err) => login_error(&app_state, &current, &form, &err.to_string()).await,
    }
}

// Sign up

pub async fn signup_page(
    State(app_state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<RoleQuery>,
) -> Response {
    let template = SignupTemplate {
        error: None,
        full_name: String::new(),
        email: String::new(),
        selected_role: parse_role(query.role.as_deref()),
        csrf_token: csrf_token(&current.session).await,
        notices: page_notices(&current.store, None),
        demo_mode: app_state.auth_service.mode().is_demo(),
    };
    render_page(&template)
}

async fn signup_error(
    app_state: &AppState,
    current: &CurrentSession,
    form: &SignupForm,
    msg: &str,
) -> Response {
    let template = SignupTemplate {
        error: Some(msg.to_string()),
        full_name: form.full_name.clone(),
        email: form.email.clone(),
        selected_role: parse_role(Some(&form.role)),
        csrf_token: csrf_token(&current.session).await,
        notices: page_notices(&current.store, Some(msg)),
        demo_mode: app_state.auth_service.mode().is_demo(),
    };
    render_page(&template)
}

pub async fn signup_handler(
    State(app_state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<SignupForm>,
) -> Response {
    if validate_csrf_form_field(&current.session, &form.csrf_token)
        .await
        .is_err()
    {
        return signup_error(&app_state, &current, &form, CSRF_FAILURE).await;
    }

    if let Err(msg) = validate_signup(&form) {
        debug!("Rejected sign up form: {}", msg);
        return signup_error(&app_state, &current, &form, msg).await;
    }

    let request = SignUpRequest {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
        full_name: form.full_name.trim().to_string(),
        role: parse_role(Some(&form.role)),
    };

    match app_state.auth_service.sign_up(&current.store, request).await {
        Ok(_) => Redirect::to("/auth/login").into_response(),
        Err(err) => signup_error(&app_state, &current, &form, &err.to_string()).await,
    }
}

// Sign out

pub async fn logout_handler(
    State(app_state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<CsrfOnlyForm>,
) -> Result<Redirect> {
    validate_csrf_form_field(&current.session, &form.csrf_token)
        .await
        .map_err(|_| AppError::Csrf)?;

    // A failed remote sign-out leaves the user signed in; the notice explains why.
    let _ = app_state.auth_service.sign_out(&current.store).await;
    Ok(Redirect::to("/"))
}

// Password reset

pub async fn reset_password_page(
    State(app_state): State<AppState>,
    current: CurrentSession,
) -> Response {
    let template = ResetPasswordTemplate {
        error: None,
        sent: false,
        email: String::new(),
        csrf_token: csrf_token(&current.session).await,
        notices: page_notices(&current.store, None),
        demo_mode: app_state.auth_service.mode().is_demo(),
    };
    render_page(&template)
}

pub async fn reset_password_handler(
    State(app_state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let email = form.email.trim().to_string();

    let outcome = if validate_csrf_form_field(&current.session, &form.csrf_token)
        .await
        .is_err()
    {
        Err(CSRF_FAILURE.to_string())
    } else if email.is_empty() {
        Err("Please enter your email address".to_string())
    } else {
        app_state
            .auth_service
            .reset_password(&current.store, &email)
            .await
            .map_err(|err| err.to_string())
    };

    let error = outcome.err();
    let template = ResetPasswordTemplate {
        sent: error.is_none(),
        email,
        csrf_token: csrf_token(&current.session).await,
        notices: page_notices(&current.store, error.as_deref()),
        demo_mode: app_state.auth_service.mode().is_demo(),
        error,
    };
    render_page(&template)
}

// Profile

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn update_profile_handler(
    State(app_state): State<AppState>,
    current: CurrentSession,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect> {
    validate_csrf_form_field(&current.session, &form.csrf_token)
        .await
        .map_err(|_| AppError::Csrf)?;

    let update = ProfileUpdate {
        full_name: non_blank(form.full_name),
        avatar_url: non_blank(form.avatar_url),
        role: None,
    };

    match app_state
        .auth_service
        .update_profile(&current.store, update)
        .await
    {
        Ok(user) => Ok(Redirect::to(&user.role.dashboard_path())),
        Err(AuthError::NoActiveSession) => Ok(Redirect::to(&login_url(Role::default()))),
        Err(_) => {
            let back = current
                .store
                .user()
                .map(|user| user.role.dashboard_path())
                .unwrap_or_else(|| "/".to_string());
            Ok(Redirect::to(&back))
        }
    }
}

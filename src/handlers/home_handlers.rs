use crate::auth::CurrentSession;
use crate::handlers::page_notices;
use crate::middleware::csrf::get_or_create_csrf_token;
use crate::models::SessionUser;
use crate::session::Notice;
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
struct IndexTemplate {
    user: Option<SessionUser>,
    csrf_token: String,
    notices: Vec<Notice>,
    demo_mode: bool,
}

/// GET / - Landing page with a way into each portal
pub async fn index_handler(State(app_state): State<AppState>, current: CurrentSession) -> Response {
    let csrf_token = get_or_create_csrf_token(&current.session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    IndexTemplate {
        user: current.store.user(),
        csrf_token,
        notices: page_notices(&current.store, None),
        demo_mode: app_state.auth_service.mode().is_demo(),
    }
    .into_response()
}

/// GET /health
pub async fn health_handler(State(app_state): State<AppState>) -> Json<Value> {
    let backend = if app_state.auth_service.mode().is_demo() {
        "mock"
    } else {
        "remote"
    };

    Json(json!({
        "status": "ok",
        "backend": backend,
        "active_sessions": app_state.registry.len().await,
    }))
}

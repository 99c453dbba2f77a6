pub mod dashboard_handlers;
pub mod home_handlers;

pub use dashboard_handlers::{admin_dashboard_handler, admin_portal_handler, customer_dashboard_handler};
pub use home_handlers::{health_handler, index_handler};

use crate::models::Role;
use crate::session::{Notice, SessionState, SessionStore};
use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

/// Render `template`, falling back to a bare error page if rendering fails.
pub fn render_page<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            Html("<html><body><h1>Error rendering page</h1></body></html>".to_string())
                .into_response()
        }
    }
}

/// Drain the store's pending notices for display. A notice repeating the
/// inline form error is dropped.
pub fn page_notices(store: &SessionStore, inline_error: Option<&str>) -> Vec<Notice> {
    let mut notices = store.take_notices();
    if let Some(inline) = inline_error {
        notices.retain(|notice| notice.message != inline);
    }
    notices
}

/// Who is looking at a page, flattened for templates.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub name: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub signed_in: bool,
}

impl Viewer {
    /// Anonymous demo visitors are greeted with the demo name for `role`.
    pub fn from_state(state: &SessionState, role: Role) -> Self {
        match &state.user {
            Some(user) => Self {
                name: user.display_name().to_string(),
                email: user.email.clone(),
                full_name: user.full_name.clone().unwrap_or_default(),
                avatar_url: user.avatar_url.clone().unwrap_or_default(),
                signed_in: true,
            },
            None => Self {
                name: role.demo_display_name().to_string(),
                email: String::new(),
                full_name: String::new(),
                avatar_url: String::new(),
                signed_in: false,
            },
        }
    }
}

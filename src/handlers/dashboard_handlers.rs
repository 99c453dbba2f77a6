use crate::auth::{CurrentSession, GateDecision, PageGate, ADMIN_ONLY, CUSTOMER_ONLY};
use crate::handlers::{page_notices, Viewer};
use crate::middleware::csrf::get_or_create_csrf_token;
use crate::services::dashboard_service::{AdminOverview, CustomerOverview, PortalOverview};
use crate::session::{Notice, SessionState};
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, warn};

const LOADING_REFRESH_SECS: u64 = 2;

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
struct AdminDashboardTemplate {
    viewer: Viewer,
    overview: AdminOverview,
    csrf_token: String,
    notices: Vec<Notice>,
    demo_mode: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/portal.html")]
struct AdminPortalTemplate {
    viewer: Viewer,
    overview: PortalOverview,
    csrf_token: String,
    notices: Vec<Notice>,
    demo_mode: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "customer/dashboard.html")]
struct CustomerDashboardTemplate {
    viewer: Viewer,
    overview: CustomerOverview,
    selected_category: String,
    csrf_token: String,
    notices: Vec<Notice>,
    demo_mode: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "loading.html")]
struct LoadingTemplate {
    refresh_secs: u64,
    notices: Vec<Notice>,
    demo_mode: bool,
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    category: Option<String>,
}

/// Run `gate` for the current request, waiting out an in-flight load first.
///
/// `Err` carries the response to send instead of the page: a redirect to
/// login, or a self-refreshing loading page.
async fn check_access(
    app_state: &AppState,
    current: &CurrentSession,
    gate: PageGate,
) -> Result<SessionState, Response> {
    let mode = app_state.auth_service.mode();
    let mut state = current.store.snapshot();

    if gate.evaluate(mode, &state) == GateDecision::Loading {
        debug!("Waiting for session to load before gating");
        match current
            .store
            .wait_until_loaded(app_state.config.auth_load_timeout)
            .await
        {
            Ok(loaded) => state = loaded,
            Err(e) => {
                warn!("{}", e);
                return Err(loading_page(app_state));
            }
        }
    }

    match gate.evaluate(mode, &state) {
        GateDecision::Authorized => Ok(state),
        GateDecision::Redirect(url) => {
            debug!(
                "Redirecting away from {} page to {}",
                gate.required_role(),
                url
            );
            Err(Redirect::to(&url).into_response())
        }
        GateDecision::Loading => Err(loading_page(app_state)),
    }
}

fn loading_page(app_state: &AppState) -> Response {
    LoadingTemplate {
        refresh_secs: LOADING_REFRESH_SECS,
        notices: Vec::new(),
        demo_mode: app_state.auth_service.mode().is_demo(),
    }
    .into_response()
}

async fn csrf_token(current: &CurrentSession) -> String {
    get_or_create_csrf_token(&current.session)
        .await
        .unwrap_or_else(|_| String::from("error"))
}

/// GET /admin/dashboard
pub async fn admin_dashboard_handler(
    State(app_state): State<AppState>,
    current: CurrentSession,
) -> Response {
    let state = match check_access(&app_state, &current, ADMIN_ONLY).await {
        Ok(state) => state,
        Err(response) => return response,
    };

    AdminDashboardTemplate {
        viewer: Viewer::from_state(&state, ADMIN_ONLY.required_role()),
        overview: app_state.dashboard_service.admin_overview(),
        csrf_token: csrf_token(&current).await,
        notices: page_notices(&current.store, None),
        demo_mode: app_state.auth_service.mode().is_demo(),
    }
    .into_response()
}

/// GET /admin/portal
pub async fn admin_portal_handler(
    State(app_state): State<AppState>,
    current: CurrentSession,
) -> Response {
    let state = match check_access(&app_state, &current, ADMIN_ONLY).await {
        Ok(state) => state,
        Err(response) => return response,
    };

    AdminPortalTemplate {
        viewer: Viewer::from_state(&state, ADMIN_ONLY.required_role()),
        overview: app_state.dashboard_service.portal_overview(),
        csrf_token: csrf_token(&current).await,
        notices: page_notices(&current.store, None),
        demo_mode: app_state.auth_service.mode().is_demo(),
    }
    .into_response()
}

/// GET /customer/dashboard
pub async fn customer_dashboard_handler(
    State(app_state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<CategoryQuery>,
) -> Response {
    let state = match check_access(&app_state, &current, CUSTOMER_ONLY).await {
        Ok(state) => state,
        Err(response) => return response,
    };

    let selected_category = query
        .category
        .map(|c| c.trim().to_string())
        .unwrap_or_default();
    let overview = app_state
        .dashboard_service
        .customer_overview(Some(selected_category.as_str()));

    CustomerDashboardTemplate {
        viewer: Viewer::from_state(&state, CUSTOMER_ONLY.required_role()),
        overview,
        selected_category,
        csrf_token: csrf_token(&current).await,
        notices: page_notices(&current.store, None),
        demo_mode: app_state.auth_service.mode().is_demo(),
    }
    .into_response()
}

pub mod test_helpers {
    use crate::backend::{AuthBackend, MockBackend};
    use crate::config::{AppConfig, SessionLayer};
    use crate::{build_router, AppState};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use tower_sessions::{cookie::Key, MemoryStore, SessionManagerLayer};

    static CSRF_FIELD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"name="csrf_token" value="([^"]+)""#).unwrap());

    /// Config with a short load timeout so gating tests finish quickly.
    pub fn test_config() -> AppConfig {
        AppConfig {
            auth_load_timeout: Duration::from_millis(500),
            ..AppConfig::default()
        }
    }

    /// Plain-HTTP signed cookie sessions with a throwaway key.
    pub fn test_session_layer() -> SessionLayer {
        SessionManagerLayer::new(MemoryStore::default())
            .with_secure(false)
            .with_name("session")
            .with_signed(Key::generate())
    }

    pub fn app_with_backend(backend: Arc<dyn AuthBackend>, config: AppConfig) -> (Router, AppState) {
        let state = AppState::new(backend, config);
        (build_router(state.clone(), test_session_layer()), state)
    }

    /// Portal running without a hosted backend.
    pub fn mock_app() -> (Router, AppState) {
        app_with_backend(Arc::new(MockBackend::new()), test_config())
    }

    pub fn extract_csrf_token(html: &str) -> Option<String> {
        CSRF_FIELD
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    #[derive(Debug)]
    pub struct TestResponse {
        pub status: StatusCode,
        pub location: Option<String>,
        pub body: String,
    }

    impl TestResponse {
        pub fn is_redirect_to(&self, target: &str) -> bool {
            self.status.is_redirection() && self.location.as_deref() == Some(target)
        }
    }

    /// Drives the router like a browser: keeps the session cookie between
    /// requests.
    #[derive(Clone)]
    pub struct TestBrowser {
        app: Router,
        cookie: Option<String>,
    }

    impl TestBrowser {
        pub fn new(app: Router) -> Self {
            Self { app, cookie: None }
        }

        pub async fn get(&mut self, uri: &str) -> TestResponse {
            let request = self.request("GET", uri).body(Body::empty()).unwrap();
            self.send(request).await
        }

        pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
            let body = serde_urlencoded::to_string(fields).unwrap();
            let request = self
                .request("POST", uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap();
            self.send(request).await
        }

        /// Fetch a page that carries a form and return its CSRF token.
        pub async fn csrf_token(&mut self) -> String {
            let page = self.get("/auth/login").await;
            extract_csrf_token(&page.body).expect("login page should carry a CSRF token")
        }

        pub async fn sign_in(&mut self, email: &str, password: &str, role: &str) -> TestResponse {
            let token = self.csrf_token().await;
            self.post_form(
                "/auth/login",
                &[
                    ("email", email),
                    ("password", password),
                    ("role", role),
                    ("csrf_token", &token),
                ],
            )
            .await
        }

        pub async fn sign_out(&mut self) -> TestResponse {
            let token = self.csrf_token().await;
            self.post_form("/auth/logout", &[("csrf_token", &token)])
                .await
        }

        fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
            let builder = Request::builder().method(method).uri(uri);
            match &self.cookie {
                Some(cookie) => builder.header(header::COOKIE, cookie),
                None => builder,
            }
        }

        async fn send(&mut self, request: Request<Body>) -> TestResponse {
            let response = self.app.clone().oneshot(request).await.unwrap();

            if let Some(set_cookie) = response
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
            {
                if let Some(pair) = set_cookie.split(';').next() {
                    self.cookie = Some(pair.to_string());
                }
            }

            let status = response.status();
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();

            TestResponse {
                status,
                location,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }
        }
    }
}

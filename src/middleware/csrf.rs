use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, warn};
use uuid::Uuid;

pub const CSRF_TOKEN_KEY: &str = "csrf_token";

const TOKEN_LIFETIME_SECS: i64 = 86400;

/// CSRF Token structure for session storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfToken {
    pub value: String,
    pub created_at: i64,
}

impl CsrfToken {
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Tokens live for 24 hours.
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() - self.created_at > TOKEN_LIFETIME_SECS
    }
}

impl Default for CsrfToken {
    fn default() -> Self {
        Self::new()
    }
}

/// First characters of a token, safe to log.
fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

/// Generate a new CSRF token and store in session
pub async fn generate_csrf_token(
    session: &Session,
) -> Result<String, tower_sessions::session::Error> {
    let token = CsrfToken::new();
    let value = token.value.clone();

    session.insert(CSRF_TOKEN_KEY, token).await?;

    debug!("Generated new CSRF token: {}", token_prefix(&value));
    Ok(value)
}

/// Get or create a CSRF token for the session
pub async fn get_or_create_csrf_token(
    session: &Session,
) -> Result<String, tower_sessions::session::Error> {
    let token: Option<CsrfToken> = session.get(CSRF_TOKEN_KEY).await?;

    match token {
        Some(existing_token) if !existing_token.is_expired() => Ok(existing_token.value),
        _ => generate_csrf_token(session).await,
    }
}

async fn stored_token(session: &Session) -> Result<CsrfToken, StatusCode> {
    let stored: Option<CsrfToken> = session.get(CSRF_TOKEN_KEY).await.map_err(|e| {
        warn!("Failed to get CSRF token from session: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match stored {
        Some(token) if token.is_expired() => {
            warn!("CSRF token expired");
            Err(StatusCode::FORBIDDEN)
        }
        Some(token) => Ok(token),
        None => {
            warn!("No CSRF token in session");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

/// Check the token a form posted against the session's, then rotate it.
pub async fn validate_csrf_form_field(
    session: &Session,
    form_token: &str,
) -> Result<(), StatusCode> {
    let stored = stored_token(session).await?;

    if form_token != stored.value {
        warn!(
            "CSRF form token mismatch: expected {}, got {}",
            token_prefix(&stored.value),
            token_prefix(form_token)
        );
        return Err(StatusCode::FORBIDDEN);
    }

    debug!("CSRF form token validated, regenerating for replay protection");
    let _ = generate_csrf_token(session).await;

    Ok(())
}

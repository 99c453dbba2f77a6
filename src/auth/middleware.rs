use crate::error::AppError;
use crate::session::{registry::STORE_KEY, SessionRegistry, SessionStore};
use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tower_sessions::Session;
use tracing::warn;

/// The cookie session together with this browser's [`SessionStore`].
///
/// The first request of a browser session gets a fresh store, which is
/// initialized before the handler runs.
pub struct CurrentSession {
    pub session: Session,
    pub store: SessionStore,
}

impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| {
                warn!("Cookie session unavailable: {}", msg);
                AppError::Internal(msg.to_string())
            })?;

        let app_state = AppState::from_ref(state);

        let key = match session.get::<String>(STORE_KEY).await? {
            Some(key) => key,
            None => {
                let key = SessionRegistry::new_key();
                session.insert(STORE_KEY, &key).await?;
                key
            }
        };

        let (store, created) = app_state.registry.get_or_create(&key).await;
        if created {
            app_state.auth_service.initialize(&store);
        }

        Ok(Self { session, store })
    }
}

use crate::backend::{
    AuthBackend, AuthError, BackendMode, SignInRequest, SignUpOutcome, SignUpRequest,
};
use crate::models::{ProfileUpdate, SessionUser};
use crate::session::{Notice, SessionStore};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Brokers auth operations between a backend and a browser's session store.
///
/// Every operation records a notice on the store: a success message, or the
/// backend's error message. Errors are also returned to the caller so forms
/// can show them inline. Operations that change who is signed in take turns
/// on the store, which stays loading until the last one finishes.
pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
}

impl AuthService {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self { backend }
    }

    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    /// Initial load for a new store. Sessions are never restored across
    /// browser sessions, so this always ends signed out.
    pub fn initialize(&self, store: &SessionStore) {
        debug!("Initializing session store ({:?} backend)", self.mode());
        store.finish_initial_load(None);
    }

    pub async fn sign_in(
        &self,
        store: &SessionStore,
        request: SignInRequest,
    ) -> Result<SessionUser, AuthError> {
        let _operation = store.begin_operation().await;

        match self.backend.sign_in(&request).await {
            Ok(user) => {
                info!("User {} signed in as {}", user.email, user.role);
                store.set_user(Some(user.clone()));
                store.push_notice(Notice::success(self.with_mode("Successfully signed in!")));
                Ok(user)
            }
            Err(e) => Err(self.fail(store, "Sign in", e)),
        }
    }

    pub async fn sign_up(
        &self,
        store: &SessionStore,
        request: SignUpRequest,
    ) -> Result<SignUpOutcome, AuthError> {
        let _operation = store.begin_operation().await;

        match self.backend.sign_up(&request).await {
            Ok(SignUpOutcome::Active(user)) => {
                info!("Account created for {} as {}", user.email, user.role);
                store.set_user(Some(user.clone()));
                store.push_notice(Notice::success(
                    self.with_mode("Account created successfully!"),
                ));
                Ok(SignUpOutcome::Active(user))
            }
            Ok(SignUpOutcome::PendingVerification) => {
                info!("Account created for {}, awaiting email verification", request.email);
                store.push_notice(Notice::success(
                    "Account created successfully! Please check your email to verify your account.",
                ));
                Ok(SignUpOutcome::PendingVerification)
            }
            Err(e) => Err(self.fail(store, "Sign up", e)),
        }
    }

    pub async fn sign_out(&self, store: &SessionStore) -> Result<(), AuthError> {
        let _operation = store.begin_operation().await;

        if let Some(user) = store.user() {
            if let Err(e) = self.backend.sign_out(&user).await {
                return Err(self.fail(store, "Sign out", e));
            }
            info!("User {} signed out", user.email);
        }

        store.set_user(None);
        store.push_notice(Notice::success(self.with_mode("Successfully signed out!")));
        Ok(())
    }

    pub async fn reset_password(&self, store: &SessionStore, email: &str) -> Result<(), AuthError> {
        match self.backend.reset_password(email).await {
            Ok(()) => {
                store.push_notice(Notice::success(self.with_mode("Password reset email sent!")));
                Ok(())
            }
            Err(e) => Err(self.fail(store, "Password reset", e)),
        }
    }

    /// Persist `update` (when a backend is configured) and merge it into the
    /// signed-in user.
    pub async fn update_profile(
        &self,
        store: &SessionStore,
        update: ProfileUpdate,
    ) -> Result<SessionUser, AuthError> {
        let _operation = store.begin_operation().await;
        let Some(user) = store.user() else {
            return Err(self.fail(store, "Profile update", AuthError::NoActiveSession));
        };

        if let Err(e) = self.backend.update_profile(&user, &update).await {
            return Err(self.fail(store, "Profile update", e));
        }

        store.update_user(|current| current.apply(&update));
        store.push_notice(Notice::success("Profile updated successfully!"));

        let mut updated = user;
        updated.apply(&update);
        Ok(updated)
    }

    fn with_mode(&self, message: &str) -> String {
        if self.mode().is_demo() {
            format!("{} (Demo Mode)", message)
        } else {
            message.to_string()
        }
    }

    fn fail(&self, store: &SessionStore, operation: &str, err: AuthError) -> AuthError {
        error!("{} error: {}", operation, err);
        store.push_notice(Notice::error(err.to_string()));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockAuthBackend, MockBackend};
    use crate::models::Role;
    use crate::session::NoticeLevel;
    use std::time::Duration;

    fn demo_service() -> AuthService {
        AuthService::new(Arc::new(MockBackend::new()))
    }

    fn loaded_store() -> SessionStore {
        let store = SessionStore::new();
        store.finish_initial_load(None);
        store
    }

    fn remote_user() -> SessionUser {
        SessionUser {
            id: "remote-1".to_string(),
            email: "remote@example.com".to_string(),
            role: Role::Customer,
            full_name: Some("Remote User".to_string()),
            avatar_url: None,
            is_verified: true,
            last_login: None,
            access_token: Some("token".to_string()),
        }
    }

    fn rejected(message: &str) -> AuthError {
        AuthError::Backend {
            status: 400,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_demo_sign_in_populates_store() {
        let service = demo_service();
        let store = loaded_store();

        let user = service
            .sign_in(
                &store,
                SignInRequest {
                    email: "a@b.com".to_string(),
                    password: "x".to_string(),
                    role: Role::Admin,
                },
            )
            .await
            .unwrap();

        assert_eq!(user.role, Role::Admin);
        let stored = store.user().unwrap();
        assert_eq!(stored.email, "a@b.com");
        assert_eq!(stored.role, Role::Admin);
        assert!(stored.is_verified);
        assert!(!store.is_loading());

        let notices = store.take_notices();
        assert_eq!(notices[0].message, "Successfully signed in! (Demo Mode)");
    }

    #[tokio::test]
    async fn test_sign_in_error_is_recorded_and_returned() {
        let mut backend = MockAuthBackend::new();
        backend.expect_mode().returning(|| BackendMode::Remote);
        backend
            .expect_sign_in()
            .times(1)
            .returning(|_| Box::pin(async move { Err(rejected("Invalid login credentials")) }));

        let service = AuthService::new(Arc::new(backend));
        let store = loaded_store();

        let result = service
            .sign_in(
                &store,
                SignInRequest {
                    email: "a@b.com".to_string(),
                    password: "wrong".to_string(),
                    role: Role::Customer,
                },
            )
            .await;

        match result {
            Err(err) => assert_eq!(err.to_string(), "Invalid login credentials"),
            Ok(_) => panic!("sign in should fail"),
        }
        assert!(store.user().is_none());
        assert!(!store.is_loading(), "loading must be cleared on failure");

        let notices = store.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_remote_sign_up_leaves_store_empty() {
        let mut backend = MockAuthBackend::new();
        backend.expect_mode().returning(|| BackendMode::Remote);
        backend
            .expect_sign_up()
            .times(1)
            .returning(|_| Box::pin(async move { Ok(SignUpOutcome::PendingVerification) }));

        let service = AuthService::new(Arc::new(backend));
        let store = loaded_store();

        let outcome = service
            .sign_up(
                &store,
                SignUpRequest {
                    email: "new@example.com".to_string(),
                    password: "secret1".to_string(),
                    full_name: "New Person".to_string(),
                    role: Role::Customer,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome, SignUpOutcome::PendingVerification);
        assert!(store.user().is_none());
        assert!(store.take_notices()[0].message.contains("check your email"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_user() {
        let service = demo_service();
        let store = loaded_store();
        service
            .sign_in(
                &store,
                SignInRequest {
                    email: "a@b.com".to_string(),
                    password: String::new(),
                    role: Role::Customer,
                },
            )
            .await
            .unwrap();

        service.sign_out(&store).await.unwrap();
        assert!(store.user().is_none());
    }

    #[tokio::test]
    async fn test_failed_remote_sign_out_keeps_user() {
        let mut backend = MockAuthBackend::new();
        backend.expect_mode().returning(|| BackendMode::Remote);
        backend
            .expect_sign_out()
            .times(1)
            .returning(|_| Box::pin(async move { Err(rejected("Network unreachable")) }));

        let service = AuthService::new(Arc::new(backend));
        let store = loaded_store();
        store.set_user(Some(remote_user()));

        assert!(service.sign_out(&store).await.is_err());
        assert_eq!(store.user().map(|u| u.id), Some("remote-1".to_string()));
    }

    #[tokio::test]
    async fn test_update_profile_merges_fields() {
        let service = demo_service();
        let store = loaded_store();
        store.set_user(Some(remote_user()));

        let updated = service
            .update_profile(
                &store,
                ProfileUpdate {
                    full_name: Some("New Name".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.full_name.as_deref(), Some("New Name"));
        let stored = store.user().unwrap();
        assert_eq!(stored.full_name.as_deref(), Some("New Name"));
        assert_eq!(stored.role, Role::Customer);
        assert_eq!(stored.email, "remote@example.com");
    }

    #[tokio::test]
    async fn test_update_profile_requires_user() {
        let service = demo_service();
        let store = loaded_store();

        let result = service
            .update_profile(&store, ProfileUpdate::default())
            .await;
        assert!(matches!(result, Err(AuthError::NoActiveSession)));
        assert_eq!(store.take_notices()[0].message, "No user logged in");
    }

    #[tokio::test]
    async fn test_remote_profile_failure_does_not_merge() {
        let mut backend = MockAuthBackend::new();
        backend.expect_mode().returning(|| BackendMode::Remote);
        backend
            .expect_update_profile()
            .times(1)
            .returning(|_, _| Box::pin(async move { Err(rejected("permission denied")) }));

        let service = AuthService::new(Arc::new(backend));
        let store = loaded_store();
        store.set_user(Some(remote_user()));

        let result = service
            .update_profile(
                &store,
                ProfileUpdate {
                    full_name: Some("Other".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(result.is_err());
        assert_eq!(
            store.user().and_then(|u| u.full_name),
            Some("Remote User".to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_out_during_sign_in_runs_after_it() {
        let mut backend = MockAuthBackend::new();
        backend.expect_mode().returning(|| BackendMode::Remote);
        backend.expect_sign_in().times(1).returning(|request| {
            let mut user = remote_user();
            user.email = request.email.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(user)
            })
        });
        backend
            .expect_sign_out()
            .times(1)
            .returning(|_| Box::pin(async move { Ok(()) }));

        let service = Arc::new(AuthService::new(Arc::new(backend)));
        let store = loaded_store();

        let signing_in = {
            let service = service.clone();
            let store = store.clone();
            tokio::spawn(async move {
                service
                    .sign_in(
                        &store,
                        SignInRequest {
                            email: "a@b.com".to_string(),
                            password: "secret1".to_string(),
                            role: Role::Customer,
                        },
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.is_loading());

        let signing_out = {
            let service = service.clone();
            let store = store.clone();
            tokio::spawn(async move { service.sign_out(&store).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.is_loading(), "sign-in is still running");
        assert!(store.user().is_none());

        signing_in.await.unwrap().unwrap();
        signing_out.await.unwrap().unwrap();

        assert!(store.user().is_none(), "the later sign-out wins");
        assert!(!store.is_loading());
        let messages: Vec<String> = store
            .take_notices()
            .into_iter()
            .map(|notice| notice.message)
            .collect();
        assert_eq!(
            messages,
            vec!["Successfully signed in!", "Successfully signed out!"]
        );
    }
}

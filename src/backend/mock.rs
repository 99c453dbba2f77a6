use super::{
    AuthBackend, AuthResult, BackendMode, SignInRequest, SignUpOutcome, SignUpRequest,
};
use crate::models::{ProfileUpdate, SessionUser};
use async_trait::async_trait;
use tracing::debug;

pub const MOCK_USER_ID: &str = "mock-user-id";

/// In-memory stand-in used when no hosted backend is configured.
///
/// Trusts any input: sign-in does not look at the password at all.
#[derive(Debug, Clone, Default)]
pub struct MockBackend;

impl MockBackend {
    pub fn new() -> Self {
        Self
    }

    fn synthesize(email: &str, role: crate::models::Role, full_name: String) -> SessionUser {
        SessionUser {
            id: MOCK_USER_ID.to_string(),
            email: email.to_string(),
            role,
            full_name: Some(full_name),
            avatar_url: None,
            is_verified: true,
            last_login: Some(chrono::Utc::now().to_rfc3339()),
            access_token: None,
        }
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Mock
    }

    async fn sign_in(&self, request: &SignInRequest) -> AuthResult<SessionUser> {
        debug!("Mock sign in for {} as {}", request.email, request.role);
        Ok(Self::synthesize(
            &request.email,
            request.role,
            request.role.demo_display_name().to_string(),
        ))
    }

    async fn sign_up(&self, request: &SignUpRequest) -> AuthResult<SignUpOutcome> {
        debug!("Mock sign up for {} as {}", request.email, request.role);
        Ok(SignUpOutcome::Active(Self::synthesize(
            &request.email,
            request.role,
            request.full_name.clone(),
        )))
    }

    async fn sign_out(&self, _user: &SessionUser) -> AuthResult<()> {
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> AuthResult<()> {
        debug!("Mock password reset requested for {}", email);
        Ok(())
    }

    async fn update_profile(&self, _user: &SessionUser, _update: &ProfileUpdate) -> AuthResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[tokio::test]
    async fn test_sign_in_ignores_password() {
        let backend = MockBackend::new();

        for password in ["", "x", "definitely-wrong"] {
            let user = backend
                .sign_in(&SignInRequest {
                    email: "a@b.com".to_string(),
                    password: password.to_string(),
                    role: Role::Admin,
                })
                .await
                .unwrap();

            assert_eq!(user.email, "a@b.com");
            assert_eq!(user.role, Role::Admin);
            assert!(user.is_verified);
            assert_eq!(user.full_name.as_deref(), Some("Admin User"));
        }
    }

    #[tokio::test]
    async fn test_sign_up_is_active_immediately() {
        let outcome = MockBackend::new()
            .sign_up(&SignUpRequest {
                email: "new@b.com".to_string(),
                password: "secret1".to_string(),
                full_name: "New Person".to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap();

        match outcome {
            SignUpOutcome::Active(user) => {
                assert_eq!(user.full_name.as_deref(), Some("New Person"));
                assert_eq!(user.role, Role::Customer);
                assert!(user.is_verified);
            }
            SignUpOutcome::PendingVerification => panic!("mock sign up should not need verification"),
        }
    }
}

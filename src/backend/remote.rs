use super::rest::{ensure_success, read_json};
use super::{
    AuthBackend, AuthResult, BackendMode, RestClient, SignInRequest, SignUpOutcome,
    SignUpRequest,
};
use crate::models::{NewUserProfile, ProfileUpdate, Role, SessionUser, UserProfile};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const USERS_TABLE: &str = "users";

/// Hosted Supabase-compatible backend: credential checks go to the auth API,
/// profile data lives in the `users` table.
pub struct RemoteBackend {
    rest: RestClient,
    site_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUserPayload,
}

#[derive(Debug, Deserialize)]
struct AuthUserPayload {
    id: String,
    email: Option<String>,
    email_confirmed_at: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl AuthUserPayload {
    fn metadata_str(&self, key: &str) -> Option<String> {
        self.user_metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

impl RemoteBackend {
    pub fn new(rest: RestClient, site_url: &str) -> Self {
        Self {
            rest,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// Load the profile row for a freshly authenticated user, creating it when
    /// it does not exist yet. Profile failures never fail the sign-in.
    async fn load_profile(
        &self,
        auth_user: AuthUserPayload,
        email: &str,
        role: Role,
        access_token: String,
    ) -> SessionUser {
        let now = chrono::Utc::now().to_rfc3339();
        let token = Some(access_token.as_str());

        let existing = self
            .rest
            .table(USERS_TABLE)
            .eq("id", &auth_user.id)
            .limit(1)
            .bearer(token)
            .select::<UserProfile>()
            .await;

        match existing {
            Ok(rows) => {
                if let Some(profile) = rows.into_iter().next() {
                    if let Err(e) = self
                        .rest
                        .table(USERS_TABLE)
                        .eq("id", &auth_user.id)
                        .bearer(token)
                        .update(&json!({ "last_login": now }))
                        .await
                    {
                        warn!("Failed to record last login for {}: {}", auth_user.id, e);
                    }

                    let mut user = profile.into_session_user(Some(access_token));
                    user.last_login = Some(now);
                    return user;
                }
            }
            Err(e) => warn!("Error fetching user profile for {}: {}", auth_user.id, e),
        }

        let new_profile = NewUserProfile {
            id: auth_user.id.clone(),
            email: auth_user.email.clone().unwrap_or_else(|| email.to_string()),
            full_name: auth_user.metadata_str("full_name").unwrap_or_default(),
            role,
            is_verified: auth_user.email_confirmed_at.is_some(),
            last_login: now.clone(),
        };

        match self
            .rest
            .table(USERS_TABLE)
            .bearer(token)
            .insert::<_, UserProfile>(&new_profile)
            .await
        {
            Ok(rows) => match rows.into_iter().next() {
                Some(profile) => {
                    info!("Created user profile for {}", new_profile.email);
                    profile.into_session_user(Some(access_token))
                }
                None => {
                    warn!("Profile insert for {} returned no row", new_profile.email);
                    fallback_user(new_profile, &auth_user, access_token)
                }
            },
            Err(e) => {
                warn!("Error creating user profile for {}: {}", new_profile.email, e);
                fallback_user(new_profile, &auth_user, access_token)
            }
        }
    }
}

fn fallback_user(
    profile: NewUserProfile,
    auth_user: &AuthUserPayload,
    access_token: String,
) -> SessionUser {
    SessionUser {
        id: profile.id,
        email: profile.email,
        role: profile.role,
        full_name: Some(profile.full_name),
        avatar_url: auth_user.metadata_str("avatar_url"),
        is_verified: profile.is_verified,
        last_login: Some(profile.last_login),
        access_token: Some(access_token),
    }
}

#[async_trait]
impl AuthBackend for RemoteBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Remote
    }

    async fn sign_in(&self, request: &SignInRequest) -> AuthResult<SessionUser> {
        debug!("Attempting hosted sign in for {} as {}", request.email, request.role);

        let response = self
            .rest
            .post("/auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": request.email, "password": request.password }))
            .send()
            .await?;
        let token: TokenResponse = read_json(response).await?;

        // The portal picked at login becomes the stored role.
        if let Err(e) = self
            .rest
            .table(USERS_TABLE)
            .eq("id", &token.user.id)
            .bearer(Some(&token.access_token))
            .update(&json!({ "role": request.role }))
            .await
        {
            warn!("Failed to update role for {}: {}", token.user.id, e);
        }

        let mut user = self
            .load_profile(token.user, &request.email, request.role, token.access_token)
            .await;
        // A rejected role update leaves the stored role stale; the session
        // still follows the portal picked at login.
        user.role = request.role;
        Ok(user)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> AuthResult<SignUpOutcome> {
        debug!("Attempting hosted sign up for {} as {}", request.email, request.role);

        let response = self
            .rest
            .post("/auth/v1/signup", None)
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "data": { "full_name": request.full_name, "role": request.role },
            }))
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(SignUpOutcome::PendingVerification)
    }

    async fn sign_out(&self, user: &SessionUser) -> AuthResult<()> {
        let Some(token) = user.access_token.as_deref() else {
            return Ok(());
        };

        let response = self.rest.post("/auth/v1/logout", Some(token)).send().await?;
        ensure_success(response).await
    }

    async fn reset_password(&self, email: &str) -> AuthResult<()> {
        let redirect_to = format!("{}/auth/reset-password", self.site_url);
        let response = self
            .rest
            .post("/auth/v1/recover", None)
            .query(&[("redirect_to", redirect_to.as_str())])
            .json(&json!({ "email": email }))
            .send()
            .await?;
        ensure_success(response).await
    }

    async fn update_profile(&self, user: &SessionUser, update: &ProfileUpdate) -> AuthResult<()> {
        if update.is_empty() {
            return Ok(());
        }

        self.rest
            .table(USERS_TABLE)
            .eq("id", &user.id)
            .bearer(user.access_token.as_deref())
            .update(update)
            .await
    }
}

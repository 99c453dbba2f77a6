use super::session_user::{Role, SessionUser};
use serde::{Deserialize, Serialize};

/// Row of the hosted `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    pub last_login: Option<String>,
}

impl UserProfile {
    /// Build the session user for this profile, keeping the auth token.
    pub fn into_session_user(self, access_token: Option<String>) -> SessionUser {
        SessionUser {
            id: self.id,
            email: self.email,
            role: self.role,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            is_verified: self.is_verified,
            last_login: self.last_login,
            access_token,
        }
    }
}

/// Columns written when a profile row has to be created on first sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct NewUserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_verified: bool,
    pub last_login: String,
}

//! Auth backend capability.
//!
//! Everything the session layer needs from an identity provider goes through
//! [`AuthBackend`]. Two implementations exist: [`RemoteBackend`] talks to a
//! hosted Supabase-compatible project over HTTP, [`MockBackend`] synthesizes
//! users in memory and never fails. Which one runs is decided once, from
//! [`BackendConfig`], when the application state is built.

pub mod mock;
pub mod remote;
pub mod rest;

pub use mock::MockBackend;
pub use remote::RemoteBackend;
pub use rest::{RestClient, TableQuery};

use crate::config::BackendConfig;
use crate::models::{ProfileUpdate, Role, SessionUser};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Remote,
    Mock,
}

impl BackendMode {
    /// Demo mode: no hosted backend, every operation succeeds.
    pub fn is_demo(&self) -> bool {
        matches!(self, BackendMode::Mock)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Rejection reported by the backend. The message is shown to users as-is.
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Request to auth backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected response from auth backend: {0}")]
    InvalidResponse(String),
    #[error("No user logged in")]
    NoActiveSession,
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account is usable right away.
    Active(SessionUser),
    /// The backend sent a confirmation email; nobody is signed in yet.
    PendingVerification,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AuthBackend: Send + Sync {
    fn mode(&self) -> BackendMode;
    async fn sign_in(&self, request: &SignInRequest) -> AuthResult<SessionUser>;
    async fn sign_up(&self, request: &SignUpRequest) -> AuthResult<SignUpOutcome>;
    async fn sign_out(&self, user: &SessionUser) -> AuthResult<()>;
    async fn reset_password(&self, email: &str) -> AuthResult<()>;
    async fn update_profile(&self, user: &SessionUser, update: &ProfileUpdate) -> AuthResult<()>;
}

/// Build the backend selected by `config`.
pub fn from_config(config: &BackendConfig, site_url: &str) -> Arc<dyn AuthBackend> {
    match config {
        BackendConfig::Remote { url, anon_key } => Arc::new(RemoteBackend::new(
            RestClient::new(url, anon_key),
            site_url,
        )),
        BackendConfig::Mock => Arc::new(MockBackend::new()),
    }
}

//! Cookie-session settings for the portal.
//!
//! The cookie only carries the key of a browser's in-memory session store, so
//! its lifetime also bounds how long an idle store is kept around.

use std::env;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha512};
use tower_sessions::{
    cookie::{Key, SameSite},
    service::SignedCookie,
    Expiry, MemoryStore, SessionManagerLayer,
};
use tracing::warn;

/// Signed in-memory session layer used by the portal router.
pub type SessionLayer = SessionManagerLayer<MemoryStore, SignedCookie>;

const MIN_SECRET_BYTES: usize = 64;
const PLACEHOLDER_SECRETS: [&str; 3] = ["example", "changeme", "default"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Production environment requires HTTPS. Set FORCE_HTTPS=true")]
    HttpsRequired,
    #[error("SESSION_SECRET must be set in production")]
    MissingSessionSecret,
    #[error("SESSION_SECRET must be at least 64 bytes in production")]
    SessionSecretTooShort,
    #[error("SESSION_SECRET appears to be a default value. Generate a secure secret")]
    DefaultSessionSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// `ENVIRONMENT=production` selects production; anything else is development.
    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// `SESSION_SECRET`, base64-decoded when it is valid base64.
pub struct SessionSecret {
    raw: String,
    bytes: Vec<u8>,
}

impl SessionSecret {
    pub fn from_env() -> Option<Self> {
        env::var("SESSION_SECRET")
            .ok()
            .filter(|raw| !raw.is_empty())
            .map(Self::new)
    }

    pub fn new(raw: String) -> Self {
        let bytes = STANDARD
            .decode(raw.as_bytes())
            .unwrap_or_else(|_| raw.as_bytes().to_vec());
        Self { raw, bytes }
    }

    /// Strength checks applied before a production start.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.bytes.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::SessionSecretTooShort);
        }

        let lowered = self.raw.to_ascii_lowercase();
        if PLACEHOLDER_SECRETS.iter().any(|p| lowered.contains(p)) {
            return Err(ConfigError::DefaultSessionSecret);
        }

        Ok(())
    }

    /// Cookie signing key. Short secrets are stretched through SHA-512.
    pub fn signing_key(&self) -> Key {
        if self.bytes.len() >= MIN_SECRET_BYTES {
            Key::from(&self.bytes[..MIN_SECRET_BYTES])
        } else {
            Key::from(Sha512::digest(&self.bytes).as_slice())
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub expiry: time::Duration,
    pub name: String,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self::for_environment(Environment::from_env())
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => SessionConfig {
                secure: true,
                http_only: true,
                same_site: SameSite::Strict,
                expiry: time::Duration::hours(2),
                name: "__Host-session".to_string(),
            },
            Environment::Development => SessionConfig {
                secure: false,
                http_only: true,
                same_site: SameSite::Lax,
                expiry: time::Duration::days(1),
                name: "session".to_string(),
            },
        }
    }

    pub fn create_layer(&self, store: MemoryStore) -> SessionLayer {
        let key = match SessionSecret::from_env() {
            Some(secret) => secret.signing_key(),
            None => {
                warn!("SESSION_SECRET not set; generating ephemeral key (development only)");
                Key::generate()
            }
        };

        SessionManagerLayer::new(store)
            .with_secure(self.secure)
            .with_http_only(self.http_only)
            .with_same_site(self.same_site)
            .with_name(self.name.clone())
            .with_expiry(Expiry::OnInactivity(self.expiry))
            .with_signed(key)
    }

    /// Idle time after which a browser's session store may be evicted.
    pub fn idle_limit(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.expiry.whole_seconds().max(0) as u64)
    }
}

/// Refuse to start a production portal over plain HTTP or with a weak secret.
pub fn validate_production_config() -> Result<(), ConfigError> {
    if Environment::from_env() != Environment::Production {
        return Ok(());
    }

    if !env_flag_enabled("FORCE_HTTPS") {
        return Err(ConfigError::HttpsRequired);
    }

    SessionSecret::from_env()
        .ok_or(ConfigError::MissingSessionSecret)?
        .check()
}

fn env_flag_enabled(key: &str) -> bool {
    env::var(key)
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false)
}

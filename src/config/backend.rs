//! Resolution of the hosted auth backend.
//!
//! The presence of both the endpoint and the public key is the only switch
//! between talking to the hosted backend and running in demo mode. It is read
//! once at startup and never consulted again by handlers.

use crate::backend::BackendMode;
use std::env;
use tracing::info;

pub const URL_VARS: [&str; 2] = ["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"];
pub const ANON_KEY_VARS: [&str; 2] = ["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Remote { url: String, anon_key: String },
    Mock,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let config = Self::from_values(first_present(&URL_VARS), first_present(&ANON_KEY_VARS));

        match &config {
            BackendConfig::Remote { url, .. } => info!("Hosted auth backend configured at {}", url),
            BackendConfig::Mock => {
                info!("Hosted auth backend not configured, using mock authentication")
            }
        }

        config
    }

    pub fn from_values(url: Option<String>, anon_key: Option<String>) -> Self {
        match (non_blank(url), non_blank(anon_key)) {
            (Some(url), Some(anon_key)) => BackendConfig::Remote {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            },
            _ => BackendConfig::Mock,
        }
    }

    pub fn mode(&self) -> BackendMode {
        match self {
            BackendConfig::Remote { .. } => BackendMode::Remote,
            BackendConfig::Mock => BackendMode::Mock,
        }
    }
}

fn first_present(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_values_select_remote() {
        let config = BackendConfig::from_values(
            Some("https://project.example.co/".to_string()),
            Some("anon".to_string()),
        );
        assert_eq!(
            config,
            BackendConfig::Remote {
                url: "https://project.example.co".to_string(),
                anon_key: "anon".to_string(),
            }
        );
        assert_eq!(config.mode(), BackendMode::Remote);
    }

    #[test]
    fn test_missing_or_blank_value_selects_mock() {
        assert_eq!(
            BackendConfig::from_values(Some("https://x.example".to_string()), None),
            BackendConfig::Mock
        );
        assert_eq!(
            BackendConfig::from_values(None, Some("anon".to_string())),
            BackendConfig::Mock
        );
        assert_eq!(
            BackendConfig::from_values(Some("   ".to_string()), Some("anon".to_string())),
            BackendConfig::Mock
        );
    }
}

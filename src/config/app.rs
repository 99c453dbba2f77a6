use anyhow::Context;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Process-level settings read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Public origin of the portal, used in links sent by the backend.
    pub site_url: String,
    /// How long a gated page waits for a session to finish loading.
    pub auth_load_timeout: Duration,
    pub registry_sweep_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            site_url: "http://localhost:8080".to_string(),
            auth_load_timeout: Duration::from_millis(5000),
            registry_sweep_interval: Duration::from_secs(300),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = match env::var("HOST") {
            Ok(raw) => raw.parse::<IpAddr>().context("HOST must be an IP address")?,
            Err(_) => defaults.host,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().context("PORT must be a valid port number")?,
            Err(_) => defaults.port,
        };

        let site_url = env::var("BSM_SITE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let auth_load_timeout = match env::var("BSM_AUTH_LOAD_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(
                raw.parse::<u64>()
                    .context("BSM_AUTH_LOAD_TIMEOUT_MS must be a number of milliseconds")?,
            ),
            Err(_) => defaults.auth_load_timeout,
        };

        let registry_sweep_interval = match env::var("BSM_REGISTRY_SWEEP_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("BSM_REGISTRY_SWEEP_SECS must be a number of seconds")?,
            ),
            Err(_) => defaults.registry_sweep_interval,
        };

        Ok(Self {
            host,
            port,
            site_url,
            auth_load_timeout,
            registry_sweep_interval,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

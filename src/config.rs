use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::AgentError;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub gateway: GatewayConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub admin_email: String,
    pub admin_password: String,
    pub timeout_secs: u64,
    /// How long a freshly issued token is trusted before it is considered expired.
    pub token_ttl_secs: u64,
    /// A cached token is refreshed once it is this close to expiry.
    pub refresh_margin_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash-exp".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.0,
            timeout_secs: 30,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api-gateway:4000".to_string(),
            admin_email: "admin@test.com".to_string(),
            admin_password: "admin123".to_string(),
            timeout_secs: 10,
            token_ttl_secs: 23 * 60 * 60,
            refresh_margin_secs: 5 * 60,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// Longest token lifetime accepted from configuration (one year).
const MAX_TOKEN_TTL_SECS: u64 = 366 * 24 * 60 * 60;

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Saturates instead of panicking on out-of-range values.
    pub fn token_ttl(&self) -> TimeDelta {
        seconds(self.token_ttl_secs)
    }

    pub fn refresh_margin(&self) -> TimeDelta {
        seconds(self.refresh_margin_secs)
    }

    /// Reject token timings that would either overflow or force a login per call.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AgentError::Config(format!(
                "gateway.token_ttl_secs must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_SECS, self.token_ttl_secs
            )));
        }
        if self.refresh_margin_secs >= self.token_ttl_secs {
            return Err(AgentError::Config(format!(
                "gateway.refresh_margin_secs ({}) must be shorter than gateway.token_ttl_secs ({})",
                self.refresh_margin_secs, self.token_ttl_secs
            )));
        }
        Ok(())
    }
}

fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

impl Config {
    /// Load configuration from an optional TOML file, then apply environment overrides.
    ///
    /// A missing file is not an error: every section falls back to its defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            log::info!("No {} found, using defaults", path.display());
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.gateway.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Override file values with whatever the environment provides.
    fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("GOOGLE_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = var("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(endpoint) = var("GEMINI_ENDPOINT") {
            self.gemini.endpoint = endpoint;
        }
        if let Some(url) = var("API_GATEWAY_URL") {
            self.gateway.base_url = url;
        }
        if let Some(email) = var("ADMIN_EMAIL") {
            self.gateway.admin_email = email;
        }
        if let Some(password) = var("ADMIN_PASSWORD") {
            self.gateway.admin_password = password;
        }
        if let Some(host) = var("AGENT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("AGENT_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("AGENT_PORT is not a valid port: {}", port))?;
        }

        // Empty strings in .env files are common; treat them as unset.
        if self.gemini.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.gemini.api_key = None;
        }
        self.gateway.base_url = self.gateway.base_url.trim_end_matches('/').to_string();

        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str, AgentError> {
        self.gemini.api_key.as_deref().ok_or_else(|| {
            AgentError::Config(
                "GOOGLE_API_KEY no configurada. Verifica el archivo .env".to_string(),
            )
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

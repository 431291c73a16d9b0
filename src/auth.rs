use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use crate::config::GatewayConfig;
use crate::error::{AgentError, AgentResult};

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A bearer token and the moment we stop trusting it.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// Keeps the admin bearer token used for gateway calls.
///
/// Refresh is lazy: a login only happens when a caller asks for a token and the
/// cached one is missing or inside the refresh margin. A refresh replaces the
/// whole credential, so concurrent refreshers simply race and the last one wins.
pub struct CredentialManager {
    client: reqwest::Client,
    login_url: String,
    email: String,
    password: String,
    ttl: Duration,
    margin: Duration,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(config: &GatewayConfig, client: reqwest::Client) -> Self {
        Self::with_clock(config, client, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &GatewayConfig,
        client: reqwest::Client,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            login_url: format!("{}/api/auth/login", config.base_url),
            email: config.admin_email.clone(),
            password: config.admin_password.clone(),
            ttl: config.token_ttl(),
            margin: config.refresh_margin(),
            clock,
            current: RwLock::new(None),
        }
    }

    /// Return a token valid for at least the refresh margin, logging in if needed.
    pub async fn get_token(&self) -> AgentResult<String> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let credential = self.login().await?;
        let token = credential.token.clone();
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(credential);
        Ok(token)
    }

    /// Authorization header built from the token currently held.
    ///
    /// Does not refresh; call [`get_token`](Self::get_token) first.
    pub fn get_auth_headers(&self) -> AgentResult<HeaderMap> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        let credential = guard.as_ref().ok_or_else(|| {
            AgentError::Auth("no token available, call get_token() first".to_string())
        })?;

        let value = HeaderValue::from_str(&format!("Bearer {}", credential.token))
            .map_err(|_| AgentError::Auth("token is not a valid header value".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    fn cached_token(&self) -> Option<String> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|c| {
                c.expires_at
                    .checked_sub_signed(self.margin)
                    .is_some_and(|refresh_at| self.clock.now() < refresh_at)
            })
            .map(|c| c.token.clone())
    }

    async fn login(&self) -> AgentResult<Credential> {
        log::info!("Auth: requesting new gateway token for {}", self.email);

        let response = self
            .client
            .post(&self.login_url)
            .json(&LoginRequest {
                email: &self.email,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| AgentError::Auth(format!("login request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Auth(format!("login rejected ({}): {}", status, body)));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Auth(format!("invalid login response: {}", e)))?;

        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AgentError::Auth("login response has no token".to_string()))?;

        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| {
                AgentError::Auth(format!("token lifetime {} is out of range", self.ttl))
            })?;
        log::info!("Auth: token obtained, trusted until {}", expires_at);

        Ok(Credential { token, expires_at })
    }
}

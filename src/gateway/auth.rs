//! Client-credentials token acquisition
//!
//! Fetches bearer tokens from the tenant's OAuth2 endpoint and keeps the
//! current one until shortly before it expires.

use crate::config::DynamicsConfig;
use crate::gateway::error::GatewayError;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Tokens are refreshed this long before their stated expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Caching bearer-token source
pub struct TokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a provider for the configured tenant
    pub fn new(client: reqwest::Client, config: &DynamicsConfig) -> Self {
        Self {
            client,
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope(),
            cached: RwLock::new(None),
        }
    }

    /// Current bearer token, fetching a new one when needed
    ///
    /// # Errors
    /// * `GatewayError::Transport` if the token endpoint is unreachable
    /// * `GatewayError::AuthRejected` if the endpoint returns a non-success status
    /// * `GatewayError::InvalidToken` if the response carries no token
    pub async fn token(&self) -> Result<String, GatewayError> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        // No guard is held while the token endpoint is awaited.
        let fresh = self.fetch().await?;

        let mut cached = self.cached.write().await;
        // A concurrent refresh may have stored a longer-lived token meanwhile.
        if let Some(current) = cached.as_ref() {
            if current.expires_at >= fresh.expires_at {
                return Ok(current.access_token.clone());
            }
        }
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn cached_token(&self) -> Option<String> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|token| token.expires_at > Instant::now() + EXPIRY_MARGIN)
            .map(|token| token.access_token.clone())
    }

    async fn fetch(&self) -> Result<CachedToken, GatewayError> {
        tracing::debug!(token_url = %self.token_url, "Requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: self.token_url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Transport {
                url: self.token_url.clone(),
                source,
            })?;

        if !status.is_success() {
            tracing::error!(
                status_code = status.as_u16(),
                "Token endpoint rejected client credentials"
            );
            return Err(GatewayError::AuthRejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::InvalidToken(e.to_string()))?;
        if parsed.access_token.is_empty() {
            return Err(GatewayError::InvalidToken(
                "access_token is empty".to_string(),
            ));
        }

        tracing::debug!(expires_in = parsed.expires_in, "Access token acquired");

        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(parsed.expires_in))
            .ok_or_else(|| {
                GatewayError::InvalidToken(format!(
                    "expires_in {} is out of range",
                    parsed.expires_in
                ))
            })?;

        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at,
        })
    }
}

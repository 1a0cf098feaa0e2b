//! HTTP gateway
//!
//! reqwest-backed [`Gateway`] against the backend's OData endpoints. One
//! shared client (connection pooling, per-request timeout) and one cached
//! bearer token serve every invocation.

use crate::config::DynamicsConfig;
use crate::gateway::auth::TokenProvider;
use crate::gateway::error::GatewayError;
use crate::gateway::{Gateway, GatewayResult, HttpMethod};
use crate::notify::{NotificationRelay, ProgressEvent};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::Value;
use std::time::Duration;

/// Raw response handed back by [`HttpGateway::send`]
#[derive(Debug)]
struct RawResponse {
    status: u16,
    body: String,
}

/// reqwest implementation of [`Gateway`]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
    missing: Vec<&'static str>,
}

impl HttpGateway {
    /// Build a gateway from connection settings
    ///
    /// Blank credentials do not fail here; every call then returns an error
    /// result naming the missing settings.
    ///
    /// # Errors
    /// * `GatewayError::ClientBuild` if the HTTP client cannot be constructed
    pub fn new(config: &DynamicsConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::ClientBuild(e.to_string()))?;

        Ok(Self {
            tokens: TokenProvider::new(client.clone(), config),
            client,
            base_url: config.base_url().to_string(),
            missing: config.missing_settings(),
        })
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, GatewayError> {
        if !self.missing.is_empty() {
            return Err(GatewayError::MissingCredentials(self.missing.join(", ")));
        }

        let token = self.tokens.token().await?;
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(method = %method, url = %url, has_body = body.is_some(), "Calling backend");

        let mut request = self
            .client
            .request(method.into(), &url)
            .bearer_auth(token)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header("OData-Version", "4.0")
            .header("OData-MaxVersion", "4.0");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Transport { url, source })?;

        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        relay: &NotificationRelay,
    ) -> GatewayResult {
        relay.notify(ProgressEvent::RequestStarted {
            method: method.to_string(),
            path: path.to_string(),
        });

        let response = match self.send(method, path, body.as_ref()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(method = %method, path = %path, error = %e, "Backend request failed");
                return GatewayResult::error(e.to_string());
            }
        };

        relay.notify(ProgressEvent::RequestCompleted {
            method: method.to_string(),
            path: path.to_string(),
            status: response.status,
        });

        normalize_response(method, path, response)
    }
}

fn normalize_response(method: HttpMethod, path: &str, response: RawResponse) -> GatewayResult {
    let RawResponse { status, body } = response;

    if !(200..300).contains(&status) {
        tracing::error!(
            method = %method,
            path = %path,
            status_code = status,
            "Backend returned error status"
        );
        return GatewayResult::error(format!(
            "{} {} failed with HTTP {}: {}",
            method, path, status, body
        ));
    }

    if body.trim().is_empty() {
        return GatewayResult::success(format!("Operation successful (HTTP {})", status));
    }

    match serde_json::from_str::<Value>(&body) {
        Ok(json) => GatewayResult::success(
            serde_json::to_string_pretty(&json).unwrap_or(body),
        ),
        Err(_) => GatewayResult::success(body),
    }
}

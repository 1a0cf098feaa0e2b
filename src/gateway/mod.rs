//! Backend gateway
//!
//! The [`Gateway`] trait is the single seam between operations and the
//! backend. [`HttpGateway`] is the reqwest implementation; tests substitute
//! scripted gateways.

pub mod auth;
pub mod error;
pub mod http;

pub use auth::TokenProvider;
pub use error::GatewayError;
pub use http::HttpGateway;

use crate::notify::NotificationRelay;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// HTTP methods the operations use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read
    Get,
    /// Create or invoke an action
    Post,
    /// Partial update
    Patch,
}

impl HttpMethod {
    /// Upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// One content item of a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Content kind; always `text` here
    #[serde(rename = "type")]
    pub kind: String,
    /// Text payload
    pub text: String,
}

impl Content {
    /// Text content item
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Normalized result of a backend call, also used as the operation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResult {
    /// Whether the call failed
    pub is_error: bool,
    /// Ordered content items
    pub content: Vec<Content>,
}

impl GatewayResult {
    /// Successful result with a single text item
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![Content::text(text)],
        }
    }

    /// Error result with a single text item
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![Content::text(text)],
        }
    }

    /// All text items joined with newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text parsed as JSON, if it is JSON
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.text()).ok()
    }
}

/// Executes one backend request
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Issue `method` against `path` (relative to the environment root,
    /// query string included) with an optional JSON body.
    ///
    /// Never fails: transport problems and HTTP error statuses come back as
    /// results with `is_error` set.
    async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        relay: &NotificationRelay,
    ) -> GatewayResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_wire_format() {
        let json = serde_json::to_value(GatewayResult::error("boom")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"isError": true, "content": [{"type": "text", "text": "boom"}]})
        );
    }

    #[test]
    fn test_text_joins_items() {
        let result = GatewayResult {
            is_error: false,
            content: vec![Content::text("a"), Content::text("b")],
        };
        assert_eq!(result.text(), "a\nb");
        assert!(result.json().is_none());
    }

    #[test]
    fn test_json_parses_text() {
        let result = GatewayResult::success(r#"{"SalesOrderNumber": "SO-1"}"#);
        assert_eq!(result.json().unwrap()["SalesOrderNumber"], "SO-1");
    }
}

//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::fmt;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Backend connection configuration
    pub dynamics: DynamicsConfig,
    /// Query configuration
    pub query: QueryConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Backend connection configuration
#[derive(Clone, Default)]
pub struct DynamicsConfig {
    /// Environment root, e.g. `https://contoso.operations.dynamics.com`
    pub resource_url: String,
    /// Directory tenant
    pub tenant_id: String,
    /// Application (client) ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Token authority host
    pub authority_host: String,
    /// Per-request timeout (in seconds)
    pub timeout_secs: u64,
}

/// Query configuration
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// `$top` used when a query does not carry one
    pub default_page_size: u32,
    /// Optional JSON entity catalog; builtin list when unset
    pub entity_catalog_path: Option<String>,
}

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const DEFAULT_PAGE_SIZE: u32 = 5;

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            dynamics: DynamicsConfig {
                resource_url: env::var("DYNAMICS_RESOURCE_URL").unwrap_or_default(),
                tenant_id: env::var("AZURE_TENANT_ID").unwrap_or_default(),
                client_id: env::var("AZURE_CLIENT_ID").unwrap_or_default(),
                client_secret: env::var("AZURE_CLIENT_SECRET").unwrap_or_default(),
                authority_host: env::var("AZURE_AUTHORITY_HOST")
                    .unwrap_or_else(|_| DEFAULT_AUTHORITY_HOST.to_string()),
                timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30),
            },
            query: QueryConfig {
                default_page_size: parse_page_size(env::var("DEFAULT_PAGE_SIZE").ok()),
                entity_catalog_path: env::var("ENTITY_CATALOG_PATH")
                    .ok()
                    .filter(|p| !p.trim().is_empty()),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DynamicsConfig {
    /// Environment root without a trailing slash
    pub fn base_url(&self) -> &str {
        self.resource_url.trim_end_matches('/')
    }

    /// OAuth2 token endpoint for the tenant
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// Client-credentials scope for the environment
    pub fn scope(&self) -> String {
        format!("{}/.default", self.base_url())
    }

    /// Names of required settings that are blank
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            ("DYNAMICS_RESOURCE_URL", &self.resource_url),
            ("AZURE_TENANT_ID", &self.tenant_id),
            ("AZURE_CLIENT_ID", &self.client_id),
            ("AZURE_CLIENT_SECRET", &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl fmt::Debug for DynamicsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicsConfig")
            .field("resource_url", &self.resource_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authority_host", &self.authority_host)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn parse_page_size(raw: Option<String>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

//! Gateway error types
//!
//! Errors that can occur while talking to the backend (credentials, token
//! acquisition, transport). HTTP error statuses are not errors at this level:
//! they come back as responses and are turned into error results by the caller.

use thiserror::Error;

/// Errors that can occur while issuing a backend request
#[derive(Error, Debug)]
pub enum GatewayError {
    /// One or more connection settings are blank
    #[error("Missing Dynamics configuration: {0}")]
    MissingCredentials(String),

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Token endpoint rejected the client credentials
    #[error("Authentication failed (HTTP {status}): {body}")]
    AuthRejected {
        /// HTTP status from the token endpoint
        status: u16,
        /// Response body from the token endpoint
        body: String,
    },

    /// Token endpoint answered with something that is not a token
    #[error("Invalid token response: {0}")]
    InvalidToken(String),

    /// Request could not be sent or the response could not be read
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Target URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },
}

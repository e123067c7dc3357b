//! # SonarQube API Client Library
//!
//! A Rust client library for the SonarQube Web API, covering the endpoints a
//! CI bootstrap needs: system restart/status, users, groups, tokens,
//! permissions, and quality profiles.
//!
//! Every request is authenticated with HTTP Basic credentials; mutating
//! endpoints take form-urlencoded bodies and responses are JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sonarqube_platform::{SonarConfig, SonarClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SonarConfig::new("sonar", 9000, "admin", "admin");
//!     let client = SonarClient::new(config)?;
//!
//!     let status = client.system_api().status().await?;
//!     println!("server is {status}");
//!
//!     let identity = client.identity_api();
//!     identity.create_user("jenkins", "jenkins", "secret").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod identity;
pub mod profile;
pub mod system;

use reqwest::Error as ReqwestError;
use std::fmt;

// Re-export common types for convenience
pub use client::SonarClient;
pub use identity::{Group, IdentityApi, IdentityError, Permission, User, UserToken};
pub use profile::{ProfileApi, ProfileError, QualityProfile, RestoreSummary};
pub use system::{ServerStatus, SystemApi};

/// Custom error type for SonarQube API operations.
#[derive(Debug)]
pub enum SonarError {
    /// HTTP request failed
    Http(ReqwestError),
    /// JSON serialization/deserialization failed
    Serialization(serde_json::Error),
    /// API returned an error response
    InvalidResponse(String),
    /// Configuration is invalid
    InvalidConfig(String),
}

impl fmt::Display for SonarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SonarError::Http(e) => write!(f, "HTTP error: {e}"),
            SonarError::Serialization(e) => write!(f, "Serialization error: {e}"),
            SonarError::InvalidResponse(e) => write!(f, "Invalid response: {e}"),
            SonarError::InvalidConfig(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for SonarError {}

impl From<ReqwestError> for SonarError {
    fn from(error: ReqwestError) -> Self {
        SonarError::Http(error)
    }
}

impl From<serde_json::Error> for SonarError {
    fn from(error: serde_json::Error) -> Self {
        SonarError::Serialization(error)
    }
}

impl SonarClient {
    /// Get an identity API instance (users, groups, tokens, permissions).
    pub fn identity_api(&self) -> IdentityApi {
        IdentityApi::new(self)
    }

    /// Get a quality profile API instance.
    pub fn profile_api(&self) -> ProfileApi {
        ProfileApi::new(self)
    }

    /// Get a system API instance (restart, status).
    pub fn system_api(&self) -> SystemApi {
        SystemApi::new(self)
    }
}

/// Configuration for the SonarQube API client.
///
/// Holds the server coordinates and the Basic auth credentials attached to
/// every request. SonarQube exposes its Web API over plain HTTP inside the
/// provisioning network, so the base URL is rendered as `http://host:port`.
#[derive(Debug, Clone)]
pub struct SonarConfig {
    /// Server hostname
    pub host: String,
    /// Server port
    pub port: u16,
    /// Username for Basic authentication
    pub username: String,
    /// Password for Basic authentication (kept out of logs)
    pub password: String,
    /// Log every request line at debug level
    pub debug: bool,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl SonarConfig {
    /// Create a new configuration.
    ///
    /// # Arguments
    ///
    /// * `host` - Server hostname
    /// * `port` - Server port
    /// * `username` - Basic auth username
    /// * `password` - Basic auth password
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            debug: false,
            connect_timeout: 10,
            request_timeout: 30,
        }
    }

    /// Enable request logging at debug level.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the connect/request timeouts (seconds).
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: u64, request_timeout: u64) -> Self {
        self.connect_timeout = connect_timeout;
        self.request_timeout = request_timeout;
        self
    }

    /// Render the base URL for API requests.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

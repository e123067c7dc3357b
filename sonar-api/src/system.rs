//! System API functionality: restart and lifecycle status.

use log::debug;
use serde::Deserialize;

use crate::{SonarClient, SonarError};

/// Server lifecycle states reported by `/api/system/status`.
///
/// The set mirrors the states the server documents; anything else (newer
/// server versions add states) is carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    Up,
    Down,
    Starting,
    Restarting,
    DbMigrationNeeded,
    DbMigrationRunning,
    Other(String),
}

impl ServerStatus {
    /// Whether the server is fully operational.
    #[must_use]
    pub fn is_up(&self) -> bool {
        matches!(self, ServerStatus::Up)
    }

    fn from_wire(status: &str) -> Self {
        match status {
            "UP" => ServerStatus::Up,
            "DOWN" => ServerStatus::Down,
            "STARTING" => ServerStatus::Starting,
            "RESTARTING" => ServerStatus::Restarting,
            "DB_MIGRATION_NEEDED" => ServerStatus::DbMigrationNeeded,
            "DB_MIGRATION_RUNNING" => ServerStatus::DbMigrationRunning,
            other => ServerStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServerStatus::Up => "UP",
            ServerStatus::Down => "DOWN",
            ServerStatus::Starting => "STARTING",
            ServerStatus::Restarting => "RESTARTING",
            ServerStatus::DbMigrationNeeded => "DB_MIGRATION_NEEDED",
            ServerStatus::DbMigrationRunning => "DB_MIGRATION_RUNNING",
            ServerStatus::Other(other) => other,
        };
        f.write_str(s)
    }
}

/// Response wrapper for `/api/system/status`
#[derive(Debug, Clone, Deserialize)]
struct StatusResponse {
    status: String,
}

/// System API operations
pub struct SystemApi<'a> {
    client: &'a SonarClient,
}

impl<'a> SystemApi<'a> {
    /// Create a new `SystemApi` instance
    #[must_use]
    pub fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Trigger a server restart.
    ///
    /// The server acknowledges and restarts asynchronously; this does not
    /// wait for it to come back. Poll [`Self::status`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn restart(&self) -> Result<(), SonarError> {
        let response = self.client.post_form("/api/system/restart", &[]).await?;
        SonarClient::handle_response(response, "restart server").await?;

        debug!("Server restart triggered");
        Ok(())
    }

    /// Fetch the server's lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails - during a restart the
    /// server drops connections, so callers polling for readiness must
    /// treat errors as "not up yet".
    pub async fn status(&self) -> Result<ServerStatus, SonarError> {
        let response = self.client.get("/api/system/status", &[]).await?;
        let response = SonarClient::handle_response(response, "get server status").await?;

        let status: StatusResponse = response.json().await?;
        Ok(ServerStatus::from_wire(&status.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(ServerStatus::from_wire("UP"), ServerStatus::Up);
        assert_eq!(ServerStatus::from_wire("DOWN"), ServerStatus::Down);
        assert_eq!(
            ServerStatus::from_wire("DB_MIGRATION_RUNNING"),
            ServerStatus::DbMigrationRunning
        );
        assert_eq!(
            ServerStatus::from_wire("MAINTENANCE"),
            ServerStatus::Other("MAINTENANCE".to_string())
        );
    }

    #[test]
    fn test_only_up_counts_as_up() {
        assert!(ServerStatus::Up.is_up());
        assert!(!ServerStatus::Starting.is_up());
        assert!(!ServerStatus::Other("UPGRADE".to_string()).is_up());
    }

    #[test]
    fn test_status_display_round_trip() {
        for status in ["UP", "DOWN", "STARTING", "RESTARTING"] {
            assert_eq!(ServerStatus::from_wire(status).to_string(), status);
        }
    }
}

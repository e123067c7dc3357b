//! Quality profile API functionality.
//!
//! A quality profile is a named, server-side set of active analysis rules
//! for a language. The server addresses profiles by an opaque key, so the
//! human-facing name must be resolved through search first.

use log::debug;
use reqwest::multipart;
use serde::{Deserialize, Serialize};

use crate::{SonarClient, SonarError};

/// Represents a quality profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Server-assigned profile key
    pub key: String,
    /// Human-readable profile name
    pub name: String,
    /// Language the profile applies to
    pub language: Option<String>,
    /// Whether this is the default profile for its language
    #[serde(rename = "isDefault")]
    pub is_default: Option<bool>,
}

/// Response wrapper for `/api/qualityprofiles/search`
#[derive(Debug, Clone, Deserialize)]
pub struct ProfilesResponse {
    /// Matching profiles
    pub profiles: Vec<QualityProfile>,
}

/// Response of `/api/qualityprofiles/restore`
#[derive(Debug, Clone, Deserialize)]
pub struct RestoreSummary {
    /// The restored profile
    pub profile: Option<QualityProfile>,
    /// Number of rules restored
    #[serde(rename = "ruleSuccesses")]
    pub rule_successes: Option<u32>,
    /// Number of rules that could not be restored
    #[serde(rename = "ruleFailures")]
    pub rule_failures: Option<u32>,
}

/// Quality-profile-specific error types
#[derive(Debug)]
pub enum ProfileError {
    /// General API error
    Api(SonarError),
    /// No profile matched the requested name
    ProfileNotFound(String),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Api(err) => write!(f, "API error: {err}"),
            ProfileError::ProfileNotFound(name) => {
                write!(f, "Quality profile not found: {name}")
            }
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<SonarError> for ProfileError {
    fn from(err: SonarError) -> Self {
        ProfileError::Api(err)
    }
}

impl From<reqwest::Error> for ProfileError {
    fn from(err: reqwest::Error) -> Self {
        ProfileError::Api(SonarError::Http(err))
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        ProfileError::Api(SonarError::Serialization(err))
    }
}

/// Quality profile API operations
pub struct ProfileApi<'a> {
    client: &'a SonarClient,
}

impl<'a> ProfileApi<'a> {
    /// Create a new `ProfileApi` instance
    #[must_use]
    pub fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Resolve a profile name to its server-assigned key.
    ///
    /// Takes the first matching profile, mirroring the server's own
    /// ordering for name searches.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::ProfileNotFound` when no profile matches -
    /// callers must surface this rather than mask it, since every later
    /// profile operation depends on the key.
    pub async fn get_profile_id(&self, profile_name: &str) -> Result<String, ProfileError> {
        let response = self
            .client
            .get(
                "/api/qualityprofiles/search",
                &[("qualityProfile", profile_name)],
            )
            .await?;
        let response = SonarClient::handle_response(response, "search quality profiles").await?;

        let profiles: ProfilesResponse = response.json().await?;
        let profile = profiles
            .profiles
            .first()
            .ok_or_else(|| ProfileError::ProfileNotFound(profile_name.to_string()))?;

        debug!(
            "Profile id of {profile_name} profile is {}",
            profile.key
        );
        Ok(profile.key.clone())
    }

    /// Bulk-activate rules on a profile, filtered by status.
    ///
    /// # Arguments
    ///
    /// * `profile_key` - Target profile key from [`Self::get_profile_id`]
    /// * `languages` - Comma-separated language filter (e.g., "java")
    /// * `statuses` - Comma-separated rule status filter (e.g., "READY")
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn activate_rules(
        &self,
        profile_key: &str,
        languages: &str,
        statuses: &str,
    ) -> Result<(), ProfileError> {
        let response = self
            .client
            .post_form(
                "/api/qualityprofiles/activate_rules",
                &[
                    ("activation", "true"),
                    ("languages", languages),
                    ("targetKey", profile_key),
                    ("statuses", statuses),
                ],
            )
            .await?;
        SonarClient::handle_response(response, "activate profile rules").await?;

        debug!("Activated {statuses} rules for profile {profile_key}");
        Ok(())
    }

    /// Bulk-deactivate rules on a profile, filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn deactivate_rules(
        &self,
        profile_key: &str,
        statuses: &str,
    ) -> Result<(), ProfileError> {
        let response = self
            .client
            .post_form(
                "/api/qualityprofiles/deactivate_rules",
                &[("targetKey", profile_key), ("statuses", statuses)],
            )
            .await?;
        SonarClient::handle_response(response, "deactivate profile rules").await?;

        debug!("Deactivated {statuses} rules for profile {profile_key}");
        Ok(())
    }

    /// Set a profile as the default for a language.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn set_default(
        &self,
        profile_name: &str,
        language: &str,
    ) -> Result<(), ProfileError> {
        let response = self
            .client
            .post_form(
                "/api/qualityprofiles/set_default",
                &[("qualityProfile", profile_name), ("language", language)],
            )
            .await?;
        SonarClient::handle_response(response, "set default profile").await?;

        debug!("Profile {profile_name} is now the default for {language}");
        Ok(())
    }

    /// Restore a profile from a backup XML document.
    ///
    /// The server creates or overwrites the profile named inside the
    /// backup and reports how many rules were restored.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn restore(&self, backup_xml: String) -> Result<RestoreSummary, ProfileError> {
        let part = multipart::Part::text(backup_xml).file_name("backup.xml");
        let form = multipart::Form::new().part("backup", part);

        let response = self
            .client
            .post_multipart("/api/qualityprofiles/restore", form)
            .await?;
        let response = SonarClient::handle_response(response, "restore quality profile").await?;

        let summary: RestoreSummary = response.json().await?;
        if let Some(profile) = &summary.profile {
            debug!(
                "Restored profile {} ({} rules, {} failures)",
                profile.name,
                summary.rule_successes.unwrap_or(0),
                summary.rule_failures.unwrap_or(0)
            );
        }
        Ok(summary)
    }
}

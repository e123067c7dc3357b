//! Provisioning configuration resolved from the process environment.
//!
//! Every setting has a documented default, applied at construction. The
//! environment lookup is injectable so unit tests never mutate the process
//! environment.

use std::path::PathBuf;
use std::time::Duration;

use sonarqube_platform::SonarConfig;

use crate::cli::Args;
use crate::plugins::PLUGIN_URLS;

/// Environment variables the orchestrator honors, with their defaults.
pub const ENV_SONAR_HOST: &str = "SONAR_HOST";
pub const ENV_SONAR_PORT: &str = "SONAR_PORT";
pub const ENV_SONAR_ADMIN: &str = "SONAR_ADMIN";
pub const ENV_SONAR_PASSWORD: &str = "SONAR_PASSWORD";
pub const ENV_AUTO_USER: &str = "AUTO_USER";
pub const ENV_AUTO_USER_PASSWORD: &str = "AUTO_USER_PASSWORD";

pub const DEFAULT_HOST: &str = "sonar";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_ADMIN: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
pub const DEFAULT_AUTO_USER: &str = "jenkins";
pub const DEFAULT_AUTO_USER_PASSWORD: &str = "jenkins";

/// File the Jenkins SonarQube plugin keeps its global configuration in.
pub const JENKINS_CONFIG_FILE: &str = "hudson.plugins.sonar.SonarGlobalConfiguration.xml";

/// Quality profile and language the bootstrap configures.
pub const PROFILE_NAME: &str = "Sonar way ext";
pub const PROFILE_LANGUAGE: &str = "java";

/// Group the service account is placed in.
pub const GROUP_NAME: &str = "non-interactive-users";

/// Name of the API token issued to the service account.
pub const TOKEN_NAME: &str = "Jenkins";

/// Delay between readiness probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Custom error types for configuration resolution
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid SONAR_PORT value '{value}': {message}")]
    InvalidPort { value: String, message: String },
}

/// Fully resolved settings for one provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub host: String,
    pub port: u16,
    pub admin_username: String,
    pub admin_password: String,
    pub auto_user: String,
    pub auto_user_password: String,
    pub debug: bool,
    pub plugin_urls: Vec<String>,
    pub plugin_dir: PathBuf,
    pub jenkins_config: PathBuf,
    pub profile_name: String,
    pub profile_language: String,
    pub profile_backup: Option<PathBuf>,
    pub group_name: String,
    pub token_name: String,
    pub poll_interval: Duration,
}

impl ProvisionConfig {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPort` when `SONAR_PORT` is set but not
    /// a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary lookup function.
    ///
    /// Unset variables fall back to their documented defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPort` when the port value does not
    /// parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(ENV_SONAR_PORT) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidPort {
                    value,
                    message: e.to_string(),
                })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: lookup(ENV_SONAR_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            admin_username: lookup(ENV_SONAR_ADMIN).unwrap_or_else(|| DEFAULT_ADMIN.to_string()),
            admin_password: lookup(ENV_SONAR_PASSWORD)
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            auto_user: lookup(ENV_AUTO_USER).unwrap_or_else(|| DEFAULT_AUTO_USER.to_string()),
            auto_user_password: lookup(ENV_AUTO_USER_PASSWORD)
                .unwrap_or_else(|| DEFAULT_AUTO_USER_PASSWORD.to_string()),
            debug: false,
            plugin_urls: PLUGIN_URLS.iter().map(|url| url.to_string()).collect(),
            plugin_dir: PathBuf::from("/opt/data/sonar"),
            jenkins_config: PathBuf::from("/opt/data/jenkins").join(JENKINS_CONFIG_FILE),
            profile_name: PROFILE_NAME.to_string(),
            profile_language: PROFILE_LANGUAGE.to_string(),
            profile_backup: None,
            group_name: GROUP_NAME.to_string(),
            token_name: TOKEN_NAME.to_string(),
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Apply command-line overrides on top of the environment-resolved
    /// settings.
    #[must_use]
    pub fn with_args(mut self, args: &Args) -> Self {
        self.debug = args.debug;
        self.plugin_dir = args.plugin_dir.clone();
        self.jenkins_config = args.jenkins_dir.join(JENKINS_CONFIG_FILE);
        self.profile_backup = args.profile_backup.clone();
        self
    }

    /// Client configuration for the admin credentials.
    #[must_use]
    pub fn sonar_config(&self) -> SonarConfig {
        SonarConfig::new(
            self.host.clone(),
            self.port,
            self.admin_username.clone(),
            self.admin_password.clone(),
        )
        .with_debug(self.debug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults_apply_when_environment_is_empty() {
        let config = ProvisionConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.host, "sonar");
        assert_eq!(config.port, 9000);
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.admin_password, "admin");
        assert_eq!(config.auto_user, "jenkins");
        assert_eq!(config.auto_user_password, "jenkins");
        assert_eq!(config.plugin_urls.len(), 3);
        assert_eq!(
            config.jenkins_config,
            PathBuf::from("/opt/data/jenkins/hudson.plugins.sonar.SonarGlobalConfiguration.xml")
        );
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let vars = [
            ("SONAR_HOST", "sonar.internal"),
            ("SONAR_PORT", "9123"),
            ("SONAR_ADMIN", "root"),
            ("SONAR_PASSWORD", "hunter2"),
            ("AUTO_USER", "ci-bot"),
            ("AUTO_USER_PASSWORD", "ci-secret"),
        ];
        let config = ProvisionConfig::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.host, "sonar.internal");
        assert_eq!(config.port, 9123);
        assert_eq!(config.admin_username, "root");
        assert_eq!(config.admin_password, "hunter2");
        assert_eq!(config.auto_user, "ci-bot");
        assert_eq!(config.auto_user_password, "ci-secret");
    }

    #[test]
    fn test_invalid_port_is_a_config_error() {
        let vars = [("SONAR_PORT", "ninethousand")];
        let result = ProvisionConfig::from_lookup(lookup_from(&vars));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidPort { ref value, .. }) if value == "ninethousand"
        ));
    }

    #[test]
    fn test_sonar_config_carries_admin_credentials() {
        let config = ProvisionConfig::from_lookup(|_| None).unwrap();
        let sonar = config.sonar_config();

        assert_eq!(sonar.host, "sonar");
        assert_eq!(sonar.port, 9000);
        assert_eq!(sonar.username, "admin");
        assert_eq!(sonar.base_url(), "http://sonar:9000");
    }
}

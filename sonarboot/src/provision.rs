//! The provisioning sequence.
//!
//! Runs the fixed setup steps exactly once per invocation: plugin
//! downloads, server restart, readiness wait, quality profile
//! configuration, service account with scan permission, token issuance,
//! and the Jenkins configuration rewrite. Each step depends on the
//! previous one succeeding; the only retry loop is the readiness wait.
//!
//! A fresh client is opened per logical phase instead of carrying one
//! connection across the server restart.

use log::{error, info};
use std::fmt::Display;

use sonarqube_platform::SonarClient;

use crate::config::ProvisionConfig;
use crate::{jenkins, plugins, readiness};

/// Rule statuses bulk-activated on the target profile.
const ACTIVATE_STATUSES: &str = "READY";
/// Rule statuses bulk-deactivated afterwards.
const DEACTIVATE_STATUSES: &str = "DEPRECATED";

fn fatal(err: impl Display) -> i32 {
    error!("❌ {err}");
    1
}

fn open_client(config: &ProvisionConfig) -> Result<SonarClient, i32> {
    SonarClient::new(config.sonar_config()).map_err(fatal)
}

/// Run the full provisioning sequence.
///
/// Returns `Ok(())` for success and for the benign early exits (token
/// already issued, Jenkins not installed); `Err(exit_code)` for fatal
/// failures, with the cause already logged.
pub async fn execute_provisioning(config: &ProvisionConfig) -> Result<(), i32> {
    plugins::download_plugins(&config.plugin_urls, &config.plugin_dir)
        .await
        .map_err(fatal)?;

    // Restart picks up the freshly downloaded plugins. The client is
    // dropped immediately; the server kills connections on the way down.
    {
        let client = open_client(config)?;
        client.system_api().restart().await.map_err(fatal)?;
    }

    readiness::wait_until_up(
        || {
            let sonar_config = config.sonar_config();
            async move {
                let client = SonarClient::new(sonar_config)?;
                client.system_api().status().await
            }
        },
        || tokio::time::sleep(config.poll_interval),
    )
    .await;

    // Profile phase: resolve, set default, activate rules.
    let profile_key = {
        let client = open_client(config)?;
        let profiles = client.profile_api();

        if let Some(backup) = &config.profile_backup {
            if backup.is_file() {
                let backup_xml = tokio::fs::read_to_string(backup).await.map_err(fatal)?;
                profiles.restore(backup_xml).await.map_err(fatal)?;
            } else {
                info!(
                    "Profile backup {} not found, skipping restore",
                    backup.display()
                );
            }
        }

        let key = profiles
            .get_profile_id(&config.profile_name)
            .await
            .map_err(fatal)?;
        profiles
            .set_default(&config.profile_name, &config.profile_language)
            .await
            .map_err(fatal)?;
        profiles
            .activate_rules(&key, &config.profile_language, ACTIVATE_STATUSES)
            .await
            .map_err(fatal)?;
        key
    };

    // Account phase, on a fresh client.
    let token = {
        let client = open_client(config)?;
        client
            .profile_api()
            .deactivate_rules(&profile_key, DEACTIVATE_STATUSES)
            .await
            .map_err(fatal)?;

        let identity = client.identity_api();
        identity
            .create_user(
                &config.auto_user,
                &config.auto_user,
                &config.auto_user_password,
            )
            .await
            .map_err(fatal)?;
        identity
            .create_group(&config.group_name)
            .await
            .map_err(fatal)?;
        identity
            .add_user_to_group(&config.auto_user, &config.group_name)
            .await
            .map_err(fatal)?;

        if let Err(e) = identity.add_permission(&config.auto_user, "scan").await {
            error!(
                "❌ Can't add permission scan for user {}: {e}",
                config.auto_user
            );
            return Err(1);
        }

        identity
            .generate_token(&config.auto_user, &config.token_name)
            .await
            .map_err(fatal)?
    };

    let Some(token) = token else {
        info!(
            "Token {} for user {} already exists, nothing to update",
            config.token_name, config.auto_user
        );
        return Ok(());
    };

    jenkins::update_server_token(&config.jenkins_config, &token).map_err(fatal)?;

    info!("✅ Sonar provisioning complete");
    Ok(())
}

pub mod cli;
pub mod config;
pub mod jenkins;
pub mod plugins;
pub mod provision;
pub mod readiness;

pub use cli::Args;
pub use config::{ConfigError, ProvisionConfig};
pub use jenkins::{JenkinsError, TOKEN_TAG, update_server_token};
pub use plugins::{PLUGIN_URLS, PluginError, download_plugins};
pub use provision::execute_provisioning;
pub use readiness::wait_until_up;

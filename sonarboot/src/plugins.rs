//! Analyzer plugin downloads.
//!
//! The bootstrap drops a fixed set of analyzer plugin archives into the
//! server's plugin directory before triggering the restart that loads them.
//! Existing files are overwritten unconditionally; there is no checksum
//! verification.

use log::info;
use std::path::{Path, PathBuf};

/// Analyzer plugin archives the bootstrap installs.
pub const PLUGIN_URLS: &[&str] = &[
    "https://github.com/spotbugs/sonar-findbugs/releases/download/3.6.0/sonar-findbugs-plugin-3.6.0.jar",
    "https://github.com/SonarQubeCommunity/sonar-pmd/releases/download/2.6/sonar-pmd-plugin-2.6.jar",
    "https://github.com/checkstyle/sonar-checkstyle/releases/download/3.7/checkstyle-sonar-plugin-3.7.jar",
];

/// Custom error types for plugin downloads
#[derive(thiserror::Error, Debug)]
pub enum PluginError {
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin URL has no file name: {0}")]
    BadUrl(String),
}

/// Download every plugin archive into `plugin_dir`.
///
/// The target file name is the last path segment of each URL. Any failure
/// is fatal to the provisioning run.
///
/// # Errors
///
/// Returns an error when a download fails, a URL carries no file name, or
/// the archive cannot be written.
pub async fn download_plugins(urls: &[String], plugin_dir: &Path) -> Result<(), PluginError> {
    tokio::fs::create_dir_all(plugin_dir)
        .await
        .map_err(|source| PluginError::Io {
            path: plugin_dir.to_path_buf(),
            source,
        })?;

    let client = reqwest::Client::new();

    for url in urls {
        let file_name = plugin_file_name(url)?;
        let target = plugin_dir.join(file_name);

        let response = client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| PluginError::Download {
                url: url.clone(),
                source,
            })?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| PluginError::Download {
                url: url.clone(),
                source,
            })?;

        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|source| PluginError::Io {
                path: target.clone(),
                source,
            })?;

        info!("Downloaded {file_name} ({} bytes)", bytes.len());
    }

    Ok(())
}

/// Last path segment of a plugin URL.
fn plugin_file_name(url: &str) -> Result<&str, PluginError> {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| PluginError::BadUrl(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_file_names() {
        let names: Vec<&str> = PLUGIN_URLS
            .iter()
            .map(|url| plugin_file_name(url).unwrap())
            .collect();

        assert_eq!(
            names,
            [
                "sonar-findbugs-plugin-3.6.0.jar",
                "sonar-pmd-plugin-2.6.jar",
                "checkstyle-sonar-plugin-3.7.jar"
            ]
        );
    }

    #[test]
    fn test_url_without_file_name_is_rejected() {
        assert!(matches!(
            plugin_file_name("https://example.com/downloads/"),
            Err(PluginError::BadUrl(_))
        ));
    }
}

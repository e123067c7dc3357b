//! Jenkins SonarQube plugin configuration rewrite.
//!
//! The Jenkins side of the integration stores the server authentication
//! token inside `hudson.plugins.sonar.SonarGlobalConfiguration.xml`. After
//! a new token is issued, the text of the first
//! `serverAuthenticationToken` element is replaced in place; the rest of
//! the document passes through untouched.

use log::info;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesText, Event};
use std::path::{Path, PathBuf};

/// Element holding the token inside the Jenkins configuration.
pub const TOKEN_TAG: &str = "serverAuthenticationToken";

/// Custom error types for the configuration rewrite
#[derive(thiserror::Error, Debug)]
pub enum JenkinsError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rewrite {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("No <serverAuthenticationToken> element in {path}")]
    MissingElement { path: PathBuf },
}

/// Replace the stored token in the Jenkins configuration file.
///
/// Returns `Ok(false)` when the file does not exist - the Jenkins side is
/// simply not installed, which is a benign outcome for the bootstrap, not
/// an error. Returns `Ok(true)` after a successful in-place rewrite.
///
/// # Errors
///
/// Returns an error when the file cannot be read or written, is not
/// well-formed XML, or carries no token element.
pub fn update_server_token(path: &Path, token: &str) -> Result<bool, JenkinsError> {
    if !path.is_file() {
        info!(
            "There is no file {} for configuration, please make sure that the Sonar plugin is installed in Jenkins",
            path.display()
        );
        return Ok(false);
    }

    let xml = std::fs::read_to_string(path).map_err(|source| JenkinsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let updated = replace_token_text(&xml, token).map_err(|e| match e {
        RewriteError::Malformed(message) => JenkinsError::Xml {
            path: path.to_path_buf(),
            message,
        },
        RewriteError::MissingElement => JenkinsError::MissingElement {
            path: path.to_path_buf(),
        },
    })?;

    std::fs::write(path, updated).map_err(|source| JenkinsError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Injected the issued API token into {}", path.display());
    Ok(true)
}

#[derive(Debug)]
enum RewriteError {
    Malformed(String),
    MissingElement,
}

/// Replace the text of the first token element, passing everything else
/// through verbatim.
fn replace_token_text(xml: &str, token: &str) -> Result<String, RewriteError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();

    let mut in_target = false;
    let mut replaced = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if !replaced && e.name().as_ref() == TOKEN_TAG.as_bytes() => {
                in_target = true;
                writer
                    .write_event(Event::Start(e))
                    .map_err(|e| RewriteError::Malformed(e.to_string()))?;
                writer
                    .write_event(Event::Text(BytesText::new(token)))
                    .map_err(|e| RewriteError::Malformed(e.to_string()))?;
            }
            Ok(Event::End(e)) if in_target && e.name().as_ref() == TOKEN_TAG.as_bytes() => {
                in_target = false;
                replaced = true;
                writer
                    .write_event(Event::End(e))
                    .map_err(|e| RewriteError::Malformed(e.to_string()))?;
            }
            // A self-closed element is expanded so the token has a text node
            Ok(Event::Empty(e)) if !replaced && e.name().as_ref() == TOKEN_TAG.as_bytes() => {
                replaced = true;
                writer
                    .write_event(Event::Start(e))
                    .map_err(|e| RewriteError::Malformed(e.to_string()))?;
                writer
                    .write_event(Event::Text(BytesText::new(token)))
                    .map_err(|e| RewriteError::Malformed(e.to_string()))?;
                writer
                    .write_event(Event::End(BytesEnd::new(TOKEN_TAG)))
                    .map_err(|e| RewriteError::Malformed(e.to_string()))?;
            }
            // The replacement text was already written on the start tag
            Ok(Event::Text(_) | Event::CData(_)) if in_target => {}
            Ok(Event::Eof) => break,
            Ok(event) => {
                writer
                    .write_event(event)
                    .map_err(|e| RewriteError::Malformed(e.to_string()))?;
            }
            Err(e) => return Err(RewriteError::Malformed(e.to_string())),
        }
        buf.clear();
    }

    if !replaced {
        return Err(RewriteError::MissingElement);
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| RewriteError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hudson.plugins.sonar.SonarGlobalConfiguration>
  <installations>
    <hudson.plugins.sonar.SonarInstallation>
      <name>sonar</name>
      <serverUrl>http://sonar:9000</serverUrl>
      <serverAuthenticationToken>PLACEHOLDER</serverAuthenticationToken>
    </hudson.plugins.sonar.SonarInstallation>
  </installations>
</hudson.plugins.sonar.SonarGlobalConfiguration>"#;

    #[test]
    fn test_replaces_placeholder_text() {
        let updated = replace_token_text(SAMPLE, "squ_new_token").unwrap();

        assert!(updated.contains("<serverAuthenticationToken>squ_new_token</serverAuthenticationToken>"));
        assert!(!updated.contains("PLACEHOLDER"));
        // The surrounding document is untouched
        assert!(updated.contains("<serverUrl>http://sonar:9000</serverUrl>"));
    }

    #[test]
    fn test_replaces_only_the_first_element() {
        let xml = "<config>\
                   <serverAuthenticationToken>one</serverAuthenticationToken>\
                   <serverAuthenticationToken>two</serverAuthenticationToken>\
                   </config>";
        let updated = replace_token_text(xml, "squ_new").unwrap();

        assert!(updated.contains("<serverAuthenticationToken>squ_new</serverAuthenticationToken>"));
        assert!(updated.contains("<serverAuthenticationToken>two</serverAuthenticationToken>"));
        assert!(!updated.contains(">one<"));
    }

    #[test]
    fn test_fills_an_empty_element() {
        let xml = "<config><serverAuthenticationToken></serverAuthenticationToken></config>";
        let updated = replace_token_text(xml, "squ_new").unwrap();

        assert!(updated.contains("<serverAuthenticationToken>squ_new</serverAuthenticationToken>"));
    }

    #[test]
    fn test_expands_a_self_closed_element() {
        let xml = "<config><serverAuthenticationToken/></config>";
        let updated = replace_token_text(xml, "squ_new").unwrap();

        assert!(updated.contains("<serverAuthenticationToken>squ_new</serverAuthenticationToken>"));
    }

    #[test]
    fn test_document_without_token_element_is_an_error() {
        let xml = "<config><name>sonar</name></config>";
        assert!(matches!(
            replace_token_text(xml, "squ_new"),
            Err(RewriteError::MissingElement)
        ));
    }

    #[test]
    fn test_missing_file_is_a_benign_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hudson.plugins.sonar.SonarGlobalConfiguration.xml");

        let updated = update_server_token(&path, "squ_new").unwrap();
        assert!(!updated);
        assert!(!path.exists());
    }

    #[test]
    fn test_rewrites_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hudson.plugins.sonar.SonarGlobalConfiguration.xml");
        std::fs::write(&path, SAMPLE).unwrap();

        let updated = update_server_token(&path, "squ_e2e_token").unwrap();
        assert!(updated);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(
            "<serverAuthenticationToken>squ_e2e_token</serverAuthenticationToken>"
        ));
        assert!(!contents.contains("PLACEHOLDER"));
    }
}

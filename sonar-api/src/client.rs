//! Core SonarQube API client implementation.
//!
//! This module contains the foundational client for making authenticated
//! requests to the SonarQube Web API: Basic auth on every call,
//! form-urlencoded POST bodies, JSON responses.

use log::debug;
use reqwest::{Client, multipart};
use std::time::Duration;

use crate::{SonarConfig, SonarError};

/// Core SonarQube API client.
///
/// Wraps a pooled `reqwest::Client` bound to one server and one set of
/// credentials. Cheap to construct; the orchestrator builds a fresh instance
/// per provisioning phase instead of keeping one connection alive across the
/// server restart.
#[derive(Clone)]
pub struct SonarClient {
    config: SonarConfig,
    base_url: String,
    client: Client,
}

impl SonarClient {
    /// Create a new SonarQube API client.
    ///
    /// # Errors
    ///
    /// Returns `SonarError::InvalidConfig` if the host, username, or
    /// password is empty, or if the underlying HTTP client cannot be built.
    pub fn new(config: SonarConfig) -> Result<Self, SonarError> {
        if config.host.is_empty() {
            return Err(SonarError::InvalidConfig("host must not be empty".into()));
        }
        if config.username.is_empty() || config.password.is_empty() {
            return Err(SonarError::InvalidConfig(
                "username and password must not be empty".into(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(SonarError::Http)?;

        let base_url = config.base_url();
        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Get the base URL for API requests.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get access to the configuration.
    #[must_use]
    pub fn config(&self) -> &SonarConfig {
        &self.config
    }

    /// Build URL with query parameters - centralized helper
    fn build_url_with_params(&self, endpoint: &str, query_params: &[(&str, &str)]) -> String {
        let mut url = String::with_capacity(
            self.base_url
                .len()
                .saturating_add(endpoint.len())
                .saturating_add(query_params.len().saturating_mul(32)),
        );
        url.push_str(&self.base_url);
        url.push_str(endpoint);

        if !query_params.is_empty() {
            url.push('?');
            for (i, (key, value)) in query_params.iter().enumerate() {
                if i > 0 {
                    url.push('&');
                }
                url.push_str(&urlencoding::encode(key));
                url.push('=');
                url.push_str(&urlencoding::encode(value));
            }
        }

        url
    }

    /// Make a GET request to the specified endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - The API endpoint path (e.g., "/api/users/search")
    /// * `query_params` - Query parameters as key-value pairs
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<reqwest::Response, SonarError> {
        let url = self.build_url_with_params(endpoint, query_params);

        if self.config.debug {
            debug!("GET {url}");
        }

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        Ok(response)
    }

    /// Make a POST request with a form-urlencoded body.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - The API endpoint path (e.g., "/api/users/create")
    /// * `params` - Form parameters as key-value pairs
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, SonarError> {
        let mut url =
            String::with_capacity(self.base_url.len().saturating_add(endpoint.len()));
        url.push_str(&self.base_url);
        url.push_str(endpoint);

        if self.config.debug {
            debug!("POST {url}");
        }

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .form(params)
            .send()
            .await?;

        Ok(response)
    }

    /// Make a POST request with a multipart form body.
    ///
    /// Used by the quality profile restore endpoint, which takes a backup
    /// XML document as a file part.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn post_multipart(
        &self,
        endpoint: &str,
        form: multipart::Form,
    ) -> Result<reqwest::Response, SonarError> {
        let mut url =
            String::with_capacity(self.base_url.len().saturating_add(endpoint.len()));
        url.push_str(&self.base_url);
        url.push_str(endpoint);

        if self.config.debug {
            debug!("POST {url} (multipart)");
        }

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .multipart(form)
            .send()
            .await?;

        Ok(response)
    }

    /// Helper method to handle common response processing.
    ///
    /// Checks if the response is successful and returns an error carrying
    /// the URL, status, and body text if not.
    ///
    /// # Errors
    ///
    /// Returns `SonarError::InvalidResponse` for non-2xx responses.
    pub async fn handle_response(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, SonarError> {
        if !response.status().is_success() {
            let status = response.status();
            let url = response.url().clone();
            let error_text = response.text().await?;
            return Err(SonarError::InvalidResponse(format!(
                "Failed to {context}\n  URL: {url}\n  HTTP {status}: {error_text}"
            )));
        }
        Ok(response)
    }
}

//! Identity API functionality for managing users, groups, tokens, and
//! permissions.
//!
//! The creation operations here are idempotent the way a provisioning run
//! needs them to be: an entity that already exists is a logged no-op, never
//! an error.

use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{SonarClient, SonarError};

/// Represents a SonarQube user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Login the user authenticates with
    pub login: String,
    /// Display name
    pub name: Option<String>,
    /// Whether the account is active
    pub active: Option<bool>,
}

/// Represents a user group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group name
    pub name: String,
    /// Number of members
    #[serde(rename = "membersCount")]
    pub members_count: Option<u32>,
}

/// Represents an issued user token (the secret itself is only returned at
/// generation time)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserToken {
    /// Token name, unique per user
    pub name: String,
    /// Creation timestamp as reported by the server
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Response wrapper for `/api/users/search`
#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    /// Matching users
    pub users: Vec<User>,
}

/// Response wrapper for `/api/user_groups/search`
#[derive(Debug, Clone, Deserialize)]
pub struct GroupsResponse {
    /// Matching groups
    pub groups: Vec<Group>,
}

/// Response wrapper for `/api/user_tokens/search`
#[derive(Debug, Clone, Deserialize)]
pub struct UserTokensResponse {
    /// Tokens issued to the queried login
    #[serde(rename = "userTokens")]
    pub user_tokens: Vec<UserToken>,
}

/// Response wrapper for `/api/user_tokens/generate`
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedToken {
    /// The issued token secret
    pub token: String,
}

/// Global permissions a user can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Admin,
    Codeviewer,
    Issueadmin,
    Scan,
    User,
}

impl Permission {
    /// All permissions the server accepts.
    pub const ALL: &'static [Permission] = &[
        Permission::Admin,
        Permission::Codeviewer,
        Permission::Issueadmin,
        Permission::Scan,
        Permission::User,
    ];

    /// The wire name of this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Admin => "admin",
            Permission::Codeviewer => "codeviewer",
            Permission::Issueadmin => "issueadmin",
            Permission::Scan => "scan",
            Permission::User => "user",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Permission::Admin),
            "codeviewer" => Ok(Permission::Codeviewer),
            "issueadmin" => Ok(Permission::Issueadmin),
            "scan" => Ok(Permission::Scan),
            "user" => Ok(Permission::User),
            other => Err(IdentityError::InvalidPermission(other.to_string())),
        }
    }
}

/// Identity-specific error types
#[derive(Debug)]
pub enum IdentityError {
    /// General API error
    Api(SonarError),
    /// Permission value outside the accepted enumeration
    InvalidPermission(String),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::Api(err) => write!(f, "API error: {err}"),
            IdentityError::InvalidPermission(value) => write!(
                f,
                "Permission '{value}' is not allowed, possible values are \
                 admin, codeviewer, issueadmin, scan, user"
            ),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<SonarError> for IdentityError {
    fn from(err: SonarError) -> Self {
        IdentityError::Api(err)
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        IdentityError::Api(SonarError::Http(err))
    }
}

impl From<serde_json::Error> for IdentityError {
    fn from(err: serde_json::Error) -> Self {
        IdentityError::Api(SonarError::Serialization(err))
    }
}

/// Identity API operations
pub struct IdentityApi<'a> {
    client: &'a SonarClient,
}

impl<'a> IdentityApi<'a> {
    /// Create a new `IdentityApi` instance
    #[must_use]
    pub fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Check whether a user with exactly this login exists.
    ///
    /// The search endpoint matches fuzzily, so the result set is filtered
    /// for an exact login match.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn user_exists(&self, login: &str) -> Result<bool, IdentityError> {
        let response = self
            .client
            .get("/api/users/search", &[("login", login)])
            .await?;
        let response = SonarClient::handle_response(response, "search users").await?;

        let users: UsersResponse = response.json().await?;
        Ok(users.users.iter().any(|u| u.login == login))
    }

    /// Create a user unless one with this login already exists.
    ///
    /// # Arguments
    ///
    /// * `login` - Login for the new account
    /// * `name` - Display name
    /// * `password` - Initial password
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. An existing user is a
    /// logged no-op, not an error.
    pub async fn create_user(
        &self,
        login: &str,
        name: &str,
        password: &str,
    ) -> Result<(), IdentityError> {
        if self.user_exists(login).await? {
            debug!("User {login} already exists");
            return Ok(());
        }

        let response = self
            .client
            .post_form(
                "/api/users/create",
                &[("login", login), ("name", name), ("password", password)],
            )
            .await?;
        SonarClient::handle_response(response, "create user").await?;

        debug!("User {login} has been created");
        Ok(())
    }

    /// Check whether a token with this name exists for the login.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn token_exists(
        &self,
        login: &str,
        token_name: &str,
    ) -> Result<bool, IdentityError> {
        let response = self
            .client
            .get("/api/user_tokens/search", &[("login", login)])
            .await?;
        let response = SonarClient::handle_response(response, "search user tokens").await?;

        let tokens: UserTokensResponse = response.json().await?;
        Ok(tokens.user_tokens.iter().any(|t| t.name == token_name))
    }

    /// Generate a token for the login unless one with this name exists.
    ///
    /// Returns the newly issued secret, or `None` when a token with this
    /// name already existed - the server never re-discloses an issued
    /// secret, so the caller must treat `None` as "no new token" rather
    /// than failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn generate_token(
        &self,
        login: &str,
        token_name: &str,
    ) -> Result<Option<String>, IdentityError> {
        if self.token_exists(login, token_name).await? {
            debug!("Token {token_name} for login {login} already exists");
            return Ok(None);
        }

        let response = self
            .client
            .post_form(
                "/api/user_tokens/generate",
                &[("login", login), ("name", token_name)],
            )
            .await?;
        let response = SonarClient::handle_response(response, "generate token").await?;

        let generated: GeneratedToken = response.json().await?;
        debug!("Token {token_name} for login {login} has been created");
        Ok(Some(generated.token))
    }

    /// Check whether a group matching this name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn group_exists(&self, name: &str) -> Result<bool, IdentityError> {
        let response = self
            .client
            .get("/api/user_groups/search", &[("q", name), ("f", "name")])
            .await?;
        let response = SonarClient::handle_response(response, "search groups").await?;

        let groups: GroupsResponse = response.json().await?;
        Ok(!groups.groups.is_empty())
    }

    /// Create a group unless one matching this name already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. An existing group is a
    /// logged no-op, not an error.
    pub async fn create_group(&self, name: &str) -> Result<(), IdentityError> {
        if self.group_exists(name).await? {
            debug!("Group {name} already exists");
            return Ok(());
        }

        let response = self
            .client
            .post_form("/api/user_groups/create", &[("name", name)])
            .await?;
        SonarClient::handle_response(response, "create group").await?;

        debug!("Group {name} has been created");
        Ok(())
    }

    /// Add a user to a group.
    ///
    /// There is no existence guard; the server treats repeated membership
    /// as a conflict, which is swallowed here so the call stays a safe
    /// no-op on re-runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any other reason.
    pub async fn add_user_to_group(&self, login: &str, group: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post_form(
                "/api/user_groups/add_user",
                &[("name", group), ("login", login)],
            )
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            if error_text.contains("already") {
                debug!("User {login} is already a member of {group}");
                return Ok(());
            }
            return Err(IdentityError::Api(SonarError::InvalidResponse(format!(
                "Failed to add user to group\n  HTTP {status}: {error_text}"
            ))));
        }

        debug!("User {login} has been added to group {group}");
        Ok(())
    }

    /// Grant a global permission to a user.
    ///
    /// The permission name is validated against the accepted enumeration
    /// before any network I/O; an invalid value fails without contacting
    /// the server.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidPermission` for values outside the
    /// enumeration, or an API error if the grant request fails.
    pub async fn add_permission(&self, login: &str, permission: &str) -> Result<(), IdentityError> {
        let permission: Permission = permission.parse()?;

        let response = self
            .client
            .post_form(
                "/api/permissions/add_user",
                &[("login", login), ("permission", permission.as_str())],
            )
            .await?;
        SonarClient::handle_response(response, "add permission").await?;

        debug!("Permission {permission} for user {login} has been granted");
        Ok(())
    }
}

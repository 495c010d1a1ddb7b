//! # Core Configuration Module
//!
//! Provides configuration management for the OneTap Drive core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an `AppConfig`
//! holding the settings of every component:
//!
//! - [`DriveSettings`] - Drive endpoints, the single document name and its container
//! - [`OAuthSettings`] - OAuth 2.0 client registration and consent timeout
//! - [`SessionSettings`] - Channel sizes of the session actor and event bus
//!
//! `build()` validates everything up front and fails fast with an actionable
//! message instead of letting a bad endpoint surface as a runtime transport
//! error.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .client_id("1234.apps.googleusercontent.com")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.drive.document_name, "config.txt");
//! assert_eq!(config.drive.container, "appDataFolder");
//! ```
//!
//! ## Environment
//!
//! [`AppConfig::from_env`] reads:
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `GOOGLE_CLIENT_ID` | `oauth.client_id` (required) |
//! | `GOOGLE_CLIENT_SECRET` | `oauth.client_secret` |
//! | `ONETAP_REDIRECT_URI` | `oauth.redirect_uri` |
//! | `ONETAP_DRIVE_API_BASE` | `drive.api_base` |
//! | `ONETAP_DRIVE_UPLOAD_BASE` | `drive.upload_base` |
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::AppConfig;
//!
//! // Missing OAuth client id
//! let config = AppConfig::builder()
//!     .build()
//!     .expect("Should fail - missing client id");
//! ```

use crate::error::{Error, Result};
use std::time::Duration;
use url::Url;

/// Application name reported to Google APIs.
pub const DEFAULT_APPLICATION_NAME: &str = "OneTapDrive";

/// Name of the single managed document.
pub const DEFAULT_DOCUMENT_NAME: &str = "config.txt";

/// Drive space that is private to the signed-in application.
pub const APP_DATA_CONTAINER: &str = "appDataFolder";

/// OAuth scope granting access to the application data folder only.
pub const DRIVE_APPDATA_SCOPE: &str = "https://www.googleapis.com/auth/drive.appdata";

const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";

/// Top-level configuration for the OneTap Drive core.
///
/// Use [`AppConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Name reported in the user agent
    pub application_name: String,

    /// Remote storage settings
    pub drive: DriveSettings,

    /// Identity settings
    pub oauth: OAuthSettings,

    /// Session actor settings
    pub session: SessionSettings,
}

/// Google Drive settings for the single-document adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSettings {
    /// Drive v3 metadata endpoint base
    pub api_base: String,

    /// Drive v3 media upload endpoint base
    pub upload_base: String,

    /// Fixed document name (default `config.txt`)
    pub document_name: String,

    /// Private container space (always `appDataFolder` in production)
    pub container: String,

    /// Page size used while scanning the container
    pub page_size: u32,

    /// Per-request timeout handed to the HTTP client
    pub request_timeout: Duration,

    /// Report a transport failure during `get` as "no document".
    ///
    /// Off by default: a dropped connection is surfaced as an error instead of
    /// being confused with an empty container.
    pub absent_on_transport_error: bool,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            upload_base: DEFAULT_DRIVE_UPLOAD_BASE.to_string(),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            container: APP_DATA_CONTAINER.to_string(),
            page_size: 100,
            request_timeout: Duration::from_secs(30),
            absent_on_transport_error: false,
        }
    }
}

/// OAuth 2.0 client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    /// Upper bound for the interactive consent step plus token exchange
    pub consent_timeout: Duration,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                DRIVE_APPDATA_SCOPE.to_string(),
            ],
            consent_timeout: Duration::from_secs(120),
        }
    }
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .field("consent_timeout", &self.consent_timeout)
            .finish()
    }
}

/// Session actor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Capacity of the command channel into the session actor
    pub command_buffer: usize,

    /// Capacity of the broadcast event bus
    pub event_buffer: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            command_buffer: 32,
            event_buffer: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Builds a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Fails when `GOOGLE_CLIENT_ID` is missing or any value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup("GOOGLE_CLIENT_ID").ok_or_else(|| Error::CapabilityMissing {
            capability: "OAuth client".to_string(),
            message: "GOOGLE_CLIENT_ID is not set. Register an OAuth client with the \
                      drive.appdata scope and export its id."
                .to_string(),
        })?;

        let mut builder = Self::builder().client_id(client_id);

        if let Some(secret) = lookup("GOOGLE_CLIENT_SECRET") {
            builder = builder.client_secret(secret);
        }
        if let Some(redirect_uri) = lookup("ONETAP_REDIRECT_URI") {
            builder = builder.redirect_uri(redirect_uri);
        }
        if let Some(api_base) = lookup("ONETAP_DRIVE_API_BASE") {
            builder = builder.drive_api_base(api_base);
        }
        if let Some(upload_base) = lookup("ONETAP_DRIVE_UPLOAD_BASE") {
            builder = builder.drive_upload_base(upload_base);
        }

        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The OAuth client id is present
    /// - Every endpoint is an absolute `http(s)` URL
    /// - The document name and container are non-empty
    /// - Page size and channel capacities are non-zero
    pub fn validate(&self) -> Result<()> {
        if self.application_name.trim().is_empty() {
            return Err(Error::Config("Application name cannot be empty".to_string()));
        }

        if self.oauth.client_id.trim().is_empty() {
            return Err(Error::CapabilityMissing {
                capability: "OAuth client".to_string(),
                message: "No OAuth client id configured. Set it with \
                          AppConfig::builder().client_id(..) or GOOGLE_CLIENT_ID."
                    .to_string(),
            });
        }

        validate_endpoint("drive.api_base", &self.drive.api_base)?;
        validate_endpoint("drive.upload_base", &self.drive.upload_base)?;
        validate_endpoint("oauth.auth_url", &self.oauth.auth_url)?;
        validate_endpoint("oauth.token_url", &self.oauth.token_url)?;
        validate_endpoint("oauth.redirect_uri", &self.oauth.redirect_uri)?;

        if self.drive.document_name.trim().is_empty() {
            return Err(Error::Config("Document name cannot be empty".to_string()));
        }

        if self.drive.container.trim().is_empty() {
            return Err(Error::Config("Container cannot be empty".to_string()));
        }

        if self.drive.page_size == 0 || self.drive.page_size > 1000 {
            return Err(Error::Config(
                "Drive page size must be between 1 and 1000".to_string(),
            ));
        }

        if self.oauth.scopes.is_empty() {
            return Err(Error::Config("At least one OAuth scope is required".to_string()));
        }

        if self.session.command_buffer == 0 || self.session.event_buffer == 0 {
            return Err(Error::Config(
                "Session channel capacities must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// User agent sent with every HTTP request.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.application_name, env!("CARGO_PKG_VERSION"))
    }
}

fn validate_endpoint(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| Error::Config(format!("{} is not a valid URL ({}): {}", name, value, e)))?;

    match url.scheme() {
        "https" | "http" => Ok(()),
        other => Err(Error::Config(format!(
            "{} must use http or https, got '{}'",
            name, other
        ))),
    }
}

/// Builder for constructing [`AppConfig`] instances.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    application_name: Option<String>,
    drive: DriveSettings,
    oauth: OAuthSettings,
    session: SessionSettings,
}

impl AppConfigBuilder {
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Sets the OAuth client id (required).
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.oauth.client_id = client_id.into();
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.oauth.client_secret = Some(secret.into());
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.oauth.redirect_uri = uri.into();
        self
    }

    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.oauth.scopes = scopes;
        self
    }

    pub fn consent_timeout(mut self, timeout: Duration) -> Self {
        self.oauth.consent_timeout = timeout;
        self
    }

    pub fn drive_api_base(mut self, base: impl Into<String>) -> Self {
        self.drive.api_base = base.into();
        self
    }

    pub fn drive_upload_base(mut self, base: impl Into<String>) -> Self {
        self.drive.upload_base = base.into();
        self
    }

    /// Overrides the document name. Mostly useful for tests against a shared
    /// container.
    pub fn document_name(mut self, name: impl Into<String>) -> Self {
        self.drive.document_name = name.into();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.drive.page_size = page_size;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.drive.request_timeout = timeout;
        self
    }

    /// Restores the legacy behaviour of reading a transport failure as "no document".
    pub fn absent_on_transport_error(mut self, enabled: bool) -> Self {
        self.drive.absent_on_transport_error = enabled;
        self
    }

    pub fn command_buffer(mut self, capacity: usize) -> Self {
        self.session.command_buffer = capacity;
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.session.event_buffer = capacity;
        self
    }

    /// Builds the final `AppConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, see [`AppConfig::validate`].
    pub fn build(self) -> Result<AppConfig> {
        let config = AppConfig {
            application_name: self
                .application_name
                .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string()),
            drive: self.drive,
            oauth: self.oauth,
            session: self.session,
        };

        config.validate()?;
        Ok(config)
    }
}

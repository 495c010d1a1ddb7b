//! Authorization credential handed from the identity capability to the
//! session holder, and from the session holder to the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the signed-in account (usually the account e-mail).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque, time-limited proof of authorization for one account and scope.
///
/// The access token is never printed: `Debug` redacts it.
///
/// # Examples
///
/// ```
/// use bridge_traits::credential::{AccountId, Credential};
/// use chrono::{Duration, Utc};
///
/// let credential = Credential::new(AccountId::new("user@example.com"), "ya29.a0...")
///     .with_scopes(vec!["https://www.googleapis.com/auth/drive.appdata".to_string()])
///     .with_expiry(Utc::now() + Duration::hours(1));
///
/// assert!(!credential.is_expired_at(Utc::now()));
/// assert!(!format!("{:?}", credential).contains("ya29"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    account: AccountId,
    access_token: String,
    scopes: Vec<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(account: AccountId, access_token: impl Into<String>) -> Self {
        Self {
            account,
            access_token: access_token.into(),
            scopes: Vec::new(),
            expires_at: None,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Bearer token for API requests.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the scope list is known and contains `scope`.
    ///
    /// An empty scope list means "unknown" and is treated as granted; the
    /// remote service has the final word.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.is_empty() || self.scopes.iter().any(|s| s == scope)
    }

    /// A credential without a known expiry is never considered expired locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

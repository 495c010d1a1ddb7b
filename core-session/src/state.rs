//! Observable session state
//!
//! The session task publishes a [`SessionSnapshot`] after every transition.
//! The snapshot never contains the credential itself, only the account it
//! belongs to.

use bridge_traits::{AccountId, DocumentError, ErrorKind, IdentityError};
use serde::Serialize;

/// An error as shown to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedError {
    pub message: String,
    pub kind: ErrorKind,
    /// The host should offer to run the consent flow again.
    pub requires_consent: bool,
}

impl From<&DocumentError> for ReportedError {
    fn from(error: &DocumentError) -> Self {
        Self {
            message: error.to_string(),
            kind: error.kind(),
            requires_consent: error.requires_consent(),
        }
    }
}

impl From<&IdentityError> for ReportedError {
    fn from(error: &IdentityError) -> Self {
        Self {
            message: error.to_string(),
            kind: error.kind(),
            requires_consent: error.kind().requires_consent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state")]
pub enum SessionState {
    SignedOut,
    SignedIn { account: AccountId },
    /// The last sign-in attempt failed; no credential is held.
    SignInFailed { error: ReportedError },
}

/// Point-in-time view of the session.
///
/// `document` is `None` both when nothing has been fetched and when the
/// container holds no document; it is always `None` unless signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub fetching: bool,
    pub document: Option<String>,
    pub last_error: Option<ReportedError>,
}

impl SessionSnapshot {
    pub fn signed_out() -> Self {
        Self {
            state: SessionState::SignedOut,
            fetching: false,
            document: None,
            last_error: None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, SessionState::SignedIn { .. })
    }

    pub fn account(&self) -> Option<&AccountId> {
        match &self.state {
            SessionState::SignedIn { account } => Some(account),
            _ => None,
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::signed_out()
    }
}

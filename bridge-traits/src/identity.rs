//! Identity Abstractions
//!
//! The identity capability presents an interactive consent UI and yields a
//! [`Credential`] for the chosen account, or fails/cancels. The core treats it
//! as opaque; `core-auth` ships an OAuth 2.0 implementation and hosts may
//! inject the platform sign-in SDK instead.

use async_trait::async_trait;
use thiserror::Error;

use crate::credential::Credential;
use crate::error::ErrorKind;

/// Sign-in failures reported by an [`IdentityProvider`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The user dismissed the consent screen.
    #[error("Sign-in cancelled by user")]
    CancelledByUser,

    /// The identity service refused to issue a credential.
    #[error("Sign-in denied: {0}")]
    Denied(String),

    /// The identity service could not be reached.
    #[error("Sign-in transport failure: {0}")]
    Transport(String),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::CancelledByUser => ErrorKind::CancelledByUser,
            IdentityError::Denied(_) => ErrorKind::Auth,
            IdentityError::Transport(_) => ErrorKind::Transport,
        }
    }
}

/// Produces a credential for one account and the private-app-storage scope.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::identity::IdentityProvider;
///
/// async fn sign_in(identity: &dyn IdentityProvider) {
///     match identity.authorize().await {
///         Ok(credential) => println!("Signed in as {}", credential.account()),
///         Err(e) => println!("Sign-in failed: {}", e),
///     }
/// }
/// ```
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the (possibly interactive) authorization flow.
    async fn authorize(&self) -> Result<Credential, IdentityError>;
}

/// Parameters delivered to the redirect URI after the user approved consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentCallback {
    pub code: String,
    pub state: String,
}

/// Host capability that shows the consent page and captures its redirect.
///
/// - Desktop: open a browser and listen on a loopback redirect URI
/// - Android: launch the account chooser / custom tab
#[async_trait]
pub trait ConsentHandler: Send + Sync {
    /// Present `authorization_url` to the user.
    ///
    /// Returns `Ok(None)` when the user dismissed the screen or denied access.
    async fn request_consent(
        &self,
        authorization_url: &str,
    ) -> Result<Option<ConsentCallback>, IdentityError>;
}

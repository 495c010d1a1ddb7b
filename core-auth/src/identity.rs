//! Identity providers that turn a user's consent into a [`Credential`].
//!
//! - [`OAuthIdentityProvider`] runs the interactive PKCE authorization-code
//!   flow through a host [`ConsentHandler`].
//! - [`StaticTokenIdentity`] hands out a credential obtained elsewhere, for
//!   hosts whose platform SDK already selected the account.

use async_trait::async_trait;
use bridge_traits::{
    AccountId, Clock, ConsentHandler, Credential, HttpClient, IdentityError, IdentityProvider,
};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::oauth::{OAuthConfig, OAuthFlowManager};
use crate::types::{OAuthTokens, DRIVE_APPDATA_SCOPE};

/// Default upper bound for consent plus token exchange (2 minutes)
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Interactive OAuth 2.0 identity provider.
///
/// # Example
///
/// ```no_run
/// use bridge_traits::{ConsentHandler, HttpClient, IdentityProvider, SystemClock};
/// use core_auth::{OAuthConfig, OAuthIdentityProvider};
/// use core_runtime::config::AppConfig;
/// use std::sync::Arc;
///
/// # async fn example(
/// #     http: Arc<dyn HttpClient>,
/// #     consent: Arc<dyn ConsentHandler>,
/// # ) -> Result<(), bridge_traits::IdentityError> {
/// let config = AppConfig::from_env().unwrap();
/// let identity = OAuthIdentityProvider::new(
///     OAuthConfig::from(&config.oauth),
///     http,
///     consent,
///     Arc::new(SystemClock),
/// )
/// .with_timeout(config.oauth.consent_timeout);
///
/// let credential = identity.authorize().await?;
/// println!("Signed in as {}", credential.account());
/// # Ok(())
/// # }
/// ```
pub struct OAuthIdentityProvider {
    flow: OAuthFlowManager,
    consent: Arc<dyn ConsentHandler>,
    clock: Arc<dyn Clock>,
    auth_timeout: Duration,
}

impl OAuthIdentityProvider {
    pub fn new(
        config: OAuthConfig,
        http_client: Arc<dyn HttpClient>,
        consent: Arc<dyn ConsentHandler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            flow: OAuthFlowManager::new(config, http_client),
            consent,
            clock,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, auth_timeout: Duration) -> Self {
        self.auth_timeout = auth_timeout;
        self
    }

    async fn run_flow(&self) -> Result<Credential> {
        let (auth_url, verifier) = self.flow.build_auth_url()?;

        let callback = self
            .consent
            .request_consent(&auth_url)
            .await?
            .ok_or(IdentityError::CancelledByUser)?;

        let tokens = self
            .flow
            .exchange_code(&callback.code, &callback.state, &verifier, self.clock.now())
            .await?;

        self.credential_from_tokens(tokens)
    }

    fn credential_from_tokens(&self, tokens: OAuthTokens) -> Result<Credential> {
        let claims = tokens.claims()?;

        let requested_appdata = self
            .flow
            .config()
            .scopes
            .iter()
            .any(|scope| scope == DRIVE_APPDATA_SCOPE);
        let granted_appdata =
            tokens.scopes.is_empty() || tokens.scopes.iter().any(|s| s == DRIVE_APPDATA_SCOPE);
        if requested_appdata && !granted_appdata {
            return Err(AuthError::ScopeNotGranted(DRIVE_APPDATA_SCOPE.to_string()));
        }

        Ok(
            Credential::new(AccountId::new(claims.account_id()), tokens.access_token)
                .with_scopes(tokens.scopes)
                .with_expiry(tokens.expires_at),
        )
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    #[instrument(skip(self))]
    async fn authorize(&self) -> std::result::Result<Credential, IdentityError> {
        info!("Starting interactive sign-in");

        let outcome = match timeout(self.auth_timeout, self.run_flow()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthError::Timeout(self.auth_timeout.as_secs())),
        };

        match outcome {
            Ok(credential) => {
                info!(account = %credential.account(), "Sign-in completed");
                Ok(credential)
            }
            Err(error) => {
                warn!(error = %error, "Sign-in failed");
                Err(error.into())
            }
        }
    }
}

/// Identity provider backed by an already-issued credential.
#[derive(Debug, Clone)]
pub struct StaticTokenIdentity {
    credential: Credential,
}

impl StaticTokenIdentity {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    async fn authorize(&self) -> std::result::Result<Credential, IdentityError> {
        Ok(self.credential.clone())
    }
}

//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, identity,
//! clock) into the shared Rust core: the Drive `appDataFolder` store, the
//! event bus and the session task. Desktop apps typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) and call
//! [`CoreService::desktop`]; other hosts build a [`CoreDependencies`] bundle
//! from their own bridges.

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits::{AccountId, Credential, DocumentId, ErrorKind};
pub use core_auth::StaticTokenIdentity;
pub use core_runtime::config::AppConfig;
pub use core_runtime::events::{CoreEvent, DocumentEvent, EventStream, SessionEvent};
pub use core_session::{ReportedError, SessionError, SessionSnapshot, SessionState};

use std::sync::Arc;

use bridge_traits::{
    http::HttpClient, identity::IdentityProvider, storage::RemoteDocumentStore, time::Clock,
};
use core_runtime::events::EventBus;
use core_session::SessionHandle;
use provider_google_drive::DriveAppDataStore;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            identity,
            clock,
        }
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<AppConfig>,
    deps: Arc<CoreDependencies>,
    events: EventBus,
    session: SessionHandle,
}

impl CoreService {
    /// Create a new service backed by the Google Drive store.
    ///
    /// Must be called from within a Tokio runtime: the session task is
    /// spawned immediately.
    pub fn new(config: AppConfig, deps: CoreDependencies) -> Result<Self> {
        let store = Arc::new(DriveAppDataStore::new(
            Arc::clone(&deps.http_client),
            Arc::clone(&deps.clock),
            config.drive.clone(),
        ));
        Self::with_store(config, deps, store)
    }

    /// Create a service over an arbitrary document store.
    pub fn with_store(
        config: AppConfig,
        deps: CoreDependencies,
        store: Arc<dyn RemoteDocumentStore>,
    ) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.session.event_buffer);
        let session = SessionHandle::spawn(store, events.clone(), &config.session);
        info!(
            document = %config.drive.document_name,
            container = %config.drive.container,
            "Core service started"
        );

        Ok(Self {
            config: Arc::new(config),
            deps: Arc::new(deps),
            events,
            session,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    /// Direct access to the session task.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Run the configured identity flow; on success a fetch is scheduled.
    pub async fn sign_in(&self) -> Result<AccountId> {
        Ok(self.session.sign_in(self.deps.identity.as_ref()).await?)
    }

    pub async fn sign_out(&self) -> Result<()> {
        Ok(self.session.sign_out().await?)
    }

    pub async fn set_document(&self, text: impl Into<String>) -> Result<DocumentId> {
        Ok(self.session.set_document(text).await?)
    }

    pub async fn delete_document(&self) -> Result<DocumentId> {
        Ok(self.session.delete_document().await?)
    }

    pub async fn fetch_document(&self) -> Result<Option<String>> {
        Ok(self.session.fetch_document().await?)
    }
}

#[cfg(feature = "desktop-shims")]
impl CoreService {
    /// Bootstrap with the desktop bridges: `reqwest` for HTTP and a loopback
    /// listener on the configured redirect URI for the consent step.
    ///
    /// ```no_run
    /// # async fn example() -> core_service::Result<()> {
    /// use core_service::{AppConfig, CoreService};
    ///
    /// let core = CoreService::desktop(AppConfig::from_env()?)?;
    /// core.sign_in().await?;
    /// core.set_document("theme=dark").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn desktop(config: AppConfig) -> Result<Self> {
        use bridge_desktop::{LoopbackConsentHandler, ReqwestHttpClient};
        use bridge_traits::time::SystemClock;
        use core_auth::{OAuthConfig, OAuthIdentityProvider};

        let http_client: Arc<dyn HttpClient> = Arc::new(
            ReqwestHttpClient::with_options(config.drive.request_timeout, &config.user_agent())
                .map_err(|e| CoreError::InitializationFailed(e.to_string()))?,
        );
        let consent = Arc::new(
            LoopbackConsentHandler::from_redirect_uri(&config.oauth.redirect_uri)
                .map_err(|e| CoreError::InitializationFailed(e.to_string()))?,
        );
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let identity = OAuthIdentityProvider::new(
            OAuthConfig::from(&config.oauth),
            Arc::clone(&http_client),
            consent,
            Arc::clone(&clock),
        )
        .with_timeout(config.oauth.consent_timeout);

        Self::new(
            config,
            CoreDependencies::new(http_client, Arc::new(identity), clock),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::storage::DocumentResult;
    use bridge_traits::time::SystemClock;
    use mockall::mock;
    use std::sync::Mutex;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    #[derive(Default)]
    struct SlotStore {
        slot: Mutex<Option<String>>,
    }

    #[async_trait]
    impl RemoteDocumentStore for SlotStore {
        async fn put(&self, _credential: &Credential, text: &str) -> DocumentResult<DocumentId> {
            *self.slot.lock().unwrap() = Some(text.to_string());
            Ok(DocumentId::new("doc-1"))
        }

        async fn get(&self, _credential: &Credential) -> DocumentResult<Option<String>> {
            Ok(self.slot.lock().unwrap().clone())
        }
    }

    fn config() -> AppConfig {
        AppConfig::builder().client_id("client-id").build().unwrap()
    }

    fn dependencies() -> CoreDependencies {
        let credential = Credential::new(AccountId::new("user@example.com"), "access-token");
        CoreDependencies::new(
            Arc::new(MockHttpClient::new()),
            Arc::new(StaticTokenIdentity::new(credential)),
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn test_round_trip_through_facade() {
        let core =
            CoreService::with_store(config(), dependencies(), Arc::new(SlotStore::default()))
                .unwrap();

        let account = core.sign_in().await.unwrap();
        assert_eq!(account, AccountId::new("user@example.com"));

        core.set_document("hello").await.unwrap();
        assert_eq!(
            core.fetch_document().await.unwrap(),
            Some("hello".to_string())
        );

        core.delete_document().await.unwrap();
        assert_eq!(core.fetch_document().await.unwrap(), Some(String::new()));

        core.sign_out().await.unwrap();
        assert_eq!(core.snapshot(), SessionSnapshot::signed_out());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = config();
        config.drive.page_size = 0;

        let result = CoreService::new(config, dependencies());

        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_signed_out_errors_are_classified() {
        let core =
            CoreService::with_store(config(), dependencies(), Arc::new(SlotStore::default()))
                .unwrap();

        let error = core.set_document("hello").await.unwrap_err();

        assert!(matches!(
            error,
            CoreError::Session(SessionError::NotSignedIn)
        ));
        assert!(error.requires_consent());
    }

    #[cfg(feature = "desktop-shims")]
    #[tokio::test]
    async fn test_desktop_bootstrap() {
        let core = CoreService::desktop(config()).unwrap();

        assert_eq!(core.config().drive.document_name, "config.txt");
        assert!(!core.snapshot().is_signed_in());
    }
}

//! # Session Holder
//!
//! Owns the signed-in credential, the last known document text and the
//! fetch/error status, and drives the remote document store on behalf of the
//! presentation layer.
//!
//! ## Architecture
//!
//! ```text
//!  SessionHandle ──commands──> SessionActor ──UploadJob──> upload lane ──┐
//!   (cloneable)   <─oneshot──      │  ▲      ──FetchJob───> fetch lane ──┤
//!                                  │  └──────────completions─────────────┘
//!                    watch<SessionSnapshot> + EventBus
//! ```
//!
//! A single task owns all state. Each lane is a FIFO worker, so at most one
//! upload and one download are in flight and uploads reach the store in the
//! order they were requested.
//!
//! Every sign-in, sign-out and sign-in failure starts a new epoch. Lane
//! results from an older epoch still answer their caller but never change
//! the snapshot. A fetch dispatched before a later local edit never
//! overwrites that edit.

use crate::error::{Result, SessionError};
use crate::state::{ReportedError, SessionSnapshot, SessionState};
use bridge_traits::{
    AccountId, Credential, DocumentId, DocumentResult, IdentityError, IdentityProvider,
    RemoteDocumentStore,
};
use core_runtime::config::SessionSettings;
use core_runtime::events::{CoreEvent, DocumentEvent, EventBus, EventStream, SessionEvent};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

type Reply<T> = oneshot::Sender<Result<T>>;

#[derive(Debug, Clone)]
enum Write {
    Put(String),
    Clear,
}

impl Write {
    fn text(&self) -> &str {
        match self {
            Write::Put(text) => text,
            Write::Clear => "",
        }
    }
}

enum Command {
    BeginSignIn,
    SignInSucceeded {
        credential: Credential,
        reply: oneshot::Sender<()>,
    },
    SignInFailed {
        error: Option<IdentityError>,
        reply: oneshot::Sender<()>,
    },
    SignOut {
        reply: oneshot::Sender<()>,
    },
    Write {
        write: Write,
        reply: Reply<DocumentId>,
    },
    Fetch {
        reply: Reply<Option<String>>,
    },
}

struct UploadJob {
    epoch: u64,
    credential: Credential,
    write: Write,
    reply: Reply<DocumentId>,
}

struct FetchJob {
    epoch: u64,
    revision: u64,
    credential: Credential,
    /// `None` for the fetch scheduled by sign-in.
    reply: Option<Reply<Option<String>>>,
}

enum Completion {
    Upload {
        epoch: u64,
        length: usize,
        result: DocumentResult<DocumentId>,
        reply: Reply<DocumentId>,
    },
    Fetch {
        epoch: u64,
        revision: u64,
        result: DocumentResult<Option<String>>,
        reply: Option<Reply<Option<String>>>,
    },
}

/// Spawn a FIFO worker that runs `handler` for one job at a time.
fn spawn_lane<J, F, Fut>(lane: &'static str, mut handler: F) -> mpsc::UnboundedSender<J>
where
    J: Send + 'static,
    F: FnMut(J) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (sender, mut receiver) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            handler(job).await;
        }
        debug!(lane, "Lane closed");
    });
    sender
}

struct SessionActor {
    commands: mpsc::Receiver<Command>,
    completions: mpsc::UnboundedReceiver<Completion>,
    uploads: mpsc::UnboundedSender<UploadJob>,
    fetches: mpsc::UnboundedSender<FetchJob>,
    snapshot: watch::Sender<SessionSnapshot>,
    events: EventBus,
    credential: Option<Credential>,
    epoch: u64,
    /// Bumped by every local edit.
    revision: u64,
    /// Fetches of the current epoch not yet completed.
    pending_fetches: usize,
}

impl SessionActor {
    async fn run(mut self) {
        debug!("Session task started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = self.completions.recv() => self.handle_completion(completion),
            }
        }
        debug!("Session task stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::BeginSignIn => self.emit(CoreEvent::Session(SessionEvent::SigningIn)),
            Command::SignInSucceeded { credential, reply } => {
                self.sign_in_succeeded(credential);
                let _ = reply.send(());
            }
            Command::SignInFailed { error, reply } => {
                self.sign_in_failed(error);
                let _ = reply.send(());
            }
            Command::SignOut { reply } => {
                self.sign_out();
                let _ = reply.send(());
            }
            Command::Write { write, reply } => self.write(write, reply),
            Command::Fetch { reply } => {
                if self.credential.is_none() {
                    let _ = reply.send(Err(SessionError::NotSignedIn));
                } else {
                    self.dispatch_fetch(Some(reply));
                }
            }
        }
    }

    fn sign_in_succeeded(&mut self, credential: Credential) {
        let account = credential.account().clone();
        let switching_account = self
            .credential
            .as_ref()
            .map_or(true, |current| current.account() != &account);

        self.start_epoch();
        self.credential = Some(credential);
        info!(account = %account, "Signed in");

        self.update(|snapshot| {
            snapshot.state = SessionState::SignedIn {
                account: account.clone(),
            };
            snapshot.last_error = None;
            snapshot.fetching = false;
            if switching_account {
                snapshot.document = None;
            }
        });
        self.emit(CoreEvent::Session(SessionEvent::SignedIn {
            account: account.to_string(),
        }));

        self.dispatch_fetch(None);
    }

    fn sign_in_failed(&mut self, error: Option<IdentityError>) {
        self.start_epoch();
        self.credential = None;

        match error {
            Some(error) => {
                warn!(error = %error, "Sign-in failed");
                let reported = ReportedError::from(&error);
                self.snapshot.send_replace(SessionSnapshot {
                    state: SessionState::SignInFailed {
                        error: reported.clone(),
                    },
                    fetching: false,
                    document: None,
                    last_error: Some(reported),
                });
                self.emit(CoreEvent::Session(SessionEvent::SignInFailed {
                    message: error.to_string(),
                    cancelled: matches!(error, IdentityError::CancelledByUser),
                }));
            }
            None => {
                info!("Sign-in ended without a credential");
                self.snapshot.send_replace(SessionSnapshot::signed_out());
                self.emit(CoreEvent::Session(SessionEvent::SignedOut));
            }
        }
    }

    fn sign_out(&mut self) {
        self.start_epoch();
        self.credential = None;
        info!("Signed out");
        self.snapshot.send_replace(SessionSnapshot::signed_out());
        self.emit(CoreEvent::Session(SessionEvent::SignedOut));
    }

    fn write(&mut self, write: Write, reply: Reply<DocumentId>) {
        let Some(credential) = self.credential.clone() else {
            let _ = reply.send(Err(SessionError::NotSignedIn));
            return;
        };

        self.revision += 1;
        let text = write.text().to_string();
        self.update(|snapshot| snapshot.document = Some(text));

        let job = UploadJob {
            epoch: self.epoch,
            credential,
            write,
            reply,
        };
        if let Err(mpsc::error::SendError(job)) = self.uploads.send(job) {
            let _ = job.reply.send(Err(SessionError::Stopped));
        }
    }

    fn dispatch_fetch(&mut self, reply: Option<Reply<Option<String>>>) {
        let Some(credential) = self.credential.clone() else {
            if let Some(reply) = reply {
                let _ = reply.send(Err(SessionError::NotSignedIn));
            }
            return;
        };

        let job = FetchJob {
            epoch: self.epoch,
            revision: self.revision,
            credential,
            reply,
        };
        if let Err(mpsc::error::SendError(job)) = self.fetches.send(job) {
            if let Some(reply) = job.reply {
                let _ = reply.send(Err(SessionError::Stopped));
            }
            return;
        }

        self.pending_fetches += 1;
        self.update(|snapshot| snapshot.fetching = true);
        self.emit(CoreEvent::Document(DocumentEvent::FetchStarted));
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Upload {
                epoch,
                length,
                result,
                reply,
            } => {
                if epoch == self.epoch {
                    self.apply_upload(length, &result);
                } else {
                    debug!("Discarding upload result from a previous session");
                }
                let _ = reply.send(result.map_err(SessionError::from));
            }
            Completion::Fetch {
                epoch,
                revision,
                result,
                reply,
            } => {
                let outcome = if epoch == self.epoch {
                    self.apply_fetch(revision, &result);
                    result.map_err(SessionError::from)
                } else if self.credential.is_none() {
                    debug!("Discarding fetch result after sign-out");
                    Err(SessionError::NotSignedIn)
                } else {
                    debug!("Discarding fetch result from a previous session");
                    result.map_err(SessionError::from)
                };
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
        }
    }

    fn apply_upload(&mut self, length: usize, result: &DocumentResult<DocumentId>) {
        match result {
            Ok(document_id) => {
                info!(document_id = %document_id, length, "Document uploaded");
                self.update(|snapshot| snapshot.last_error = None);
                self.emit(CoreEvent::Document(DocumentEvent::Uploaded {
                    document_id: document_id.to_string(),
                    length,
                }));
            }
            Err(error) => {
                warn!(error = %error, kind = %error.kind(), "Document upload failed");
                let reported = ReportedError::from(error);
                self.emit(CoreEvent::Document(DocumentEvent::UploadFailed {
                    message: reported.message.clone(),
                    kind: reported.kind,
                    requires_consent: reported.requires_consent,
                }));
                self.update(|snapshot| snapshot.last_error = Some(reported));
            }
        }
    }

    fn apply_fetch(&mut self, revision: u64, result: &DocumentResult<Option<String>>) {
        self.pending_fetches = self.pending_fetches.saturating_sub(1);
        let fetching = self.pending_fetches > 0;

        match result {
            Ok(text) => {
                let overwrite = revision == self.revision;
                if !overwrite {
                    debug!("Keeping local edit made while the fetch was in flight");
                }
                self.update(|snapshot| {
                    snapshot.fetching = fetching;
                    snapshot.last_error = None;
                    if overwrite {
                        snapshot.document = text.clone();
                    }
                });
                self.emit(CoreEvent::Document(DocumentEvent::Fetched {
                    present: text.is_some(),
                    length: text.as_ref().map_or(0, String::len),
                }));
            }
            Err(error) => {
                warn!(error = %error, kind = %error.kind(), "Document fetch failed");
                let reported = ReportedError::from(error);
                self.emit(CoreEvent::Document(DocumentEvent::FetchFailed {
                    message: reported.message.clone(),
                    kind: reported.kind,
                    requires_consent: reported.requires_consent,
                }));
                self.update(|snapshot| {
                    snapshot.fetching = fetching;
                    snapshot.last_error = Some(reported);
                });
            }
        }
    }

    fn start_epoch(&mut self) {
        self.epoch += 1;
        self.pending_fetches = 0;
    }

    fn update(&self, modify: impl FnOnce(&mut SessionSnapshot)) {
        self.snapshot.send_modify(modify);
    }

    fn emit(&self, event: CoreEvent) {
        self.events.emit(event).ok();
    }
}

/// Cloneable front end of the session task.
///
/// The task stops once every handle has been dropped. Calls made after that
/// fail with [`SessionError::Stopped`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
    events: EventBus,
}

impl SessionHandle {
    /// Start the session task and its upload and fetch lanes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        store: Arc<dyn RemoteDocumentStore>,
        events: EventBus,
        settings: &SessionSettings,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(settings.command_buffer.max(1));
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::signed_out());

        let upload_store = Arc::clone(&store);
        let upload_done = completion_tx.clone();
        let uploads = spawn_lane("upload", move |job: UploadJob| {
            let store = Arc::clone(&upload_store);
            let done = upload_done.clone();
            async move {
                let length = job.write.text().len();
                let result = match &job.write {
                    Write::Put(text) => store.put(&job.credential, text).await,
                    Write::Clear => store.clear(&job.credential).await,
                };
                let _ = done.send(Completion::Upload {
                    epoch: job.epoch,
                    length,
                    result,
                    reply: job.reply,
                });
            }
        });

        let fetch_store = store;
        let fetch_done = completion_tx;
        let fetches = spawn_lane("fetch", move |job: FetchJob| {
            let store = Arc::clone(&fetch_store);
            let done = fetch_done.clone();
            async move {
                let result = store.get(&job.credential).await;
                let _ = done.send(Completion::Fetch {
                    epoch: job.epoch,
                    revision: job.revision,
                    result,
                    reply: job.reply,
                });
            }
        });

        let actor = SessionActor {
            commands: command_rx,
            completions: completion_rx,
            uploads,
            fetches,
            snapshot: snapshot_tx,
            events: events.clone(),
            credential: None,
            epoch: 0,
            revision: 0,
            pending_fetches: 0,
        };
        tokio::spawn(actor.run());

        Self {
            commands: command_tx,
            snapshot: snapshot_rx,
            events,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Stopped)?;
        response.await.map_err(|_| SessionError::Stopped)
    }

    /// Run the identity flow and record its outcome.
    ///
    /// A dismissed consent screen is reported as
    /// `SessionError::SignIn(IdentityError::CancelledByUser)` and leaves the
    /// session in the sign-in-failed state.
    #[instrument(skip(self, identity))]
    pub async fn sign_in(&self, identity: &dyn IdentityProvider) -> Result<AccountId> {
        self.commands
            .send(Command::BeginSignIn)
            .await
            .map_err(|_| SessionError::Stopped)?;

        match identity.authorize().await {
            Ok(credential) => {
                let account = credential.account().clone();
                self.sign_in_succeeded(credential).await?;
                Ok(account)
            }
            Err(error) => {
                self.sign_in_failed(Some(error.clone())).await?;
                Err(SessionError::SignIn(error))
            }
        }
    }

    /// Store `credential`, clear the previous error and schedule a fetch.
    pub async fn sign_in_succeeded(&self, credential: Credential) -> Result<()> {
        self.request(|reply| Command::SignInSucceeded { credential, reply })
            .await
    }

    /// Drop any credential and local text. `None` means the flow ended
    /// without an error to report and leads to the signed-out state.
    pub async fn sign_in_failed(&self, error: Option<IdentityError>) -> Result<()> {
        self.request(|reply| Command::SignInFailed { error, reply })
            .await
    }

    /// Drop the credential and local text. The store is not contacted.
    pub async fn sign_out(&self) -> Result<()> {
        self.request(|reply| Command::SignOut { reply }).await
    }

    /// Replace the local text immediately, then overwrite the remote
    /// document. A failed upload is reported but the local text is kept.
    pub async fn set_document(&self, text: impl Into<String>) -> Result<DocumentId> {
        let write = Write::Put(text.into());
        self.request(|reply| Command::Write { write, reply }).await?
    }

    /// Set the local text to `""` and overwrite the remote document with an
    /// empty payload.
    pub async fn delete_document(&self) -> Result<DocumentId> {
        self.request(|reply| Command::Write {
            write: Write::Clear,
            reply,
        })
        .await?
    }

    /// Download the remote document into the session.
    ///
    /// On failure the local text is left untouched.
    pub async fn fetch_document(&self) -> Result<Option<String>> {
        self.request(|reply| Command::Fetch { reply }).await?
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    pub fn events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Wait until no fetch is in flight and return the resulting snapshot.
    pub async fn wait_for_fetch(&self) -> Result<SessionSnapshot> {
        let mut receiver = self.snapshot.clone();
        let snapshot = receiver
            .wait_for(|snapshot| !snapshot.fetching)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| SessionError::Stopped)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{DocumentError, ErrorKind};
    use mockall::{mock, Sequence};

    mock! {
        Store {}

        #[async_trait]
        impl RemoteDocumentStore for Store {
            async fn put(&self, credential: &Credential, text: &str) -> DocumentResult<DocumentId>;
            async fn get(&self, credential: &Credential) -> DocumentResult<Option<String>>;
            async fn clear(&self, credential: &Credential) -> DocumentResult<DocumentId>;
        }
    }

    struct FixedIdentity(std::result::Result<Credential, IdentityError>);

    #[async_trait]
    impl IdentityProvider for FixedIdentity {
        async fn authorize(&self) -> std::result::Result<Credential, IdentityError> {
            self.0.clone()
        }
    }

    fn credential(account: &str) -> Credential {
        Credential::new(AccountId::new(account), "access-token")
    }

    fn spawn(store: MockStore) -> SessionHandle {
        SessionHandle::spawn(
            Arc::new(store),
            EventBus::new(32),
            &SessionSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_sign_in_schedules_fetch() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some("theme=dark".to_string())));
        let session = spawn(store);

        session
            .sign_in_succeeded(credential("user@example.com"))
            .await
            .unwrap();

        let snapshot = session.wait_for_fetch().await.unwrap();
        assert_eq!(
            snapshot.state,
            SessionState::SignedIn {
                account: AccountId::new("user@example.com")
            }
        );
        assert_eq!(snapshot.document.as_deref(), Some("theme=dark"));
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_operations_require_sign_in() {
        let session = spawn(MockStore::new());

        assert_eq!(
            session.set_document("hello").await,
            Err(SessionError::NotSignedIn)
        );
        assert_eq!(
            session.delete_document().await,
            Err(SessionError::NotSignedIn)
        );
        assert_eq!(
            session.fetch_document().await,
            Err(SessionError::NotSignedIn)
        );
        assert_eq!(session.snapshot(), SessionSnapshot::signed_out());
    }

    #[tokio::test]
    async fn test_auth_failure_keeps_session_and_local_text() {
        let mut store = MockStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_put()
            .times(1)
            .returning(|_, _| Err(DocumentError::Auth("Token expired".to_string())));
        let session = spawn(store);

        session
            .sign_in_succeeded(credential("user@example.com"))
            .await
            .unwrap();
        session.wait_for_fetch().await.unwrap();

        let result = session.set_document("hello").await;
        assert_eq!(
            result,
            Err(SessionError::Document(DocumentError::Auth(
                "Token expired".to_string()
            )))
        );

        let snapshot = session.snapshot();
        assert!(snapshot.is_signed_in());
        assert_eq!(snapshot.document.as_deref(), Some("hello"));
        let error = snapshot.last_error.unwrap();
        assert_eq!(error.kind, ErrorKind::Auth);
        assert!(error.requires_consent);
    }

    #[tokio::test]
    async fn test_delete_uses_clear_and_sets_empty_text() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some("old".to_string())));
        store
            .expect_clear()
            .times(1)
            .returning(|_| Ok(DocumentId::new("file-1")));
        let session = spawn(store);

        session
            .sign_in_succeeded(credential("user@example.com"))
            .await
            .unwrap();
        session.wait_for_fetch().await.unwrap();

        let id = session.delete_document().await.unwrap();
        assert_eq!(id, DocumentId::new("file-1"));
        assert_eq!(session.snapshot().document.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_local_text() {
        let mut store = MockStore::new();
        let mut seq = Sequence::new();
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some("saved".to_string())));
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DocumentError::Transport("offline".to_string())));
        let session = spawn(store);

        session
            .sign_in_succeeded(credential("user@example.com"))
            .await
            .unwrap();
        session.wait_for_fetch().await.unwrap();

        let result = session.fetch_document().await;
        assert!(matches!(
            result,
            Err(SessionError::Document(DocumentError::Transport(_)))
        ));

        let snapshot = session.snapshot();
        assert!(!snapshot.fetching);
        assert_eq!(snapshot.document.as_deref(), Some("saved"));
        assert_eq!(snapshot.last_error.unwrap().kind, ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_sign_in_failure_and_cancellation() {
        let session = spawn(MockStore::new());

        session
            .sign_in_failed(Some(IdentityError::CancelledByUser))
            .await
            .unwrap();
        let snapshot = session.snapshot();
        assert!(matches!(
            snapshot.state,
            SessionState::SignInFailed { ref error } if error.kind == ErrorKind::CancelledByUser
        ));
        assert!(snapshot.document.is_none());

        session.sign_in_failed(None).await.unwrap();
        assert_eq!(session.snapshot(), SessionSnapshot::signed_out());
    }

    #[tokio::test]
    async fn test_sign_in_runs_identity_provider() {
        let mut store = MockStore::new();
        store.expect_get().returning(|_| Ok(None));
        let session = spawn(store);
        let mut events = session.events();

        let account = session
            .sign_in(&FixedIdentity(Ok(credential("user@example.com"))))
            .await
            .unwrap();
        assert_eq!(account, AccountId::new("user@example.com"));

        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Session(SessionEvent::SigningIn)
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Session(SessionEvent::SignedIn {
                account: "user@example.com".to_string()
            })
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Document(DocumentEvent::FetchStarted)
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Document(DocumentEvent::Fetched {
                present: false,
                length: 0
            })
        );
    }

    #[tokio::test]
    async fn test_sign_in_cancelled_by_user() {
        let session = spawn(MockStore::new());

        let result = session
            .sign_in(&FixedIdentity(Err(IdentityError::CancelledByUser)))
            .await;

        assert_eq!(
            result,
            Err(SessionError::SignIn(IdentityError::CancelledByUser))
        );
        assert!(matches!(
            session.snapshot().state,
            SessionState::SignInFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_switching_account_clears_document() {
        let mut store = MockStore::new();
        let mut seq = Sequence::new();
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some("first".to_string())));
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DocumentError::Transport("offline".to_string())));
        let session = spawn(store);

        session
            .sign_in_succeeded(credential("first@example.com"))
            .await
            .unwrap();
        assert_eq!(
            session.wait_for_fetch().await.unwrap().document.as_deref(),
            Some("first")
        );

        session
            .sign_in_succeeded(credential("second@example.com"))
            .await
            .unwrap();
        let snapshot = session.wait_for_fetch().await.unwrap();
        assert_eq!(
            snapshot.account(),
            Some(&AccountId::new("second@example.com"))
        );
        assert!(snapshot.document.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_state_without_store_calls() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some("secret".to_string())));
        let session = spawn(store);

        session
            .sign_in_succeeded(credential("user@example.com"))
            .await
            .unwrap();
        session.wait_for_fetch().await.unwrap();
        session.sign_out().await.unwrap();

        assert_eq!(session.snapshot(), SessionSnapshot::signed_out());
    }
}

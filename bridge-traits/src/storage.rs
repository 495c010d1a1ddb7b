//! Remote Document Storage Abstraction
//!
//! The core stores exactly one named document inside the signed-in account's
//! private application container. A [`RemoteDocumentStore`] translates the
//! three logical operations into calls against the remote storage service:
//!
//! | Operation | Behaviour |
//! |-----------|-----------|
//! | `put` | Find-or-create the document, overwrite its content |
//! | `get` | Find the document by name, download it, `None` if absent |
//! | `clear` | `put` of the empty string (there is no true delete) |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::credential::Credential;
use crate::error::ErrorKind;

/// Identifier assigned to the document by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failures of a remote document operation.
///
/// None of these are retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Credential expired, revoked or lacking the required scope.
    ///
    /// Recoverable only by re-running the interactive consent flow.
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// The request never produced a response (connectivity, DNS, timeout).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The remote API rejected the request (quota, invalid container, ...).
    #[error("Storage service error (status {status}): {message}")]
    Service { status: u16, message: String },
}

impl DocumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocumentError::Auth(_) => ErrorKind::Auth,
            DocumentError::Transport(_) => ErrorKind::Transport,
            DocumentError::Service { .. } => ErrorKind::Service,
        }
    }

    pub fn requires_consent(&self) -> bool {
        self.kind().requires_consent()
    }
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// Single-slot document store inside a private application container.
///
/// Implementations must never create a second document with the configured
/// name: `put` overwrites the existing one when it is found.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::RemoteDocumentStore;
///
/// async fn round_trip(store: &dyn RemoteDocumentStore, credential: &Credential) {
///     store.put(credential, "hello").await?;
///     assert_eq!(store.get(credential).await?, Some("hello".to_string()));
/// }
/// ```
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    /// Create or replace the document content, returning its identifier.
    async fn put(&self, credential: &Credential, text: &str) -> DocumentResult<DocumentId>;

    /// Fetch the document content, `None` when no document exists yet.
    async fn get(&self, credential: &Credential) -> DocumentResult<Option<String>>;

    /// Logical delete: overwrite the document with an empty payload.
    async fn clear(&self, credential: &Credential) -> DocumentResult<DocumentId> {
        self.put(credential, "").await
    }
}

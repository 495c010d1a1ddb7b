//! # Host Bridge Traits
//!
//! Capability contracts between the OneTap Drive core and the host platform.
//!
//! ## Overview
//!
//! The core never talks to a platform SDK directly. Everything it needs from
//! the outside world is expressed as a trait in this crate and injected by the
//! host (desktop shims, an Android shell, tests):
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP request execution
//!
//! ### Identity
//! - [`IdentityProvider`](identity::IdentityProvider) - Produces a [`Credential`] for one account
//! - [`ConsentHandler`](identity::ConsentHandler) - Presents the interactive consent screen
//!
//! ### Remote storage
//! - [`RemoteDocumentStore`](storage::RemoteDocumentStore) - put/get/clear of the single
//!   named document in the account's private application container
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for credential expiry checks
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! Host bridges report failures with [`BridgeError`](error::BridgeError).
//! Document and identity operations use their own taxonomies
//! ([`DocumentError`](storage::DocumentError), [`IdentityError`](identity::IdentityError))
//! so the presentation layer can tell an expired credential from a dropped
//! connection. Both classify into [`ErrorKind`].
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod credential;
pub mod error;
pub mod http;
pub mod identity;
pub mod storage;
pub mod time;

pub use credential::{AccountId, Credential};
pub use error::{BridgeError, ErrorKind};

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use identity::{ConsentCallback, ConsentHandler, IdentityError, IdentityProvider};
pub use storage::{DocumentError, DocumentId, DocumentResult, RemoteDocumentStore};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};

//! # Event Bus System
//!
//! Broadcasts session and document notifications to the presentation layer
//! using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enums for the session and document domains
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   emit    ┌───────────┐   subscribe   ┌────────────┐
//! │ Session actor  ├──────────>│ EventBus  ├──────────────>│ Presenter  │
//! └────────────────┘           │ (broadcast│               └────────────┘
//!                              │  channel) │   subscribe   ┌────────────┐
//!                              │           ├──────────────>│ Logger     │
//!                              └───────────┘               └────────────┘
//! ```
//!
//! The session actor also publishes a full snapshot through a `watch`
//! channel; events describe transitions, the snapshot describes the current
//! state.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Session(SessionEvent::SignedIn {
//!         account: "user@example.com".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "User signed in");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting without subscribers returns an error which producers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

use bridge_traits::ErrorKind;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Sign-in lifecycle
    Session(SessionEvent),
    /// Remote document transfers
    Document(DocumentEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Document(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Session(SessionEvent::SignInFailed { cancelled: true, .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Session(SessionEvent::SignInFailed { .. }) => EventSeverity::Error,
            CoreEvent::Document(DocumentEvent::FetchFailed { .. })
            | CoreEvent::Document(DocumentEvent::UploadFailed { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::SignedIn { .. })
            | CoreEvent::Session(SessionEvent::SignedOut)
            | CoreEvent::Document(DocumentEvent::Uploaded { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Session Events
// ============================================================================

/// Sign-in lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// Interactive consent flow started.
    SigningIn,
    /// A credential was accepted.
    SignedIn {
        /// Account identifier (usually the e-mail address).
        account: String,
    },
    /// Sign-in failed or was dismissed.
    SignInFailed {
        message: String,
        /// True when the user dismissed the consent screen.
        cancelled: bool,
    },
    /// Credential dropped and local text cleared.
    SignedOut,
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::SigningIn => "Sign-in in progress",
            SessionEvent::SignedIn { .. } => "User signed in",
            SessionEvent::SignInFailed { cancelled: true, .. } => "Sign-in cancelled",
            SessionEvent::SignInFailed { .. } => "Sign-in failed",
            SessionEvent::SignedOut => "User signed out",
        }
    }
}

// ============================================================================
// Document Events
// ============================================================================

/// Remote document transfer events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum DocumentEvent {
    /// A download was dispatched.
    FetchStarted,
    /// A download completed.
    Fetched {
        /// False when the container holds no document yet.
        present: bool,
        /// Length of the downloaded text in bytes.
        length: usize,
    },
    /// A download failed.
    FetchFailed {
        message: String,
        kind: ErrorKind,
        /// Re-running the consent flow may fix this.
        requires_consent: bool,
    },
    /// An upload overwrote the remote document.
    Uploaded { document_id: String, length: usize },
    /// An upload failed. Local text is kept.
    UploadFailed {
        message: String,
        kind: ErrorKind,
        requires_consent: bool,
    },
}

impl DocumentEvent {
    fn description(&self) -> &str {
        match self {
            DocumentEvent::FetchStarted => "Fetching document",
            DocumentEvent::Fetched { present: true, .. } => "Document fetched",
            DocumentEvent::Fetched { present: false, .. } => "No document stored yet",
            DocumentEvent::FetchFailed { .. } => "Document fetch failed",
            DocumentEvent::Uploaded { .. } => "Document uploaded",
            DocumentEvent::UploadFailed { .. } => "Document upload failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every `subscribe()` creates an
/// independent receiver that only sees future events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// A subscriber that falls behind by more than `capacity` events receives
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let documents_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Document(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in() -> CoreEvent {
        CoreEvent::Session(SessionEvent::SignedIn {
            account: "user@example.com".to_string(),
        })
    }

    fn upload_failed() -> CoreEvent {
        CoreEvent::Document(DocumentEvent::UploadFailed {
            message: "token expired".to_string(),
            kind: ErrorKind::Auth,
            requires_consent: true,
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(CoreEvent::Session(SessionEvent::SignedOut)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        assert_eq!(bus.emit(signed_in()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), signed_in());
        assert_eq!(sub2.recv().await.unwrap(), signed_in());
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Document(_)));

        bus.emit(signed_in()).ok();
        bus.emit(upload_failed()).ok();

        assert_eq!(stream.recv().await.unwrap(), upload_failed());
    }

    #[tokio::test]
    async fn test_try_recv_skips_filtered_events() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Document(_)));

        bus.emit(signed_in()).ok();
        assert!(stream.try_recv().is_none());

        bus.emit(CoreEvent::Document(DocumentEvent::FetchStarted)).ok();
        assert_eq!(
            stream.try_recv().unwrap().unwrap(),
            CoreEvent::Document(DocumentEvent::FetchStarted)
        );
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for length in 0..5 {
            bus.emit(CoreEvent::Document(DocumentEvent::Uploaded {
                document_id: "doc-1".to_string(),
                length,
            }))
            .ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(upload_failed().severity(), EventSeverity::Error);
        assert_eq!(signed_in().severity(), EventSeverity::Info);
        assert_eq!(
            CoreEvent::Session(SessionEvent::SignInFailed {
                message: "dismissed".to_string(),
                cancelled: true,
            })
            .severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            CoreEvent::Document(DocumentEvent::FetchStarted).severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_event_description() {
        assert_eq!(signed_in().description(), "User signed in");
        assert_eq!(
            CoreEvent::Document(DocumentEvent::Fetched {
                present: false,
                length: 0
            })
            .description(),
            "No document stored yet"
        );
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&upload_failed()).unwrap();
        assert!(json.contains("\"type\":\"Document\""));
        assert!(json.contains("\"event\":\"UploadFailed\""));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, upload_failed());
    }
}

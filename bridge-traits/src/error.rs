use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Presentation-facing classification shared by every failure the core reports.
///
/// | Kind | Meaning | Host reaction |
/// |------|---------|---------------|
/// | `Auth` | Credential expired, revoked or missing scope | Re-run interactive consent |
/// | `Transport` | Network or connectivity failure | Show error, user may retry |
/// | `Service` | Remote API rejected the request | Show error |
/// | `CancelledByUser` | Consent screen dismissed | Treat as sign-in failure |
///
/// Nothing is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Auth,
    Transport,
    Service,
    CancelledByUser,
}

impl ErrorKind {
    /// Whether the host must run the interactive consent flow again to recover.
    pub fn requires_consent(&self) -> bool {
        matches!(self, ErrorKind::Auth)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Transport => "transport",
            ErrorKind::Service => "service",
            ErrorKind::CancelledByUser => "cancelled_by_user",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

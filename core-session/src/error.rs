use bridge_traits::{DocumentError, ErrorKind, IdentityError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No account is signed in")]
    NotSignedIn,

    #[error(transparent)]
    SignIn(#[from] IdentityError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Session task has stopped")]
    Stopped,
}

impl SessionError {
    /// Presentation classification, `None` for lifecycle errors of the
    /// session task itself.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SessionError::NotSignedIn => Some(ErrorKind::Auth),
            SessionError::SignIn(e) => Some(e.kind()),
            SessionError::Document(e) => Some(e.kind()),
            SessionError::Stopped => None,
        }
    }

    pub fn requires_consent(&self) -> bool {
        self.kind().is_some_and(|kind| kind.requires_consent())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(SessionError::NotSignedIn.kind(), Some(ErrorKind::Auth));
        assert!(SessionError::NotSignedIn.requires_consent());
        assert_eq!(
            SessionError::from(IdentityError::CancelledByUser).kind(),
            Some(ErrorKind::CancelledByUser)
        );
        assert_eq!(
            SessionError::from(DocumentError::Transport("offline".to_string())).kind(),
            Some(ErrorKind::Transport)
        );
        assert_eq!(SessionError::Stopped.kind(), None);
        assert!(!SessionError::Stopped.requires_consent());
    }

    #[test]
    fn test_display_is_transparent() {
        let error = SessionError::from(DocumentError::Auth("token expired".to_string()));
        assert_eq!(error.to_string(), "Authorization failed: token expired");
    }
}

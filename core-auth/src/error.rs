use bridge_traits::IdentityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Token endpoint returned {status}: {message}")]
    TokenExchangeFailed { status: u16, message: String },

    #[error("Malformed token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Token response did not identify the account")]
    MissingIdentity,

    #[error("Required scope not granted: {0}")]
    ScopeNotGranted(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Sign-in did not complete within {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Consent(#[from] IdentityError),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl From<AuthError> for IdentityError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Consent(inner) => inner,
            AuthError::Timeout(_) => IdentityError::CancelledByUser,
            AuthError::NetworkError(message) => IdentityError::Transport(message),
            AuthError::TokenExchangeFailed { status, message } if status >= 500 => {
                IdentityError::Transport(format!("Token endpoint returned {}: {}", status, message))
            }
            other => IdentityError::Denied(other.to_string()),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Session error: {0}")]
    Session(#[from] core_session::SessionError),
}

impl CoreError {
    /// Whether re-running the consent flow may resolve the error.
    pub fn requires_consent(&self) -> bool {
        matches!(self, CoreError::Session(e) if e.requires_consent())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

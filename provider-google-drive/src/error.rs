//! Error types for Google Drive provider

use bridge_traits::storage::DocumentError;
use thiserror::Error;

use crate::types::DriveErrorResponse;

/// 403 reasons that mean the credential, not the request, is at fault.
const AUTH_FAILURE_REASONS: &[&str] = &["insufficientPermissions", "authError"];

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// The credential is known to be expired; no request was sent
    #[error("Credential expired")]
    CredentialExpired,

    /// Authentication failed or the token lacks the appdata scope
    #[error("Authentication failed (status {status_code}): {message}")]
    AuthenticationFailed { status_code: u16, message: String },

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The request never produced a response
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl GoogleDriveError {
    /// Classify a non-success response.
    ///
    /// 401 is always an auth failure. 403 is one only when the error reason
    /// points at the credential; quota and rate-limit 403s stay API errors.
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        let envelope = serde_json::from_slice::<DriveErrorResponse>(body).ok();

        let reason = envelope
            .as_ref()
            .and_then(|e| e.error.reason())
            .map(str::to_string);
        let message = match &envelope {
            Some(e) if !e.error.message.is_empty() => match &reason {
                Some(reason) => format!("{} ({})", e.error.message, reason),
                None => e.error.message.clone(),
            },
            _ => String::from_utf8_lossy(body).trim().to_string(),
        };

        let is_auth_failure = status_code == 401
            || (status_code == 403
                && reason
                    .as_deref()
                    .is_some_and(|r| AUTH_FAILURE_REASONS.contains(&r)));

        if is_auth_failure {
            GoogleDriveError::AuthenticationFailed {
                status_code,
                message,
            }
        } else {
            GoogleDriveError::ApiError {
                status_code,
                message,
            }
        }
    }
}

impl From<GoogleDriveError> for DocumentError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::CredentialExpired => {
                DocumentError::Auth("credential expired".to_string())
            }
            GoogleDriveError::AuthenticationFailed { .. } => DocumentError::Auth(error.to_string()),
            GoogleDriveError::ApiError {
                status_code,
                message,
            } => DocumentError::Service {
                status: status_code,
                message,
            },
            GoogleDriveError::ParseError(message) => DocumentError::Service {
                status: 200,
                message,
            },
            GoogleDriveError::BridgeError(e) => DocumentError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::ErrorKind;

    fn error_body(code: u16, reason: &str) -> Vec<u8> {
        format!(
            r#"{{"error":{{"code":{code},"message":"Request failed","errors":[{{"reason":"{reason}"}}]}}}}"#
        )
        .into_bytes()
    }

    #[test]
    fn test_error_display() {
        let error = GoogleDriveError::ApiError {
            status_code: 404,
            message: "File not found".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Google Drive API error (status 404): File not found"
        );
    }

    #[test]
    fn test_unauthorized_is_auth() {
        let error = GoogleDriveError::from_response(401, &error_body(401, "authError"));
        assert!(matches!(error, GoogleDriveError::AuthenticationFailed { .. }));
        assert_eq!(DocumentError::from(error).kind(), ErrorKind::Auth);
    }

    #[test]
    fn test_insufficient_permissions_is_auth() {
        let error = GoogleDriveError::from_response(403, &error_body(403, "insufficientPermissions"));
        assert!(DocumentError::from(error).requires_consent());
    }

    #[test]
    fn test_quota_is_service() {
        let error = GoogleDriveError::from_response(403, &error_body(403, "storageQuotaExceeded"));
        match DocumentError::from(error) {
            DocumentError::Service { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("storageQuotaExceeded"));
            }
            other => panic!("Expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body() {
        let error = GoogleDriveError::from_response(502, b"Bad Gateway\n");
        assert_eq!(
            error.to_string(),
            "Google Drive API error (status 502): Bad Gateway"
        );
    }

    #[test]
    fn test_bridge_error_is_transport() {
        let error = GoogleDriveError::from(BridgeError::Timeout("30s".to_string()));
        assert_eq!(DocumentError::from(error).kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_expired_credential_is_auth() {
        assert_eq!(
            DocumentError::from(GoogleDriveError::CredentialExpired),
            DocumentError::Auth("credential expired".to_string())
        );
    }
}

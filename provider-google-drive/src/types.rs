//! Google Drive API request and response types
//!
//! Data structures for the small subset of Drive API v3 used by the
//! application-data store.

use serde::{Deserialize, Serialize};

/// Google Drive API file resource, reduced to the requested fields.
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,

    #[serde(default)]
    pub name: String,
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Response of a create or update request made with `fields=id`.
#[derive(Debug, Deserialize)]
pub struct FileIdResponse {
    pub id: String,
}

/// Metadata part of a multipart create request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata<'a> {
    pub name: &'a str,
    pub parents: [&'a str; 1],
    pub mime_type: &'a str,
}

/// Standard Google API error envelope.
///
/// ```json
/// {"error": {"code": 403, "message": "...", "errors": [{"reason": "insufficientPermissions"}]}}
/// ```
#[derive(Debug, Deserialize)]
pub struct DriveErrorResponse {
    pub error: DriveErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct DriveErrorBody {
    #[serde(default)]
    pub code: u16,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub errors: Vec<DriveErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct DriveErrorDetail {
    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub message: String,
}

impl DriveErrorBody {
    /// Reason of the first detail entry, if any.
    pub fn reason(&self) -> Option<&str> {
        self.errors
            .first()
            .map(|detail| detail.reason.as_str())
            .filter(|reason| !reason.is_empty())
    }
}

//! Google Drive application-data store
//!
//! Implements [`RemoteDocumentStore`] on top of Drive API v3, keeping a single
//! named document inside the `appDataFolder` space of the signed-in account.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{DocumentId, DocumentResult, RemoteDocumentStore};
use bridge_traits::{Clock, Credential};
use bytes::Bytes;
use core_runtime::config::DriveSettings;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{GoogleDriveError, Result};
use crate::types::{DriveFile, FileIdResponse, FileMetadata, FilesListResponse};

/// Fields to request for file resources while scanning the container
const LIST_FIELDS: &str = "nextPageToken,files(id,name)";

const DOCUMENT_MIME_TYPE: &str = "text/plain";

/// Google Drive application-data document store
///
/// # Features
///
/// - Paginated scan of the private container, first name match wins
/// - Find-or-create on upload: an existing document is overwritten in place
///   so the container never holds a second copy
/// - Local expiry check before any request
/// - No retries; every failure is classified and surfaced
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::DriveAppDataStore;
/// use bridge_traits::storage::RemoteDocumentStore;
///
/// let store = DriveAppDataStore::new(http_client, clock, config.drive.clone());
/// store.put(&credential, "hello").await?;
/// assert_eq!(store.get(&credential).await?, Some("hello".to_string()));
/// ```
pub struct DriveAppDataStore {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    settings: DriveSettings,
}

impl DriveAppDataStore {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        settings: DriveSettings,
    ) -> Self {
        Self {
            http_client,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &DriveSettings {
        &self.settings
    }

    fn ensure_fresh(&self, credential: &Credential) -> Result<()> {
        if credential.is_expired_at(self.clock.now()) {
            warn!(account = %credential.account(), "Refusing request with expired credential");
            return Err(GoogleDriveError::CredentialExpired);
        }
        Ok(())
    }

    /// Execute a single authorized request and classify non-success statuses.
    async fn send(&self, credential: &Credential, request: HttpRequest) -> Result<HttpResponse> {
        let request = request
            .bearer_token(credential.access_token())
            .timeout(self.settings.request_timeout);

        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            debug!(status = response.status, "Drive request succeeded");
            Ok(response)
        } else {
            warn!(status = response.status, "Drive request failed");
            Err(GoogleDriveError::from_response(
                response.status,
                &response.body,
            ))
        }
    }

    fn list_url(&self, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/files?spaces={}&fields={}&pageSize={}",
            self.settings.api_base,
            urlencoding::encode(&self.settings.container),
            LIST_FIELDS,
            self.settings.page_size
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        url
    }

    /// Scan the container page by page for the configured document name.
    #[instrument(skip(self, credential))]
    async fn find_document(&self, credential: &Credential) -> Result<Option<DriveFile>> {
        let mut page_token: Option<String> = None;
        let mut scanned = 0usize;

        loop {
            let request = HttpRequest::new(HttpMethod::Get, self.list_url(page_token.as_deref()))
                .header("Accept", "application/json");
            let response = self.send(credential, request).await?;

            let page: FilesListResponse = serde_json::from_slice(&response.body).map_err(|e| {
                GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
            })?;

            scanned += page.files.len();

            if let Some(file) = page
                .files
                .into_iter()
                .find(|file| file.name == self.settings.document_name)
            {
                debug!(file_id = %file.id, scanned, "Found document");
                return Ok(Some(file));
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => {
                    debug!(scanned, "Document not present in container");
                    return Ok(None);
                }
            }
        }
    }

    async fn download(&self, credential: &Credential, file_id: &str) -> Result<String> {
        let url = format!(
            "{}/files/{}?alt=media",
            self.settings.api_base,
            urlencoding::encode(file_id)
        );
        let response = self
            .send(credential, HttpRequest::new(HttpMethod::Get, url))
            .await?;

        String::from_utf8(response.body.to_vec())
            .map_err(|e| GoogleDriveError::ParseError(format!("Document is not UTF-8: {}", e)))
    }

    async fn create(&self, credential: &Credential, text: &str) -> Result<String> {
        let metadata = FileMetadata {
            name: &self.settings.document_name,
            parents: [self.settings.container.as_str()],
            mime_type: DOCUMENT_MIME_TYPE,
        };
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| GoogleDriveError::ParseError(format!("Failed to encode metadata: {}", e)))?;

        let boundary = format!("onetap-{}", Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &metadata_json, text);

        let url = format!(
            "{}/files?uploadType=multipart&fields=id",
            self.settings.upload_base
        );
        let request = HttpRequest::new(HttpMethod::Post, url)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(Bytes::from(body));

        let response = self.send(credential, request).await?;
        parse_file_id(&response)
    }

    async fn overwrite(&self, credential: &Credential, file_id: &str, text: &str) -> Result<String> {
        let url = format!(
            "{}/files/{}?uploadType=media&fields=id",
            self.settings.upload_base,
            urlencoding::encode(file_id)
        );
        let request = HttpRequest::new(HttpMethod::Patch, url)
            .header("Content-Type", DOCUMENT_MIME_TYPE)
            .body(Bytes::from(text.to_owned()));

        let response = self.send(credential, request).await?;
        parse_file_id(&response)
    }

    async fn put_document(&self, credential: &Credential, text: &str) -> Result<DocumentId> {
        self.ensure_fresh(credential)?;

        let id = match self.find_document(credential).await? {
            Some(existing) => {
                debug!(file_id = %existing.id, "Overwriting existing document");
                self.overwrite(credential, &existing.id, text).await?
            }
            None => {
                debug!("Creating document");
                self.create(credential, text).await?
            }
        };

        info!(document_id = %id, length = text.len(), "Uploaded document");
        Ok(DocumentId::new(id))
    }

    async fn get_document(&self, credential: &Credential) -> Result<Option<String>> {
        self.ensure_fresh(credential)?;

        let Some(file) = self.find_document(credential).await? else {
            info!("No document stored yet");
            return Ok(None);
        };

        let text = self.download(credential, &file.id).await?;
        info!(document_id = %file.id, length = text.len(), "Downloaded document");
        Ok(Some(text))
    }
}

#[async_trait]
impl RemoteDocumentStore for DriveAppDataStore {
    #[instrument(skip(self, credential, text), fields(account = %credential.account()))]
    async fn put(&self, credential: &Credential, text: &str) -> DocumentResult<DocumentId> {
        Ok(self.put_document(credential, text).await?)
    }

    #[instrument(skip(self, credential), fields(account = %credential.account()))]
    async fn get(&self, credential: &Credential) -> DocumentResult<Option<String>> {
        match self.get_document(credential).await {
            Err(GoogleDriveError::BridgeError(e)) if self.settings.absent_on_transport_error => {
                warn!(error = %e, "Transport failure reported as absent document");
                Ok(None)
            }
            other => Ok(other?),
        }
    }
}

fn parse_file_id(response: &HttpResponse) -> Result<String> {
    let parsed: FileIdResponse = serde_json::from_slice(&response.body)
        .map_err(|e| GoogleDriveError::ParseError(format!("Failed to parse file id: {}", e)))?;
    Ok(parsed.id)
}

/// Assemble a `multipart/related` body: JSON metadata part, then content part.
fn multipart_related_body(boundary: &str, metadata_json: &str, text: &str) -> String {
    format!(
        "--{boundary}\r\n\
         Content-Type: application/json; charset=UTF-8\r\n\r\n\
         {metadata_json}\r\n\
         --{boundary}\r\n\
         Content-Type: {DOCUMENT_MIME_TYPE}; charset=UTF-8\r\n\r\n\
         {text}\r\n\
         --{boundary}--\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::storage::DocumentError;
    use bridge_traits::{AccountId, ErrorKind, FixedClock};
    use chrono::{Duration, TimeZone, Utc};
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    const API: &str = "https://drive.test/drive/v3";
    const UPLOAD: &str = "https://drive.test/upload/drive/v3";

    fn settings() -> DriveSettings {
        DriveSettings {
            api_base: API.to_string(),
            upload_base: UPLOAD.to_string(),
            page_size: 2,
            ..DriveSettings::default()
        }
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn store(mock_http: MockHttpClient, settings: DriveSettings) -> DriveAppDataStore {
        DriveAppDataStore::new(Arc::new(mock_http), Arc::new(FixedClock(now())), settings)
    }

    fn credential() -> Credential {
        Credential::new(AccountId::new("user@example.com"), "test_token")
            .with_expiry(now() + Duration::hours(1))
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn is_list(request: &HttpRequest, page_token: Option<&str>) -> bool {
        let base = request.method == HttpMethod::Get
            && request.url.starts_with(&format!("{}/files?spaces=appDataFolder", API))
            && request.url.contains("fields=nextPageToken,files(id,name)")
            && request.headers.get("Authorization") == Some(&"Bearer test_token".to_string());
        match page_token {
            Some(token) => base && request.url.ends_with(&format!("&pageToken={}", token)),
            None => base && !request.url.contains("pageToken="),
        }
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_related_body("b1", r#"{"name":"config.txt"}"#, "hello");

        assert!(body.starts_with("--b1\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"));
        assert!(body.contains("{\"name\":\"config.txt\"}\r\n--b1\r\n"));
        assert!(body.contains("Content-Type: text/plain; charset=UTF-8\r\n\r\nhello\r\n"));
        assert!(body.ends_with("--b1--\r\n"));
    }

    #[test]
    fn test_list_url() {
        let store = store(MockHttpClient::new(), settings());
        assert_eq!(
            store.list_url(None),
            format!(
                "{}/files?spaces=appDataFolder&fields=nextPageToken,files(id,name)&pageSize=2",
                API
            )
        );
        assert!(store.list_url(Some("a/b")).ends_with("&pageToken=a%2Fb"));
    }

    #[tokio::test]
    async fn test_get_downloads_first_match() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|r| is_list(r, None))
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"files":[
                        {"id":"other","name":"notes.txt"},
                        {"id":"first","name":"config.txt"},
                        {"id":"second","name":"config.txt"}
                    ]}"#,
                ))
            });
        mock_http
            .expect_execute()
            .withf(|r| r.method == HttpMethod::Get && r.url == format!("{}/files/first?alt=media", API))
            .times(1)
            .returning(|_| Ok(response(200, "hello")));

        let result = store(mock_http, settings()).get(&credential()).await;

        assert_eq!(result, Ok(Some("hello".to_string())));
    }

    #[tokio::test]
    async fn test_get_follows_pages_and_reports_absent() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|r| is_list(r, None))
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"nextPageToken":"p2","files":[{"id":"a","name":"a.txt"},{"id":"b","name":"b.txt"}]}"#,
                ))
            });
        mock_http
            .expect_execute()
            .withf(|r| is_list(r, Some("p2")))
            .times(1)
            .returning(|_| Ok(response(200, r#"{"files":[{"id":"c","name":"c.txt"}]}"#)));

        let result = store(mock_http, settings()).get(&credential()).await;

        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_get_empty_document_is_not_absent() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|r| is_list(r, None))
            .returning(|_| Ok(response(200, r#"{"files":[{"id":"doc","name":"config.txt"}]}"#)));
        mock_http
            .expect_execute()
            .withf(|r| r.url.ends_with("/files/doc?alt=media"))
            .returning(|_| Ok(response(200, "")));

        let result = store(mock_http, settings()).get(&credential()).await;

        assert_eq!(result, Ok(Some(String::new())));
    }

    #[tokio::test]
    async fn test_put_creates_when_absent() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|r| is_list(r, None))
            .times(1)
            .returning(|_| Ok(response(200, r#"{"files":[]}"#)));
        mock_http
            .expect_execute()
            .withf(|r| {
                let body = String::from_utf8(r.body.clone().unwrap_or_default().to_vec())
                    .unwrap_or_default();
                let content_type = r.headers.get("Content-Type").cloned().unwrap_or_default();
                r.method == HttpMethod::Post
                    && r.url == format!("{}/files?uploadType=multipart&fields=id", UPLOAD)
                    && content_type.starts_with("multipart/related; boundary=onetap-")
                    && body.contains(
                        r#"{"name":"config.txt","parents":["appDataFolder"],"mimeType":"text/plain"}"#,
                    )
                    && body.contains("\r\n\r\nhello\r\n")
            })
            .times(1)
            .returning(|_| Ok(response(200, r#"{"id":"new-doc"}"#)));

        let id = store(mock_http, settings())
            .put(&credential(), "hello")
            .await
            .unwrap();

        assert_eq!(id, DocumentId::new("new-doc"));
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_document() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|r| is_list(r, None))
            .times(1)
            .returning(|_| Ok(response(200, r#"{"files":[{"id":"doc","name":"config.txt"}]}"#)));
        mock_http
            .expect_execute()
            .withf(|r| {
                r.method == HttpMethod::Patch
                    && r.url == format!("{}/files/doc?uploadType=media&fields=id", UPLOAD)
                    && r.body.as_deref() == Some(b"world".as_slice())
            })
            .times(1)
            .returning(|_| Ok(response(200, r#"{"id":"doc"}"#)));
        mock_http
            .expect_execute()
            .withf(|r| r.method == HttpMethod::Post)
            .never();

        let id = store(mock_http, settings())
            .put(&credential(), "world")
            .await
            .unwrap();

        assert_eq!(id.as_str(), "doc");
    }

    #[tokio::test]
    async fn test_clear_uploads_empty_payload() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|r| is_list(r, None))
            .returning(|_| Ok(response(200, r#"{"files":[{"id":"doc","name":"config.txt"}]}"#)));
        mock_http
            .expect_execute()
            .withf(|r| r.method == HttpMethod::Patch && r.body.as_deref() == Some(b"".as_slice()))
            .times(1)
            .returning(|_| Ok(response(200, r#"{"id":"doc"}"#)));

        assert!(store(mock_http, settings()).clear(&credential()).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_credential_fails_without_request() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().never();

        let expired = Credential::new(AccountId::new("user@example.com"), "test_token")
            .with_expiry(now() - Duration::seconds(1));

        let store = store(mock_http, settings());
        let put = store.put(&expired, "hello").await;
        let get = store.get(&expired).await;

        assert_eq!(put.unwrap_err().kind(), ErrorKind::Auth);
        assert_eq!(get.unwrap_err().kind(), ErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_revoked_token_is_auth_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().returning(|_| {
            Ok(response(
                401,
                r#"{"error":{"code":401,"message":"Invalid Credentials","errors":[{"reason":"authError"}]}}"#,
            ))
        });

        let error = store(mock_http, settings())
            .put(&credential(), "hello")
            .await
            .unwrap_err();

        assert!(error.requires_consent());
    }

    #[tokio::test]
    async fn test_quota_error_is_service_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|r| is_list(r, None))
            .returning(|_| Ok(response(200, r#"{"files":[]}"#)));
        mock_http
            .expect_execute()
            .withf(|r| r.method == HttpMethod::Post)
            .returning(|_| {
                Ok(response(
                    403,
                    r#"{"error":{"code":403,"message":"The user's Drive storage quota has been exceeded.","errors":[{"reason":"storageQuotaExceeded"}]}}"#,
                ))
            });

        let error = store(mock_http, settings())
            .put(&credential(), "hello")
            .await
            .unwrap_err();

        assert!(matches!(error, DocumentError::Service { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_by_default() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Err(BridgeError::Connection("network unreachable".to_string())));

        let error = store(mock_http, settings())
            .get(&credential())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_transport_failure_reads_as_absent_when_enabled() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Err(BridgeError::Timeout("30s".to_string())));

        let settings = DriveSettings {
            absent_on_transport_error: true,
            ..settings()
        };
        let store = store(mock_http, settings);

        assert_eq!(store.get(&credential()).await, Ok(None));
        // uploads still surface the failure
        assert_eq!(
            store.put(&credential(), "x").await.unwrap_err().kind(),
            ErrorKind::Transport
        );
    }

    #[tokio::test]
    async fn test_malformed_list_response_is_service_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(200, "<html>captive portal</html>")));

        let error = store(mock_http, settings())
            .get(&credential())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Service);
    }
}

//! Loopback redirect consent handler
//!
//! Desktop hosts complete the OAuth consent step in the system browser. The
//! handler announces the authorization URL, then waits for the browser to be
//! redirected to `http://127.0.0.1:<port>/<path>` and extracts `code` and
//! `state` from that single request (RFC 8252 section 7.3).

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    ConsentCallback, ConsentHandler, IdentityError,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use url::Url;

const MAX_REQUEST_BYTES: usize = 8 * 1024;
const CONNECTION_DEADLINE: Duration = Duration::from_secs(5);

type UrlPresenter = Arc<dyn Fn(&str) + Send + Sync>;

/// Result of inspecting one request received on the loopback listener.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CallbackOutcome {
    /// Not the redirect path (favicon and the like)
    Ignored,
    Approved(ConsentCallback),
    Dismissed,
    Failed(String),
}

/// [`ConsentHandler`] that listens on the loopback redirect URI.
pub struct LoopbackConsentHandler {
    bind_addr: SocketAddr,
    callback_path: String,
    presenter: UrlPresenter,
}

impl LoopbackConsentHandler {
    /// Build a handler for a loopback redirect URI such as
    /// `http://127.0.0.1:8080/callback`.
    ///
    /// # Errors
    ///
    /// Fails when the URI is not an `http` loopback address with a port.
    pub fn from_redirect_uri(redirect_uri: &str) -> Result<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|e| BridgeError::NotAvailable(format!("Invalid redirect URI: {}", e)))?;

        if url.scheme() != "http" {
            return Err(BridgeError::NotAvailable(
                "Loopback redirect URI must use http".to_string(),
            ));
        }

        let ip = match url.host_str() {
            Some("localhost") => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Some(host) => host
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<IpAddr>()
                .ok()
                .filter(IpAddr::is_loopback)
                .ok_or_else(|| {
                    BridgeError::NotAvailable(format!("Redirect host {} is not loopback", host))
                })?,
            None => {
                return Err(BridgeError::NotAvailable(
                    "Redirect URI has no host".to_string(),
                ))
            }
        };

        let port = url.port().ok_or_else(|| {
            BridgeError::NotAvailable("Loopback redirect URI needs an explicit port".to_string())
        })?;

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            callback_path: url.path().to_string(),
            presenter: Arc::new(|authorization_url: &str| {
                eprintln!("Open this URL in your browser to sign in:\n{}", authorization_url);
            }),
        })
    }

    /// Replace how the authorization URL is shown to the user.
    pub fn with_presenter<F>(mut self, presenter: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.presenter = Arc::new(presenter);
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[async_trait]
impl ConsentHandler for LoopbackConsentHandler {
    async fn request_consent(
        &self,
        authorization_url: &str,
    ) -> std::result::Result<Option<ConsentCallback>, IdentityError> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| IdentityError::Transport(format!("Cannot listen on {}: {}", self.bind_addr, e)))?;

        info!(addr = %self.bind_addr, "Waiting for consent redirect");
        (self.presenter)(authorization_url);

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) =
                        accepted.map_err(|e| IdentityError::Transport(e.to_string()))?;
                    debug!(%peer, "Loopback connection accepted");
                    let callback_path = self.callback_path.clone();
                    connections.spawn(async move {
                        serve_connection(stream, peer, &callback_path).await
                    });
                }
                Some(served) = connections.join_next() => match served {
                    Ok(CallbackOutcome::Ignored) => continue,
                    Ok(CallbackOutcome::Approved(callback)) => return Ok(Some(callback)),
                    Ok(CallbackOutcome::Dismissed) => {
                        info!("User dismissed the consent screen");
                        return Ok(None);
                    }
                    Ok(CallbackOutcome::Failed(reason)) => {
                        return Err(IdentityError::Denied(reason))
                    }
                    Err(e) => warn!(error = %e, "Loopback connection task failed"),
                },
            }
        }
    }
}

/// Read one request and answer it. Connections that stay silent past
/// [`CONNECTION_DEADLINE`] (browser preconnects) are dropped as ignored.
async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    callback_path: &str,
) -> CallbackOutcome {
    let request = match timeout(CONNECTION_DEADLINE, read_request_head(&mut stream)).await {
        Ok(Ok(request)) => request,
        Ok(Err(e)) => {
            warn!(%peer, error = %e, "Malformed loopback request");
            return CallbackOutcome::Ignored;
        }
        Err(_) => {
            debug!(%peer, "Idle loopback connection dropped");
            return CallbackOutcome::Ignored;
        }
    };
    if request.is_empty() {
        return CallbackOutcome::Ignored;
    }

    let outcome = request
        .lines()
        .next()
        .map(|line| parse_request_line(line, callback_path))
        .unwrap_or(CallbackOutcome::Ignored);

    let (status, message) = match &outcome {
        CallbackOutcome::Ignored => ("404 Not Found", "Not found."),
        CallbackOutcome::Approved(_) => (
            "200 OK",
            "Sign-in complete. You can close this window and return to the app.",
        ),
        CallbackOutcome::Dismissed => ("200 OK", "Sign-in was cancelled."),
        CallbackOutcome::Failed(_) => ("400 Bad Request", "Sign-in failed."),
    };
    if let Err(e) = write_response(&mut stream, status, message).await {
        warn!(%peer, error = %e, "Failed to answer loopback request");
    }

    outcome
}

async fn read_request_head(stream: &mut TcpStream) -> Result<String> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

async fn write_response(stream: &mut TcpStream, status: &str, message: &str) -> Result<()> {
    let body = format!(
        "<!doctype html><html><body><p>{}</p></body></html>",
        message
    );
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Interpret `GET <target> HTTP/1.1` against the expected callback path.
fn parse_request_line(line: &str, callback_path: &str) -> CallbackOutcome {
    let mut parts = line.split_whitespace();
    let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
        return CallbackOutcome::Ignored;
    };

    let Ok(url) = Url::parse(&format!("http://127.0.0.1{}", target)) else {
        return CallbackOutcome::Failed("unparseable redirect".to_string());
    };

    if url.path() != callback_path {
        return CallbackOutcome::Ignored;
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match (error, code, state) {
        (Some(error), _, _) if error == "access_denied" => CallbackOutcome::Dismissed,
        (Some(error), _, _) => CallbackOutcome::Failed(error),
        (None, Some(code), Some(state)) => {
            CallbackOutcome::Approved(ConsentCallback { code, state })
        }
        _ => CallbackOutcome::Failed("redirect is missing code or state".to_string()),
    }
}

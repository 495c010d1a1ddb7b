//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `ConsentHandler` using a loopback redirect listener on `tokio::net`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LoopbackConsentHandler, ReqwestHttpClient};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let consent = LoopbackConsentHandler::from_redirect_uri("http://127.0.0.1:8080/callback")?;
//! ```

mod consent;
mod http;

pub use consent::LoopbackConsentHandler;
pub use http::ReqwestHttpClient;

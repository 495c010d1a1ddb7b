//! # Authentication Module
//!
//! Google sign-in for the OneTap Drive core.
//!
//! ## Overview
//!
//! This crate implements the identity capability: it runs the OAuth 2.0
//! authorization-code flow with PKCE against Google, requesting the `openid`,
//! `email` and `drive.appdata` scopes, and turns the token response into a
//! [`Credential`](bridge_traits::Credential) bound to one account.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization flow with PKCE (S256) and CSRF state checks
//! - Account identification from the OpenID `id_token`
//! - Host-driven consent UI through [`ConsentHandler`](bridge_traits::ConsentHandler)
//! - Bounded sign-in duration
//!
//! Tokens are kept in memory only; a restart requires signing in again.

pub mod error;
pub mod identity;
pub mod oauth;
pub mod types;

pub use error::{AuthError, Result};
pub use identity::{OAuthIdentityProvider, StaticTokenIdentity, DEFAULT_AUTH_TIMEOUT};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use types::{IdTokenClaims, OAuthTokens, DRIVE_APPDATA_SCOPE};

//! # Google Drive Provider
//!
//! Implements `RemoteDocumentStore` for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - A single-document store inside the `appDataFolder` space
//! - Find-or-create uploads through multipart create and media update
//! - Paginated lookup by name and media download
//! - Classification of Drive error envelopes into auth, transport and
//!   service failures

pub mod connector;
pub mod error;
pub mod types;

pub use connector::DriveAppDataStore;
pub use error::{GoogleDriveError, Result};

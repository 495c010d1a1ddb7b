//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the OneTap Drive core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the auth, provider and
//! session crates depend on. It establishes the logging conventions and the
//! event broadcasting mechanism the presentation layer observes.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};

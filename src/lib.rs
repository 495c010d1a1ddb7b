//! Workspace facade crate.
//!
//! Exposes feature flags that map onto the individual workspace crates so a
//! host application can depend on `onetap-workspace` alone. With the default
//! `desktop-shims` feature the desktop bootstrap of [`core_service`] is
//! available.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

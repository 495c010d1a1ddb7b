//! # Core Session
//!
//! The session holder: the single owner of the signed-in credential and the
//! locally known text of the remote document.
//!
//! ## Overview
//!
//! - [`SessionHandle`] - cloneable command interface to the session task
//! - [`SessionSnapshot`] - observable state published after every change
//! - [`SessionError`] - failures returned to callers
//!
//! ## Usage
//!
//! ```ignore
//! use core_session::SessionHandle;
//!
//! let session = SessionHandle::spawn(store, event_bus, &config.session);
//! session.sign_in(&identity).await?;
//! session.set_document("theme=dark").await?;
//!
//! let snapshot = session.wait_for_fetch().await?;
//! println!("{:?}", snapshot.document);
//! ```

pub mod error;
pub mod session;
pub mod state;

pub use error::{Result, SessionError};
pub use session::SessionHandle;
pub use state::{ReportedError, SessionSnapshot, SessionState};

//! Client core for revu.
//!
//! Everything the terminal frontend needs that is not rendering: the wire
//! types the review backend speaks, the HTTP gateway that talks to it, stored
//! sign-in credentials, and the two pure state models the UI is built around
//! (the flat comment store and the arena-backed project tree). Nothing in this
//! crate touches ratatui or the terminal.

pub mod api;
pub mod auth;
pub mod comments;
pub mod error;
pub mod fs;
pub mod types;

pub use error::{ApiError, Result};

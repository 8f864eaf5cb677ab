//! Core services for account operations.
//!
//! This module provides the write pipeline and the request dispatch that
//! the serving layer calls into.

pub mod dispatch;
pub mod writer;

pub use dispatch::{Request, Response, Status, dispatch};
pub use writer::{AccountWriter, PasswordUpdate};

//! # useradmin-core
//!
//! Core business logic for the `useradmin` backend.
//!
//! This crate provides:
//! - Account and role model
//! - Payload validation with an ordered error digest
//! - Password hashing (`bcrypt`)
//! - Local storage (`SQLite`)
//! - The account write pipeline (create, edit, lookup, delete)
//! - Request dispatch for the serving layer
//! - Default account seeding

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
mod error;
pub mod seed;
pub mod service;

pub use account::{
    Account, AccountId, AccountPayload, AccountRepository, AccountStore, BcryptHasher,
    PasswordHasher, Role, RoleId, ValidationError, ValidationResult, validate_account,
};
pub use error::{Error, Result};
pub use seed::seed_default_accounts;
pub use service::{AccountWriter, PasswordUpdate, Request, Response, Status, dispatch};

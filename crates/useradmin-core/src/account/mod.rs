//! Account management module.
//!
//! Provides the account model, payload validation, password hashing, and
//! storage.

mod model;
pub mod password;
mod repository;
mod store;
pub mod validation;

pub use model::{Account, AccountId, AccountPayload, Role, RoleId};
pub use password::{BcryptHasher, PasswordHasher};
pub use repository::AccountRepository;
pub use store::AccountStore;
pub use validation::{ValidationError, ValidationResult, validate_account};

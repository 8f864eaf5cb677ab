//! Persistence interface used by the account writer.

use std::future::Future;

use super::model::{Account, AccountId, Role, RoleId};
use crate::Result;

/// Account persistence.
///
/// Implementations own atomicity and uniqueness: a [`save`](Self::save)
/// commits the account row and its role associations together, and a
/// username collision must surface as
/// [`Error::DuplicateUsername`](crate::Error::DuplicateUsername) from the
/// store's own constraint, not from a prior lookup.
pub trait AccountStore: Send + Sync {
    /// Returns every account, ordered by id.
    fn find_all(&self) -> impl Future<Output = Result<Vec<Account>>> + Send;

    /// Looks up an account by id.
    fn find_by_id(&self, id: AccountId) -> impl Future<Output = Result<Option<Account>>> + Send;

    /// Looks up an account by username.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Account>>> + Send;

    /// Inserts (no id) or replaces (with id) an account and its role set.
    ///
    /// Returns the stored account with its id populated.
    fn save(&self, account: Account) -> impl Future<Output = Result<Account>> + Send;

    /// Deletes an account and its role associations.
    ///
    /// Returns whether a row was removed; a missing id is not an error.
    fn delete_by_id(&self, id: AccountId) -> impl Future<Output = Result<bool>> + Send;

    /// Looks up a role by id.
    fn find_role_by_id(&self, id: RoleId) -> impl Future<Output = Result<Option<Role>>> + Send;
}

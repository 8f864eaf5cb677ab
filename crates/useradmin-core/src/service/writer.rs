//! Account write pipeline.
//!
//! [`AccountWriter`] validates payloads, hashes passwords, resolves role
//! sets and commits accounts through an [`AccountStore`].

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::account::{
    Account, AccountId, AccountPayload, AccountStore, PasswordHasher, Role, RoleId,
    validate_account,
};
use crate::{Error, Result};

/// What an edit does with the submitted password field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordUpdate {
    /// The field equals the stored hash; keep it without hashing again.
    Keep,
    /// The field is a new plaintext password and must be hashed.
    Rehash,
}

impl PasswordUpdate {
    /// Decides by byte comparison of the submitted field against the stored
    /// hash.
    ///
    /// A client that echoes the stored hash back leaves the password alone.
    /// A new plaintext that happens to equal the stored hash string is also
    /// kept unhashed; clients that need to set such a value cannot.
    #[must_use]
    pub fn decide(stored_hash: &str, submitted: &str) -> Self {
        if stored_hash.as_bytes() == submitted.as_bytes() {
            Self::Keep
        } else {
            Self::Rehash
        }
    }
}

/// Orchestrates account creation, edits, lookups and removal.
pub struct AccountWriter<S, H> {
    store: S,
    hasher: H,
}

impl<S, H> AccountWriter<S, H>
where
    S: AccountStore,
    H: PasswordHasher,
{
    /// Creates a writer over the given store and hasher.
    #[must_use]
    pub const fn new(store: S, hasher: H) -> Self {
        Self { store, hasher }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validates and stores a new account with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid payload,
    /// [`Error::UnknownRole`] for a role id that does not exist,
    /// [`Error::DuplicateUsername`] if the username is taken, or a
    /// database/hashing error.
    pub async fn create(&self, payload: AccountPayload) -> Result<Account> {
        validate_account(&payload)?;

        let roles = self.resolve_roles(&payload.roles).await?;
        let password = self.hasher.hash(&payload.password)?;
        let account = self
            .store
            .save(payload.into_account(None, password, roles))
            .await?;

        info!(
            "Created account '{}' with roles {:?}",
            account.username,
            account.role_ids()
        );
        Ok(account)
    }

    /// Validates and replaces an existing account.
    ///
    /// The password is hashed again only when the submitted field differs
    /// from the stored hash (see [`PasswordUpdate::decide`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid payload,
    /// [`Error::AccountNotFound`] if no account has this id,
    /// [`Error::UnknownRole`], [`Error::DuplicateUsername`] when renaming to
    /// a taken username, or a database/hashing error.
    pub async fn edit(&self, id: AccountId, payload: AccountPayload) -> Result<Account> {
        validate_account(&payload)?;

        let existing = self.get_by_id(id).await?;
        let roles = self.resolve_roles(&payload.roles).await?;

        let password = match PasswordUpdate::decide(&existing.password, &payload.password) {
            PasswordUpdate::Keep => {
                debug!("Password for account {id} unchanged, keeping stored hash");
                existing.password
            }
            PasswordUpdate::Rehash => self.hasher.hash(&payload.password)?,
        };

        let account = self
            .store
            .save(payload.into_account(Some(id), password, roles))
            .await?;

        info!(
            "Updated account {id} ({}) with roles {:?}",
            account.username,
            account.role_ids()
        );
        Ok(account)
    }

    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if absent, or a database error.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Account> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("id {id}")))
    }

    /// Looks up an account by username, e.g. for the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if absent, or a database error.
    pub async fn find_by_username(&self, username: &str) -> Result<Account> {
        self.store
            .find_by_username(username)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("username {username}")))
    }

    /// Lists every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<Account>> {
        self.store.find_all().await
    }

    /// Deletes an account. Deleting a missing id succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: AccountId) -> Result<()> {
        if self.store.delete_by_id(id).await? {
            info!("Deleted account {id}");
        }
        Ok(())
    }

    /// Resolves role ids to reference rows, dropping duplicates.
    async fn resolve_roles(&self, ids: &[RoleId]) -> Result<Vec<Role>> {
        let unique: BTreeSet<RoleId> = ids.iter().copied().collect();
        let mut roles = Vec::with_capacity(unique.len());
        for id in unique {
            let role = self
                .store
                .find_role_by_id(id)
                .await?
                .ok_or(Error::UnknownRole(id))?;
            roles.push(role);
        }
        Ok(roles)
    }
}

//! Default account seeding.
//!
//! Run once at startup. Accounts whose username already exists are left
//! untouched, so running it again is harmless.

use tracing::{debug, info};

use crate::account::{AccountPayload, AccountStore, PasswordHasher, RoleId};
use crate::service::AccountWriter;
use crate::{Error, Result};

/// The accounts a fresh installation starts with.
#[must_use]
pub fn default_accounts() -> Vec<AccountPayload> {
    vec![
        AccountPayload::new("user", "12345", &[RoleId::USER]).with_profile(
            "User",
            "LastUser",
            25,
            "user@mail.com",
        ),
        AccountPayload::new("admin", "admin", &[RoleId::USER, RoleId::ADMIN]).with_profile(
            "Admin",
            "LastAdmin",
            30,
            "admin@mail.com",
        ),
    ]
}

/// Creates each default account whose username is not taken yet.
///
/// Returns the number of accounts created.
///
/// # Errors
///
/// Returns an error if a lookup or write fails for any reason other than the
/// account already existing.
pub async fn seed_default_accounts<S, H>(writer: &AccountWriter<S, H>) -> Result<usize>
where
    S: AccountStore,
    H: PasswordHasher,
{
    let mut created = 0;
    for payload in default_accounts() {
        if writer.store().find_by_username(&payload.username).await?.is_some() {
            debug!("Default account '{}' already present", payload.username);
            continue;
        }

        match writer.create(payload).await {
            Ok(_) => created += 1,
            // Another process seeded it between the lookup and the insert
            Err(Error::DuplicateUsername(username)) => {
                debug!("Default account '{username}' created concurrently");
            }
            Err(e) => return Err(e),
        }
    }

    if created > 0 {
        info!("Seeded {created} default accounts");
    }
    Ok(created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account::{AccountRepository, BcryptHasher, validate_account};

    async fn writer() -> AccountWriter<AccountRepository, BcryptHasher> {
        let repo = AccountRepository::in_memory().await.unwrap();
        AccountWriter::new(repo, BcryptHasher::new(4))
    }

    #[test]
    fn test_default_accounts_are_valid() {
        for payload in default_accounts() {
            assert!(validate_account(&payload).is_ok(), "{}", payload.username);
        }
    }

    #[tokio::test]
    async fn test_seed_creates_defaults_once() {
        let writer = writer().await;

        assert_eq!(seed_default_accounts(&writer).await.unwrap(), 2);
        assert_eq!(seed_default_accounts(&writer).await.unwrap(), 0);

        let accounts = writer.list().await.unwrap();
        assert_eq!(accounts.len(), 2);

        let admin = writer.find_by_username("admin").await.unwrap();
        assert_eq!(admin.role_ids(), vec![RoleId::USER, RoleId::ADMIN]);
        assert_ne!(admin.password, "admin");

        let user = writer.find_by_username("user").await.unwrap();
        assert_eq!(user.role_ids(), vec![RoleId::USER]);
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_account() {
        let writer = writer().await;

        let custom = AccountPayload::new("admin", "s3cret", &[RoleId::ADMIN]).with_profile(
            "Site",
            "Owner",
            50,
            "owner@example.com",
        );
        let existing = writer.create(custom).await.unwrap();

        assert_eq!(seed_default_accounts(&writer).await.unwrap(), 1);
        let admin = writer.find_by_username("admin").await.unwrap();
        assert_eq!(admin.password, existing.password);
        assert_eq!(admin.email, "owner@example.com");
    }
}

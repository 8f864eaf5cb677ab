//! Account model types.

use serde::{Deserialize, Serialize};

/// Unique identifier for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl AccountId {
    /// Create a new account ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub i64);

impl RoleId {
    /// The `ROLE_USER` reference row.
    pub const USER: Self = Self(1);
    /// The `ROLE_ADMIN` reference row.
    pub const ADMIN: Self = Self(2);

    /// Create a new role ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A role an account can hold.
///
/// Roles are reference data seeded with the schema; they are never created
/// or modified through the account write pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Role name, e.g. `ROLE_ADMIN`.
    pub name: String,
}

/// A stored user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier (None for unsaved accounts).
    pub id: Option<AccountId>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Age in years.
    pub age: i16,
    /// Email address.
    pub email: String,
    /// Login name, unique across all accounts.
    pub username: String,
    /// Password hash. Never plaintext once persisted.
    pub password: String,
    /// Roles held by the account, ordered by role id.
    pub roles: Vec<Role>,
}

impl Account {
    /// Returns the ids of the roles this account holds.
    #[must_use]
    pub fn role_ids(&self) -> Vec<RoleId> {
        self.roles.iter().map(|role| role.id).collect()
    }
}

/// Incoming account payload for create and edit requests.
///
/// Edits resend the whole record; every field replaces the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountPayload {
    /// Client-supplied id. Ignored by the writer; edits take the id from the
    /// request target.
    pub id: Option<AccountId>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Age in years.
    pub age: i16,
    /// Email address.
    pub email: String,
    /// Login name.
    pub username: String,
    /// Plaintext password, or the stored hash echoed back unchanged.
    pub password: String,
    /// Ids of the roles to assign.
    pub roles: Vec<RoleId>,
}

impl AccountPayload {
    /// Creates a payload with the given credentials and roles.
    #[must_use]
    pub fn new(username: &str, password: &str, roles: &[RoleId]) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            roles: roles.to_vec(),
            ..Default::default()
        }
    }

    /// Sets the profile fields.
    #[must_use]
    pub fn with_profile(
        mut self,
        first_name: &str,
        last_name: &str,
        age: i16,
        email: &str,
    ) -> Self {
        self.first_name = first_name.to_string();
        self.last_name = last_name.to_string();
        self.age = age;
        self.email = email.to_string();
        self
    }

    /// Builds an account from this payload with resolved roles and the
    /// password value to store.
    #[must_use]
    pub fn into_account(
        self,
        id: Option<AccountId>,
        password: String,
        roles: Vec<Role>,
    ) -> Account {
        Account {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            email: self.email,
            username: self.username,
            password,
            roles,
        }
    }
}

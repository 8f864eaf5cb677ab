//! Account storage repository.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use tracing::{debug, warn};

use super::model::{Account, AccountId, Role, RoleId};
use super::store::AccountStore;
use crate::{Error, Result};

/// Role reference rows seeded with the schema.
const REFERENCE_ROLES: [(RoleId, &str); 2] =
    [(RoleId::USER, "ROLE_USER"), (RoleId::ADMIN, "ROLE_ADMIN")];

/// Repository for account storage and retrieval.
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// The single connection is never recycled; dropping it drops the data.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Closes the connection pool, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize database schema and role reference data.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                age INTEGER NOT NULL,
                email TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS roles (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS account_roles (
                account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                role_id INTEGER NOT NULL REFERENCES roles(id),
                PRIMARY KEY (account_id, role_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        for (id, name) in REFERENCE_ROLES {
            sqlx::query("INSERT OR IGNORE INTO roles (id, name) VALUES (?, ?)")
                .bind(id.0)
                .bind(name)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}

/// Loads the roles of a single account.
async fn roles_of(conn: &mut SqliteConnection, id: AccountId) -> Result<Vec<Role>> {
    let rows = sqlx::query(
        r"
        SELECT r.id, r.name
        FROM account_roles ar
        JOIN roles r ON r.id = ar.role_id
        WHERE ar.account_id = ?
        ORDER BY r.id
        ",
    )
    .bind(id.0)
    .fetch_all(&mut *conn)
    .await?;

    let roles: Vec<Role> = rows.iter().map(row_to_role).collect::<sqlx::Result<_>>()?;
    Ok(roles)
}

/// Loads role assignments for every account, keyed by account id.
async fn all_role_assignments(
    conn: &mut SqliteConnection,
) -> Result<HashMap<AccountId, Vec<Role>>> {
    let rows = sqlx::query(
        r"
        SELECT ar.account_id, r.id, r.name
        FROM account_roles ar
        JOIN roles r ON r.id = ar.role_id
        ORDER BY ar.account_id, r.id
        ",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut assignments: HashMap<AccountId, Vec<Role>> = HashMap::new();
    for row in &rows {
        let account_id = AccountId::new(row.try_get("account_id")?);
        assignments
            .entry(account_id)
            .or_default()
            .push(row_to_role(row)?);
    }
    Ok(assignments)
}

/// Converts an optional account row into an account with its roles.
async fn with_roles(
    conn: &mut SqliteConnection,
    row: Option<SqliteRow>,
) -> Result<Option<Account>> {
    let Some(row) = row else {
        return Ok(None);
    };
    let mut account = row_to_account(&row)?;
    if let Some(id) = account.id {
        account.roles = roles_of(conn, id).await?;
    }
    Ok(Some(account))
}

// Reads run inside a transaction so an account row and its role rows come
// from the same snapshot.
impl AccountStore for AccountRepository {
    async fn find_all(&self) -> Result<Vec<Account>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r"
            SELECT id, first_name, last_name, age, email, username, password
            FROM accounts
            ORDER BY id ASC
            ",
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut assignments = all_role_assignments(&mut tx).await?;
        tx.commit().await?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut account = row_to_account(row)?;
            if let Some(id) = account.id {
                account.roles = assignments.remove(&id).unwrap_or_default();
            }
            accounts.push(account);
        }

        debug!("Loaded {} accounts", accounts.len());
        Ok(accounts)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r"
            SELECT id, first_name, last_name, age, email, username, password
            FROM accounts
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let account = with_roles(&mut tx, row).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r"
            SELECT id, first_name, last_name, age, email, username, password
            FROM accounts
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(&mut *tx)
        .await?;

        let account = with_roles(&mut tx, row).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn save(&self, mut account: Account) -> Result<Account> {
        let mut tx = self.pool.begin().await?;

        let id = if let Some(id) = account.id {
            // Full-record replace
            let result = sqlx::query(
                r"
                UPDATE accounts SET
                    first_name = ?, last_name = ?, age = ?,
                    email = ?, username = ?, password = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = ?
                ",
            )
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(account.age)
            .bind(&account.email)
            .bind(&account.username)
            .bind(&account.password)
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, &account.username))?;

            if result.rows_affected() == 0 {
                return Err(Error::AccountNotFound(format!("id {id}")));
            }
            id
        } else {
            let result = sqlx::query(
                r"
                INSERT INTO accounts (first_name, last_name, age, email, username, password)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(account.age)
            .bind(&account.email)
            .bind(&account.username)
            .bind(&account.password)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, &account.username))?;

            AccountId::new(result.last_insert_rowid())
        };

        // Replace the role set
        sqlx::query("DELETE FROM account_roles WHERE account_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

        for role in &account.roles {
            sqlx::query("INSERT INTO account_roles (account_id, role_id) VALUES (?, ?)")
                .bind(id.0)
                .bind(role.id.0)
                .execute(&mut *tx)
                .await
                .map_err(|e| role_error(e, role.id))?;
        }

        tx.commit().await?;

        account.id = Some(id);
        debug!(
            "Saved account {} ({}) with {} roles",
            id,
            account.username,
            account.roles.len()
        );
        Ok(account)
    }

    async fn delete_by_id(&self, id: AccountId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM account_roles WHERE account_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if !deleted {
            debug!("Delete of account {id} matched no rows");
        }
        Ok(deleted)
    }

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_role).transpose()?)
    }
}

/// Translates a uniqueness violation on the accounts table into
/// [`Error::DuplicateUsername`].
fn write_error(err: sqlx::Error, username: &str) -> Error {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        warn!("Username '{username}' is already taken");
        return Error::DuplicateUsername(username.to_string());
    }
    Error::Database(err)
}

/// Translates a foreign key violation on `account_roles` into
/// [`Error::UnknownRole`].
fn role_error(err: sqlx::Error, role_id: RoleId) -> Error {
    if let sqlx::Error::Database(db) = &err
        && db.is_foreign_key_violation()
    {
        return Error::UnknownRole(role_id);
    }
    Error::Database(err)
}

/// Convert a database row to an Account without roles.
fn row_to_account(row: &SqliteRow) -> sqlx::Result<Account> {
    Ok(Account {
        id: Some(AccountId::new(row.try_get("id")?)),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        age: row.try_get("age")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        roles: Vec::new(),
    })
}

fn row_to_role(row: &SqliteRow) -> sqlx::Result<Role> {
    Ok(Role {
        id: RoleId::new(row.try_get("id")?),
        name: row.try_get("name")?,
    })
}

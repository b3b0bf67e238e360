//! Identity and role records.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{Record, Table, TableStore};

/// Username seeded when the users file is absent at first load.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
/// Password of the seeded admin account. A known, accepted weakness;
/// changing it requires an explicit migration note.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Access role of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Employee => write!(f, "employee"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(Error::InvalidInput(format!("unknown role '{other}'"))),
        }
    }
}

/// One stored account. Passwords are kept as-is; hashing is explicitly out
/// of scope of the observed behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Role")]
    pub role: Role,
}

impl Record for User {
    const COLUMNS: &'static [&'static str] = &["Username", "Password", "Role"];
}

/// Owns the users table: authentication lookups, registration, deletion.
pub struct UserDirectory {
    store: TableStore<User>,
}

impl UserDirectory {
    /// Opens the directory at `path`. If the backing file is absent the
    /// directory is seeded with the single default admin account.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = TableStore::open(path);
        if !store.path().exists() {
            let seeded = Table::new().append(User {
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                password: DEFAULT_ADMIN_PASSWORD.to_string(),
                role: Role::Admin,
            });
            store.save(&seeded)?;
            tracing::info!(path = %store.path().display(), "seeded default admin account");
        }
        Ok(Self { store })
    }

    /// Returns the stored role only when `username` exists and `password`
    /// matches exactly. Recording the login event is the caller's job.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<Role>> {
        let table = self.store.load()?;
        Ok(table
            .iter()
            .find(|user| user.username == username && user.password == password)
            .map(|user| user.role))
    }

    /// Inserts a new account. Usernames are unique; passwords are not.
    pub fn register(&self, username: &str, password: &str, role: Role) -> Result<()> {
        if username.trim().is_empty() {
            return Err(Error::InvalidInput("username cannot be empty".to_string()));
        }
        if password.trim().is_empty() {
            return Err(Error::InvalidInput("password cannot be empty".to_string()));
        }
        let user = User {
            username: username.to_string(),
            password: password.to_string(),
            role,
        };
        self.store.update(|table| {
            if table.iter().any(|existing| existing.username == username) {
                return Err(Error::DuplicateUser(username.to_string()));
            }
            Ok(table.append(user))
        })?;
        tracing::info!(username, %role, "registered account");
        Ok(())
    }

    /// Removes the account, returning `false` when it was never present.
    pub fn delete(&self, username: &str) -> Result<bool> {
        let mut removed = false;
        self.store.update(|table| {
            let mut rows = table.into_rows();
            let before = rows.len();
            rows.retain(|user| user.username != username);
            removed = rows.len() != before;
            Ok(Table::from_rows(rows))
        })?;
        Ok(removed)
    }

    /// Usernames with the employee role, in directory order. These are the
    /// only valid assignment targets for new tasks.
    pub fn list_employees(&self) -> Result<Vec<String>> {
        let table = self.store.load()?;
        Ok(table
            .iter()
            .filter(|user| user.role == Role::Employee)
            .map(|user| user.username.clone())
            .collect())
    }

    /// Full credential dump, in directory order. Admin-only at the access
    /// control layer.
    pub fn list_all(&self) -> Result<Vec<User>> {
        Ok(self.store.load()?.into_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> (tempfile::TempDir, UserDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let users = UserDirectory::open(dir.path().join("users.csv")).unwrap();
        (dir, users)
    }

    #[test]
    fn absent_file_seeds_exactly_the_default_admin() {
        let (_dir, users) = directory();

        let all = users.list_all().unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].username, "admin");
        assert_eq!(all[0].password, "admin123");
        assert_eq!(all[0].role, Role::Admin);
    }

    #[test]
    fn present_but_empty_file_is_not_reseeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, "Username,Password,Role\n").unwrap();

        let users = UserDirectory::open(&path).unwrap();

        assert!(users.list_all().unwrap().is_empty());
    }

    #[test]
    fn authenticate_returns_stored_role_on_exact_match() {
        let (_dir, users) = directory();
        users.register("alice", "s3cret", Role::Employee).unwrap();

        assert_eq!(
            users.authenticate("alice", "s3cret").unwrap(),
            Some(Role::Employee)
        );
        assert_eq!(users.authenticate("alice", "S3CRET").unwrap(), None);
        assert_eq!(users.authenticate("nobody", "s3cret").unwrap(), None);
    }

    #[test]
    fn duplicate_registration_is_rejected_regardless_of_payload() {
        let (_dir, users) = directory();
        users.register("alice", "one", Role::Employee).unwrap();

        let err = users.register("alice", "two", Role::Admin).unwrap_err();

        assert!(matches!(err, Error::DuplicateUser(name) if name == "alice"));
    }

    #[test]
    fn blank_username_or_password_is_invalid_input() {
        let (_dir, users) = directory();

        assert!(matches!(
            users.register("   ", "pw", Role::Employee),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            users.register("bob", " \t", Role::Employee),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn delete_reports_whether_the_user_existed() {
        let (_dir, users) = directory();
        users.register("alice", "pw", Role::Employee).unwrap();

        assert!(users.delete("alice").unwrap());
        assert!(!users.delete("alice").unwrap());
        assert_eq!(users.authenticate("alice", "pw").unwrap(), None);
    }

    #[test]
    fn list_employees_excludes_admins_and_keeps_order() {
        let (_dir, users) = directory();
        users.register("zoe", "pw", Role::Employee).unwrap();
        users.register("root2", "pw", Role::Admin).unwrap();
        users.register("amir", "pw", Role::Employee).unwrap();

        assert_eq!(users.list_employees().unwrap(), vec!["zoe", "amir"]);
    }
}

//! File-backed user store.
//!
//! The whole collection lives in memory and is rewritten to a single JSON
//! document after every successful mutation. Lookups are linear scans by
//! exact (case-sensitive) username.

use crate::error::{AccountError, Result};
use crate::user::{hash_password, NewUser, User};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const DEFAULT_DATA_FILE: &str = "data/users.json";

/// Owns the user list and its backing file
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    users: Vec<User>,
}

impl UserStore {
    /// Open a store, treating any load failure as an empty collection.
    ///
    /// The failure is logged. A later save will overwrite whatever was on
    /// disk, so prefer [`UserStore::try_open`] when the file must not be lost.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = match read_users(&path) {
            Ok(users) => {
                info!("Loaded {} users from {}", users.len(), path.display());
                users
            }
            Err(e) => {
                error!("Failed to load users: {}", e);
                Vec::new()
            }
        };
        Self { path, users }
    }

    /// Open a store, returning an error if the backing file exists but
    /// cannot be read or parsed. A missing file yields an empty store.
    pub fn try_open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let users = read_users(&path)?;
        info!("Loaded {} users from {}", users.len(), path.display());
        Ok(Self { path, users })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All users in insertion order
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    fn get_user_mut(&mut self, username: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.username == username)
    }

    /// Write the full collection to the backing file.
    ///
    /// The directory is created if needed and the file is replaced via a
    /// rename, so readers never observe a half-written document.
    pub fn save(&self) -> Result<()> {
        match write_users(&self.path, &self.users) {
            Ok(()) => {
                info!("Saved {} users to {}", self.users.len(), self.path.display());
                Ok(())
            }
            Err(e) => {
                error!("Failed to save users: {}", e);
                Err(e)
            }
        }
    }

    /// Register a new account. Fails if the username is taken.
    ///
    /// On a save failure the user stays registered in memory and the error
    /// is returned so the caller can retry [`UserStore::save`].
    pub fn register(&mut self, new_user: NewUser) -> Result<&User> {
        if self.get_user(&new_user.username).is_some() {
            warn!(
                "Registration failed: username {} already exists",
                new_user.username
            );
            return Err(AccountError::DuplicateUser(new_user.username));
        }

        let username = new_user.username.clone();
        self.users.push(new_user.into_user());
        self.save()?;
        info!("Registered user: {}", username);

        let index = self.users.len() - 1;
        Ok(&self.users[index])
    }

    /// Authenticate and return the matching record, hash included.
    pub fn login(&self, username: &str, password: &str) -> Result<&User> {
        match self.get_user(username) {
            Some(user) if user.verify_password(password) => {
                info!("User {} logged in", username);
                Ok(user)
            }
            _ => {
                warn!("Login failed: invalid username or password");
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    /// Replace the password hash after checking the old password.
    ///
    /// The new password is not compared against the old one and may be empty.
    pub fn change_password(
        &mut self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let Some(user) = self.get_user_mut(username) else {
            warn!("Password change failed: invalid username or old password");
            return Err(AccountError::InvalidCredentials);
        };
        if !user.verify_password(old_password) {
            warn!("Password change failed: invalid username or old password");
            return Err(AccountError::InvalidCredentials);
        }

        user.password_hash = hash_password(new_password);
        self.save()?;
        info!("User {} changed password", username);
        Ok(())
    }

    /// Overwrite both contact fields.
    ///
    /// `None` clears the stored value; there is no leave-unchanged mode.
    pub fn update_user_info(
        &mut self,
        username: &str,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<()> {
        let Some(user) = self.get_user_mut(username) else {
            warn!("Update user info failed: user {} does not exist", username);
            return Err(AccountError::UserNotFound(username.to_string()));
        };

        user.email = email;
        user.phone = phone;
        self.save()?;
        info!("Updated info for user {}", username);
        Ok(())
    }

    /// Delete an account and persist the shortened list
    pub fn remove_user(&mut self, username: &str) -> Result<User> {
        let Some(index) = self.users.iter().position(|u| u.username == username) else {
            warn!("Remove user failed: user {} does not exist", username);
            return Err(AccountError::UserNotFound(username.to_string()));
        };

        let removed = self.users.remove(index);
        self.save()?;
        info!("Removed user {}", username);
        Ok(removed)
    }
}

fn read_users(path: &Path) -> Result<Vec<User>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| AccountError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| AccountError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_users(path: &Path, users: &[User]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| AccountError::io(dir, e))?;

    let content = serde_json::to_string_pretty(users).map_err(AccountError::Serialize)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| AccountError::io(dir, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| AccountError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| AccountError::io(path, e.error))?;
    Ok(())
}

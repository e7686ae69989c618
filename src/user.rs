//! User records and password hashing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role tag carried on every user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role '{}', expected admin or user", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored account.
///
/// Serialized field-for-field into the backing file. Absent contact fields
/// are written as `null` and read back from either `null` or a missing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl User {
    /// Check a plaintext password against the stored hash
    pub fn verify_password(&self, password: &str) -> bool {
        self.password_hash == hash_password(password)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for registering a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role: Role::default(),
            email: None,
            phone: None,
        }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }

    pub(crate) fn into_user(self) -> User {
        User {
            password_hash: hash_password(&self.password),
            username: self.username,
            role: self.role,
            email: self.email,
            phone: self.phone,
        }
    }
}

/// Unsalted SHA-256 of the UTF-8 password, as lowercase hex.
///
/// Kept single-round so hashes already in existing user files stay valid.
pub fn hash_password(password: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_known_digests() {
        assert_eq!(
            hash_password(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let hash = hash_password("Secret!");
        assert_eq!(hash.len(), 64);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("guest".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_user_serializes_all_fields() {
        let user = NewUser::new("alice", "pw").role(Role::Admin).into_user();
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["username"], "alice");
        assert_eq!(value["role"], "admin");
        assert_eq!(value["password_hash"], hash_password("pw"));
        assert!(value["email"].is_null());
        assert!(value["phone"].is_null());
    }

    #[test]
    fn test_user_deserializes_missing_optionals() {
        let json = r#"{"username":"bob","password_hash":"x","role":"user"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.email.is_none());
        assert!(user.phone.is_none());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let json = r#"{"username":"bob","password_hash":"x","role":"root"}"#;
        assert!(serde_json::from_str::<User>(json).is_err());
    }

    #[test]
    fn test_verify_password() {
        let user = NewUser::new("carol", "hunter2").into_user();
        assert!(user.verify_password("hunter2"));
        assert!(!user.verify_password("hunter3"));
        assert!(!user.is_admin());
    }
}

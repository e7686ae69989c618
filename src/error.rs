use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by the user store.
///
/// The first three variants are business-rule outcomes; the rest mean the
/// backing file could not be read or written.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("user '{0}' not found")]
    UserNotFound(String),

    /// Unknown username and wrong password are deliberately indistinguishable.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("user '{0}' already exists")]
    DuplicateUser(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize users: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl AccountError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the in-memory state may have diverged from the backing file.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Parse { .. } | Self::Serialize(_)
        )
    }
}

pub type Result<T, E = AccountError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_are_not_persistence() {
        assert!(!AccountError::UserNotFound("bob".to_string()).is_persistence());
        assert!(!AccountError::InvalidCredentials.is_persistence());
        assert!(!AccountError::DuplicateUser("bob".to_string()).is_persistence());
    }

    #[test]
    fn test_io_error_is_persistence() {
        let err = AccountError::io(
            "data/users.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_persistence());
        assert!(err.to_string().contains("data/users.json"));
    }

    #[test]
    fn test_credentials_message_is_generic() {
        let msg = AccountError::InvalidCredentials.to_string();
        assert_eq!(msg, "invalid username or password");
    }
}

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("no passphrase provided")]
    EmptyPassphrase,

    #[error("authentication failed: wrong passphrase or tampered record")]
    Authentication,

    #[error("record encryption failed")]
    Encryption,

    #[error("malformed record: {0}")]
    Format(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("backup rotation failed at {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no account with created timestamp {0}")]
    NotFound(String),

    #[error("another account already uses created timestamp {0}")]
    DuplicateCreated(String),

    #[error("invalid account: {0}")]
    InvalidAccount(String),

    #[error("password length {0} is too short (minimum {min})", min = crate::generator::MIN_PASSWORD_LENGTH)]
    PasswordLength(usize),
}

impl VaultError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn backup(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Backup {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = VaultError> = std::result::Result<T, E>;

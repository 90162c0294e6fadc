use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in EggCarton.
#[derive(Debug, Error)]
pub enum CartonError {
    // --- Request errors ---
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Forbidden: you can only access your own secrets")]
    Forbidden,

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed")]
    DecryptionFailed,

    // --- External dependency errors ---
    #[error("Key service error: {0}")]
    KeyService(String),

    #[error("Secret store error: {0}")]
    Store(String),

    // --- Local setup errors ---
    #[error("EggCarton is not initialized at {0} (run `egg init` first)")]
    NotInitialized(PathBuf),

    #[error("EggCarton is already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Child process exited with code {0}")]
    ChildProcessFailed(i32),

    #[error("No command specified (use `egg run -- <command>`)")]
    NoCommandSpecified,
}

/// Coarse classification of a [`CartonError`].
///
/// Callers that sit at a transport boundary (an HTTP handler, the CLI)
/// map these onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    Crypto,
    KeyService,
    Store,
    Local,
}

impl CartonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::SecretNotFound(_) => ErrorKind::NotFound,
            Self::EncryptionFailed(_) | Self::DecryptionFailed => ErrorKind::Crypto,
            Self::KeyService(_) => ErrorKind::KeyService,
            Self::Store(_) => ErrorKind::Store,
            _ => ErrorKind::Local,
        }
    }

    /// `true` for transient infrastructure faults the caller may retry
    /// with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::KeyService | ErrorKind::Store)
    }
}

/// Convenience type alias for EggCarton results.
pub type Result<T> = std::result::Result<T, CartonError>;

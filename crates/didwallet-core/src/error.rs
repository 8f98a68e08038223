//! Error types for the wallet service

use thiserror::Error;

/// Main error type for wallet, identity and messaging operations
#[derive(Error, Debug)]
pub enum WalletError {
    /// A wallet with this id already exists in the storage root
    #[error("Wallet already exists: {0}")]
    AlreadyExists(String),

    /// No wallet with this id exists
    #[error("Wallet not found: {0}")]
    NotFound(String),

    /// Credentials did not unlock the wallet
    #[error("Wallet access failed: {0}")]
    AccessFailed(String),

    /// The wallet is already open in this service
    #[error("Wallet already opened: {0}")]
    AlreadyOpened(String),

    /// Handle does not refer to an open wallet
    #[error("Invalid wallet handle: {0}")]
    InvalidHandle(i32),

    /// Wallet must be closed before this operation
    #[error("Wallet is still open: {0}")]
    WalletStillOpen(String),

    /// Record (key, DID) was not found inside an open wallet
    #[error("Wallet item not found: {0}")]
    ItemNotFound(String),

    /// DID is already stored in the wallet
    #[error("DID already exists: {0}")]
    DidAlreadyExists(String),

    /// Caller passed a malformed config, key or DID
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Only ed25519 keys are supported
    #[error("Unknown crypto type: {0}")]
    UnknownCryptoType(String),

    /// Decryption failed (wrong key, tampered data, or malformed input)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Cryptographic operation failed
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error during storage operations (redb)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by callers deciding continue-or-abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Expected on repeated runs; usually tolerated
    AlreadyExists,
    /// Wallet could not be unlocked or opened
    UnlockFailure,
    /// Wallet, handle or record does not exist
    NotFound,
    /// Authenticated decryption rejected the message
    AuthFailure,
    /// Malformed input from the caller
    InvalidInput,
    /// Storage, I/O or other internal failure
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::AlreadyExists => "already-exists",
            ErrorKind::UnlockFailure => "unlock-failure",
            ErrorKind::NotFound => "not-found",
            ErrorKind::AuthFailure => "auth-failure",
            ErrorKind::InvalidInput => "invalid-input",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl WalletError {
    /// Classify this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::AlreadyExists(_) | WalletError::DidAlreadyExists(_) => {
                ErrorKind::AlreadyExists
            }
            WalletError::AccessFailed(_) | WalletError::AlreadyOpened(_) => {
                ErrorKind::UnlockFailure
            }
            WalletError::NotFound(_)
            | WalletError::InvalidHandle(_)
            | WalletError::ItemNotFound(_) => ErrorKind::NotFound,
            WalletError::DecryptionFailed(_) => ErrorKind::AuthFailure,
            WalletError::InvalidStructure(_)
            | WalletError::UnknownCryptoType(_)
            | WalletError::WalletStillOpen(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Internal,
        }
    }

    /// Numeric error code, compatible with the classic wallet library codes.
    pub fn code(&self) -> i32 {
        match self {
            WalletError::InvalidStructure(_) => 113,
            WalletError::Io(_) => 114,
            WalletError::WalletStillOpen(_) => 112,
            WalletError::InvalidHandle(_) => 200,
            WalletError::AlreadyExists(_) => 203,
            WalletError::NotFound(_) => 204,
            WalletError::AlreadyOpened(_) => 206,
            WalletError::AccessFailed(_) => 207,
            WalletError::Serialization(_) => 209,
            WalletError::Storage(_)
            | WalletError::Database(_)
            | WalletError::Transaction(_)
            | WalletError::Table(_)
            | WalletError::StorageOp(_)
            | WalletError::Commit(_) => 210,
            WalletError::Crypto(_) => 211,
            WalletError::ItemNotFound(_) => 212,
            WalletError::UnknownCryptoType(_) => 500,
            WalletError::DidAlreadyExists(_) => 600,
            WalletError::DecryptionFailed(_) => 113,
        }
    }
}

/// Result type alias using WalletError
pub type WalletResult<T> = Result<T, WalletError>;

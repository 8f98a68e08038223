//! JSON configuration values exchanged with the wallet service.
//!
//! Every type round-trips through the JSON shape callers already use, e.g.
//! `{"id": "personAWallet"}` for a wallet config or `{"key": "..."}` for
//! credentials.

use crate::error::WalletError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;

/// Default size of the crypto thread pool when none is configured
pub const DEFAULT_CRYPTO_THREAD_POOL_SIZE: usize = 4;

fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, WalletError> {
    serde_json::from_str(json)
        .map_err(|e| WalletError::InvalidStructure(format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, WalletError> {
    serde_json::to_string(value).map_err(|e| WalletError::Serialization(e.to_string()))
}

/// Service runtime options, fixed at service construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Size of the thread pool for the most expensive crypto operations
    #[serde(default = "default_pool_size")]
    pub crypto_thread_pool_size: usize,
}

fn default_pool_size() -> usize {
    DEFAULT_CRYPTO_THREAD_POOL_SIZE
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            crypto_thread_pool_size: DEFAULT_CRYPTO_THREAD_POOL_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Runtime config with the given pool size.
    pub fn with_pool_size(crypto_thread_pool_size: usize) -> Self {
        Self {
            crypto_thread_pool_size,
        }
    }

    /// Parse `{"crypto_thread_pool_size": <int>}`.
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let config: Self = from_json(json, "runtime config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, WalletError> {
        to_json(self)
    }

    /// Pool size must be at least one.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.crypto_thread_pool_size == 0 {
            return Err(WalletError::InvalidStructure(
                "crypto_thread_pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage backend for a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// redb file under the storage root
    #[default]
    Default,
    /// redb in-memory backend, kept until the wallet is deleted
    Inmem,
}

/// Backend-specific storage options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the service storage root for this wallet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Identifies a wallet at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Wallet id, unique per storage root
    pub id: String,
    #[serde(default)]
    pub storage_type: StorageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_config: Option<StorageConfig>,
}

impl WalletConfig {
    /// Default-storage wallet config with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            storage_type: StorageType::Default,
            storage_config: None,
        }
    }

    /// In-memory wallet config with the given id.
    pub fn in_memory(id: impl Into<String>) -> Self {
        Self {
            storage_type: StorageType::Inmem,
            ..Self::new(id)
        }
    }

    /// Store this wallet under `path` instead of the service storage root.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_config = Some(StorageConfig {
            path: Some(path.into()),
        });
        self
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let config: Self = from_json(json, "wallet config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, WalletError> {
        to_json(self)
    }

    /// The id becomes a directory name, so it must be a single path component.
    pub fn validate(&self) -> Result<(), WalletError> {
        let id = self.id.as_str();
        if id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\'])
            || id.chars().any(char::is_control)
        {
            return Err(WalletError::InvalidStructure(format!(
                "Invalid wallet id: {:?}",
                id
            )));
        }
        Ok(())
    }
}

/// How the wallet master key is obtained from the credential key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyDerivationMethod {
    /// HKDF-SHA256 over the passphrase with a per-wallet salt
    #[default]
    Derived,
    /// The key is a base58-encoded 32-byte master key
    Raw,
}

/// Unlocks a wallet.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCredentials {
    pub key: String,
    #[serde(default)]
    pub key_derivation_method: KeyDerivationMethod,
}

impl WalletCredentials {
    /// Passphrase credentials.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            key_derivation_method: KeyDerivationMethod::Derived,
        }
    }

    /// Raw master key credentials (base58, 32 bytes).
    pub fn raw(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            key_derivation_method: KeyDerivationMethod::Raw,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        from_json(json, "wallet credentials")
    }

    pub fn to_json(&self) -> Result<String, WalletError> {
        to_json(self)
    }
}

impl std::fmt::Debug for WalletCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletCredentials")
            .field("key", &"<redacted>")
            .field("key_derivation_method", &self.key_derivation_method)
            .finish()
    }
}

/// Options for creating a DID; `{}` lets the service generate everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidOptions {
    /// Explicit DID to store instead of deriving one from the verkey
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    /// Seed for deterministic key generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    /// Only "ed25519" is supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_type: Option<String>,
    /// Use the full verkey as the DID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<bool>,
    /// Qualify the DID with this method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

impl DidOptions {
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        from_json(json, "DID options")
    }

    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: Some(seed.into()),
            ..Self::default()
        }
    }
}

/// Options for creating a bare key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_type: Option<String>,
}

impl KeyOptions {
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        from_json(json, "key options")
    }
}

/// Another party's DID to store: `{"did": ..., "verkey": ...}`.
///
/// `verkey` may be abbreviated (`~...`) against a 16-byte DID, and may be
/// left out when the DID is a cryptonym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheirDidOptions {
    pub did: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_type: Option<String>,
}

impl TheirDidOptions {
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        from_json(json, "their DID")
    }

    pub fn new(did: impl Into<String>, verkey: Option<String>) -> Self {
        Self {
            did: did.into(),
            verkey,
            crypto_type: None,
        }
    }
}

/// Reject any crypto type other than ed25519.
pub(crate) fn check_crypto_type(crypto_type: Option<&str>) -> Result<(), WalletError> {
    match crypto_type {
        None | Some("ed25519") => Ok(()),
        Some(other) => Err(WalletError::UnknownCryptoType(other.to_string())),
    }
}

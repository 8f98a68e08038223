//! An unlocked wallet: sealed key and DID records on top of a [`WalletStore`].
//!
//! Every record value is sealed with the wallet master key. The master key
//! is checked at unlock time against a sealed check token written when the
//! wallet was created.

use crate::config::{KeyDerivationMethod, WalletCredentials};
use crate::crypto::{derive_key, random_bytes, MessageCipher};
use crate::error::WalletError;
use crate::identity::{Did, SigningKeypair, Verkey};
use crate::storage::{RecordTable, WalletStore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

const META_SALT: &str = "salt";
const META_KDF: &str = "kdf";
const META_CHECK: &str = "check";
const META_CREATED_AT: &str = "created_at";

const CHECK_TOKEN: &[u8] = b"didwallet-check-v1";
const MASTER_KEY_INFO: &[u8] = b"didwallet-wallet-key-v1";

/// A DID stored in a wallet, as returned by the list/get operations.
///
/// JSON: `{"did": ..., "verkey": ..., "tempVerkey": ..., "metadata": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidRecord {
    pub did: Did,
    pub verkey: Verkey,
    pub temp_verkey: Option<Verkey>,
    pub metadata: Option<String>,
}

/// Another party's DID and the verkey it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheirDidRecord {
    pub did: Did,
    pub verkey: Verkey,
}

/// Stored signing key. Never leaves the wallet.
#[derive(Serialize, Deserialize)]
struct KeyRecord {
    seed: [u8; 32],
    metadata: Option<String>,
}

/// Master key for a wallet from its credentials and salt.
fn master_key(credentials: &WalletCredentials, salt: &[u8]) -> Result<[u8; 32], WalletError> {
    match credentials.key_derivation_method {
        KeyDerivationMethod::Derived => {
            derive_key(credentials.key.as_bytes(), Some(salt), MASTER_KEY_INFO, &[])
        }
        KeyDerivationMethod::Raw => {
            let bytes = bs58::decode(&credentials.key).into_vec().map_err(|_| {
                WalletError::InvalidStructure("RAW wallet key must be base58".to_string())
            })?;
            <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
                WalletError::InvalidStructure("RAW wallet key must be 32 bytes".to_string())
            })
        }
    }
}

/// Generate a RAW wallet key (base58, 32 bytes), optionally from a seed.
pub fn generate_wallet_key(seed: Option<&str>) -> Result<String, WalletError> {
    let key: [u8; 32] = match seed {
        Some(seed) => SigningKeypair::parse_seed(seed)?,
        None => random_bytes(),
    };
    Ok(bs58::encode(key).into_string())
}

/// Wallet whose master key has been verified.
pub struct Wallet {
    id: String,
    store: WalletStore,
    cipher: MessageCipher,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Write salt, key-derivation method and check token into a fresh store.
    pub fn initialize(
        id: impl Into<String>,
        store: WalletStore,
        credentials: &WalletCredentials,
    ) -> Result<Self, WalletError> {
        let salt: [u8; 32] = random_bytes();
        let cipher = MessageCipher::new(&master_key(credentials, &salt)?);

        let kdf = match credentials.key_derivation_method {
            KeyDerivationMethod::Derived => "DERIVED",
            KeyDerivationMethod::Raw => "RAW",
        };

        store.put_meta(META_SALT, &salt)?;
        store.put_meta(META_KDF, kdf.as_bytes())?;
        store.put_meta(META_CHECK, &cipher.seal(CHECK_TOKEN)?)?;
        store.put_meta(
            META_CREATED_AT,
            chrono::Utc::now().to_rfc3339().as_bytes(),
        )?;

        let id = id.into();
        debug!(wallet = %id, kdf, "Initialized wallet store");
        Ok(Self { id, store, cipher })
    }

    /// Unlock an existing store, failing with `AccessFailed` on wrong credentials.
    pub fn unlock(
        id: impl Into<String>,
        store: WalletStore,
        credentials: &WalletCredentials,
    ) -> Result<Self, WalletError> {
        let id = id.into();
        let (salt, check) = match (store.get_meta(META_SALT)?, store.get_meta(META_CHECK)?) {
            (Some(salt), Some(check)) => (salt, check),
            _ => {
                return Err(WalletError::Storage(format!(
                    "Wallet {} is missing its key metadata",
                    id
                )))
            }
        };

        let cipher = MessageCipher::new(&master_key(credentials, &salt)?);
        match cipher.open(&check) {
            Ok(token) if token == CHECK_TOKEN => Ok(Self { id, store, cipher }),
            _ => Err(WalletError::AccessFailed(format!(
                "Invalid credentials for wallet {}",
                id
            ))),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// RFC 3339 creation time, if recorded.
    pub fn created_at(&self) -> Result<Option<String>, WalletError> {
        Ok(self
            .store
            .get_meta(META_CREATED_AT)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn seal<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, WalletError> {
        let bytes =
            postcard::to_allocvec(value).map_err(|e| WalletError::Serialization(e.to_string()))?;
        self.cipher.seal(&bytes)
    }

    fn unseal<T: DeserializeOwned>(&self, sealed: &[u8]) -> Result<T, WalletError> {
        let bytes = self
            .cipher
            .open(sealed)
            .map_err(|e| WalletError::Storage(format!("Corrupt wallet record: {}", e)))?;
        postcard::from_bytes(&bytes).map_err(|e| WalletError::Serialization(e.to_string()))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Key Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Store a signing key. Storing the same key twice is a no-op.
    pub fn add_key(&self, keypair: &SigningKeypair) -> Result<Verkey, WalletError> {
        let verkey = keypair.verkey();
        let record = KeyRecord {
            seed: keypair.seed(),
            metadata: None,
        };
        self.store
            .insert_new(RecordTable::Keys, verkey.as_str(), &self.seal(&record)?)?;
        Ok(verkey)
    }

    fn key_record(&self, verkey: &Verkey) -> Result<KeyRecord, WalletError> {
        let sealed = self
            .store
            .get(RecordTable::Keys, verkey.as_str())?
            .ok_or_else(|| WalletError::ItemNotFound(format!("key {}", verkey)))?;
        self.unseal(&sealed)
    }

    /// Load the signing keypair for a verkey held in this wallet.
    pub fn keypair(&self, verkey: &Verkey) -> Result<SigningKeypair, WalletError> {
        Ok(SigningKeypair::from_seed(&self.key_record(verkey)?.seed))
    }

    pub fn set_key_metadata(&self, verkey: &Verkey, metadata: &str) -> Result<(), WalletError> {
        let mut record = self.key_record(verkey)?;
        record.metadata = Some(metadata.to_string());
        self.store
            .update(RecordTable::Keys, verkey.as_str(), &self.seal(&record)?)?;
        Ok(())
    }

    pub fn key_metadata(&self, verkey: &Verkey) -> Result<Option<String>, WalletError> {
        Ok(self.key_record(verkey)?.metadata)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DID Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Store a new DID record; fails with `DidAlreadyExists` if the DID is taken.
    pub fn add_did(&self, record: &DidRecord) -> Result<(), WalletError> {
        let inserted = self
            .store
            .insert_new(RecordTable::Dids, record.did.as_str(), &self.seal(record)?)?;
        if !inserted {
            return Err(WalletError::DidAlreadyExists(record.did.to_string()));
        }
        Ok(())
    }

    pub fn contains_did(&self, did: &Did) -> Result<bool, WalletError> {
        Ok(self.store.get(RecordTable::Dids, did.as_str())?.is_some())
    }

    /// Load one DID record.
    pub fn did(&self, did: &Did) -> Result<DidRecord, WalletError> {
        let sealed = self
            .store
            .get(RecordTable::Dids, did.as_str())?
            .ok_or_else(|| WalletError::ItemNotFound(format!("DID {}", did)))?;
        self.unseal(&sealed)
    }

    pub fn set_did_metadata(&self, did: &Did, metadata: &str) -> Result<(), WalletError> {
        let mut record = self.did(did)?;
        record.metadata = Some(metadata.to_string());
        self.store
            .update(RecordTable::Dids, did.as_str(), &self.seal(&record)?)?;
        Ok(())
    }

    /// Stage a new key for a DID as its `temp_verkey`.
    pub fn start_key_replacement(
        &self,
        did: &Did,
        keypair: &SigningKeypair,
    ) -> Result<Verkey, WalletError> {
        let mut record = self.did(did)?;
        let verkey = self.add_key(keypair)?;
        record.temp_verkey = Some(verkey.clone());
        self.store
            .update(RecordTable::Dids, did.as_str(), &self.seal(&record)?)?;
        debug!(wallet = %self.id, %did, "Staged replacement key");
        Ok(verkey)
    }

    /// Promote a DID's `temp_verkey` to its verkey.
    pub fn apply_key_replacement(&self, did: &Did) -> Result<Verkey, WalletError> {
        let mut record = self.did(did)?;
        let verkey = record.temp_verkey.take().ok_or_else(|| {
            WalletError::ItemNotFound(format!("temporary verkey for DID {}", did))
        })?;
        record.verkey = verkey.clone();
        self.store
            .update(RecordTable::Dids, did.as_str(), &self.seal(&record)?)?;
        Ok(verkey)
    }

    /// Re-store a DID under its `did:{method}:` form, keeping keys and metadata.
    pub fn qualify_did(&self, did: &Did, method: &str) -> Result<Did, WalletError> {
        let mut record = self.did(did)?;
        let qualified = did.qualify(method)?;
        if qualified == record.did {
            return Ok(qualified);
        }

        record.did = qualified.clone();
        let moved = self.store.rename(
            RecordTable::Dids,
            did.as_str(),
            qualified.as_str(),
            &self.seal(&record)?,
        )?;
        if !moved {
            return Err(WalletError::DidAlreadyExists(qualified.to_string()));
        }
        Ok(qualified)
    }

    /// All DID records, ordered by DID.
    pub fn dids(&self) -> Result<Vec<DidRecord>, WalletError> {
        self.store
            .list(RecordTable::Dids)?
            .into_iter()
            .map(|(_, sealed)| self.unseal(&sealed))
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Their DIDs
    // ═══════════════════════════════════════════════════════════════════════

    /// Store another party's DID, replacing any earlier entry for it.
    pub fn store_their_did(&self, record: &TheirDidRecord) -> Result<(), WalletError> {
        self.store
            .put(RecordTable::TheirDids, record.did.as_str(), &self.seal(record)?)
    }

    pub fn their_did(&self, did: &Did) -> Result<TheirDidRecord, WalletError> {
        let sealed = self
            .store
            .get(RecordTable::TheirDids, did.as_str())?
            .ok_or_else(|| WalletError::ItemNotFound(format!("their DID {}", did)))?;
        self.unseal(&sealed)
    }

    /// Verkey of a DID, looking at our own DIDs first and then theirs.
    pub fn verkey_for_did(&self, did: &Did) -> Result<Verkey, WalletError> {
        match self.did(did) {
            Ok(record) => Ok(record.verkey),
            Err(WalletError::ItemNotFound(_)) => Ok(self.their_did(did)?.verkey),
            Err(e) => Err(e),
        }
    }
}

//! Local implementation of the wallet service.
//!
//! Wallets live under a storage root (`<root>/wallet/<id>/wallet.redb`) or
//! in process memory. Open wallets are tracked in a handle table; handle
//! numbers start at 1 and are never reused.

use crate::config::{
    check_crypto_type, DidOptions, KeyOptions, RuntimeConfig, StorageType, TheirDidOptions,
    WalletConfig, WalletCredentials,
};
use crate::error::{WalletError, WalletResult};
use crate::identity::{Did, SigningKeypair, Verkey};
use crate::messaging::{self, DecryptedMessage};
use crate::service::{WalletHandle, WalletService};
use crate::storage::{wallet_dir, WalletStore, WALLET_FILE};
use crate::wallet::{self, DidRecord, TheirDidRecord, Wallet};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::{debug, info, warn};

/// Where a wallet's data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WalletLocation {
    /// Directory holding the wallet file
    File(PathBuf),
    /// Key into the in-memory registry
    Memory(String),
}

struct OpenWallet {
    location: WalletLocation,
    wallet: Wallet,
}

/// Wallet service backed by redb, usable from any thread.
pub struct LocalWalletService {
    storage_root: PathBuf,
    runtime: RuntimeConfig,
    open: Mutex<HashMap<WalletHandle, OpenWallet>>,
    memory: Mutex<HashMap<String, WalletStore>>,
    next_handle: AtomicI32,
}

impl std::fmt::Debug for LocalWalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWalletService")
            .field("storage_root", &self.storage_root)
            .field("runtime", &self.runtime)
            .field("open_wallets", &self.open.lock().len())
            .finish()
    }
}

impl LocalWalletService {
    /// Create a service storing file wallets under `storage_root`.
    pub fn new(storage_root: impl Into<PathBuf>, runtime: RuntimeConfig) -> WalletResult<Self> {
        runtime.validate()?;
        let storage_root = storage_root.into();

        info!(
            storage_root = %storage_root.display(),
            crypto_thread_pool_size = runtime.crypto_thread_pool_size,
            "Wallet service started"
        );

        Ok(Self {
            storage_root,
            runtime,
            open: Mutex::new(HashMap::new()),
            memory: Mutex::new(HashMap::new()),
            next_handle: AtomicI32::new(1),
        })
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Number of wallets currently open.
    pub fn open_wallet_count(&self) -> usize {
        self.open.lock().len()
    }

    /// Whether a handle refers to an open wallet.
    pub fn is_open(&self, handle: WalletHandle) -> bool {
        self.open.lock().contains_key(&handle)
    }

    /// Whether the wallet's storage exists (file or memory).
    pub fn wallet_exists(&self, config: &WalletConfig) -> bool {
        match self.location(config) {
            WalletLocation::File(dir) => dir.join(WALLET_FILE).exists(),
            WalletLocation::Memory(id) => self.memory.lock().contains_key(&id),
        }
    }

    fn location(&self, config: &WalletConfig) -> WalletLocation {
        match config.storage_type {
            StorageType::Default => {
                let root = config
                    .storage_config
                    .as_ref()
                    .and_then(|c| c.path.as_deref())
                    .unwrap_or(&self.storage_root);
                WalletLocation::File(wallet_dir(root, &config.id))
            }
            StorageType::Inmem => WalletLocation::Memory(config.id.clone()),
        }
    }

    fn load_store(&self, config: &WalletConfig, location: &WalletLocation) -> WalletResult<WalletStore> {
        match location {
            WalletLocation::File(dir) => WalletStore::open_file(dir.join(WALLET_FILE))
                .map_err(|e| match e {
                    WalletError::NotFound(_) => WalletError::NotFound(config.id.clone()),
                    other => other,
                }),
            WalletLocation::Memory(id) => self
                .memory
                .lock()
                .get(id)
                .cloned()
                .ok_or_else(|| WalletError::NotFound(config.id.clone())),
        }
    }

    fn with_wallet<T>(
        &self,
        handle: WalletHandle,
        f: impl FnOnce(&Wallet) -> WalletResult<T>,
    ) -> WalletResult<T> {
        let open = self.open.lock();
        let entry = open
            .get(&handle)
            .ok_or(WalletError::InvalidHandle(handle.value()))?;
        f(&entry.wallet)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Key Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Generate a base58 RAW wallet key, optionally from a seed.
    pub fn generate_wallet_key(seed: Option<&str>) -> WalletResult<String> {
        wallet::generate_wallet_key(seed)
    }

    /// Store a bare signing key (no DID) and return its verkey.
    pub fn create_key(&self, handle: WalletHandle, options: &KeyOptions) -> WalletResult<Verkey> {
        let keypair = keypair_from_options(options)?;
        self.with_wallet(handle, |w| w.add_key(&keypair))
    }

    pub fn set_key_metadata(
        &self,
        handle: WalletHandle,
        verkey: &Verkey,
        metadata: &str,
    ) -> WalletResult<()> {
        self.with_wallet(handle, |w| w.set_key_metadata(verkey, metadata))
    }

    pub fn get_key_metadata(&self, handle: WalletHandle, verkey: &Verkey) -> WalletResult<Option<String>> {
        self.with_wallet(handle, |w| w.key_metadata(verkey))
    }

    /// Sign with a key held in the wallet.
    pub fn sign(&self, handle: WalletHandle, signer_vk: &Verkey, message: &[u8]) -> WalletResult<Vec<u8>> {
        self.with_wallet(handle, |w| Ok(w.keypair(signer_vk)?.sign(message)))
    }

    /// Verify a signature; needs no wallet.
    pub fn verify(signer_vk: &Verkey, message: &[u8], signature: &[u8]) -> WalletResult<bool> {
        signer_vk.verify(message, signature)
    }

    /// Encrypt anonymously to a verkey; needs no wallet.
    pub fn anon_crypt(recipient_vk: &Verkey, message: &[u8]) -> WalletResult<Vec<u8>> {
        messaging::anon_crypt(recipient_vk, message)
    }

    /// Decrypt an anon-crypted message with a key held in the wallet.
    pub fn anon_decrypt(
        &self,
        handle: WalletHandle,
        recipient_vk: &Verkey,
        encrypted: &[u8],
    ) -> WalletResult<Vec<u8>> {
        self.with_wallet(handle, |w| {
            messaging::anon_decrypt(&w.keypair(recipient_vk)?, encrypted)
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DID Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Verkey of a DID stored in the wallet, ours or theirs.
    pub fn key_for_local_did(&self, handle: WalletHandle, did: &Did) -> WalletResult<Verkey> {
        self.with_wallet(handle, |w| w.verkey_for_did(did))
    }

    /// Store another party's DID so its verkey can be looked up later.
    pub fn store_their_did(
        &self,
        handle: WalletHandle,
        options: &TheirDidOptions,
    ) -> WalletResult<TheirDidRecord> {
        check_crypto_type(options.crypto_type.as_deref())?;
        let did = Did::parse(&options.did)?;
        let verkey = match options.verkey.as_deref() {
            Some(verkey) => Verkey::expand(&did, verkey)?,
            None if did.identifier_bytes()?.len() == 32 => Verkey::parse(did.unqualified())?,
            None => {
                return Err(WalletError::InvalidStructure(format!(
                    "Their DID {} needs a verkey",
                    did
                )))
            }
        };

        let record = TheirDidRecord { did, verkey };
        self.with_wallet(handle, |w| w.store_their_did(&record))?;
        debug!(%handle, did = %record.did, "Stored their DID");
        Ok(record)
    }

    pub fn get_their_did(&self, handle: WalletHandle, did: &Did) -> WalletResult<TheirDidRecord> {
        self.with_wallet(handle, |w| w.their_did(did))
    }

    /// Generate a new key for one of our DIDs and stage it as `temp_verkey`.
    pub fn replace_keys_start(
        &self,
        handle: WalletHandle,
        did: &Did,
        options: &KeyOptions,
    ) -> WalletResult<Verkey> {
        let keypair = keypair_from_options(options)?;
        let verkey = self.with_wallet(handle, |w| w.start_key_replacement(did, &keypair))?;
        info!(%handle, %did, temp_verkey = %verkey, "Started key replacement");
        Ok(verkey)
    }

    /// Make the staged `temp_verkey` the DID's verkey.
    pub fn replace_keys_apply(&self, handle: WalletHandle, did: &Did) -> WalletResult<()> {
        let verkey = self.with_wallet(handle, |w| w.apply_key_replacement(did))?;
        info!(%handle, %did, %verkey, "Applied key replacement");
        Ok(())
    }

    /// Qualify a stored DID with a method, returning the qualified DID.
    pub fn qualify_did(&self, handle: WalletHandle, did: &Did, method: &str) -> WalletResult<Did> {
        let qualified = self.with_wallet(handle, |w| w.qualify_did(did, method))?;
        info!(%handle, %did, %qualified, "Qualified DID");
        Ok(qualified)
    }

    pub fn set_did_metadata(&self, handle: WalletHandle, did: &Did, metadata: &str) -> WalletResult<()> {
        self.with_wallet(handle, |w| w.set_did_metadata(did, metadata))
    }

    pub fn get_did_metadata(&self, handle: WalletHandle, did: &Did) -> WalletResult<Option<String>> {
        self.with_wallet(handle, |w| Ok(w.did(did)?.metadata))
    }

    pub fn get_my_did_with_metadata(&self, handle: WalletHandle, did: &Did) -> WalletResult<DidRecord> {
        self.with_wallet(handle, |w| w.did(did))
    }
}

fn keypair_from_options(options: &KeyOptions) -> WalletResult<SigningKeypair> {
    check_crypto_type(options.crypto_type.as_deref())?;
    Ok(match options.seed.as_deref() {
        Some(seed) => SigningKeypair::from_seed(&SigningKeypair::parse_seed(seed)?),
        None => SigningKeypair::generate(),
    })
}

impl WalletService for LocalWalletService {
    fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime
    }

    fn create_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> WalletResult<()> {
        config.validate()?;

        match self.location(config) {
            WalletLocation::File(dir) => {
                let path = dir.join(WALLET_FILE);
                if path.exists() {
                    return Err(WalletError::AlreadyExists(config.id.clone()));
                }

                let result = WalletStore::create_file(&path)
                    .and_then(|store| Wallet::initialize(&config.id, store, credentials));
                if let Err(e) = result {
                    // Leave no half-initialized wallet behind
                    if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                        warn!(
                            wallet = %config.id,
                            error = %cleanup,
                            "Failed to remove partially created wallet"
                        );
                    }
                    return Err(e);
                }
            }
            WalletLocation::Memory(id) => {
                let mut memory = self.memory.lock();
                if memory.contains_key(&id) {
                    return Err(WalletError::AlreadyExists(config.id.clone()));
                }
                let store = WalletStore::in_memory()?;
                Wallet::initialize(&config.id, store.clone(), credentials)?;
                memory.insert(id, store);
            }
        }

        info!(wallet = %config.id, storage_type = ?config.storage_type, "Created wallet");
        Ok(())
    }

    fn open_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> WalletResult<WalletHandle> {
        config.validate()?;
        let location = self.location(config);

        let mut open = self.open.lock();
        if open.values().any(|o| o.location == location) {
            return Err(WalletError::AlreadyOpened(config.id.clone()));
        }

        let store = self.load_store(config, &location)?;
        let wallet = Wallet::unlock(&config.id, store, credentials)?;

        let handle = WalletHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        open.insert(handle, OpenWallet { location, wallet });

        info!(wallet = %config.id, %handle, "Opened wallet");
        Ok(handle)
    }

    fn create_and_store_my_did(
        &self,
        handle: WalletHandle,
        options: &DidOptions,
    ) -> WalletResult<(Did, Verkey)> {
        check_crypto_type(options.crypto_type.as_deref())?;

        let keypair = match options.seed.as_deref() {
            Some(seed) => SigningKeypair::from_seed(&SigningKeypair::parse_seed(seed)?),
            None => SigningKeypair::generate(),
        };
        let verkey = keypair.verkey();

        let mut did = match options.did.as_deref() {
            Some(explicit) => Did::parse(explicit)?,
            None if options.cid == Some(true) => Did::cryptonym(&verkey),
            None => Did::from_verkey(&verkey),
        };
        if let Some(method) = options.method_name.as_deref() {
            did = did.qualify(method)?;
        }

        let record = DidRecord {
            did: did.clone(),
            verkey: verkey.clone(),
            temp_verkey: None,
            metadata: None,
        };

        self.with_wallet(handle, |w| {
            if w.contains_did(&did)? {
                return Err(WalletError::DidAlreadyExists(did.to_string()));
            }
            w.add_key(&keypair)?;
            w.add_did(&record)
        })?;

        info!(%handle, %did, %verkey, "Created DID");
        Ok((did, verkey))
    }

    fn list_my_dids_with_metadata(&self, handle: WalletHandle) -> WalletResult<Vec<DidRecord>> {
        let dids = self.with_wallet(handle, |w| w.dids())?;
        debug!(%handle, count = dids.len(), "Listed DIDs");
        Ok(dids)
    }

    fn auth_crypt(
        &self,
        handle: WalletHandle,
        sender_vk: &Verkey,
        recipient_vk: &Verkey,
        message: &[u8],
    ) -> WalletResult<Vec<u8>> {
        let encrypted = self.with_wallet(handle, |w| {
            messaging::auth_crypt(&w.keypair(sender_vk)?, recipient_vk, message)
        })?;
        debug!(%handle, %sender_vk, %recipient_vk, bytes = encrypted.len(), "Auth-crypted message");
        Ok(encrypted)
    }

    fn auth_decrypt(
        &self,
        handle: WalletHandle,
        recipient_vk: &Verkey,
        encrypted: &[u8],
    ) -> WalletResult<DecryptedMessage> {
        let result = self.with_wallet(handle, |w| {
            messaging::auth_decrypt(&w.keypair(recipient_vk)?, encrypted)
        });
        match &result {
            Ok(decrypted) => {
                debug!(%handle, sender_vk = %decrypted.sender_verkey, "Auth-decrypted message")
            }
            Err(e) => warn!(%handle, %recipient_vk, error = %e, "Auth-decrypt rejected message"),
        }
        result
    }

    fn close_wallet(&self, handle: WalletHandle) -> WalletResult<()> {
        let closed = self
            .open
            .lock()
            .remove(&handle)
            .ok_or(WalletError::InvalidHandle(handle.value()))?;

        info!(wallet = %closed.wallet.id(), %handle, "Closed wallet");
        Ok(())
    }

    fn delete_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> WalletResult<()> {
        config.validate()?;
        let location = self.location(config);

        let open = self.open.lock();
        if open.values().any(|o| o.location == location) {
            return Err(WalletError::WalletStillOpen(config.id.clone()));
        }

        // Credentials must unlock the wallet before it may be deleted
        let store = self.load_store(config, &location)?;
        Wallet::unlock(&config.id, store, credentials)?;

        match &location {
            WalletLocation::File(dir) => std::fs::remove_dir_all(dir)?,
            WalletLocation::Memory(id) => {
                self.memory.lock().remove(id);
            }
        }
        drop(open);

        info!(wallet = %config.id, "Deleted wallet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service() -> (TempDir, LocalWalletService) {
        let temp = TempDir::new().unwrap();
        let service = LocalWalletService::new(temp.path(), RuntimeConfig::default()).unwrap();
        (temp, service)
    }

    fn creds() -> WalletCredentials {
        WalletCredentials::new("key")
    }

    #[test]
    fn test_rejects_zero_pool_size() {
        let temp = TempDir::new().unwrap();
        let result = LocalWalletService::new(temp.path(), RuntimeConfig::with_pool_size(0));
        assert!(matches!(result, Err(WalletError::InvalidStructure(_))));
    }

    #[test]
    fn test_file_wallet_layout() {
        let (temp, service) = service();
        let config = WalletConfig::new("personAWallet");

        service.create_wallet(&config, &creds()).unwrap();
        assert!(temp
            .path()
            .join("wallet")
            .join("personAWallet")
            .join(WALLET_FILE)
            .exists());
        assert!(service.wallet_exists(&config));
    }

    #[test]
    fn test_storage_config_path_override() {
        let (_temp, service) = service();
        let other = TempDir::new().unwrap();
        let config = WalletConfig::new("elsewhere").with_path(other.path());

        service.create_wallet(&config, &creds()).unwrap();
        assert!(wallet_dir(other.path(), "elsewhere").join(WALLET_FILE).exists());
    }

    #[test]
    fn test_handles_start_at_one_and_increase() {
        let (_temp, service) = service();
        let a = WalletConfig::in_memory("a");
        let b = WalletConfig::in_memory("b");
        service.create_wallet(&a, &creds()).unwrap();
        service.create_wallet(&b, &creds()).unwrap();

        let ha = service.open_wallet(&a, &creds()).unwrap();
        let hb = service.open_wallet(&b, &creds()).unwrap();
        assert_eq!(ha, WalletHandle(1));
        assert_eq!(hb, WalletHandle(2));

        service.close_wallet(ha).unwrap();
        let ha2 = service.open_wallet(&a, &creds()).unwrap();
        assert_eq!(ha2, WalletHandle(3));
    }

    #[test]
    fn test_open_twice_is_already_opened() {
        let (_temp, service) = service();
        let config = WalletConfig::new("w");
        service.create_wallet(&config, &creds()).unwrap();
        service.open_wallet(&config, &creds()).unwrap();

        assert!(matches!(
            service.open_wallet(&config, &creds()),
            Err(WalletError::AlreadyOpened(_))
        ));
    }

    #[test]
    fn test_did_with_seed_is_deterministic_across_wallets() {
        let (_temp, service) = service();
        let opts = DidOptions::with_seed("000000000000000000000000Trustee1");

        let mut dids = Vec::new();
        for id in ["w1", "w2"] {
            let config = WalletConfig::in_memory(id);
            service.create_wallet(&config, &creds()).unwrap();
            let handle = service.open_wallet(&config, &creds()).unwrap();
            dids.push(service.create_and_store_my_did(handle, &opts).unwrap());
        }
        assert_eq!(dids[0], dids[1]);
    }

    #[test]
    fn test_duplicate_seed_in_same_wallet_rejected() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();
        let opts = DidOptions::with_seed("000000000000000000000000Trustee1");

        service.create_and_store_my_did(handle, &opts).unwrap();
        assert!(matches!(
            service.create_and_store_my_did(handle, &opts),
            Err(WalletError::DidAlreadyExists(_))
        ));
    }

    #[test]
    fn test_did_options_variants() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();

        let (cid, verkey) = service
            .create_and_store_my_did(
                handle,
                &DidOptions {
                    cid: Some(true),
                    ..DidOptions::default()
                },
            )
            .unwrap();
        assert_eq!(cid.as_str(), verkey.as_str());

        let (qualified, _) = service
            .create_and_store_my_did(
                handle,
                &DidOptions {
                    method_name: Some("sov".into()),
                    ..DidOptions::default()
                },
            )
            .unwrap();
        assert_eq!(qualified.method(), Some("sov"));

        let result = service.create_and_store_my_did(
            handle,
            &DidOptions {
                crypto_type: Some("secp256k1".into()),
                ..DidOptions::default()
            },
        );
        assert!(matches!(result, Err(WalletError::UnknownCryptoType(_))));
    }

    #[test]
    fn test_did_metadata_and_key_lookup() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();
        let (did, verkey) = service
            .create_and_store_my_did(handle, &DidOptions::default())
            .unwrap();

        assert_eq!(service.key_for_local_did(handle, &did).unwrap(), verkey);
        assert_eq!(service.get_did_metadata(handle, &did).unwrap(), None);

        service.set_did_metadata(handle, &did, "{\"name\":\"personA\"}").unwrap();
        let record = service.get_my_did_with_metadata(handle, &did).unwrap();
        assert_eq!(record.metadata.as_deref(), Some("{\"name\":\"personA\"}"));
    }

    #[test]
    fn test_store_their_did_forms() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();

        let theirs = SigningKeypair::generate().verkey();
        let did = Did::from_verkey(&theirs);

        // Abbreviated verkey expands against the DID
        let abbreviated = theirs.abbreviate(&did).unwrap();
        let record = service
            .store_their_did(handle, &TheirDidOptions::new(did.as_str(), Some(abbreviated)))
            .unwrap();
        assert_eq!(record.verkey, theirs);
        assert_eq!(service.get_their_did(handle, &did).unwrap(), record);
        assert_eq!(service.key_for_local_did(handle, &did).unwrap(), theirs);

        // A cryptonym carries its own verkey
        let other = SigningKeypair::generate().verkey();
        let cryptonym = Did::cryptonym(&other);
        let record = service
            .store_their_did(handle, &TheirDidOptions::new(cryptonym.as_str(), None))
            .unwrap();
        assert_eq!(record.verkey, other);

        // A short DID alone says nothing about its key
        let short = Did::from_verkey(&SigningKeypair::generate().verkey());
        assert!(matches!(
            service.store_their_did(handle, &TheirDidOptions::new(short.as_str(), None)),
            Err(WalletError::InvalidStructure(_))
        ));

        // Their DIDs never show up as ours
        assert!(service.list_my_dids_with_metadata(handle).unwrap().is_empty());
    }

    #[test]
    fn test_replace_keys_survives_reopen() {
        let (_temp, service) = service();
        let config = WalletConfig::new("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();
        let (did, original) = service
            .create_and_store_my_did(handle, &DidOptions::default())
            .unwrap();

        assert!(matches!(
            service.replace_keys_apply(handle, &did),
            Err(WalletError::ItemNotFound(_))
        ));

        let staged = service
            .replace_keys_start(handle, &did, &KeyOptions::default())
            .unwrap();
        assert_ne!(staged, original);
        let record = service.get_my_did_with_metadata(handle, &did).unwrap();
        assert_eq!(record.verkey, original);
        assert_eq!(record.temp_verkey, Some(staged.clone()));

        service.close_wallet(handle).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();

        service.replace_keys_apply(handle, &did).unwrap();
        let record = service.get_my_did_with_metadata(handle, &did).unwrap();
        assert_eq!(record.verkey, staged);
        assert_eq!(record.temp_verkey, None);
        assert_eq!(service.key_for_local_did(handle, &did).unwrap(), staged);

        let signature = service.sign(handle, &staged, b"rotated").unwrap();
        assert!(LocalWalletService::verify(&staged, b"rotated", &signature).unwrap());
    }

    #[test]
    fn test_replace_keys_start_unknown_did() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();
        let unknown = Did::from_verkey(&SigningKeypair::generate().verkey());

        assert!(matches!(
            service.replace_keys_start(handle, &unknown, &KeyOptions::default()),
            Err(WalletError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_qualify_stored_did() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();
        let (did, verkey) = service
            .create_and_store_my_did(handle, &DidOptions::default())
            .unwrap();
        service.set_did_metadata(handle, &did, "personA").unwrap();

        let qualified = service.qualify_did(handle, &did, "peer").unwrap();
        assert_eq!(qualified.as_str(), format!("did:peer:{}", did));

        let record = service.get_my_did_with_metadata(handle, &qualified).unwrap();
        assert_eq!(record.verkey, verkey);
        assert_eq!(record.metadata.as_deref(), Some("personA"));
        assert!(matches!(
            service.key_for_local_did(handle, &did),
            Err(WalletError::ItemNotFound(_))
        ));

        let dids = service.list_my_dids_with_metadata(handle).unwrap();
        assert_eq!(dids.len(), 1);
        assert_eq!(dids[0].did, qualified);

        assert!(matches!(
            service.qualify_did(handle, &qualified, "not a method"),
            Err(WalletError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_failed_create_leaves_no_directory() {
        let (temp, service) = service();
        let config = WalletConfig::new("badkey");

        // '0' is not in the base58 alphabet, so the store is created and
        // then initialization fails
        let result = service.create_wallet(&config, &WalletCredentials::raw("0000"));
        assert!(matches!(result, Err(WalletError::InvalidStructure(_))));
        assert!(!wallet_dir(temp.path(), "badkey").exists());
        assert!(!service.wallet_exists(&config));

        service.create_wallet(&config, &creds()).unwrap();
    }

    #[test]
    fn test_sign_verify_and_key_metadata() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();

        let verkey = service.create_key(handle, &KeyOptions::default()).unwrap();
        let signature = service.sign(handle, &verkey, b"payload").unwrap();
        assert!(LocalWalletService::verify(&verkey, b"payload", &signature).unwrap());
        assert!(!LocalWalletService::verify(&verkey, b"other", &signature).unwrap());

        service.set_key_metadata(handle, &verkey, "meta").unwrap();
        assert_eq!(
            service.get_key_metadata(handle, &verkey).unwrap().as_deref(),
            Some("meta")
        );
    }

    #[test]
    fn test_anon_crypt_through_service() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();
        let (_, verkey) = service
            .create_and_store_my_did(handle, &DidOptions::default())
            .unwrap();

        let encrypted = LocalWalletService::anon_crypt(&verkey, b"hello").unwrap();
        assert_eq!(
            service.anon_decrypt(handle, &verkey, &encrypted).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_auth_crypt_with_foreign_sender_key_fails() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();
        let handle = service.open_wallet(&config, &creds()).unwrap();
        let (_, own) = service
            .create_and_store_my_did(handle, &DidOptions::default())
            .unwrap();
        let foreign = SigningKeypair::generate().verkey();

        assert!(matches!(
            service.auth_crypt(handle, &foreign, &own, b"x"),
            Err(WalletError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_delete_requires_valid_credentials() {
        let (_temp, service) = service();
        let config = WalletConfig::new("w");
        service.create_wallet(&config, &creds()).unwrap();

        assert!(matches!(
            service.delete_wallet(&config, &WalletCredentials::new("wrong")),
            Err(WalletError::AccessFailed(_))
        ));
        assert!(service.wallet_exists(&config));

        service.delete_wallet(&config, &creds()).unwrap();
        assert!(!service.wallet_exists(&config));
    }

    #[test]
    fn test_in_memory_wallet_survives_close() {
        let (_temp, service) = service();
        let config = WalletConfig::in_memory("w");
        service.create_wallet(&config, &creds()).unwrap();

        let handle = service.open_wallet(&config, &creds()).unwrap();
        let (did, _) = service
            .create_and_store_my_did(handle, &DidOptions::default())
            .unwrap();
        service.close_wallet(handle).unwrap();

        let handle = service.open_wallet(&config, &creds()).unwrap();
        let dids = service.list_my_dids_with_metadata(handle).unwrap();
        assert_eq!(dids.len(), 1);
        assert_eq!(dids[0].did, did);
    }
}

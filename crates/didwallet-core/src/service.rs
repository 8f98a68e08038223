//! The Identity & Wallet Service contract.
//!
//! [`WalletService`] is the boundary the demo orchestrator drives. The
//! crate ships [`crate::LocalWalletService`]; tests wrap or replace it.

use crate::config::{DidOptions, RuntimeConfig, WalletConfig, WalletCredentials};
use crate::error::WalletResult;
use crate::identity::{Did, Verkey};
use crate::messaging::DecryptedMessage;
use crate::wallet::DidRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime reference to an open wallet.
///
/// Valid only between `open_wallet` and `close_wallet`; never reused by a
/// service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletHandle(pub i32);

impl WalletHandle {
    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wallet, identity and secure-messaging operations.
pub trait WalletService {
    /// Runtime options this service was constructed with.
    fn runtime_config(&self) -> &RuntimeConfig;

    /// Create a wallet. Fails with `AlreadyExists` if the id is taken.
    fn create_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> WalletResult<()>;

    /// Unlock a wallet and return a handle to it.
    fn open_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> WalletResult<WalletHandle>;

    /// Generate (or derive from a seed) a key and DID, store both.
    fn create_and_store_my_did(
        &self,
        handle: WalletHandle,
        options: &DidOptions,
    ) -> WalletResult<(Did, Verkey)>;

    /// Every DID in the wallet with its metadata.
    fn list_my_dids_with_metadata(&self, handle: WalletHandle) -> WalletResult<Vec<DidRecord>>;

    /// Encrypt `message` from `sender_vk` (held in the wallet) to `recipient_vk`.
    fn auth_crypt(
        &self,
        handle: WalletHandle,
        sender_vk: &Verkey,
        recipient_vk: &Verkey,
        message: &[u8],
    ) -> WalletResult<Vec<u8>>;

    /// Decrypt with `recipient_vk` (held in the wallet), revealing the sender.
    fn auth_decrypt(
        &self,
        handle: WalletHandle,
        recipient_vk: &Verkey,
        encrypted: &[u8],
    ) -> WalletResult<DecryptedMessage>;

    /// Release a handle.
    fn close_wallet(&self, handle: WalletHandle) -> WalletResult<()>;

    /// Remove a closed wallet's storage.
    fn delete_wallet(
        &self,
        config: &WalletConfig,
        credentials: &WalletCredentials,
    ) -> WalletResult<()>;
}

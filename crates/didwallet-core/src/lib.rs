//! didwallet Core Library
//!
//! Encrypted wallets, DIDs and authenticated messaging between them.
//!
//! ## Overview
//!
//! A wallet is an encrypted store owned by one party. Each wallet holds
//! Ed25519 signing keys and the DIDs derived from them. Two parties with
//! wallets can exchange messages that only the recipient can read and that
//! prove who sent them (auth-crypt).
//!
//! The [`WalletService`] trait is the contract; [`LocalWalletService`] keeps
//! wallets in redb files under a storage root or in memory. The
//! [`orchestrator`] module drives the two-party demo against any service.
//!
//! ## Quick Start
//!
//! ```ignore
//! use didwallet_core::{
//!     DidOptions, LocalWalletService, RuntimeConfig, WalletConfig, WalletCredentials,
//!     WalletService,
//! };
//!
//! let service = LocalWalletService::new("/tmp/wallets", RuntimeConfig::with_pool_size(2))?;
//! let config = WalletConfig::new("personAWallet");
//! let creds = WalletCredentials::new("personA_wallet_key");
//!
//! service.create_wallet(&config, &creds)?;
//! let handle = service.open_wallet(&config, &creds)?;
//! let (did, verkey) = service.create_and_store_my_did(handle, &DidOptions::default())?;
//!
//! let sealed = service.auth_crypt(handle, &verkey, &verkey, b"note to self")?;
//! let opened = service.auth_decrypt(handle, &verkey, &sealed)?;
//! assert_eq!(opened.message, b"note to self");
//!
//! service.close_wallet(handle)?;
//! service.delete_wallet(&config, &creds)?;
//! ```

pub mod config;
pub mod crypto;
pub mod environment;
pub mod error;
pub mod identity;
pub mod local;
pub mod logging;
pub mod messaging;
pub mod orchestrator;
pub mod service;
pub mod session;
pub mod storage;
pub mod wallet;

// Re-exports
pub use config::{
    DidOptions, KeyDerivationMethod, KeyOptions, RuntimeConfig, StorageConfig, StorageType,
    TheirDidOptions, WalletConfig, WalletCredentials,
};
pub use error::{ErrorKind, WalletError, WalletResult};
pub use identity::{Did, SigningKeypair, Verkey};
pub use local::LocalWalletService;
pub use messaging::{DecryptedMessage, ENVELOPE_VERSION};
pub use orchestrator::{
    DemoOrchestrator, DemoScenario, Exchange, FailurePolicy, Party, ScenarioReport, Step,
    StepOutcome, StepStatus,
};
pub use service::{WalletHandle, WalletService};
pub use session::WalletSession;
pub use wallet::{DidRecord, TheirDidRecord};

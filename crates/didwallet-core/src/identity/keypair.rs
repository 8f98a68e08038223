//! Ed25519 signing keypair backing a DID.
//!
//! The same key material is used for X25519 key agreement by converting
//! the Ed25519 secret scalar and public point to Montgomery form.

use crate::error::WalletError;
use crate::identity::Verkey;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use x25519_dalek::StaticSecret as X25519StaticSecret;

/// Ed25519 keypair stored in a wallet.
pub struct SigningKeypair {
    signing: SigningKey,
}

impl SigningKeypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self::from_seed(&crate::crypto::random_bytes())
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    /// Parse seed material supplied by a caller.
    ///
    /// Accepts exactly 32 UTF-8 bytes, 64 hex characters, or base64 that
    /// decodes to 32 bytes.
    pub fn parse_seed(seed: &str) -> Result<[u8; 32], WalletError> {
        if seed.len() == 32 {
            let mut out = [0u8; 32];
            out.copy_from_slice(seed.as_bytes());
            return Ok(out);
        }

        let decoded = if seed.len() == 64 && seed.chars().all(|c| c.is_ascii_hexdigit()) {
            hex::decode(seed).ok()
        } else {
            base64::engine::general_purpose::STANDARD.decode(seed).ok()
        };

        decoded
            .and_then(|bytes| <[u8; 32]>::try_from(bytes.as_slice()).ok())
            .ok_or_else(|| {
                WalletError::InvalidStructure(
                    "Seed must be 32 bytes, 64 hex chars or base64 of 32 bytes".to_string(),
                )
            })
    }

    /// The 32-byte secret seed (for storage).
    pub fn seed(&self) -> [u8; 32] {
        self.signing.to_bytes()
    }

    /// Public verification key.
    pub fn verkey(&self) -> Verkey {
        Verkey::from_verifying_key(&self.signing.verifying_key())
    }

    /// Sign a message, returning the 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing.sign(message).to_bytes().to_vec()
    }

    /// X25519 secret derived from the Ed25519 secret scalar.
    pub fn x25519_secret(&self) -> X25519StaticSecret {
        X25519StaticSecret::from(self.signing.to_scalar_bytes())
    }
}

impl Clone for SigningKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.seed())
    }
}

impl std::fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeypair")
            .field(
                "public",
                &hex::encode(self.signing.verifying_key().as_bytes()),
            )
            .finish_non_exhaustive()
    }
}

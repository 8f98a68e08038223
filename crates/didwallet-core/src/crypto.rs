//! Symmetric sealing with ChaCha20-Poly1305 AEAD and HKDF key derivation.
//!
//! Used for wallet record encryption and as the payload cipher of the
//! auth-crypt / anon-crypt envelopes.

use crate::error::WalletError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

/// Nonce size for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size for ChaCha20-Poly1305 (16 bytes)
pub const TAG_SIZE: usize = 16;

/// AEAD cipher bound to one 32-byte key.
///
/// # Wire Format
///
/// Sealed data format: `[nonce (12 bytes)] + [ciphertext + auth_tag (16 bytes)]`
///
/// # Example
///
/// ```
/// use didwallet_core::crypto::MessageCipher;
///
/// let key = MessageCipher::generate_key();
/// let cipher = MessageCipher::new(&key);
///
/// let sealed = cipher.seal(b"Hello, World!").unwrap();
/// let opened = cipher.open(&sealed).unwrap();
///
/// assert_eq!(b"Hello, World!".as_slice(), opened.as_slice());
/// ```
pub struct MessageCipher {
    cipher: ChaCha20Poly1305,
}

impl MessageCipher {
    /// Create a cipher with the given 32-byte key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(key.into()),
        }
    }

    /// Generate a new random 32-byte key.
    pub fn generate_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        rand::rng().fill_bytes(&mut key);
        key
    }

    /// Seal data with a fresh random nonce, prepended to the output.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, WalletError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| WalletError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Open data produced by [`MessageCipher::seal`].
    ///
    /// Fails with [`WalletError::DecryptionFailed`] on a wrong key, tampered
    /// data or truncated input.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, WalletError> {
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(WalletError::DecryptionFailed(
                "Data too short to contain nonce and tag".to_string(),
            ));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| WalletError::DecryptionFailed(e.to_string()))
    }
}

/// Derive a 32-byte key from input key material using HKDF-SHA256.
///
/// `info` is the concatenation of `label` and every slice in `context`.
pub fn derive_key(
    ikm: &[u8],
    salt: Option<&[u8]>,
    label: &[u8],
    context: &[&[u8]],
) -> Result<[u8; 32], WalletError> {
    let mut info = Vec::with_capacity(label.len() + context.iter().map(|c| c.len()).sum::<usize>());
    info.extend_from_slice(label);
    for part in context {
        info.extend_from_slice(part);
    }

    let hkdf = Hkdf::<Sha256>::new(salt, ikm);
    let mut output = [0u8; 32];
    hkdf.expand(&info, &mut output)
        .map_err(|e| WalletError::Crypto(format!("HKDF expand failed: {}", e)))?;
    Ok(output)
}

/// Fill a fixed-size array from the system RNG.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    rand::rng().fill_bytes(&mut out);
    out
}

//! Authenticated and anonymous message encryption between verkeys.
//!
//! ```text
//! ANON-CRYPT (sender unknown to recipient):
//!   eph_sk, eph_pk   = fresh X25519 keypair
//!   k                = HKDF(x25519(eph_sk, R_pk), "didwallet-anoncrypt-v1" || eph_pk || R_pk)
//!   AnonEnvelope     = { version, eph_pk, ChaCha20Poly1305(k, message) }
//!
//! AUTH-CRYPT (sender authenticated, hidden from outsiders):
//!   k                = HKDF(x25519(S_sk, R_pk), "didwallet-authcrypt-v1" || S_pk || R_pk)
//!   AuthPayload      = { sender_verkey, ChaCha20Poly1305(k, message) }
//!   output           = ANON-CRYPT(R, postcard(AuthPayload))
//! ```
//!
//! X25519 keys are the Montgomery forms of the parties' Ed25519 keys. On
//! auth-decrypt the recipient recomputes `k` from the *claimed* sender verkey,
//! so a forged sender field fails the AEAD check.

use crate::crypto::{derive_key, random_bytes, MessageCipher};
use crate::error::WalletError;
use crate::identity::{SigningKeypair, Verkey};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, SharedSecret, StaticSecret as X25519StaticSecret};

/// Current envelope format version
pub const ENVELOPE_VERSION: u8 = 1;

const ANONCRYPT_INFO: &[u8] = b"didwallet-anoncrypt-v1";
const AUTHCRYPT_INFO: &[u8] = b"didwallet-authcrypt-v1";

/// Outer envelope: message sealed to the recipient with an ephemeral key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnonEnvelope {
    version: u8,
    ephemeral_pk: [u8; 32],
    sealed: Vec<u8>,
}

/// Inner payload of an auth-crypted message.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthPayload {
    sender_verkey: String,
    sealed: Vec<u8>,
}

/// Result of authenticated decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    /// Verkey of the authenticated sender
    pub sender_verkey: Verkey,
    /// Recovered plaintext
    pub message: Vec<u8>,
}

fn agree(secret: &X25519StaticSecret, public: &X25519PublicKey) -> Result<SharedSecret, WalletError> {
    let shared = secret.diffie_hellman(public);
    if !shared.was_contributory() {
        return Err(WalletError::Crypto(
            "Key agreement produced a low-order shared secret".to_string(),
        ));
    }
    Ok(shared)
}

/// Encrypt a message to `recipient` without identifying the sender.
pub fn anon_crypt(recipient: &Verkey, message: &[u8]) -> Result<Vec<u8>, WalletError> {
    let recipient_pk = recipient.x25519_public()?;

    let ephemeral_secret = X25519StaticSecret::from(random_bytes::<32>());
    let ephemeral_pk = X25519PublicKey::from(&ephemeral_secret);

    let shared = agree(&ephemeral_secret, &recipient_pk)?;
    let key = derive_key(
        shared.as_bytes(),
        None,
        ANONCRYPT_INFO,
        &[ephemeral_pk.as_bytes(), recipient_pk.as_bytes()],
    )?;

    let envelope = AnonEnvelope {
        version: ENVELOPE_VERSION,
        ephemeral_pk: *ephemeral_pk.as_bytes(),
        sealed: MessageCipher::new(&key).seal(message)?,
    };

    postcard::to_allocvec(&envelope).map_err(|e| WalletError::Serialization(e.to_string()))
}

/// Decode a postcard value that must span the whole input.
fn decode_exact<'a, T: Deserialize<'a>>(bytes: &'a [u8], what: &str) -> Result<T, WalletError> {
    let (value, rest) = postcard::take_from_bytes(bytes)
        .map_err(|e| WalletError::DecryptionFailed(format!("Malformed {}: {}", what, e)))?;
    if !rest.is_empty() {
        return Err(WalletError::DecryptionFailed(format!(
            "Trailing bytes after {}",
            what
        )));
    }
    Ok(value)
}

/// Decrypt an anon-crypted message with the recipient's keypair.
pub fn anon_decrypt(recipient: &SigningKeypair, encrypted: &[u8]) -> Result<Vec<u8>, WalletError> {
    let envelope: AnonEnvelope = decode_exact(encrypted, "envelope")?;

    if envelope.version != ENVELOPE_VERSION {
        return Err(WalletError::DecryptionFailed(format!(
            "Unsupported envelope version {}",
            envelope.version
        )));
    }

    let recipient_pk = recipient.verkey().x25519_public()?;
    let ephemeral_pk = X25519PublicKey::from(envelope.ephemeral_pk);

    let shared = agree(&recipient.x25519_secret(), &ephemeral_pk)
        .map_err(|e| WalletError::DecryptionFailed(e.to_string()))?;
    let key = derive_key(
        shared.as_bytes(),
        None,
        ANONCRYPT_INFO,
        &[ephemeral_pk.as_bytes(), recipient_pk.as_bytes()],
    )?;

    MessageCipher::new(&key).open(&envelope.sealed)
}

/// Encrypt a message from `sender` to `recipient`, binding it to both keys.
pub fn auth_crypt(
    sender: &SigningKeypair,
    recipient: &Verkey,
    message: &[u8],
) -> Result<Vec<u8>, WalletError> {
    let sender_verkey = sender.verkey();
    let sender_pk = sender_verkey.x25519_public()?;
    let recipient_pk = recipient.x25519_public()?;

    let shared = agree(&sender.x25519_secret(), &recipient_pk)?;
    let key = derive_key(
        shared.as_bytes(),
        None,
        AUTHCRYPT_INFO,
        &[sender_pk.as_bytes(), recipient_pk.as_bytes()],
    )?;

    let payload = AuthPayload {
        sender_verkey: sender_verkey.to_string(),
        sealed: MessageCipher::new(&key).seal(message)?,
    };
    let payload =
        postcard::to_allocvec(&payload).map_err(|e| WalletError::Serialization(e.to_string()))?;

    anon_crypt(recipient, &payload)
}

/// Decrypt an auth-crypted message and authenticate its sender.
pub fn auth_decrypt(
    recipient: &SigningKeypair,
    encrypted: &[u8],
) -> Result<DecryptedMessage, WalletError> {
    let payload = anon_decrypt(recipient, encrypted)?;
    let payload: AuthPayload = decode_exact(&payload, "payload")?;

    let sender_verkey = Verkey::parse(&payload.sender_verkey)
        .map_err(|e| WalletError::DecryptionFailed(format!("Bad sender verkey: {}", e)))?;
    let sender_pk = sender_verkey.x25519_public()?;
    let recipient_pk = recipient.verkey().x25519_public()?;

    let shared = agree(&recipient.x25519_secret(), &sender_pk)
        .map_err(|e| WalletError::DecryptionFailed(e.to_string()))?;
    let key = derive_key(
        shared.as_bytes(),
        None,
        AUTHCRYPT_INFO,
        &[sender_pk.as_bytes(), recipient_pk.as_bytes()],
    )?;

    let message = MessageCipher::new(&key).open(&payload.sealed)?;

    Ok(DecryptedMessage {
        sender_verkey,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_roundtrip() {
        let alice = SigningKeypair::generate();
        let bob = SigningKeypair::generate();

        let encrypted = auth_crypt(&alice, &bob.verkey(), b"personA -> personB").unwrap();
        let decrypted = auth_decrypt(&bob, &encrypted).unwrap();

        assert_eq!(decrypted.sender_verkey, alice.verkey());
        assert_eq!(decrypted.message, b"personA -> personB");
    }

    #[test]
    fn test_auth_wrong_recipient_fails() {
        let alice = SigningKeypair::generate();
        let bob = SigningKeypair::generate();
        let carol = SigningKeypair::generate();

        let encrypted = auth_crypt(&alice, &bob.verkey(), b"for bob").unwrap();
        let result = auth_decrypt(&carol, &encrypted);

        assert!(matches!(result, Err(WalletError::DecryptionFailed(_))));
    }

    #[test]
    fn test_auth_forged_sender_fails() {
        let alice = SigningKeypair::generate();
        let bob = SigningKeypair::generate();
        let mallory = SigningKeypair::generate();

        // Mallory re-wraps Alice's inner ciphertext claiming to be Alice,
        // but can only compute a key from her own secret.
        let sender_pk = alice.verkey().x25519_public().unwrap();
        let recipient_pk = bob.verkey().x25519_public().unwrap();
        let shared = mallory.x25519_secret().diffie_hellman(&recipient_pk);
        let key = derive_key(
            shared.as_bytes(),
            None,
            AUTHCRYPT_INFO,
            &[sender_pk.as_bytes(), recipient_pk.as_bytes()],
        )
        .unwrap();
        let payload = AuthPayload {
            sender_verkey: alice.verkey().to_string(),
            sealed: MessageCipher::new(&key).seal(b"forged").unwrap(),
        };
        let forged =
            anon_crypt(&bob.verkey(), &postcard::to_allocvec(&payload).unwrap()).unwrap();

        assert!(matches!(
            auth_decrypt(&bob, &forged),
            Err(WalletError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_auth_tampered_fails() {
        let alice = SigningKeypair::generate();
        let bob = SigningKeypair::generate();

        let mut encrypted = auth_crypt(&alice, &bob.verkey(), b"integrity").unwrap();
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0x01;

        assert!(auth_decrypt(&bob, &encrypted).is_err());
    }

    #[test]
    fn test_anon_roundtrip() {
        let bob = SigningKeypair::generate();

        let encrypted = anon_crypt(&bob.verkey(), b"anonymous").unwrap();
        assert_eq!(anon_decrypt(&bob, &encrypted).unwrap(), b"anonymous");
    }

    #[test]
    fn test_garbage_input_fails_closed() {
        let bob = SigningKeypair::generate();
        assert!(matches!(
            auth_decrypt(&bob, b"not an envelope"),
            Err(WalletError::DecryptionFailed(_))
        ));
        assert!(anon_decrypt(&bob, &[]).is_err());
    }

    #[test]
    fn test_auth_appended_bytes_rejected() {
        let alice = SigningKeypair::generate();
        let bob = SigningKeypair::generate();

        let mut encrypted = auth_crypt(&alice, &bob.verkey(), b"personA -> personB").unwrap();
        encrypted.extend_from_slice(b"GARBAGE-APPENDED");

        match auth_decrypt(&bob, &encrypted) {
            Err(WalletError::DecryptionFailed(msg)) => {
                assert_eq!(msg, "Trailing bytes after envelope")
            }
            other => panic!("Expected trailing bytes rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_anon_appended_bytes_rejected() {
        let bob = SigningKeypair::generate();

        let mut encrypted = anon_crypt(&bob.verkey(), b"anonymous").unwrap();
        encrypted.push(0);

        assert!(matches!(
            anon_decrypt(&bob, &encrypted),
            Err(WalletError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_payload_appended_bytes_rejected() {
        let alice = SigningKeypair::generate();
        let bob = SigningKeypair::generate();

        // Re-wrap a genuine payload with extra bytes after it
        let encrypted = auth_crypt(&alice, &bob.verkey(), b"inner").unwrap();
        let mut payload = anon_decrypt(&bob, &encrypted).unwrap();
        payload.extend_from_slice(b"GARBAGE-APPENDED");
        let rewrapped = anon_crypt(&bob.verkey(), &payload).unwrap();

        match auth_decrypt(&bob, &rewrapped) {
            Err(WalletError::DecryptionFailed(msg)) => {
                assert_eq!(msg, "Trailing bytes after payload")
            }
            other => panic!("Expected trailing bytes rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_version_rejected() {
        let bob = SigningKeypair::generate();
        let envelope = AnonEnvelope {
            version: 99,
            ephemeral_pk: [1u8; 32],
            sealed: vec![0u8; 40],
        };
        let bytes = postcard::to_allocvec(&envelope).unwrap();

        match anon_decrypt(&bob, &bytes) {
            Err(WalletError::DecryptionFailed(msg)) => assert!(msg.contains("version")),
            other => panic!("Expected version rejection, got {:?}", other),
        }
    }
}

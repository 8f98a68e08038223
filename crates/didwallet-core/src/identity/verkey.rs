//! Verification key: base58-encoded Ed25519 public key.

use crate::error::WalletError;
use crate::identity::did::{Did, SHORT_DID_LEN};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use x25519_dalek::PublicKey as X25519PublicKey;

/// Public verification key of a DID, used as the addressing key for
/// authenticated encryption.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Verkey(String);

impl Verkey {
    /// Encode an Ed25519 verifying key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        Verkey(bs58::encode(key.as_bytes()).into_string())
    }

    /// Parse and validate a base58 verkey (must decode to a valid Ed25519 point).
    pub fn parse(s: &str) -> Result<Self, WalletError> {
        if s.starts_with('~') {
            return Err(WalletError::InvalidStructure(
                "Abbreviated verkey needs its DID to be expanded".to_string(),
            ));
        }
        let verkey = Verkey(s.to_string());
        verkey.verifying_key()?;
        Ok(verkey)
    }

    /// Expand a possibly abbreviated verkey (`~...`) using its DID.
    pub fn expand(did: &Did, verkey: &str) -> Result<Self, WalletError> {
        match verkey.strip_prefix('~') {
            None => Self::parse(verkey),
            Some(tail) => {
                let mut bytes = did.identifier_bytes()?;
                if bytes.len() != SHORT_DID_LEN {
                    return Err(WalletError::InvalidStructure(
                        "Only 16-byte DIDs have abbreviated verkeys".to_string(),
                    ));
                }
                let tail = bs58::decode(tail).into_vec().map_err(|_| {
                    WalletError::InvalidStructure("Invalid base58 in abbreviated verkey".into())
                })?;
                bytes.extend_from_slice(&tail);
                Self::parse(&bs58::encode(bytes).into_string())
            }
        }
    }

    /// Abbreviate against a DID: `~{base58(last 16 bytes)}` when the DID is the
    /// verkey's 16-byte prefix, otherwise the full verkey.
    pub fn abbreviate(&self, did: &Did) -> Result<String, WalletError> {
        let bytes = self.to_bytes();
        let did_bytes = did.identifier_bytes()?;
        if did_bytes.as_slice() == &bytes[..SHORT_DID_LEN] {
            Ok(format!("~{}", bs58::encode(&bytes[SHORT_DID_LEN..]).into_string()))
        } else {
            Ok(self.0.clone())
        }
    }

    /// Get the verkey as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 32-byte public key.
    ///
    /// Infallible because construction validated the encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        if let Ok(decoded) = bs58::decode(&self.0).into_vec() {
            if decoded.len() == 32 {
                out.copy_from_slice(&decoded);
            }
        }
        out
    }

    /// Decode into an Ed25519 verifying key.
    pub fn verifying_key(&self) -> Result<VerifyingKey, WalletError> {
        let decoded = bs58::decode(&self.0)
            .into_vec()
            .map_err(|_| WalletError::InvalidStructure(format!("Invalid base58 verkey: {}", self.0)))?;
        let bytes: [u8; 32] = decoded.as_slice().try_into().map_err(|_| {
            WalletError::InvalidStructure(format!(
                "Verkey must decode to 32 bytes, got {}",
                decoded.len()
            ))
        })?;
        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| WalletError::InvalidStructure(format!("Invalid Ed25519 verkey: {}", e)))
    }

    /// Montgomery form of the key, for X25519 key agreement.
    pub fn x25519_public(&self) -> Result<X25519PublicKey, WalletError> {
        let montgomery = self.verifying_key()?.to_montgomery();
        Ok(X25519PublicKey::from(montgomery.to_bytes()))
    }

    /// Verify an Ed25519 signature made by this key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, WalletError> {
        let key = self.verifying_key()?;
        let signature = Signature::from_slice(signature).map_err(|e| {
            WalletError::InvalidStructure(format!("Invalid signature encoding: {}", e))
        })?;
        Ok(key.verify(message, &signature).is_ok())
    }
}

impl fmt::Display for Verkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Verkey {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Verkey {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Verkey> for String {
    fn from(verkey: Verkey) -> Self {
        verkey.0
    }
}

impl AsRef<str> for Verkey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

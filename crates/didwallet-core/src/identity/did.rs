//! Decentralized Identifier (DID) type
//!
//! Unqualified form: base58 of the first 16 bytes of the Ed25519 verkey
//! (or of the whole verkey for a "cryptonym" DID).
//! Qualified form: `did:{method}:{unqualified}`.

use crate::error::WalletError;
use crate::identity::Verkey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of an abbreviated (non-cryptonym) DID
pub const SHORT_DID_LEN: usize = 16;

/// Decentralized Identifier stored in a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// DID from the first 16 bytes of the verkey.
    pub fn from_verkey(verkey: &Verkey) -> Self {
        let bytes = verkey.to_bytes();
        Did(bs58::encode(&bytes[..SHORT_DID_LEN]).into_string())
    }

    /// Cryptonym DID: the full verkey, base58 encoded.
    pub fn cryptonym(verkey: &Verkey) -> Self {
        Did(verkey.as_str().to_string())
    }

    /// Get the DID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method, if qualified (`did:sov:...` → `sov`).
    pub fn method(&self) -> Option<&str> {
        let mut parts = self.0.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("did"), Some(method), Some(_)) => Some(method),
            _ => None,
        }
    }

    /// The identifier part without any `did:{method}:` prefix.
    pub fn unqualified(&self) -> &str {
        match self.method() {
            Some(method) => &self.0["did:".len() + method.len() + 1..],
            None => &self.0,
        }
    }

    /// Qualify this DID with a method. Re-qualifies an already qualified DID.
    pub fn qualify(&self, method: &str) -> Result<Self, WalletError> {
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(WalletError::InvalidStructure(format!(
                "Invalid DID method: {:?}",
                method
            )));
        }
        Ok(Did(format!("did:{}:{}", method, self.unqualified())))
    }

    /// Decoded identifier bytes (16 or 32).
    pub fn identifier_bytes(&self) -> Result<Vec<u8>, WalletError> {
        bs58::decode(self.unqualified())
            .into_vec()
            .map_err(|_| WalletError::InvalidStructure(format!("Invalid base58 in DID: {}", self.0)))
    }

    /// Parse and validate a DID string.
    pub fn parse(did_str: &str) -> Result<Self, WalletError> {
        let did = Did(did_str.to_string());

        if did_str.starts_with("did:") && did.method().is_none() {
            return Err(WalletError::InvalidStructure(
                "Qualified DID must have the form did:<method>:<id>".to_string(),
            ));
        }

        let len = did.identifier_bytes()?.len();
        if len != SHORT_DID_LEN && len != 32 {
            return Err(WalletError::InvalidStructure(format!(
                "DID identifier must decode to 16 or 32 bytes, got {}",
                len
            )));
        }

        Ok(did)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Did {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

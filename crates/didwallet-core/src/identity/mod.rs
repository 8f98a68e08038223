//! Identity primitives: DIDs, verification keys and signing keypairs.
//!
//! ## Example
//!
//! ```rust
//! use didwallet_core::identity::{Did, SigningKeypair};
//!
//! let keypair = SigningKeypair::generate();
//! let verkey = keypair.verkey();
//! let did = Did::from_verkey(&verkey);
//!
//! let signature = keypair.sign(b"hello");
//! assert!(verkey.verify(b"hello", &signature).unwrap());
//! assert_eq!(did.identifier_bytes().unwrap().len(), 16);
//! ```

mod did;
mod keypair;
mod verkey;

pub use did::{Did, SHORT_DID_LEN};
pub use keypair::SigningKeypair;
pub use verkey::Verkey;

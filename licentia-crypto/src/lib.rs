//! Signing key capability for Licentia.
//!
//! Licences are signed by one of two key families:
//! - **RSA**: PKCS#1 v1.5 over the payload with SHA-512 as message digest
//! - **DSA**: the payload is hashed with SHA-512 and the digest is signed
//!
//! The families form a closed sum ([`LicenceKey`]); adding a third one is a
//! compile-checked change to every match on it. Key generation and
//! certificate trust are the caller's business; this crate only wraps key
//! material that already exists.

mod ct;
mod error;
mod key;

pub use ct::constant_time_eq;
pub use error::{CryptoError, CryptoResult};
pub use key::{DsaKey, KeyFamily, LicenceKey, RsaKey};

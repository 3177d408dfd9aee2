//! Shared test keys for crypto tests.
//!
//! Key generation is slow, so each family is generated once per test binary.

#![allow(dead_code)]

use dsa::{Components, KeySize};
use licentia_crypto::LicenceKey;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use std::sync::OnceLock;

pub const RSA_BITS: usize = 1024;

/// Returns a process-wide RSA private key.
pub fn rsa_key() -> &'static LicenceKey {
    static KEY: OnceLock<LicenceKey> = OnceLock::new();
    KEY.get_or_init(|| LicenceKey::from(rsa_private().clone()))
}

/// Returns the raw RSA private key behind [`rsa_key`].
pub fn rsa_private() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, RSA_BITS).unwrap())
}

/// Returns a second, unrelated RSA private key.
pub fn other_rsa_key() -> &'static LicenceKey {
    static KEY: OnceLock<LicenceKey> = OnceLock::new();
    KEY.get_or_init(|| LicenceKey::from(RsaPrivateKey::new(&mut OsRng, RSA_BITS).unwrap()))
}

/// Returns a process-wide DSA signing key.
#[allow(deprecated)]
pub fn dsa_key() -> &'static LicenceKey {
    static KEY: OnceLock<LicenceKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let components = Components::generate(&mut OsRng, KeySize::DSA_1024_160);
        LicenceKey::from(dsa::SigningKey::generate(&mut OsRng, components))
    })
}

//! Key families and the sign/verify capability.
//!
//! A [`LicenceKey`] is either RSA or DSA, and either holds private material
//! (can sign and verify) or is public-only (can only verify). Signature
//! bytes are opaque to callers: PKCS#1 v1.5 blocks for RSA, DER-encoded
//! `(r, s)` pairs for DSA.

use crate::error::{CryptoError, CryptoResult};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha512};
use signature::{DigestSigner, DigestVerifier, SignatureEncoding, Signer, Verifier};
use std::fmt;

/// The algorithm family of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// RSA, PKCS#1 v1.5 with SHA-512.
    Rsa,
    /// DSA over a SHA-512 digest.
    Dsa,
}

impl KeyFamily {
    /// Short lowercase name used in logs and errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Dsa => "dsa",
        }
    }
}

impl fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RSA key material.
pub struct RsaKey {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl RsaKey {
    /// Wraps a private key; the public half is derived from it.
    #[must_use]
    pub fn from_private(private: RsaPrivateKey) -> Self {
        Self {
            public: private.to_public_key(),
            private: Some(private),
        }
    }

    /// Wraps a public key. The result can verify but not sign.
    #[must_use]
    pub fn from_public(public: RsaPublicKey) -> Self {
        Self {
            public,
            private: None,
        }
    }

    /// Returns the public half.
    #[must_use]
    pub fn public(&self) -> &RsaPublicKey {
        &self.public
    }

    fn sign(&self, payload: &[u8]) -> CryptoResult<Vec<u8>> {
        let private = self
            .private
            .as_ref()
            .ok_or(CryptoError::PublicOnly("rsa"))?;
        let signing_key = rsa::pkcs1v15::SigningKey::<Sha512>::new(private.clone());
        let signature = signing_key
            .try_sign(payload)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        Ok(signature.to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = rsa::pkcs1v15::Signature::try_from(signature) else {
            return false;
        };
        let verifying_key = rsa::pkcs1v15::VerifyingKey::<Sha512>::new(self.public.clone());
        verifying_key.verify(payload, &signature).is_ok()
    }
}

/// DSA key material.
pub struct DsaKey {
    public: dsa::VerifyingKey,
    private: Option<dsa::SigningKey>,
}

impl DsaKey {
    /// Wraps a signing key; the verifying half is taken from it.
    #[must_use]
    pub fn from_signing_key(private: dsa::SigningKey) -> Self {
        Self {
            public: private.verifying_key().clone(),
            private: Some(private),
        }
    }

    /// Wraps a verifying key. The result can verify but not sign.
    #[must_use]
    pub fn from_verifying_key(public: dsa::VerifyingKey) -> Self {
        Self {
            public,
            private: None,
        }
    }

    /// Returns the verifying half.
    #[must_use]
    pub fn public(&self) -> &dsa::VerifyingKey {
        &self.public
    }

    fn sign(&self, payload: &[u8]) -> CryptoResult<Vec<u8>> {
        let private = self
            .private
            .as_ref()
            .ok_or(CryptoError::PublicOnly("dsa"))?;
        let digest = Sha512::new_with_prefix(payload);
        let signature: dsa::Signature = private
            .try_sign_digest(digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        Ok(signature.to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = dsa::Signature::try_from(signature) else {
            return false;
        };
        let digest = Sha512::new_with_prefix(payload);
        self.public.verify_digest(digest, &signature).is_ok()
    }
}

/// A licence signing or verification key.
pub enum LicenceKey {
    /// RSA-family key.
    Rsa(RsaKey),
    /// DSA-family key.
    Dsa(DsaKey),
}

impl LicenceKey {
    /// Parses a DER-encoded `SubjectPublicKeyInfo` into a public-only key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedAlgorithm`] if the document is not
    /// an RSA or DSA public key.
    pub fn from_public_key_der(der: &[u8]) -> CryptoResult<Self> {
        if let Ok(public) = RsaPublicKey::from_public_key_der(der) {
            return Ok(Self::Rsa(RsaKey::from_public(public)));
        }
        if let Ok(public) = dsa::VerifyingKey::from_public_key_der(der) {
            return Ok(Self::Dsa(DsaKey::from_verifying_key(public)));
        }
        Err(CryptoError::UnsupportedAlgorithm(
            "public key is neither RSA nor DSA".to_string(),
        ))
    }

    /// Parses a DER-encoded PKCS#8 private key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedAlgorithm`] if the document is not
    /// an RSA or DSA private key.
    pub fn from_pkcs8_der(der: &[u8]) -> CryptoResult<Self> {
        if let Ok(private) = RsaPrivateKey::from_pkcs8_der(der) {
            return Ok(Self::Rsa(RsaKey::from_private(private)));
        }
        if let Ok(private) = dsa::SigningKey::from_pkcs8_der(der) {
            return Ok(Self::Dsa(DsaKey::from_signing_key(private)));
        }
        Err(CryptoError::UnsupportedAlgorithm(
            "private key is neither RSA nor DSA".to_string(),
        ))
    }

    /// Returns the key's algorithm family.
    #[must_use]
    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Rsa(_) => KeyFamily::Rsa,
            Self::Dsa(_) => KeyFamily::Dsa,
        }
    }

    /// Returns true if the key can sign.
    #[must_use]
    pub fn has_private(&self) -> bool {
        match self {
            Self::Rsa(key) => key.private.is_some(),
            Self::Dsa(key) => key.private.is_some(),
        }
    }

    /// Returns a public-only copy of this key.
    #[must_use]
    pub fn public_key(&self) -> Self {
        match self {
            Self::Rsa(key) => Self::Rsa(RsaKey::from_public(key.public.clone())),
            Self::Dsa(key) => Self::Dsa(DsaKey::from_verifying_key(key.public.clone())),
        }
    }

    /// Signs `payload` with the family's scheme.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::PublicOnly`] if the key has no private
    /// material, or [`CryptoError::Signing`] if the primitive fails.
    pub fn sign(&self, payload: &[u8]) -> CryptoResult<Vec<u8>> {
        match self {
            Self::Rsa(key) => key.sign(payload),
            Self::Dsa(key) => key.sign(payload),
        }
    }

    /// Verifies `signature` over `payload`.
    ///
    /// Malformed signatures and signatures made by the other family simply
    /// fail verification.
    #[must_use]
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Rsa(key) => key.verify(payload, signature),
            Self::Dsa(key) => key.verify(payload, signature),
        }
    }
}

impl From<RsaPrivateKey> for LicenceKey {
    fn from(private: RsaPrivateKey) -> Self {
        Self::Rsa(RsaKey::from_private(private))
    }
}

impl From<RsaPublicKey> for LicenceKey {
    fn from(public: RsaPublicKey) -> Self {
        Self::Rsa(RsaKey::from_public(public))
    }
}

impl From<dsa::SigningKey> for LicenceKey {
    fn from(private: dsa::SigningKey) -> Self {
        Self::Dsa(DsaKey::from_signing_key(private))
    }
}

impl From<dsa::VerifyingKey> for LicenceKey {
    fn from(public: dsa::VerifyingKey) -> Self {
        Self::Dsa(DsaKey::from_verifying_key(public))
    }
}

impl fmt::Debug for LicenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenceKey")
            .field("family", &self.family())
            .field("private", &if self.has_private() { "[REDACTED]" } else { "none" })
            .finish()
    }
}

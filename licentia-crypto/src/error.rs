//! Error types for the key capability layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in signing operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key holds no private material.
    #[error("{0} key has no private material")]
    PublicOnly(&'static str),

    /// The key material belongs to neither supported family.
    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The underlying primitive refused to sign.
    #[error("signing failed: {0}")]
    Signing(String),
}

//! Error types for the licence module.

use licentia_crypto::CryptoError;
use thiserror::Error;

/// Licence encoding and signing errors.
#[derive(Debug, Error)]
pub enum LicenceError {
    /// Format version outside the supported set.
    #[error("unsupported licence format version {0}")]
    UnsupportedVersion(u16),

    /// Input ended before a field was complete.
    #[error("truncated licence: missing {0}")]
    Truncated(&'static str),

    /// A field is present but its contents are not valid.
    #[error("malformed licence {field}: {reason}")]
    Malformed {
        /// Name of the offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The serial is not a valid identifier.
    #[error("invalid licence serial: {0}")]
    InvalidIdentifier(#[from] licentia_types::Error),

    /// A size invariant of the record would be violated.
    #[error("licence limit exceeded: {0}")]
    LimitExceeded(String),

    /// The key capability failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// XML markup could not be read or written.
    #[error("xml error: {0}")]
    Xml(String),
}

impl LicenceError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors from a network time query.
///
/// Every variant is a transient condition; validation falls back to the
/// local clock on any of them.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The server name could not be resolved.
    #[error("could not resolve time server {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// The server name resolved to no addresses.
    #[error("time server {0} has no addresses")]
    NoAddress(String),

    /// No reply arrived within the configured timeout.
    #[error("time server did not answer in time")]
    Timeout,

    /// Socket error while sending or receiving.
    #[error("time query i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The reply is too short or not a server reply.
    #[error("malformed time reply: {0}")]
    MalformedReply(String),
}

/// Result type for licence operations.
pub type LicenceResult<T> = Result<T, LicenceError>;

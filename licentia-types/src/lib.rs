//! Core type definitions for Licentia.
//!
//! This crate defines the leaf types shared by the codec, signing and
//! validation layers:
//! - Licence serial identifiers (UUID v4)
//! - Tick-precision UTC timestamps used in the canonical encoding
//!
//! The licence record itself lives in `licentia-licence`, next to the codec
//! that owns its invariants.

mod ids;
mod timestamp;

pub use ids::LicenceId;
pub use timestamp::{LicenceTimestamp, TICKS_PER_SECOND, UNIX_EPOCH_TICKS};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid licence identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

//! Licence serial identifiers.
//!
//! Serials are random UUIDs. On the wire they travel as 16 raw bytes behind
//! a one-byte length prefix, and in text as the hyphenated lowercase form.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique serial of a licence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenceId(Uuid);

impl LicenceId {
    /// Length of the raw byte form.
    pub const BYTE_LEN: usize = 16;

    /// Creates a fresh random serial.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a serial from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the raw 16-byte form used by the binary encoding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Rebuilds a serial from its raw byte form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] unless exactly 16 bytes are given.
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        let raw: [u8; 16] = bytes.try_into().map_err(|_| {
            Error::InvalidIdentifier(format!(
                "expected {} bytes, got {}",
                Self::BYTE_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(Uuid::from_bytes(raw)))
    }

    /// Parses the canonical hyphenated text form.
    ///
    /// Only the 36-character hyphenated form is accepted so that the text
    /// encoding stays canonical.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.len() != 36 {
            return Err(Error::InvalidIdentifier(format!(
                "expected hyphenated UUID, got {s:?}"
            )));
        }
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for LicenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LicenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for LicenceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

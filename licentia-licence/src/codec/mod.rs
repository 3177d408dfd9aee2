//! Canonical licence encodings.
//!
//! Two encodings carry the same logical content:
//! - [`binary`]: compact fixed-order byte layout; its signature-less form is
//!   the exact payload that gets signed
//! - [`text`]: XML envelope for transports that want markup
//!
//! Both are deterministic: attributes are always emitted in ascending key
//! order, absent values have a single representation, and decoders reject
//! anything that would not re-encode to the same bytes. Signatures always
//! cover the binary signable form, whichever encoding carried the record.

pub mod binary;
pub mod text;

use crate::error::{LicenceError, LicenceResult};
use crate::record::LicenceRecord;

pub use binary::{decode, encode};
pub use text::{decode_text, encode_text};

/// Format version written by the encoders.
pub const CURRENT_VERSION: u16 = 1;

/// Format versions the decoders accept.
pub const SUPPORTED_VERSIONS: &[u16] = &[CURRENT_VERSION];

/// Returns the bytes a signature covers: the binary encoding without the
/// signature field.
#[must_use]
pub fn signable_bytes(record: &LicenceRecord) -> Vec<u8> {
    encode(record, false)
}

fn check_version(version: u16) -> LicenceResult<()> {
    if SUPPORTED_VERSIONS.contains(&version) {
        Ok(())
    } else {
        Err(LicenceError::UnsupportedVersion(version))
    }
}

/// Rejects a key that does not sort strictly after the previous one.
fn check_key_order(previous: Option<&String>, key: &str) -> LicenceResult<()> {
    match previous {
        Some(prev) if key <= prev.as_str() => Err(LicenceError::malformed(
            "attributes",
            format!("key {key:?} is not in ascending order after {prev:?}"),
        )),
        _ => Ok(()),
    }
}

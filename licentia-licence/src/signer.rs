//! Signing and signature verification of licence records.
//!
//! Both directions run over [`signable_bytes`]: the binary encoding without
//! the signature field. Family-specific hashing lives in the key capability.

use crate::codec::signable_bytes;
use crate::error::LicenceResult;
use crate::record::{LicenceRecord, LicenceSignature};
use licentia_crypto::{CryptoError, LicenceKey};
use tracing::{debug, warn};

/// Signs `record` in place.
///
/// Only the signature is touched. Returns `Ok(false)` and leaves the record
/// as it was if the key is public-only.
///
/// # Errors
///
/// Returns an error if the signing primitive fails or produces a signature
/// that does not fit the encoding.
pub fn sign(record: &mut LicenceRecord, key: &LicenceKey) -> LicenceResult<bool> {
    let payload = signable_bytes(record);
    let bytes = match key.sign(&payload) {
        Ok(bytes) => bytes,
        Err(CryptoError::PublicOnly(family)) => {
            warn!(
                "cannot sign licence {}: {} key has no private material",
                record.serial(),
                family
            );
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };
    record.set_signature(LicenceSignature::new(bytes)?);
    debug!("signed licence {} with {} key", record.serial(), key.family());
    Ok(true)
}

/// Verifies the signature attached to `record` against `key`.
///
/// Unsigned records, wrong-family keys and malformed signatures all yield
/// `false`.
#[must_use]
pub fn verify(record: &LicenceRecord, key: &LicenceKey) -> bool {
    match record.signature() {
        Some(signature) => key.verify(&signable_bytes(record), signature.as_bytes()),
        None => false,
    }
}

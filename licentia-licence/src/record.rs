//! The licence record and its editable draft.
//!
//! A [`LicenceRecord`] is immutable from the outside. Content changes go
//! through [`LicenceRecord::edit`], which hands out a [`LicenceDraft`] and
//! returns a fresh *unsigned* record, so a signature can never outlive the
//! content it covered. Only the signer and the decoders attach signatures.

use crate::error::{LicenceError, LicenceResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use licentia_crypto::constant_time_eq;
use licentia_types::{LicenceId, LicenceTimestamp};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of attributes (the count is a `u16` on the wire).
pub const MAX_ATTRIBUTES: usize = u16::MAX as usize;

/// Maximum signature length in bytes (the length is a `u16` on the wire).
pub const MAX_SIGNATURE_LEN: usize = u16::MAX as usize;

/// Maximum byte length of an attribute key or value.
pub const MAX_STRING_LEN: usize = u32::MAX as usize;

/// Plain, freely mutable licence contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenceDraft {
    /// Unique serial. Defaults to a fresh random one.
    pub serial: LicenceId,
    /// Start of the validity window, if any.
    pub not_before: Option<LicenceTimestamp>,
    /// End of the validity window, if any.
    pub not_after: Option<LicenceTimestamp>,
    /// Named attributes, kept in ascending key order.
    pub attributes: BTreeMap<String, String>,
}

impl LicenceDraft {
    /// Creates an empty draft with a fresh serial.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the serial.
    #[must_use]
    pub fn serial(mut self, serial: LicenceId) -> Self {
        self.serial = serial;
        self
    }

    /// Sets the start of the validity window.
    #[must_use]
    pub fn not_before(mut self, at: impl Into<LicenceTimestamp>) -> Self {
        self.not_before = Some(at.into());
        self
    }

    /// Sets the end of the validity window.
    #[must_use]
    pub fn not_after(mut self, at: impl Into<LicenceTimestamp>) -> Self {
        self.not_after = Some(at.into());
        self
    }

    /// Adds or replaces an attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Checks the size invariants and produces an unsigned record.
    pub fn build(self) -> LicenceResult<LicenceRecord> {
        LicenceRecord::from_draft(self)
    }
}

/// Opaque signature bytes produced by a key capability.
///
/// Never empty: an empty signature on the wire means "unsigned". Equality
/// is evaluated in constant time.
#[derive(Clone, Eq)]
pub struct LicenceSignature(Vec<u8>);

impl LicenceSignature {
    pub(crate) fn new(bytes: Vec<u8>) -> LicenceResult<Self> {
        if bytes.is_empty() {
            return Err(LicenceError::malformed("signature", "empty signature"));
        }
        if bytes.len() > MAX_SIGNATURE_LEN {
            return Err(LicenceError::LimitExceeded(format!(
                "signature is {} bytes, max {MAX_SIGNATURE_LEN}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Returns the raw signature bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the signature length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no signature bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the standard base64 form used by the text encoding.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }
}

impl PartialEq for LicenceSignature {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LicenceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LicenceSignature({} bytes)", self.0.len())
    }
}

/// A licence: serial, optional validity window, attributes and signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenceRecord {
    serial: LicenceId,
    not_before: Option<LicenceTimestamp>,
    not_after: Option<LicenceTimestamp>,
    attributes: BTreeMap<String, String>,
    signature: Option<LicenceSignature>,
}

impl LicenceRecord {
    /// Creates an unsigned record with a fresh serial, no validity window
    /// and no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_serial(LicenceId::new())
    }

    /// Creates an empty unsigned record with the given serial.
    #[must_use]
    pub fn with_serial(serial: LicenceId) -> Self {
        Self {
            serial,
            not_before: None,
            not_after: None,
            attributes: BTreeMap::new(),
            signature: None,
        }
    }

    /// Builds an unsigned record from a draft.
    ///
    /// # Errors
    ///
    /// Returns [`LicenceError::LimitExceeded`] if there are more than
    /// [`MAX_ATTRIBUTES`] attributes or a key or value is longer than
    /// [`MAX_STRING_LEN`] bytes.
    pub fn from_draft(draft: LicenceDraft) -> LicenceResult<Self> {
        if draft.attributes.len() > MAX_ATTRIBUTES {
            return Err(LicenceError::LimitExceeded(format!(
                "{} attributes, max {MAX_ATTRIBUTES}",
                draft.attributes.len()
            )));
        }
        if let Some((key, _)) = draft
            .attributes
            .iter()
            .find(|(k, v)| k.len() > MAX_STRING_LEN || v.len() > MAX_STRING_LEN)
        {
            return Err(LicenceError::LimitExceeded(format!(
                "attribute {key:?} exceeds {MAX_STRING_LEN} bytes"
            )));
        }
        Ok(Self {
            serial: draft.serial,
            not_before: draft.not_before,
            not_after: draft.not_after,
            attributes: draft.attributes,
            signature: None,
        })
    }

    /// Copies the contents out into an editable draft.
    #[must_use]
    pub fn to_draft(&self) -> LicenceDraft {
        LicenceDraft {
            serial: self.serial,
            not_before: self.not_before,
            not_after: self.not_after,
            attributes: self.attributes.clone(),
        }
    }

    /// Replaces the contents in one step.
    ///
    /// The returned record is always unsigned, even if `edit` changed
    /// nothing; `self` is left untouched.
    pub fn edit(&self, edit: impl FnOnce(&mut LicenceDraft)) -> LicenceResult<Self> {
        let mut draft = self.to_draft();
        edit(&mut draft);
        Self::from_draft(draft)
    }

    /// Returns a copy of this record with the signature removed.
    #[must_use]
    pub fn unsigned(&self) -> Self {
        Self {
            signature: None,
            ..self.clone()
        }
    }

    /// Returns the serial.
    #[must_use]
    pub fn serial(&self) -> LicenceId {
        self.serial
    }

    /// Returns the start of the validity window.
    #[must_use]
    pub fn not_before(&self) -> Option<LicenceTimestamp> {
        self.not_before
    }

    /// Returns the end of the validity window.
    #[must_use]
    pub fn not_after(&self) -> Option<LicenceTimestamp> {
        self.not_after
    }

    /// Returns all attributes in ascending key order.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Looks up a single attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns the signature, if the record is signed.
    #[must_use]
    pub fn signature(&self) -> Option<&LicenceSignature> {
        self.signature.as_ref()
    }

    /// Returns true if a signature is attached.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub(crate) fn set_signature(&mut self, signature: LicenceSignature) {
        self.signature = Some(signature);
    }
}

impl Default for LicenceRecord {
    fn default() -> Self {
        Self::new()
    }
}

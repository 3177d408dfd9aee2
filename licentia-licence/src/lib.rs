//! Licence records: canonical encoding, signing and validation.
//!
//! This crate handles:
//! - The licence record (serial, optional validity window, attributes)
//! - Deterministic binary and XML encodings
//! - Signing over the canonical payload with an RSA or DSA key
//! - Validation against the clock, optionally an SNTP server
//!
//! # Lifecycle
//!
//! ```text
//! LicenceDraft ─build─▶ LicenceRecord (unsigned) ─sign─▶ signed
//!      ▲                                                   │
//!      └──────────── edit (always unsigned) ◀──────────────┤
//!                                                          ▼
//!                   encode ─▶ transport ─▶ decode ─▶ validate
//! ```
//!
//! # Signed payload
//!
//! Signatures cover the binary encoding without the signature field
//! ([`codec::signable_bytes`]). Attributes are emitted in ascending key
//! order, so two records with the same content always produce the same
//! payload regardless of how they were built.

pub mod codec;
mod error;
mod record;
mod signer;
mod time;
mod validation;

pub use codec::{decode, decode_text, encode, encode_text, signable_bytes};
pub use error::{LicenceError, LicenceResult, TimeError};
pub use record::{
    LicenceDraft, LicenceRecord, LicenceSignature, MAX_ATTRIBUTES, MAX_SIGNATURE_LEN,
    MAX_STRING_LEN,
};
pub use signer::{sign, verify};
pub use time::{
    build_request, now_or_local, parse_reply, FixedClock, NetworkTime, NetworkTimeConfig,
    SystemClock, TimeSource, NTP_PACKET_LEN,
};
pub use validation::{validate, validate_at, validate_with, ValidationResult};

pub use licentia_crypto::{KeyFamily, LicenceKey};
pub use licentia_types::{LicenceId, LicenceTimestamp};

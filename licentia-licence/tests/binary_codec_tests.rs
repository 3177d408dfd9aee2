mod common;

use common::{fixed_serial, rsa_key, signed, trial_record};
use chrono::Utc;
use licentia_licence::codec::{CURRENT_VERSION, SUPPORTED_VERSIONS};
use licentia_licence::{
    decode, encode, signable_bytes, LicenceDraft, LicenceError, LicenceId, LicenceRecord,
    LicenceTimestamp,
};
use uuid::Uuid;

fn serial_0_to_15() -> LicenceId {
    LicenceId::from_uuid(Uuid::from_bytes([
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
    ]))
}

fn small_record() -> LicenceRecord {
    LicenceDraft::new()
        .serial(serial_0_to_15())
        .not_after(LicenceTimestamp::from_ticks(0x0102_0304_0506_0708))
        .attribute("b", "2")
        .attribute("a", "1")
        .build()
        .unwrap()
}

fn small_record_bytes() -> Vec<u8> {
    let mut expected = vec![0x01, 0x00, 16];
    expected.extend(0u8..16);
    expected.push(0); // no not-before
    expected.extend([1, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    expected.extend([0x02, 0x00]);
    expected.extend([1, 0, 0, 0, b'a', 1, 0, 0, 0, b'1']);
    expected.extend([1, 0, 0, 0, b'b', 1, 0, 0, 0, b'2']);
    expected
}

// ── Layout ───────────────────────────────────────────────────────

#[test]
fn signable_layout_is_exact() {
    assert_eq!(encode(&small_record(), false), small_record_bytes());
    assert_eq!(signable_bytes(&small_record()), small_record_bytes());
}

#[test]
fn unsigned_record_with_signature_field_has_zero_length() {
    let mut expected = small_record_bytes();
    expected.extend([0, 0]);
    assert_eq!(encode(&small_record(), true), expected);
}

#[test]
fn signature_field_follows_signable_bytes() {
    let record = signed(&small_record(), rsa_key());
    let full = encode(&record, true);
    let payload = encode(&record, false);
    assert_eq!(&full[..payload.len()], payload.as_slice());
    assert_eq!(&full[payload.len()..payload.len() + 2], &128u16.to_le_bytes());
    assert_eq!(&full[payload.len() + 2..], record.signature().unwrap().as_bytes());
}

#[test]
fn signable_bytes_ignore_signature() {
    let record = trial_record(Utc::now());
    let signed = signed(&record, rsa_key());
    assert_eq!(encode(&signed, false), encode(&record, false));
}

#[test]
fn version_constants() {
    assert_eq!(CURRENT_VERSION, 1);
    assert_eq!(SUPPORTED_VERSIONS, &[1]);
}

// ── Round-trips ──────────────────────────────────────────────────

#[test]
fn roundtrip_unsigned() {
    let record = trial_record(Utc::now());
    assert_eq!(decode(&encode(&record, false), false).unwrap(), record);
    assert_eq!(decode(&encode(&record, true), true).unwrap(), record);
}

#[test]
fn roundtrip_signed() {
    let record = signed(&trial_record(Utc::now()), rsa_key());
    let decoded = decode(&encode(&record, true), true).unwrap();
    assert_eq!(decoded, record);
    assert!(decoded.is_signed());
}

#[test]
fn decode_without_signature_drops_nothing_else() {
    let record = signed(&trial_record(Utc::now()), rsa_key());
    let decoded = decode(&encode(&record, false), false).unwrap();
    assert_eq!(decoded, record.unsigned());
}

#[test]
fn roundtrip_empty_record() {
    let record = LicenceRecord::with_serial(fixed_serial());
    let bytes = encode(&record, true);
    assert_eq!(bytes.len(), 2 + 1 + 16 + 1 + 1 + 2 + 2);
    assert_eq!(decode(&bytes, true).unwrap(), record);
}

#[test]
fn roundtrip_unicode_and_empty_strings() {
    let record = LicenceDraft::new()
        .attribute("", "empty key")
        .attribute("Kunde", "Müller & Söhne / 東京")
        .attribute("Note", "")
        .build()
        .unwrap();
    assert_eq!(decode(&encode(&record, false), false).unwrap(), record);
}

#[test]
fn roundtrip_negative_and_extreme_ticks() {
    let record = LicenceDraft::new()
        .not_before(LicenceTimestamp::from_ticks(i64::MIN))
        .not_after(LicenceTimestamp::from_ticks(i64::MAX))
        .build()
        .unwrap();
    assert_eq!(decode(&encode(&record, true), true).unwrap(), record);
}

// ── Structural errors ────────────────────────────────────────────

#[test]
fn unsupported_version_rejected() {
    for version in [0u16, 2, 0xffff] {
        let mut bytes = encode(&small_record(), false);
        bytes[..2].copy_from_slice(&version.to_le_bytes());
        let err = decode(&bytes, false).unwrap_err();
        assert!(matches!(err, LicenceError::UnsupportedVersion(v) if v == version));
    }
}

#[test]
fn every_truncation_rejected() {
    let bytes = encode(&signed(&small_record(), rsa_key()), true);
    for len in 0..bytes.len() {
        assert!(
            decode(&bytes[..len], true).is_err(),
            "prefix of {len} bytes decoded"
        );
    }
}

#[test]
fn truncation_names_field() {
    let err = decode(&[0x01], false).unwrap_err();
    assert!(matches!(err, LicenceError::Truncated("version")));
    let err = decode(&[0x01, 0x00, 16, 0, 1], false).unwrap_err();
    assert!(matches!(err, LicenceError::Truncated("serial")));
}

#[test]
fn trailing_bytes_rejected() {
    let mut bytes = encode(&small_record(), false);
    bytes.push(0);
    let err = decode(&bytes, false).unwrap_err();
    assert!(matches!(err, LicenceError::Malformed { field: "trailer", .. }));
}

#[test]
fn mode_mismatch_rejected() {
    let record = signed(&small_record(), rsa_key());
    assert!(decode(&encode(&record, true), false).is_err());
    assert!(decode(&encode(&record, false), true).is_err());
}

#[test]
fn invalid_presence_flag_rejected() {
    let mut bytes = encode(&small_record(), false);
    bytes[19] = 2; // not-before flag
    let err = decode(&bytes, false).unwrap_err();
    assert!(matches!(err, LicenceError::Malformed { field: "not before", .. }));
}

#[test]
fn wrong_serial_length_rejected() {
    let mut bytes = vec![0x01, 0x00, 4, 1, 2, 3, 4, 0, 0, 0, 0];
    let err = decode(&bytes, false).unwrap_err();
    assert!(matches!(err, LicenceError::InvalidIdentifier(_)));

    bytes[2] = 0;
    assert!(decode(&bytes, false).is_err());
}

#[test]
fn unordered_attributes_rejected() {
    let mut bytes = small_record_bytes();
    // Swap "a" and "b" keys so they appear descending.
    let a = bytes.iter().position(|b| *b == b'a').unwrap();
    let b = bytes.iter().position(|b| *b == b'b').unwrap();
    bytes.swap(a, b);
    let err = decode(&bytes, false).unwrap_err();
    assert!(matches!(err, LicenceError::Malformed { field: "attributes", .. }));
}

#[test]
fn duplicate_attributes_rejected() {
    let mut bytes = small_record_bytes();
    let b = bytes.iter().position(|b| *b == b'b').unwrap();
    bytes[b] = b'a';
    assert!(matches!(
        decode(&bytes, false),
        Err(LicenceError::Malformed { field: "attributes", .. })
    ));
}

#[test]
fn invalid_utf8_rejected() {
    let mut bytes = small_record_bytes();
    let a = bytes.iter().position(|b| *b == b'1').unwrap();
    bytes[a] = 0xff;
    let err = decode(&bytes, false).unwrap_err();
    assert!(matches!(err, LicenceError::Malformed { field: "attribute value", .. }));
}

#[test]
fn oversized_string_length_rejected() {
    let mut bytes = small_record_bytes();
    // Key length of the first attribute claims 4 GiB.
    let at = 2 + 1 + 16 + 1 + 9 + 2;
    bytes[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(matches!(
        decode(&bytes, false),
        Err(LicenceError::Truncated("attribute key"))
    ));
}

#[test]
fn zero_length_signature_means_unsigned() {
    let mut bytes = encode(&small_record(), false);
    bytes.extend([0, 0]);
    let decoded = decode(&bytes, true).unwrap();
    assert!(!decoded.is_signed());
}

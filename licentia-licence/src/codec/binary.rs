//! Binary licence encoding.
//!
//! Layout, all integers little-endian:
//!
//! | Field             | Encoding                                   |
//! |-------------------|--------------------------------------------|
//! | version           | `u16`                                      |
//! | serial            | `u8` length, then raw bytes                |
//! | not before        | `u8` flag (0/1), then `i64` ticks if set   |
//! | not after         | `u8` flag (0/1), then `i64` ticks if set   |
//! | attributes        | `u16` count, then key/value pairs          |
//! | signature (opt.)  | `u16` length (0 = absent), then raw bytes  |
//!
//! Keys and values are a `u32` byte length followed by UTF-8, pairs in
//! ascending key order.

use super::{check_key_order, check_version, CURRENT_VERSION};
use crate::error::{LicenceError, LicenceResult};
use crate::record::{LicenceDraft, LicenceRecord, LicenceSignature};
use licentia_types::{LicenceId, LicenceTimestamp};
use std::collections::BTreeMap;

/// Encodes a record, optionally including its signature field.
///
/// With `include_signature == false` the output is the signable payload.
#[must_use]
pub fn encode(record: &LicenceRecord, include_signature: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&CURRENT_VERSION.to_le_bytes());

    let serial = record.serial();
    let serial = serial.as_bytes();
    out.push(serial.len() as u8);
    out.extend_from_slice(serial);

    write_time(&mut out, record.not_before());
    write_time(&mut out, record.not_after());

    // Bounded by MAX_ATTRIBUTES at construction.
    out.extend_from_slice(&(record.attributes().len() as u16).to_le_bytes());
    for (key, value) in record.attributes() {
        write_str(&mut out, key);
        write_str(&mut out, value);
    }

    if include_signature {
        match record.signature() {
            Some(signature) => {
                out.extend_from_slice(&(signature.len() as u16).to_le_bytes());
                out.extend_from_slice(signature.as_bytes());
            }
            None => out.extend_from_slice(&0u16.to_le_bytes()),
        }
    }
    out
}

/// Decodes a record.
///
/// `expect_signature` must match the mode the bytes were encoded with.
///
/// # Errors
///
/// Fails on an unsupported version, truncated input, malformed flags or
/// strings, attributes out of canonical order, or trailing bytes. No
/// partial record is ever returned.
pub fn decode(bytes: &[u8], expect_signature: bool) -> LicenceResult<LicenceRecord> {
    let mut reader = ByteReader::new(bytes);

    check_version(reader.u16("version")?)?;

    let serial_len = usize::from(reader.u8("serial length")?);
    let serial = LicenceId::from_slice(reader.take(serial_len, "serial")?)?;

    let not_before = reader.time("not before")?;
    let not_after = reader.time("not after")?;

    let count = reader.u16("attribute count")?;
    let mut attributes = BTreeMap::new();
    for _ in 0..count {
        let key = reader.string("attribute key")?;
        let value = reader.string("attribute value")?;
        check_key_order(attributes.last_key_value().map(|(k, _)| k), &key)?;
        attributes.insert(key, value);
    }

    let signature = if expect_signature {
        let len = usize::from(reader.u16("signature length")?);
        match len {
            0 => None,
            len => Some(LicenceSignature::new(reader.take(len, "signature")?.to_vec())?),
        }
    } else {
        None
    };

    reader.finish()?;

    let mut record = LicenceDraft {
        serial,
        not_before,
        not_after,
        attributes,
    }
    .build()?;
    if let Some(signature) = signature {
        record.set_signature(signature);
    }
    Ok(record)
}

fn write_time(out: &mut Vec<u8>, time: Option<LicenceTimestamp>) {
    match time {
        Some(ts) => {
            out.push(1);
            out.extend_from_slice(&ts.ticks().to_le_bytes());
        }
        None => out.push(0),
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    // Bounded by MAX_STRING_LEN at construction.
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Bounds-checked cursor over the input.
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, field: &'static str) -> LicenceResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(LicenceError::Truncated(field))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> LicenceResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn u8(&mut self, field: &'static str) -> LicenceResult<u8> {
        Ok(self.array::<1>(field)?[0])
    }

    fn u16(&mut self, field: &'static str) -> LicenceResult<u16> {
        Ok(u16::from_le_bytes(self.array(field)?))
    }

    fn u32(&mut self, field: &'static str) -> LicenceResult<u32> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    fn i64(&mut self, field: &'static str) -> LicenceResult<i64> {
        Ok(i64::from_le_bytes(self.array(field)?))
    }

    fn flag(&mut self, field: &'static str) -> LicenceResult<bool> {
        match self.u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(LicenceError::malformed(
                field,
                format!("presence flag must be 0 or 1, got {other}"),
            )),
        }
    }

    fn time(&mut self, field: &'static str) -> LicenceResult<Option<LicenceTimestamp>> {
        if self.flag(field)? {
            Ok(Some(LicenceTimestamp::from_ticks(self.i64(field)?)))
        } else {
            Ok(None)
        }
    }

    fn string(&mut self, field: &'static str) -> LicenceResult<String> {
        let len = self.u32(field)?;
        let len = usize::try_from(len).map_err(|_| LicenceError::Truncated(field))?;
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| LicenceError::malformed(field, format!("invalid UTF-8: {e}")))
    }

    fn finish(self) -> LicenceResult<()> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            extra => Err(LicenceError::malformed(
                "trailer",
                format!("{extra} unexpected trailing bytes"),
            )),
        }
    }
}

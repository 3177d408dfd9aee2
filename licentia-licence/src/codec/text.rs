//! XML licence encoding.
//!
//! ```xml
//! <Licence version="1">
//!   <Serial>0f8fad5b-d9cb-469f-a165-70867728950e</Serial>
//!   <NotBefore>N/A</NotBefore>
//!   <NotAfter>638712864000000000</NotAfter>
//!   <Attributes>
//!     <Attribute>
//!       <Key>CustomerName</Key>
//!       <Value>John Doe</Value>
//!     </Attribute>
//!   </Attributes>
//!   <Signature>base64...</Signature>
//! </Licence>
//! ```
//!
//! Elements must appear in exactly this order. Times are tick counts or the
//! literal `N/A`; an absent signature is an empty `<Signature/>` element.
//! Whitespace between elements is ignored, element text is kept verbatim.
//! Attribute text must consist of XML 1.0 characters; carriage returns are
//! written as character references so conforming parsers keep them.

use super::{check_key_order, check_version, CURRENT_VERSION};
use crate::error::{LicenceError, LicenceResult};
use crate::record::{LicenceDraft, LicenceRecord, LicenceSignature};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use licentia_types::{LicenceId, LicenceTimestamp};
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;

/// Marker written for an absent validity bound.
pub const NOT_APPLICABLE: &str = "N/A";

const ROOT: &str = "Licence";
const VERSION_ATTR: &str = "version";
const SERIAL: &str = "Serial";
const NOT_BEFORE: &str = "NotBefore";
const NOT_AFTER: &str = "NotAfter";
const ATTRIBUTES: &str = "Attributes";
const ATTRIBUTE: &str = "Attribute";
const KEY: &str = "Key";
const VALUE: &str = "Value";
const SIGNATURE: &str = "Signature";

/// Encodes a record as XML, optionally including its signature element.
///
/// # Errors
///
/// Returns [`LicenceError::Xml`] if an attribute key or value contains a
/// character XML 1.0 cannot carry, or if the writer fails.
pub fn encode_text(record: &LicenceRecord, include_signature: bool) -> LicenceResult<String> {
    for (key, value) in record.attributes() {
        for text in [key, value] {
            if let Some(c) = text.chars().find(|c| !is_xml_char(*c)) {
                return Err(LicenceError::Xml(format!(
                    "attribute {key:?} contains U+{:04X}, which XML cannot represent",
                    u32::from(c)
                )));
            }
        }
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let version = CURRENT_VERSION.to_string();
    let mut root = BytesStart::new(ROOT);
    root.push_attribute((VERSION_ATTR, version.as_str()));
    write(&mut writer, Event::Start(root))?;

    write_text_element(&mut writer, SERIAL, &record.serial().to_string())?;
    write_text_element(&mut writer, NOT_BEFORE, &time_text(record.not_before()))?;
    write_text_element(&mut writer, NOT_AFTER, &time_text(record.not_after()))?;

    write(&mut writer, Event::Start(BytesStart::new(ATTRIBUTES)))?;
    for (key, value) in record.attributes() {
        write(&mut writer, Event::Start(BytesStart::new(ATTRIBUTE)))?;
        write_text_element(&mut writer, KEY, key)?;
        write_text_element(&mut writer, VALUE, value)?;
        write(&mut writer, Event::End(BytesEnd::new(ATTRIBUTE)))?;
    }
    write(&mut writer, Event::End(BytesEnd::new(ATTRIBUTES)))?;

    if include_signature {
        let signature = record
            .signature()
            .map(LicenceSignature::to_base64)
            .unwrap_or_default();
        write_text_element(&mut writer, SIGNATURE, &signature)?;
    }

    write(&mut writer, Event::End(BytesEnd::new(ROOT)))?;
    String::from_utf8(writer.into_inner()).map_err(|e| LicenceError::Xml(e.to_string()))
}

/// Decodes a record from XML.
///
/// `expect_signature` must match the mode the text was encoded with.
///
/// # Errors
///
/// Fails on an unsupported or missing version, missing or misordered
/// elements, unparsable values, attributes out of canonical order, or
/// content after the root element.
pub fn decode_text(xml: &str, expect_signature: bool) -> LicenceResult<LicenceRecord> {
    let mut cursor = XmlCursor::new(xml);

    let (root, has_content) = match cursor.open(ROOT)? {
        Open::Start(root) => (root, true),
        Open::Empty(root) => (root, false),
    };
    let version = root
        .try_get_attribute(VERSION_ATTR)
        .map_err(xml_error)?
        .ok_or_else(|| LicenceError::malformed("version", "missing version attribute"))?;
    let version = version.unescape_value().map_err(xml_error)?;
    let version: u16 = version
        .parse()
        .map_err(|_| LicenceError::malformed("version", format!("{version:?} is not a number")))?;
    check_version(version)?;
    if !has_content {
        return Err(LicenceError::Truncated(SERIAL));
    }

    let serial = LicenceId::parse(&cursor.text_element(SERIAL)?)?;
    let not_before = parse_time("not before", &cursor.text_element(NOT_BEFORE)?)?;
    let not_after = parse_time("not after", &cursor.text_element(NOT_AFTER)?)?;

    let mut attributes = BTreeMap::new();
    if let Open::Start(_) = cursor.open(ATTRIBUTES)? {
        loop {
            match cursor.next()? {
                Event::End(e) if e.name().as_ref() == ATTRIBUTES.as_bytes() => break,
                Event::Start(e) if e.name().as_ref() == ATTRIBUTE.as_bytes() => {
                    let key = cursor.text_element(KEY)?;
                    let value = cursor.text_element(VALUE)?;
                    cursor.close(ATTRIBUTE)?;
                    check_key_order(attributes.last_key_value().map(|(k, _)| k), &key)?;
                    attributes.insert(key, value);
                }
                Event::Eof => return Err(LicenceError::Truncated("Attributes")),
                other => {
                    return Err(LicenceError::malformed(
                        "attributes",
                        format!("expected <{ATTRIBUTE}>, found {}", describe(&other)),
                    ));
                }
            }
        }
    }

    let signature = if expect_signature {
        match cursor.text_element(SIGNATURE)?.as_str() {
            "" => None,
            encoded => {
                let bytes = BASE64.decode(encoded).map_err(|e| {
                    LicenceError::malformed("signature", format!("invalid base64: {e}"))
                })?;
                Some(LicenceSignature::new(bytes)?)
            }
        }
    } else {
        None
    };

    cursor.close(ROOT)?;
    cursor.end()?;

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

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> LicenceResult<()> {
    writer
        .write_event(event)
        .map_err(|e| LicenceError::Xml(e.to_string()))
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> LicenceResult<()> {
    if text.is_empty() {
        return write(writer, Event::Empty(BytesStart::new(name)));
    }
    let escaped = escape(text).replace('\r', "&#13;");
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::from_escaped(escaped)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

/// The XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn time_text(time: Option<LicenceTimestamp>) -> String {
    time.map_or_else(|| NOT_APPLICABLE.to_string(), |ts| ts.ticks().to_string())
}

fn parse_time(field: &'static str, text: &str) -> LicenceResult<Option<LicenceTimestamp>> {
    if text == NOT_APPLICABLE {
        return Ok(None);
    }
    match text.parse::<i64>() {
        // Only the canonical decimal form: no sign prefix, no leading zeros.
        Ok(ticks) if ticks.to_string() == text => Ok(Some(LicenceTimestamp::from_ticks(ticks))),
        _ => Err(LicenceError::malformed(
            field,
            format!("expected tick count or {NOT_APPLICABLE}, got {text:?}"),
        )),
    }
}

fn xml_error(e: impl std::fmt::Display) -> LicenceError {
    LicenceError::Xml(e.to_string())
}

fn describe(event: &Event<'_>) -> String {
    match event {
        Event::Start(e) | Event::Empty(e) => {
            format!("<{}>", String::from_utf8_lossy(e.name().as_ref()))
        }
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Text(_) | Event::CData(_) => "text".to_string(),
        Event::Eof => "end of document".to_string(),
        _ => "markup".to_string(),
    }
}

/// An opened element: either `<x>` with content to follow, or `<x/>`.
enum Open<'a> {
    Start(BytesStart<'a>),
    Empty(BytesStart<'a>),
}

/// Strict pull cursor that walks the fixed element sequence.
struct XmlCursor<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> XmlCursor<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    fn next_raw(&mut self) -> LicenceResult<Event<'a>> {
        self.reader.read_event().map_err(xml_error)
    }

    /// Next structural event, skipping prolog, comments and inter-element
    /// whitespace.
    fn next(&mut self) -> LicenceResult<Event<'a>> {
        loop {
            match self.next_raw()? {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
                other => return Ok(other),
            }
        }
    }

    fn open(&mut self, name: &'static str) -> LicenceResult<Open<'a>> {
        match self.next()? {
            Event::Start(e) if e.name().as_ref() == name.as_bytes() => Ok(Open::Start(e)),
            Event::Empty(e) if e.name().as_ref() == name.as_bytes() => Ok(Open::Empty(e)),
            Event::Eof => Err(LicenceError::Truncated(name)),
            other => Err(LicenceError::malformed(
                name,
                format!("expected <{name}>, found {}", describe(&other)),
            )),
        }
    }

    fn close(&mut self, name: &'static str) -> LicenceResult<()> {
        match self.next()? {
            Event::End(e) if e.name().as_ref() == name.as_bytes() => Ok(()),
            Event::Eof => Err(LicenceError::Truncated(name)),
            other => Err(LicenceError::malformed(
                name,
                format!("expected </{name}>, found {}", describe(&other)),
            )),
        }
    }

    /// Reads `<name>text</name>` or `<name/>`, returning the unescaped text.
    fn text_element(&mut self, name: &'static str) -> LicenceResult<String> {
        if let Open::Empty(_) = self.open(name)? {
            return Ok(String::new());
        }
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                Event::Text(t) => text.push_str(&t.unescape().map_err(xml_error)?),
                Event::CData(c) => {
                    let raw = String::from_utf8(c.into_inner().into_owned()).map_err(|e| {
                        LicenceError::malformed(name, format!("invalid UTF-8: {e}"))
                    })?;
                    text.push_str(&raw);
                }
                Event::Comment(_) => {}
                Event::End(e) if e.name().as_ref() == name.as_bytes() => {
                    if let Some(c) = text.chars().find(|c| !is_xml_char(*c)) {
                        return Err(LicenceError::malformed(
                            name,
                            format!("U+{:04X} is not an XML character", u32::from(c)),
                        ));
                    }
                    return Ok(text);
                }
                Event::Eof => return Err(LicenceError::Truncated(name)),
                other => {
                    return Err(LicenceError::malformed(
                        name,
                        format!("expected text, found {}", describe(&other)),
                    ));
                }
            }
        }
    }

    fn end(&mut self) -> LicenceResult<()> {
        match self.next()? {
            Event::Eof => Ok(()),
            other => Err(LicenceError::malformed(
                "document",
                format!("unexpected {} after </{ROOT}>", describe(&other)),
            )),
        }
    }
}

//! Shared test helpers for licence tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use dsa::{Components, KeySize};
use licentia_licence::{LicenceDraft, LicenceId, LicenceKey, LicenceRecord};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use std::net::UdpSocket;
use std::sync::OnceLock;
use std::thread;
use uuid::Uuid;

/// Fixed serial used by scenario tests.
pub const FIXED_SERIAL: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

/// Returns a process-wide RSA key pair (private half included).
pub fn rsa_key() -> &'static LicenceKey {
    static KEY: OnceLock<LicenceKey> = OnceLock::new();
    KEY.get_or_init(|| LicenceKey::from(RsaPrivateKey::new(&mut OsRng, 1024).unwrap()))
}

/// Returns a process-wide DSA key pair (private half included).
#[allow(deprecated)]
pub fn dsa_key() -> &'static LicenceKey {
    static KEY: OnceLock<LicenceKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let components = Components::generate(&mut OsRng, KeySize::DSA_1024_160);
        LicenceKey::from(dsa::SigningKey::generate(&mut OsRng, components))
    })
}

pub fn fixed_serial() -> LicenceId {
    LicenceId::from_uuid(Uuid::parse_str(FIXED_SERIAL).unwrap())
}

/// The trial licence from the end-to-end scenario: no start, ends 30 days
/// after `now`.
pub fn trial_record(now: DateTime<Utc>) -> LicenceRecord {
    LicenceDraft::new()
        .serial(fixed_serial())
        .not_after(now + Duration::days(30))
        .attribute("LicenceType", "Trial")
        .attribute("CustomerName", "John Doe")
        .build()
        .unwrap()
}

/// Returns a signed copy of `record`.
pub fn signed(record: &LicenceRecord, key: &LicenceKey) -> LicenceRecord {
    let mut record = record.clone();
    assert!(licentia_licence::sign(&mut record, key).unwrap());
    record
}

/// Replaces the first occurrence of `from` with `to` (same length).
pub fn patch_bytes(bytes: &mut [u8], from: &[u8], to: &[u8]) {
    assert_eq!(from.len(), to.len());
    let at = bytes
        .windows(from.len())
        .position(|w| w == from)
        .expect("pattern present");
    bytes[at..at + to.len()].copy_from_slice(to);
}

/// Builds an SNTP server reply carrying `at` as transmit timestamp.
pub fn ntp_reply(at: DateTime<Utc>) -> Vec<u8> {
    let secs = (at.timestamp() + 2_208_988_800) as u64 as u32;
    let fraction = ((u64::from(at.timestamp_subsec_nanos()) << 32) / 1_000_000_000) as u32;
    let mut reply = vec![0u8; 48];
    reply[0] = 0x24; // LI 0, version 4, mode 4 (server)
    reply[40..44].copy_from_slice(&secs.to_be_bytes());
    reply[44..48].copy_from_slice(&fraction.to_be_bytes());
    reply
}

/// Spawns a loopback UDP responder that answers one request with `reply`.
/// Returns the port it listens on.
pub fn spawn_responder(reply: Vec<u8>) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut buf = [0u8; 64];
        if let Ok((_, peer)) = socket.recv_from(&mut buf) {
            let _ = socket.send_to(&reply, peer);
        }
    });
    port
}

/// Binds a loopback socket that never answers.
pub fn silent_server() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").unwrap()
}

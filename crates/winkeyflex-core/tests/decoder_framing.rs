//! Integration tests for WinKeyer stream decoding.
//!
//! These tests feed whole byte sequences through the public decoder API, the
//! way the serial reader does, and check the resulting event sequence and the
//! session text left behind.

use winkeyflex_core::protocol::winkeyer::{TAG_MASK, TAG_POT, TAG_STATUS, VALUE_MASK};
use winkeyflex_core::{EventKind, KeyerEvent, ProtocolAnomaly, WinkeyerDecoder};

/// Feeds `bytes` through a fresh decoder, keeping only emitted events.
///
/// Anomalies are skipped, exactly as the reader loop skips them.
fn decode_all(decoder: &mut WinkeyerDecoder, bytes: &[u8]) -> Vec<KeyerEvent> {
    bytes
        .iter()
        .filter_map(|b| decoder.decode(*b).ok().flatten())
        .collect()
}

#[test]
fn test_cq_burst_yields_start_echoes_and_stop() {
    // Arrange
    let mut decoder = WinkeyerDecoder::new();

    // Act
    let events = decode_all(&mut decoder, &[0xC6, b'C', b'Q', 0xC4]);

    // Assert
    assert_eq!(
        events,
        vec![
            KeyerEvent::KeyStart,
            KeyerEvent::Echo(b'C'),
            KeyerEvent::Echo(b'Q'),
            KeyerEvent::KeyStop("CQ".to_string()),
        ]
    );
    assert_eq!(decoder.accumulated_text(), "");
}

#[test]
fn test_two_bursts_do_not_share_text() {
    let mut decoder = WinkeyerDecoder::new();

    let events = decode_all(
        &mut decoder,
        &[0xC6, b'D', b'E', 0xC4, 0xC6, b'K', b'1', 0xC4],
    );

    let words: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            KeyerEvent::KeyStop(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(words, vec!["DE", "K1"]);
}

#[test]
fn test_pot_and_ready_inside_a_burst_keep_the_word_intact() {
    // A speed change mid-word must not split or corrupt the keyed text.
    let mut decoder = WinkeyerDecoder::new();

    let events = decode_all(&mut decoder, &[0xC6, b'T', 0x94, 0xC8, b'U', 0xC4]);

    assert_eq!(
        events,
        vec![
            KeyerEvent::KeyStart,
            KeyerEvent::Echo(b'T'),
            KeyerEvent::PotChange(20),
            KeyerEvent::Ready,
            KeyerEvent::Echo(b'U'),
            KeyerEvent::KeyStop("TU".to_string()),
        ]
    );
}

#[test]
fn test_unrecognised_status_is_dropped_and_decoding_continues() {
    // Arrange: 0xEA is a status byte with code 0x2A
    let mut decoder = WinkeyerDecoder::new();

    // Act: the anomaly is reported once, and the following byte still decodes
    let anomaly = decoder.decode(0xEA);
    let next = decoder.decode(b'E');

    // Assert
    assert_eq!(anomaly, Err(ProtocolAnomaly::UnknownStatus(0x2A)));
    assert_eq!(next, Ok(Some(KeyerEvent::Echo(b'E'))));
}

#[test]
fn test_every_known_status_byte_yields_its_event_only() {
    let expected = [
        (8u8, Some(EventKind::Ready)),
        (6, Some(EventKind::KeyStart)),
        (4, Some(EventKind::KeyStop)),
        (0, None),
    ];

    for (code, kind) in expected {
        let mut decoder = WinkeyerDecoder::new();
        let byte = TAG_STATUS | code;
        let decoded = decoder.decode(byte).expect("known status code");
        assert_eq!(decoded.map(|e| e.kind()), kind, "status byte 0x{byte:02X}");
    }
}

#[test]
fn test_every_pot_byte_yields_masked_speed() {
    for byte in 0u8..=255 {
        if byte & TAG_MASK != TAG_POT {
            continue;
        }
        let mut decoder = WinkeyerDecoder::new();
        let event = decoder.decode(byte).unwrap();
        assert_eq!(event, Some(KeyerEvent::PotChange(byte & VALUE_MASK)));
    }
}

#[test]
fn test_every_untagged_byte_echoes_and_accumulates() {
    let mut decoder = WinkeyerDecoder::new();
    let mut expected = String::new();

    for byte in 0u8..=255 {
        let tag = byte & TAG_MASK;
        if tag == TAG_STATUS || tag == TAG_POT {
            continue;
        }
        let event = decoder.decode(byte).unwrap();
        assert_eq!(event, Some(KeyerEvent::Echo(byte)));
        expected.push(char::from(byte));
    }

    assert_eq!(decoder.accumulated_text(), expected);
}

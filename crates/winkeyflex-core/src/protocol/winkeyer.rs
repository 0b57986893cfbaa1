//! K1EL WinKeyer byte decoder.
//!
//! Wire format (device → host), one byte at a time:
//! ```text
//! 11xx_xxxx  status byte   low 6 bits = status code
//! 10xx_xxxx  pot byte      low 6 bits = speed pot value (0–63)
//! 0xxx_xxxx  echo byte     literal character being keyed
//! ```
//!
//! The two high bits are a tag.  There is no length prefix and no multi-byte
//! framing, so every byte is decoded independently; the only state carried
//! between bytes is the text keyed since the last key-start.
//!
//! # Status codes
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! | `8`  | keyer ready                                    |
//! | `6`  | keying started                                 |
//! | `4`  | keying stopped                                 |
//! | `0`  | internal buffer ready (no event)               |
//!
//! Any other code is a [`ProtocolAnomaly`]: it is reported to the caller so it
//! can be logged, but it never ends a session.  A single byte of line noise
//! must not tear down an otherwise working keying session.

use thiserror::Error;
use tracing::trace;

use crate::domain::event::KeyerEvent;

// ── Host → device commands ────────────────────────────────────────────────────

/// Enable host echo of keyed characters (mode register, bit 6).
pub const ENABLE_ECHO: [u8; 2] = [0x0E, 0x40];

/// Set WPM to 0, which hands speed control to the physical speed pot.
pub const SPEED_FROM_POT: [u8; 2] = [0x02, 0x00];

/// Ask the keyer to report its current pot value.
///
/// The answer arrives later as an ordinary pot byte in the read stream; there
/// is no request/response pairing.
pub const REQUEST_POT_SPEED: [u8; 1] = [0x07];

// ── Byte tags ─────────────────────────────────────────────────────────────────

/// Selects the two tag bits of a device byte.
pub const TAG_MASK: u8 = 0xC0;

/// Tag value of a status byte.
pub const TAG_STATUS: u8 = 0xC0;

/// Tag value of a speed pot byte.
pub const TAG_POT: u8 = 0x80;

/// Selects the 6-bit value carried by status and pot bytes.
pub const VALUE_MASK: u8 = 0x3F;

const STATUS_READY: u8 = 8;
const STATUS_KEY_START: u8 = 6;
const STATUS_KEY_STOP: u8 = 4;
const STATUS_BUFFER_READY: u8 = 0;

// ── Classification ────────────────────────────────────────────────────────────

/// The low 6 bits of a status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Code `0`: the keyer's internal buffer can accept more data.
    BufferReady,
    /// Code `4`: the operator stopped keying.
    KeyStop,
    /// Code `6`: the operator started keying.
    KeyStart,
    /// Code `8`: the keyer is ready.
    Ready,
    /// Any other code.
    Unknown(u8),
}

impl From<u8> for StatusCode {
    /// Converts a status value (already masked to 6 bits) into a code.
    fn from(value: u8) -> Self {
        match value {
            STATUS_BUFFER_READY => StatusCode::BufferReady,
            STATUS_KEY_STOP => StatusCode::KeyStop,
            STATUS_KEY_START => StatusCode::KeyStart,
            STATUS_READY => StatusCode::Ready,
            other => StatusCode::Unknown(other),
        }
    }
}

/// What a single device byte is, judged by its tag bits alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// Tag `11`: keyer state change.
    Status(StatusCode),
    /// Tag `10`: speed pot value, always in `0..=63`.
    Pot(u8),
    /// Tag `00` or `01`: a literal keyed character.
    Echo(u8),
}

impl ByteClass {
    /// Classifies one byte received from the WinKeyer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use winkeyflex_core::protocol::winkeyer::{ByteClass, StatusCode};
    ///
    /// assert_eq!(ByteClass::classify(0xC6), ByteClass::Status(StatusCode::KeyStart));
    /// assert_eq!(ByteClass::classify(0x97), ByteClass::Pot(23));
    /// assert_eq!(ByteClass::classify(b'K'), ByteClass::Echo(b'K'));
    /// ```
    pub fn classify(byte: u8) -> Self {
        match byte & TAG_MASK {
            TAG_STATUS => ByteClass::Status(StatusCode::from(byte & VALUE_MASK)),
            TAG_POT => ByteClass::Pot(byte & VALUE_MASK),
            _ => ByteClass::Echo(byte),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A byte that is well-formed on the wire but means nothing we know of.
///
/// Anomalies are logged and dropped by the reader loop; they are never fatal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolAnomaly {
    /// A status byte carried a code other than 0, 4, 6 or 8.
    #[error("unknown status code: 0x{0:02X}")]
    UnknownStatus(u8),
}

// ── Decoder ───────────────────────────────────────────────────────────────────

/// Stateful decoder for one WinKeyer session.
///
/// The decoder owns the session's accumulated text: the characters echoed
/// since the last key-start.  The text is attached to the key-stop event and
/// then cleared, so each burst of keying produces one completed "word".
///
/// One decoder is created per hardware connection and is never shared between
/// threads.
///
/// # Examples
///
/// ```rust
/// use winkeyflex_core::{KeyerEvent, WinkeyerDecoder};
///
/// let mut decoder = WinkeyerDecoder::new();
/// let events: Vec<_> = [0xC6, b'C', b'Q', 0xC4]
///     .iter()
///     .filter_map(|b| decoder.decode(*b).unwrap())
///     .collect();
///
/// assert_eq!(events.last(), Some(&KeyerEvent::KeyStop("CQ".to_string())));
/// assert!(decoder.accumulated_text().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct WinkeyerDecoder {
    accumulated: String,
}

impl WinkeyerDecoder {
    /// Creates a decoder with empty accumulated text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the characters echoed since the last key-start or key-stop.
    pub fn accumulated_text(&self) -> &str {
        &self.accumulated
    }

    /// Decodes one byte.
    ///
    /// Returns:
    ///
    /// - `Ok(Some(event))` when the byte produces an event.
    /// - `Ok(None)` for the buffer-ready status, which carries no event.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolAnomaly::UnknownStatus`] for a status byte with an
    /// unrecognised code.  The decoder's state is left untouched, so the
    /// caller can log the anomaly and keep feeding bytes.
    pub fn decode(&mut self, byte: u8) -> Result<Option<KeyerEvent>, ProtocolAnomaly> {
        trace!("winkeyer byte 0x{byte:02X}");

        match ByteClass::classify(byte) {
            ByteClass::Status(StatusCode::Ready) => Ok(Some(KeyerEvent::Ready)),
            ByteClass::Status(StatusCode::KeyStart) => {
                self.accumulated.clear();
                Ok(Some(KeyerEvent::KeyStart))
            }
            ByteClass::Status(StatusCode::KeyStop) => {
                // `take` hands the text to the event and leaves an empty string
                // behind, which is exactly the reset we need.
                let text = std::mem::take(&mut self.accumulated);
                Ok(Some(KeyerEvent::KeyStop(text)))
            }
            ByteClass::Status(StatusCode::BufferReady) => Ok(None),
            ByteClass::Status(StatusCode::Unknown(code)) => {
                Err(ProtocolAnomaly::UnknownStatus(code))
            }
            ByteClass::Pot(speed) => Ok(Some(KeyerEvent::PotChange(speed))),
            ByteClass::Echo(ch) => {
                self.accumulated.push(char::from(ch));
                Ok(Some(KeyerEvent::Echo(ch)))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
